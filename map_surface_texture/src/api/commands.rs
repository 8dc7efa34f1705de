//! Method-call protocol spoken with the embedding application.
//!
//! Calls arrive as a method name plus a map of arguments and are answered with a success value,
//! an error with a code, or "not implemented". Both types are serde-serializable so any channel
//! codec can carry them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::BridgeError;
use crate::core::texture_registrar::TextureId;

/// Default name of the method channel.
pub const CHANNEL_NAME: &str = "flutter_map_surface_plugin";

/// Method names understood by the plugin.
pub mod methods {
    /// Binds a surface to a new texture.
    pub const SET_SURFACE: &str = "setSurface";
    /// Resize notification, acknowledged only.
    pub const UPDATE_SURFACE: &str = "updateSurface";
    /// Disposes a texture.
    pub const DISPOSE: &str = "dispose";
}

/// Argument names.
pub mod args {
    /// Surface handle argument of `setSurface`.
    pub const MAP_SURFACE_ID: &str = "mapSurfaceId";
    /// Texture id argument of `dispose`.
    pub const TEXTURE_ID: &str = "textureId";
}

/// Error codes reported in [`MethodResponse::Error`].
pub mod codes {
    /// No arguments were sent.
    pub const NO_ARGS: &str = "NO_ARGS";
    /// Arguments are malformed or out of range.
    pub const ARG_ERROR: &str = "ARG_ERROR";
}

/// Incoming method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    /// Method name.
    pub method: String,
    /// Arguments, expected to be a map.
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl MethodCall {
    /// Creates a call.
    pub fn new(method: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Result of a method call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    /// The call succeeded.
    Success {
        /// Returned value, `null` for plain acknowledgements.
        result: Value,
    },
    /// The call failed; nothing was changed.
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable description.
        message: String,
    },
    /// The method is unknown.
    NotImplemented,
}

impl MethodResponse {
    /// Success carrying `result`.
    pub fn success(result: impl Into<Value>) -> Self {
        MethodResponse::Success {
            result: result.into(),
        }
    }

    /// Success without a value.
    pub fn ack() -> Self {
        MethodResponse::Success { result: Value::Null }
    }

    /// Error with the given code.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success { .. })
    }

    /// Error code, if this is an error.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            MethodResponse::Error { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

impl From<BridgeError> for MethodResponse {
    fn from(err: BridgeError) -> Self {
        MethodResponse::error(err.code(), err.to_string())
    }
}

/// Decoded plugin command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceCommand {
    /// Bind a surface. The handle is validated by the registry.
    SetSurface {
        /// Raw surface handle as sent by the application.
        map_surface_id: i64,
    },
    /// Resize notification.
    UpdateSurface,
    /// Dispose the texture.
    Dispose {
        /// Texture to dispose.
        texture_id: TextureId,
    },
}

impl SurfaceCommand {
    /// Decodes a call, or returns the response to send back when it can't be decoded.
    pub fn decode(call: &MethodCall) -> Result<Self, MethodResponse> {
        match call.method.as_str() {
            methods::SET_SURFACE => {
                let arguments = argument_map(call)?;
                let map_surface_id = integer_argument(arguments, args::MAP_SURFACE_ID)?;
                Ok(SurfaceCommand::SetSurface { map_surface_id })
            }
            methods::UPDATE_SURFACE => Ok(SurfaceCommand::UpdateSurface),
            methods::DISPOSE => {
                let arguments = argument_map(call)?;
                let texture_id = integer_argument(arguments, args::TEXTURE_ID)?;
                Ok(SurfaceCommand::Dispose {
                    texture_id: TextureId::new(texture_id),
                })
            }
            _ => Err(MethodResponse::NotImplemented),
        }
    }
}

fn argument_map(call: &MethodCall) -> Result<&Map<String, Value>, MethodResponse> {
    match &call.arguments {
        None | Some(Value::Null) => Err(MethodResponse::error(
            codes::NO_ARGS,
            "No arguments received",
        )),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(MethodResponse::error(
            codes::ARG_ERROR,
            "Arguments are not a map/dictionary",
        )),
    }
}

fn integer_argument(arguments: &Map<String, Value>, name: &str) -> Result<i64, MethodResponse> {
    let value = arguments
        .get(name)
        .ok_or_else(|| MethodResponse::error(codes::ARG_ERROR, format!("{name} not found")))?;

    value
        .as_i64()
        .ok_or_else(|| MethodResponse::error(codes::ARG_ERROR, format!("{name} is not an integer")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_known_commands() {
        let set = MethodCall::new(methods::SET_SURFACE, Some(json!({ "mapSurfaceId": 7 })));
        assert_eq!(
            SurfaceCommand::decode(&set),
            Ok(SurfaceCommand::SetSurface { map_surface_id: 7 })
        );

        let dispose = MethodCall::new(methods::DISPOSE, Some(json!({ "textureId": 3 })));
        assert_eq!(
            SurfaceCommand::decode(&dispose),
            Ok(SurfaceCommand::Dispose {
                texture_id: TextureId::new(3)
            })
        );
    }

    #[test]
    fn update_ignores_arguments() {
        for arguments in [None, Some(json!(42)), Some(json!({ "width": 100, "height": 50 }))] {
            let call = MethodCall::new(methods::UPDATE_SURFACE, arguments);
            assert_eq!(
                SurfaceCommand::decode(&call),
                Ok(SurfaceCommand::UpdateSurface)
            );
        }
    }

    #[test]
    fn rejects_malformed_arguments() {
        let cases = [
            (None, codes::NO_ARGS),
            (Some(Value::Null), codes::NO_ARGS),
            (Some(json!([7])), codes::ARG_ERROR),
            (Some(json!({})), codes::ARG_ERROR),
            (Some(json!({ "mapSurfaceId": "7" })), codes::ARG_ERROR),
            (Some(json!({ "mapSurfaceId": 7.5 })), codes::ARG_ERROR),
        ];

        for (arguments, code) in cases {
            let call = MethodCall::new(methods::SET_SURFACE, arguments);
            let response = SurfaceCommand::decode(&call).expect_err("must be rejected");
            assert_eq!(response.error_code(), Some(code));
        }
    }

    #[test]
    fn unknown_method_is_not_implemented() {
        let call = MethodCall::new("resize", Some(json!({})));
        assert_eq!(
            SurfaceCommand::decode(&call),
            Err(MethodResponse::NotImplemented)
        );
    }

    #[test]
    fn response_wire_format() {
        let value = serde_json::to_value(MethodResponse::success(5)).expect("serializable");
        assert_eq!(value, json!({ "status": "success", "result": 5 }));

        let value = serde_json::to_value(MethodResponse::NotImplemented).expect("serializable");
        assert_eq!(value, json!({ "status": "not_implemented" }));

        let call: MethodCall =
            serde_json::from_value(json!({ "method": "updateSurface" })).expect("valid call");
        assert_eq!(call.arguments, None);
    }
}
