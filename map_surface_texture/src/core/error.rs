//! Errors reported by bridge and registry operations.

use thiserror::Error;

use crate::core::surface::{SurfaceError, SurfaceHandle};
use crate::core::texture_registrar::TextureId;

/// Error returned synchronously from bridge creation and registry commands.
///
/// None of these errors leave partial state behind: a failed create releases anything it had
/// acquired before returning.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A command argument is missing, has the wrong type or is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The surface is already bound to a live bridge.
    #[error("texture has been already registered for surface {0}")]
    AlreadyRegistered(SurfaceHandle),

    /// The renderer refused to hand out the surface lock.
    #[error("couldn't lock surface {surface}: {source}")]
    SurfaceLockFailed {
        /// Surface that could not be locked.
        surface: SurfaceHandle,
        /// Reason reported by the surface source.
        source: SurfaceError,
    },

    /// The host display system returned the invalid texture id.
    #[error("couldn't register texture for surface {0}")]
    TextureRegistrationFailed(SurfaceHandle),

    /// The host display system handed out an id that a live bridge already uses.
    #[error("texture id {texture_id} assigned to surface {surface} is already in use")]
    TextureIdInUse {
        /// Surface whose binding was refused.
        surface: SurfaceHandle,
        /// Id returned by the display system.
        texture_id: TextureId,
    },
}

impl BridgeError {
    /// Error code reported on the method channel for this error.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidArgument(_) => "ARG_ERROR",
            BridgeError::AlreadyRegistered(_) => "ALREADY_REGISTERED",
            BridgeError::SurfaceLockFailed { .. }
            | BridgeError::TextureRegistrationFailed(_)
            | BridgeError::TextureIdInUse { .. } => "REGISTRATION_FAILED",
        }
    }
}
