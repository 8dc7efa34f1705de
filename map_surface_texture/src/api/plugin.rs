//! Plugin entry point that routes method calls to the bridge registry.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::api::commands::{MethodCall, MethodResponse, SurfaceCommand};
use crate::api::plugin_types::PluginConfig;
use crate::core::registry::BridgeRegistry;
use crate::core::surface::SurfaceBufferSource;
use crate::core::texture_registrar::TextureRegistrar;

/// One plugin instance, owning the bridges created through its channel.
///
/// The plugin lives as long as the embedding session: it is created when the host registers the
/// plugin and, when dropped, disposes every bridge that is still alive.
pub struct SurfaceTexturePlugin {
    config: PluginConfig,
    registry: BridgeRegistry,
}

impl SurfaceTexturePlugin {
    /// Creates a plugin binding surfaces of `source` to textures of `registrar`.
    pub fn new(
        source: Arc<dyn SurfaceBufferSource>,
        registrar: Arc<dyn TextureRegistrar>,
        config: PluginConfig,
    ) -> Self {
        info!("Surface texture plugin registered on channel {}", config.channel_name);
        Self {
            config,
            registry: BridgeRegistry::new(source, registrar),
        }
    }

    /// Installs the logger described by `config.logger`, then creates the plugin.
    pub fn with_logging(
        source: Arc<dyn SurfaceBufferSource>,
        registrar: Arc<dyn TextureRegistrar>,
        config: PluginConfig,
    ) -> anyhow::Result<Self> {
        crate::core::init_logger(&config.logger)?;
        Ok(Self::new(source, registrar, config))
    }

    /// Name of the method channel to register the plugin on.
    pub fn channel_name(&self) -> &str {
        &self.config.channel_name
    }

    /// Bridges owned by this plugin.
    pub fn registry(&self) -> &BridgeRegistry {
        &self.registry
    }

    /// Handles one method call. Never panics and never changes state on error.
    pub fn handle_method_call(&self, call: &MethodCall) -> MethodResponse {
        debug!("Method call {}", call.method);

        let command = match SurfaceCommand::decode(call) {
            Ok(command) => command,
            Err(response) => {
                warn!("Rejected method call {}: {response:?}", call.method);
                return response;
            }
        };

        match command {
            SurfaceCommand::SetSurface { map_surface_id } => {
                match self.registry.create_bridge(map_surface_id) {
                    Ok(texture_id) => MethodResponse::success(texture_id.get()),
                    Err(err) => {
                        warn!("setSurface({map_surface_id}) failed: {err}");
                        err.into()
                    }
                }
            }
            SurfaceCommand::UpdateSurface => {
                self.registry.resize_notice();
                MethodResponse::ack()
            }
            SurfaceCommand::Dispose { texture_id } => {
                self.registry.dispose_bridge(texture_id);
                MethodResponse::ack()
            }
        }
    }

    /// Disposes every bridge. The plugin stays usable.
    pub fn shutdown(&self) {
        self.registry.dispose_all();
    }
}
