//! Bridges renderer-owned map surfaces to a host UI framework's pixel-buffer textures.
//!
//! The renderer owns an off-screen pixel surface and signals when a new frame is ready. The host
//! display system owns a texture registry and pulls pixels whenever it wants to paint. A
//! [`TextureBridge`] binds one surface to one texture slot, and a [`BridgeRegistry`] keeps the set
//! of live bindings. [`SurfaceTexturePlugin`] exposes the registry through the
//! `setSurface` / `updateSurface` / `dispose` method-call protocol.

pub mod api;
pub mod core;

pub use crate::api::commands::{MethodCall, MethodResponse};
pub use crate::api::plugin::SurfaceTexturePlugin;
pub use crate::api::plugin_types::{LoggerConfig, PluginConfig};
pub use crate::core::bridge::{BridgeState, TextureBridge};
pub use crate::core::error::BridgeError;
pub use crate::core::registry::BridgeRegistry;
pub use crate::core::surface::{
    BufferAvailableCallback, PixelSnapshot, SurfaceBuffer, SurfaceBufferSource, SurfaceError,
    SurfaceHandle, SurfaceLock,
};
pub use crate::core::texture_registrar::{PixelBufferProvider, TextureId, TextureRegistrar};
