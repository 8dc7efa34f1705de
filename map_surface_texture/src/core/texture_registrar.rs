//! Interface of the host display system's texture registry.

use std::fmt;
use std::sync::Arc;

use crate::core::surface::PixelSnapshot;

/// Texture id assigned by the host display system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(i64);

impl TextureId {
    /// Reserved id returned by a registrar when registration failed.
    pub const INVALID: TextureId = TextureId(-1);

    /// Wraps a raw id.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw value of the id.
    pub fn get(self) -> i64 {
        self.0
    }

    /// Whether this is an id of a registered texture rather than the failure sentinel.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl From<i64> for TextureId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pull callback of a pixel-buffer texture.
///
/// Called by the display system, possibly from its own presentation thread, whenever it wants to
/// paint the texture. `None` tells the display system to skip this paint.
pub trait PixelBufferProvider: Send + Sync {
    /// Returns the pixels to paint now.
    fn copy_pixel_buffer(&self) -> Option<PixelSnapshot>;
}

/// Host display system that shows pull-based textures.
pub trait TextureRegistrar: Send + Sync {
    /// Registers a pixel-buffer texture and returns its id, or [`TextureId::INVALID`] on failure.
    fn register_texture(&self, provider: Arc<dyn PixelBufferProvider>) -> TextureId;

    /// Removes a texture. The display system stops pulling from its provider.
    fn unregister_texture(&self, texture_id: TextureId);

    /// Schedules a repaint of the texture.
    fn mark_texture_frame_available(&self, texture_id: TextureId);
}
