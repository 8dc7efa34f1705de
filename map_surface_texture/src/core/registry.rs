//! Collection of live texture bridges.

use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::core::bridge::TextureBridge;
use crate::core::error::BridgeError;
use crate::core::surface::{SurfaceBufferSource, SurfaceHandle};
use crate::core::texture_registrar::{TextureId, TextureRegistrar};

/// Owns every live [`TextureBridge`] of one plugin instance.
///
/// At most one bridge exists per surface, and texture ids are unique among live bridges. Dropping
/// the registry disposes all remaining bridges.
pub struct BridgeRegistry {
    source: Arc<dyn SurfaceBufferSource>,
    registrar: Arc<dyn TextureRegistrar>,
    bridges: Mutex<Vec<TextureBridge>>,
}

impl BridgeRegistry {
    /// Creates an empty registry binding surfaces of `source` to textures of `registrar`.
    pub fn new(
        source: Arc<dyn SurfaceBufferSource>,
        registrar: Arc<dyn TextureRegistrar>,
    ) -> Self {
        Self {
            source,
            registrar,
            bridges: Mutex::new(Vec::new()),
        }
    }

    /// Binds the surface to a new texture and returns the texture's id.
    ///
    /// Fails without changing the registry if the handle is not positive, the surface is already
    /// bound, the lock or texture registration fails, or the display system hands out an id that a
    /// live bridge already uses.
    pub fn create_bridge(&self, surface_handle: i64) -> Result<TextureId, BridgeError> {
        let surface = SurfaceHandle::try_from(surface_handle)?;

        let mut bridges = self.bridges.lock();
        if bridges.iter().any(|bridge| bridge.surface() == surface) {
            return Err(BridgeError::AlreadyRegistered(surface));
        }

        let bridge = TextureBridge::create(surface, self.source.clone(), self.registrar.clone())?;
        let texture_id = bridge.texture_id();
        if bridges.iter().any(|live| live.texture_id() == texture_id) {
            warn!("Texture {texture_id} for surface {surface} is already used by a live bridge");
            bridge.dispose_without_unregistering();
            return Err(BridgeError::TextureIdInUse {
                surface,
                texture_id,
            });
        }
        bridges.push(bridge);

        info!("Surface {surface} registered as texture {texture_id}");
        Ok(texture_id)
    }

    /// Disposes every bridge with the given texture id. Unknown ids are ignored.
    pub fn dispose_bridge(&self, texture_id: TextureId) {
        let removed: Vec<TextureBridge> = {
            let mut bridges = self.bridges.lock();
            let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *bridges)
                .into_iter()
                .partition(|bridge| bridge.texture_id() == texture_id);
            *bridges = kept;
            removed
        };

        if removed.is_empty() {
            debug!("No bridge with texture {texture_id}, nothing to dispose");
            return;
        }

        for bridge in &removed {
            bridge.dispose();
        }
        info!("Texture {texture_id} disposed");
    }

    /// Acknowledges a surface resize.
    ///
    /// Surface dimensions are owned by the renderer, which resizes its buffer itself; bridges only
    /// relay whatever size the buffer currently has, so there is nothing to do here.
    pub fn resize_notice(&self) {
        debug!("Surface resize acknowledged, buffers are sized by the renderer");
    }

    /// Disposes all bridges.
    pub fn dispose_all(&self) {
        let bridges = std::mem::take(&mut *self.bridges.lock());
        if bridges.is_empty() {
            return;
        }

        let count = bridges.len();
        for bridge in &bridges {
            bridge.dispose();
        }
        info!("Disposed {count} remaining bridges");
    }

    /// Texture bound to the surface, if any.
    pub fn texture_for_surface(&self, surface: SurfaceHandle) -> Option<TextureId> {
        self.bridges
            .lock()
            .iter()
            .find(|bridge| bridge.surface() == surface)
            .map(TextureBridge::texture_id)
    }

    /// Whether a live bridge uses the texture id.
    pub fn contains_texture(&self, texture_id: TextureId) -> bool {
        self.bridges
            .lock()
            .iter()
            .any(|bridge| bridge.texture_id() == texture_id)
    }

    /// Number of live bridges.
    pub fn len(&self) -> usize {
        self.bridges.lock().len()
    }

    /// Whether there are no live bridges.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for BridgeRegistry {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
