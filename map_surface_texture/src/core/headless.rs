//! In-memory surface source and texture registrar.
//!
//! These stand in for the renderer and the host display system when rendering off-screen, and are
//! what the crate's own tests run against.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use log::debug;
use parking_lot::Mutex;

use crate::core::surface::{
    BufferAvailableCallback, PixelSnapshot, SurfaceBuffer, SurfaceBufferSource, SurfaceError,
    SurfaceHandle, SurfaceLock,
};
use crate::core::texture_registrar::{PixelBufferProvider, TextureId, TextureRegistrar};

#[derive(Default)]
struct SurfaceSlot {
    locked: bool,
    buffer: SurfaceBuffer,
    callback: Option<BufferAvailableCallback>,
}

type SurfaceMap = HashMap<SurfaceHandle, SurfaceSlot>;

/// Surface source that keeps frames in memory.
#[derive(Default)]
pub struct HeadlessSurfaceSource {
    surfaces: Arc<Mutex<SurfaceMap>>,
}

impl HeadlessSurfaceSource {
    /// Creates a source with no surfaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty, unlocked surface. Does nothing if it already exists.
    pub fn add_surface(&self, surface: SurfaceHandle) {
        self.surfaces.lock().entry(surface).or_default();
    }

    /// Replaces the surface's frame and fires its availability callback.
    ///
    /// Returns `false` if the surface is unknown.
    pub fn publish_frame(
        &self,
        surface: SurfaceHandle,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> bool {
        let callback = {
            let mut surfaces = self.surfaces.lock();
            let Some(slot) = surfaces.get_mut(&surface) else {
                return false;
            };
            slot.buffer = SurfaceBuffer {
                width,
                height,
                data: Some(Arc::from(pixels)),
            };
            slot.callback.clone()
        };

        // Fired outside the map lock, the callback may call back into the source.
        if let Some(callback) = callback {
            callback();
        }

        true
    }

    /// Drops the surface's frame, so it reports no data.
    pub fn clear_frame(&self, surface: SurfaceHandle) {
        if let Some(slot) = self.surfaces.lock().get_mut(&surface) {
            slot.buffer = SurfaceBuffer::empty();
        }
    }

    /// Whether someone holds the surface's lock.
    pub fn is_locked(&self, surface: SurfaceHandle) -> bool {
        self.surfaces
            .lock()
            .get(&surface)
            .is_some_and(|slot| slot.locked)
    }

    /// Whether an availability callback is set for the surface.
    pub fn has_callback(&self, surface: SurfaceHandle) -> bool {
        self.callback(surface).is_some()
    }

    /// Currently installed availability callback of the surface.
    pub fn callback(&self, surface: SurfaceHandle) -> Option<BufferAvailableCallback> {
        self.surfaces
            .lock()
            .get(&surface)
            .and_then(|slot| slot.callback.clone())
    }
}

fn release_surface(surfaces: &Weak<Mutex<SurfaceMap>>, surface: SurfaceHandle) {
    if let Some(surfaces) = surfaces.upgrade() {
        if let Some(slot) = surfaces.lock().get_mut(&surface) {
            slot.locked = false;
        }
    }
}

impl SurfaceBufferSource for HeadlessSurfaceSource {
    fn lock(&self, surface: SurfaceHandle) -> Result<SurfaceLock, SurfaceError> {
        let mut surfaces = self.surfaces.lock();
        let slot = surfaces
            .get_mut(&surface)
            .ok_or(SurfaceError::UnknownSurface)?;
        if slot.locked {
            return Err(SurfaceError::AlreadyLocked);
        }
        slot.locked = true;

        let surfaces = Arc::downgrade(&self.surfaces);
        Ok(SurfaceLock::new(surface, move || {
            release_surface(&surfaces, surface)
        }))
    }

    fn surface_buffer(&self, surface: SurfaceHandle) -> SurfaceBuffer {
        self.surfaces
            .lock()
            .get(&surface)
            .map(|slot| slot.buffer.clone())
            .unwrap_or_default()
    }

    fn set_buffer_available_callback(
        &self,
        surface: SurfaceHandle,
        callback: Option<BufferAvailableCallback>,
    ) {
        if let Some(slot) = self.surfaces.lock().get_mut(&surface) {
            slot.callback = callback;
        }
    }
}

struct RegisteredTexture {
    provider: Arc<dyn PixelBufferProvider>,
    frames_available: usize,
}

/// Texture registrar that records every call and paints on request.
pub struct HeadlessTextureRegistrar {
    next_id: AtomicI64,
    textures: Mutex<HashMap<TextureId, RegisteredTexture>>,
    reject_registrations: AtomicBool,
    total_marks: AtomicUsize,
    unregister_count: AtomicUsize,
}

impl Default for HeadlessTextureRegistrar {
    fn default() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            textures: Mutex::new(HashMap::new()),
            reject_registrations: AtomicBool::new(false),
            total_marks: AtomicUsize::new(0),
            unregister_count: AtomicUsize::new(0),
        }
    }
}

impl HeadlessTextureRegistrar {
    /// Creates an empty registrar. Ids start at 1 and are never reused.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent registrations fail with [`TextureId::INVALID`].
    pub fn reject_registrations(&self, reject: bool) {
        self.reject_registrations.store(reject, Ordering::SeqCst);
    }

    /// Pulls the texture's pixels as the presentation loop would.
    pub fn paint(&self, texture_id: TextureId) -> Option<PixelSnapshot> {
        let provider = self.textures.lock().get(&texture_id)?.provider.clone();
        provider.copy_pixel_buffer()
    }

    /// Whether the texture is currently registered.
    pub fn is_registered(&self, texture_id: TextureId) -> bool {
        self.textures.lock().contains_key(&texture_id)
    }

    /// Number of registered textures.
    pub fn texture_count(&self) -> usize {
        self.textures.lock().len()
    }

    /// Frame-available marks received by a registered texture.
    pub fn frames_available(&self, texture_id: TextureId) -> usize {
        self.textures
            .lock()
            .get(&texture_id)
            .map_or(0, |texture| texture.frames_available)
    }

    /// Frame-available marks received for any id, registered or not.
    pub fn total_marks(&self) -> usize {
        self.total_marks.load(Ordering::SeqCst)
    }

    /// Number of unregister calls received.
    pub fn unregister_count(&self) -> usize {
        self.unregister_count.load(Ordering::SeqCst)
    }
}

impl TextureRegistrar for HeadlessTextureRegistrar {
    fn register_texture(&self, provider: Arc<dyn PixelBufferProvider>) -> TextureId {
        if self.reject_registrations.load(Ordering::SeqCst) {
            return TextureId::INVALID;
        }

        let texture_id = TextureId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.textures.lock().insert(
            texture_id,
            RegisteredTexture {
                provider,
                frames_available: 0,
            },
        );
        debug!("Headless texture {texture_id} registered");
        texture_id
    }

    fn unregister_texture(&self, texture_id: TextureId) {
        self.unregister_count.fetch_add(1, Ordering::SeqCst);
        self.textures.lock().remove(&texture_id);
    }

    fn mark_texture_frame_available(&self, texture_id: TextureId) {
        self.total_marks.fetch_add(1, Ordering::SeqCst);
        if let Some(texture) = self.textures.lock().get_mut(&texture_id) {
            texture.frames_available += 1;
        }
    }
}
