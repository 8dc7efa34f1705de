//! Binding between one renderer surface and one host texture slot.
//!
//! A [`TextureBridge`] locks a surface, registers a pull-based texture for it and subscribes to the
//! surface's "buffer available" notification. From then on two independent threads call into it:
//! the renderer signals new frames through the availability callback, and the display system
//! pulls pixels whenever it paints.
//!
//! Both callbacks hold only a [`Weak`] reference to the bridge and check its state on every call,
//! so a bridge that is being disposed, or already gone, turns them into no-ops.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use log::{debug, info, trace, warn};
use parking_lot::Mutex;

use crate::core::error::BridgeError;
use crate::core::surface::{PixelSnapshot, SurfaceBufferSource, SurfaceHandle, SurfaceLock};
use crate::core::texture_registrar::{PixelBufferProvider, TextureId, TextureRegistrar};

/// Lifecycle state of a [`TextureBridge`].
///
/// Creation walks `Uninitialized -> Locking -> Registered -> Live`. A failure while locking or
/// registering tears the bridge down without ever reaching `Live`. Only a `Live` bridge forwards
/// notifications and serves pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BridgeState {
    /// Nothing acquired yet.
    Uninitialized = 0,
    /// Acquiring the surface lock.
    Locking = 1,
    /// Lock held and texture registered, not yet subscribed.
    Registered = 2,
    /// Fully bound.
    Live = 3,
    /// Teardown in progress.
    Disposing = 4,
    /// Terminal state.
    Disposed = 5,
}

impl BridgeState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => BridgeState::Uninitialized,
            1 => BridgeState::Locking,
            2 => BridgeState::Registered,
            3 => BridgeState::Live,
            4 => BridgeState::Disposing,
            _ => BridgeState::Disposed,
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, BridgeState::Disposing | BridgeState::Disposed)
    }
}

/// State shared between the bridge owner and its weakly-bound callbacks.
struct BridgeShared {
    surface: SurfaceHandle,
    state: AtomicU8,
    texture_id: AtomicI64,
    subscribed: AtomicBool,
    surface_lock: Mutex<Option<SurfaceLock>>,
    source: Arc<dyn SurfaceBufferSource>,
    registrar: Arc<dyn TextureRegistrar>,
}

impl BridgeShared {
    fn state(&self) -> BridgeState {
        BridgeState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: BridgeState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn texture_id(&self) -> TextureId {
        TextureId::new(self.texture_id.load(Ordering::Acquire))
    }

    fn on_surface_buffer_ready(&self) {
        if self.state() != BridgeState::Live {
            trace!(
                "Surface {} signalled a frame while bridge is {:?}, ignoring",
                self.surface,
                self.state()
            );
            return;
        }

        let texture_id = self.texture_id();
        trace!("Surface {} frame ready, marking texture {texture_id}", self.surface);
        self.registrar.mark_texture_frame_available(texture_id);
    }

    fn on_pixel_pull_requested(&self) -> Option<PixelSnapshot> {
        if self.state() != BridgeState::Live {
            return None;
        }

        // The surface lock held by this bridge is what keeps the buffer consistent; reading does
        // not take any bridge-side mutex.
        let snapshot = PixelSnapshot::from_buffer(self.source.surface_buffer(self.surface));
        if snapshot.is_none() {
            trace!("Surface {} has no frame yet", self.surface);
        }

        snapshot
    }

    /// Single idempotent teardown shared by [`TextureBridge::dispose`] and `Drop`.
    fn teardown(&self) {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if BridgeState::from_u8(current).is_terminal() {
                return;
            }

            match self.state.compare_exchange(
                current,
                BridgeState::Disposing as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        if self.subscribed.swap(false, Ordering::AcqRel) {
            self.source
                .set_buffer_available_callback(self.surface, None);
        }

        let texture_id = self.texture_id();
        if texture_id.is_valid() {
            self.registrar.unregister_texture(texture_id);
        }

        let lock = self.surface_lock.lock().take();
        drop(lock);

        self.set_state(BridgeState::Disposed);
        debug!(
            "Bridge for surface {} (texture {texture_id}) disposed",
            self.surface
        );
    }
}

/// Pull callback handed to the display system.
struct BridgePixelProvider {
    bridge: Weak<BridgeShared>,
}

impl PixelBufferProvider for BridgePixelProvider {
    fn copy_pixel_buffer(&self) -> Option<PixelSnapshot> {
        self.bridge.upgrade()?.on_pixel_pull_requested()
    }
}

/// Exclusive binding of a renderer surface to a host texture.
///
/// Dropping the bridge disposes it.
pub struct TextureBridge {
    shared: Arc<BridgeShared>,
}

impl TextureBridge {
    /// Locks `surface`, registers a texture for it and subscribes to its frame notifications.
    ///
    /// On failure everything acquired so far is released and nothing else is changed.
    pub fn create(
        surface: SurfaceHandle,
        source: Arc<dyn SurfaceBufferSource>,
        registrar: Arc<dyn TextureRegistrar>,
    ) -> Result<Self, BridgeError> {
        let bridge = TextureBridge {
            shared: Arc::new(BridgeShared {
                surface,
                state: AtomicU8::new(BridgeState::Uninitialized as u8),
                texture_id: AtomicI64::new(TextureId::INVALID.get()),
                subscribed: AtomicBool::new(false),
                surface_lock: Mutex::new(None),
                source,
                registrar,
            }),
        };
        let shared = &bridge.shared;

        shared.set_state(BridgeState::Locking);
        let lock = shared.source.lock(surface).map_err(|source| {
            warn!("Couldn't lock surface {surface}: {source}");
            BridgeError::SurfaceLockFailed { surface, source }
        })?;
        *shared.surface_lock.lock() = Some(lock);

        let provider = Arc::new(BridgePixelProvider {
            bridge: Arc::downgrade(shared),
        });
        let texture_id = shared.registrar.register_texture(provider);
        if !texture_id.is_valid() {
            warn!("Couldn't register texture for surface {surface}");
            return Err(BridgeError::TextureRegistrationFailed(surface));
        }
        shared.texture_id.store(texture_id.get(), Ordering::Release);
        shared.set_state(BridgeState::Registered);

        // Live before subscribing, so a frame signalled while subscribing is not dropped.
        shared.set_state(BridgeState::Live);
        let weak = Arc::downgrade(shared);
        shared.source.set_buffer_available_callback(
            surface,
            Some(Arc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.on_surface_buffer_ready();
                }
            })),
        );
        shared.subscribed.store(true, Ordering::Release);

        info!("Bound surface {surface} to texture {texture_id}");
        Ok(bridge)
    }

    /// Surface bound by this bridge.
    pub fn surface(&self) -> SurfaceHandle {
        self.shared.surface
    }

    /// Texture id assigned by the display system.
    pub fn texture_id(&self) -> TextureId {
        self.shared.texture_id()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BridgeState {
        self.shared.state()
    }

    /// Whether the bridge is fully bound.
    pub fn is_live(&self) -> bool {
        self.state() == BridgeState::Live
    }

    /// Forwards a "frame ready" signal from the surface to the display system.
    ///
    /// A no-op unless the bridge is live.
    pub fn on_surface_buffer_ready(&self) {
        self.shared.on_surface_buffer_ready();
    }

    /// Reads the current frame for the display system, or `None` if there is nothing to paint.
    pub fn on_pixel_pull_requested(&self) -> Option<PixelSnapshot> {
        self.shared.on_pixel_pull_requested()
    }

    /// Disposes the bridge without unregistering its texture id.
    ///
    /// Used when the display system assigned an id that another live bridge still owns, so that
    /// tearing this bridge down doesn't remove the other bridge's texture.
    pub(crate) fn dispose_without_unregistering(&self) {
        self.shared
            .texture_id
            .store(TextureId::INVALID.get(), Ordering::Release);
        self.shared.teardown();
    }

    /// Unsubscribes from the surface, unregisters the texture and releases the surface lock.
    ///
    /// Safe to call any number of times and concurrently with in-flight callbacks, which never
    /// block disposal.
    pub fn dispose(&self) {
        self.shared.teardown();
    }
}

impl Drop for TextureBridge {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}

impl std::fmt::Debug for TextureBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureBridge")
            .field("surface", &self.surface())
            .field("texture_id", &self.texture_id())
            .field("state", &self.state())
            .finish()
    }
}
