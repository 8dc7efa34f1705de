//! Interface of the renderer-owned pixel surface.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::core::error::BridgeError;

/// Identifier of a renderer-owned surface.
///
/// Handles are supplied by the embedding application and are always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(u64);

impl SurfaceHandle {
    /// Raw value of the handle.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<i64> for SurfaceHandle {
    type Error = BridgeError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        if raw <= 0 {
            return Err(BridgeError::InvalidArgument(format!(
                "incorrect mapSurfaceId {raw}"
            )));
        }

        Ok(Self(raw as u64))
    }
}

impl fmt::Display for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error from a [`SurfaceBufferSource`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// No surface with the given handle exists.
    #[error("surface is unknown")]
    UnknownSurface,

    /// The surface is already held exclusively by someone else.
    #[error("surface is already locked")]
    AlreadyLocked,
}

/// Exclusive ownership token for a surface.
///
/// While the token is alive, its holder may read the surface's buffer and receive its availability
/// notifications. The release action supplied by the surface source runs exactly once, when the
/// token is dropped.
pub struct SurfaceLock {
    surface: SurfaceHandle,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SurfaceLock {
    /// Creates a token for `surface` that runs `release` when dropped.
    pub fn new(surface: SurfaceHandle, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            surface,
            release: Some(Box::new(release)),
        }
    }

    /// Surface this token locks.
    pub fn surface(&self) -> SurfaceHandle {
        self.surface
    }
}

impl Drop for SurfaceLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for SurfaceLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceLock")
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

/// Raw buffer state as reported by the surface.
///
/// A missing `data` or a zero dimension means the renderer has not produced a frame yet.
#[derive(Debug, Clone, Default)]
pub struct SurfaceBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data, if any frame has been rendered.
    pub data: Option<Arc<[u8]>>,
}

impl SurfaceBuffer {
    /// Buffer that reports no frame.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Pixels of one rendered frame handed out for a single paint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSnapshot {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl PixelSnapshot {
    /// Converts a raw buffer into a snapshot, or `None` if the buffer holds no frame.
    pub fn from_buffer(buffer: SurfaceBuffer) -> Option<Self> {
        if buffer.width == 0 || buffer.height == 0 {
            return None;
        }

        let pixels = buffer.data?;
        Some(Self {
            width: buffer.width,
            height: buffer.height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Callback fired by the surface whenever a new frame has finished rendering.
pub type BufferAvailableCallback = Arc<dyn Fn() + Send + Sync>;

/// Renderer-side owner of map surfaces.
///
/// Callbacks may be invoked from the renderer's own thread, concurrently with any other call.
pub trait SurfaceBufferSource: Send + Sync {
    /// Acquires exclusive access to the surface.
    fn lock(&self, surface: SurfaceHandle) -> Result<SurfaceLock, SurfaceError>;

    /// Returns the current contents of the surface's buffer.
    fn surface_buffer(&self, surface: SurfaceHandle) -> SurfaceBuffer;

    /// Sets the single availability callback of the surface. `None` removes it.
    fn set_buffer_available_callback(
        &self,
        surface: SurfaceHandle,
        callback: Option<BufferAvailableCallback>,
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn handle_must_be_positive() {
        assert!(SurfaceHandle::try_from(0).is_err());
        assert!(SurfaceHandle::try_from(-1).is_err());
        assert_eq!(SurfaceHandle::try_from(7).map(SurfaceHandle::get).ok(), Some(7));
    }

    #[test]
    fn lock_releases_once_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let surface = SurfaceHandle::try_from(3).expect("valid handle");

        let lock = SurfaceLock::new(surface, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(lock.surface(), surface);
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(lock);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_buffers_produce_no_snapshot() {
        assert_eq!(PixelSnapshot::from_buffer(SurfaceBuffer::empty()), None);

        let no_data = SurfaceBuffer {
            width: 4,
            height: 4,
            data: None,
        };
        assert_eq!(PixelSnapshot::from_buffer(no_data), None);

        let zero_width = SurfaceBuffer {
            width: 0,
            height: 4,
            data: Some(Arc::from(vec![0u8; 16])),
        };
        assert_eq!(PixelSnapshot::from_buffer(zero_width), None);
    }

    #[test]
    fn snapshot_exposes_frame() {
        let buffer = SurfaceBuffer {
            width: 1,
            height: 2,
            data: Some(Arc::from(vec![1u8, 2, 3, 4, 5, 6, 7, 8])),
        };

        let snapshot = PixelSnapshot::from_buffer(buffer).expect("frame present");
        assert_eq!(snapshot.width(), 1);
        assert_eq!(snapshot.height(), 2);
        assert_eq!(snapshot.pixels(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
