use std::collections::HashMap;
use std::sync::Arc;

use irondash_texture::{BoxedPixelData, PayloadProvider, SendableTexture, SimplePixelData, Texture};
use log::{debug, error};
use parking_lot::Mutex;

use crate::core::surface::PixelSnapshot;
use crate::core::texture_registrar::{PixelBufferProvider, TextureId, TextureRegistrar};

/// Texture pixel provider that implements irondash's PayloadProvider
struct PixelTextureProvider {
    provider: Arc<dyn PixelBufferProvider>,
}

impl PayloadProvider<BoxedPixelData> for PixelTextureProvider {
    fn get_payload(&self) -> BoxedPixelData {
        match self.provider.copy_pixel_buffer().and_then(payload_parts) {
            Some((width, height, pixels)) => SimplePixelData::new_boxed(width, height, pixels),
            // irondash always expects a payload; an empty one paints nothing
            None => SimplePixelData::new_boxed(0, 0, Vec::new()),
        }
    }
}

/// Dimensions and pixels in irondash's form, or `None` if they don't fit an `i32`.
fn payload_parts(snapshot: PixelSnapshot) -> Option<(i32, i32, Vec<u8>)> {
    let width = i32::try_from(snapshot.width()).ok()?;
    let height = i32::try_from(snapshot.height()).ok()?;
    Some((width, height, snapshot.pixels().to_vec()))
}

type SharedSendablePixelTexture = Arc<SendableTexture<BoxedPixelData>>;

/// Registers bridge textures with a Flutter engine.
///
/// [`TextureRegistrar::register_texture`] must be called on the platform thread, which is where
/// method calls are delivered. Marking frames and unregistering may happen from any thread: the
/// textures are kept in their sendable form, which hops to the platform thread on its own.
pub struct FlutterTextureRegistrar {
    engine_handle: i64,
    textures: Mutex<HashMap<TextureId, SharedSendablePixelTexture>>,
}

impl FlutterTextureRegistrar {
    /// Creates a registrar for the engine identified by `engine_handle`.
    pub fn new(engine_handle: i64) -> Self {
        Self {
            engine_handle,
            textures: Mutex::new(HashMap::new()),
        }
    }
}

impl TextureRegistrar for FlutterTextureRegistrar {
    fn register_texture(&self, provider: Arc<dyn PixelBufferProvider>) -> TextureId {
        let payload_provider = Arc::new(PixelTextureProvider { provider });
        match Texture::new_with_provider(self.engine_handle, payload_provider) {
            Ok(texture) => {
                let texture_id = TextureId::new(texture.id());
                self.textures
                    .lock()
                    .insert(texture_id, texture.into_sendable_texture());
                debug!("Flutter texture {texture_id} created on engine {}", self.engine_handle);
                texture_id
            }
            Err(err) => {
                error!("Failed to create Flutter texture: {err:?}");
                TextureId::INVALID
            }
        }
    }

    fn unregister_texture(&self, texture_id: TextureId) {
        // dropping the sendable texture releases the engine texture on the platform thread
        let texture = self.textures.lock().remove(&texture_id);
        drop(texture);
    }

    fn mark_texture_frame_available(&self, texture_id: TextureId) {
        let texture = self.textures.lock().get(&texture_id).cloned();
        if let Some(texture) = texture {
            texture.mark_frame_available();
        }
    }
}
