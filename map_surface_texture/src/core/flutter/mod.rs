//! Flutter texture registrar backed by irondash pixel-buffer textures.

pub mod pixel_texture;

pub use pixel_texture::FlutterTextureRegistrar;
