use crate::{Error, Result};
use base64::Engine as _;
use image::ImageFormat;

/// A validated image, base64-encoded for inlining into a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime_type: &'static str,
    pub data: String,
}

impl EncodedImage {
    /// `data:` URL form used by OpenAI `image_url` parts.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Sniff the image format from its magic bytes.
pub fn detect_image_format(bytes: &[u8]) -> Result<ImageFormat> {
    if bytes.is_empty() {
        return Err(Error::BadRequest("Invalid image file".to_string()));
    }

    image::guess_format(bytes).map_err(|e| {
        tracing::warn!(
            "Unrecognized image format (first 4 bytes: {:02X?}): {}",
            &bytes[..bytes.len().min(4)],
            e
        );
        Error::BadRequest("Invalid image file".to_string())
    })
}

/// Check the upload is a decodable image and base64-encode it.
pub fn encode_image(bytes: &[u8]) -> Result<EncodedImage> {
    let format = detect_image_format(bytes)?;

    image::load_from_memory_with_format(bytes, format).map_err(|e| {
        tracing::warn!("Failed to decode {:?} upload: {}", format, e);
        Error::BadRequest("Invalid image file".to_string())
    })?;

    Ok(EncodedImage {
        mime_type: format.to_mime_type(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// [`encode_image`] on the blocking pool; decoding is CPU-bound.
pub async fn encode_image_blocking(bytes: Vec<u8>) -> Result<EncodedImage> {
    tokio::task::spawn_blocking(move || encode_image(&bytes))
        .await
        .map_err(|e| Error::Invariant(format!("Image validation task join error: {}", e)))?
}

#[cfg(test)]
pub(crate) mod test_images {
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    /// A tiny solid-green image in the given format.
    pub fn leaf(format: ImageFormat) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(4, 4, Rgb([34u8, 139, 34]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format)
            .expect("encode test image");
        bytes
    }
}
