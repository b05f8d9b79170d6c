use crate::error::{Error, Result};
use base64::Engine;
use image::GenericImageView;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;

/// Embed-ready raster. JPEG payloads stay as-is and decode in the viewer
/// (DCTDecode); everything else is re-encoded as zlib RGB8 with the alpha
/// plane split into an SMask.
pub(crate) struct ImageData {
    pub width: u32,
    pub height: u32,
    pub color_space: &'static str,
    pub bits_per_component: u8,
    pub filter: &'static str,
    pub data: Vec<u8>,
    pub alpha: Option<AlphaData>,
}

pub(crate) struct AlphaData {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u8,
    pub filter: &'static str,
    pub data: Vec<u8>,
}

/// Decodes a caller-supplied payload: a `data:` URI or a bare base64 string.
/// The builder runs synchronously, so anything that needs I/O to resolve must
/// already have been turned into one of these by the caller.
pub(crate) fn decode_image_source(source: &str) -> Result<ImageData> {
    if let Some((mime, data)) = parse_data_uri(source) {
        return decode_image_bytes(&data, Some(&mime));
    }
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(Error::Image("empty image payload".to_string()));
    }
    let data = base64::engine::general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|_| Error::Image("payload is neither a data URI nor base64".to_string()))?;
    decode_image_bytes(&data, None)
}

pub(crate) fn decode_image_bytes(data: &[u8], mime: Option<&str>) -> Result<ImageData> {
    let format = if let Some(mime) = mime {
        if mime.contains("png") {
            Some(image::ImageFormat::Png)
        } else if mime.contains("jpeg") || mime.contains("jpg") {
            Some(image::ImageFormat::Jpeg)
        } else {
            None
        }
    } else {
        image::guess_format(data).ok()
    };

    let decoded = image::load_from_memory(data)
        .map_err(|err| Error::Image(format!("undecodable image data: {err}")))?;
    let (width, height) = decoded.dimensions();

    if matches!(format, Some(image::ImageFormat::Jpeg)) {
        let color_space = match decoded.color() {
            image::ColorType::L8 | image::ColorType::La8 => "/DeviceGray",
            _ => "/DeviceRGB",
        };
        return Ok(ImageData {
            width,
            height,
            color_space,
            bits_per_component: 8,
            filter: "/DCTDecode",
            data: data.to_vec(),
            alpha: None,
        });
    }

    let rgba = decoded.to_rgba8();
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    let mut has_alpha = false;
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a != 255 {
            has_alpha = true;
        }
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let compressed = flate_compress(&rgb);
    let alpha = if has_alpha {
        Some(AlphaData {
            width,
            height,
            bits_per_component: 8,
            filter: "/FlateDecode",
            data: flate_compress(&alpha),
        })
    } else {
        None
    };
    Ok(ImageData {
        width,
        height,
        color_space: "/DeviceRGB",
        bits_per_component: 8,
        filter: "/FlateDecode",
        data: compressed,
        alpha,
    })
}

pub(crate) fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    if !uri.starts_with("data:") {
        return None;
    }
    let parts: Vec<&str> = uri.splitn(2, ',').collect();
    if parts.len() != 2 {
        return None;
    }
    let header = parts[0];
    let data_part = parts[1];
    let mime = header
        .trim_start_matches("data:")
        .split(';')
        .next()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains("base64") {
        base64::engine::general_purpose::STANDARD
            .decode(data_part)
            .ok()?
    } else {
        data_part.as_bytes().to_vec()
    };
    Some((mime, data))
}

pub(crate) fn flate_compress(data: &[u8]) -> Vec<u8> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

/// Stable content fingerprint over the encoded planes. Drives resource naming
/// and dedup, and therefore must not depend on hasher seeds or platform.
fn image_fingerprint(image: &ImageData) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.filter.as_bytes());
    hasher.update(image.width.to_le_bytes());
    hasher.update(image.height.to_le_bytes());
    hasher.update(&image.data);
    if let Some(alpha) = &image.alpha {
        hasher.update(&alpha.data);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Interns decoded images in first-use order; identical content shares one
/// resource id.
#[derive(Default)]
pub(crate) struct ImageRegistry {
    entries: Vec<(String, ImageData)>,
    by_fingerprint: HashMap<String, String>,
}

impl ImageRegistry {
    pub fn intern(&mut self, image: ImageData) -> String {
        let fingerprint = image_fingerprint(&image);
        if let Some(id) = self.by_fingerprint.get(&fingerprint) {
            return id.clone();
        }
        let id = format!("img-{fingerprint}");
        self.by_fingerprint.insert(fingerprint, id.clone());
        self.entries.push((id.clone(), image));
        id
    }

    pub fn entries(&self) -> &[(String, ImageData)] {
        &self.entries
    }
}

/// Opaque PNG rendered to a data URI, for tests that need a decodable payload.
#[cfg(test)]
pub(crate) fn test_png_data_uri(width: u32, height: u32) -> String {
    let mut img = image::RgbaImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = image::Rgba([200, 40, 40, 255]);
    }
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .expect("png encode");
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    )
}
