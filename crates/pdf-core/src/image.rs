//! Image handling for PDF documents
//!
//! Overlay bitmaps arrive as PNG (signatures and rendered text, usually with a
//! transparent background) or JPEG (photos). JPEG data is embedded as-is with
//! `DCTDecode`; PNG data is decoded and re-compressed with `FlateDecode`, and
//! its alpha channel becomes a soft mask so the page shows through.

use crate::{PdfError, Result};
use image::{DynamicImage, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(PdfError::ImageError("Image data too short".to_string()));
    }

    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return Ok(ImageFormat::Jpeg);
    }

    if data[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return Ok(ImageFormat::Png);
    }

    Err(PdfError::ImageError("Unknown image format".to_string()))
}

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Get image dimensions without fully decoding
///
/// Used by callers that size an overlay from its natural bitmap size.
pub fn get_dimensions(data: &[u8]) -> Result<ImageDimensions> {
    match detect_format(data)? {
        ImageFormat::Jpeg => {
            let info = read_jpeg_header(data)?;
            Ok(ImageDimensions {
                width: info.width,
                height: info.height,
            })
        }
        ImageFormat::Png => read_png_header(data),
    }
}

/// PDF color space of an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
    DeviceCmyk,
}

impl ColorSpace {
    fn name(self) -> &'static [u8] {
        match self {
            ColorSpace::DeviceGray => b"DeviceGray",
            ColorSpace::DeviceRgb => b"DeviceRGB",
            ColorSpace::DeviceCmyk => b"DeviceCMYK",
        }
    }
}

/// Stream filter of an embedded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// JPEG passthrough
    Dct,
    /// zlib-compressed raw samples
    Flate,
}

impl ImageFilter {
    fn name(self) -> &'static [u8] {
        match self {
            ImageFilter::Dct => b"DCTDecode",
            ImageFilter::Flate => b"FlateDecode",
        }
    }
}

/// Header fields read from a JPEG SOF segment
#[derive(Debug, Clone, Copy)]
struct JpegHeader {
    width: u32,
    height: u32,
    components: u8,
}

/// Scan JPEG markers for the first start-of-frame segment
///
/// SOF layout after the marker: length (2), precision (1), height (2),
/// width (2), component count (1).
fn read_jpeg_header(data: &[u8]) -> Result<JpegHeader> {
    let mut i = 2;
    while i + 10 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // C4 (DHT), C8 (JPG) and CC (DAC) share the range but are not frames
        if (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            return Ok(JpegHeader {
                height: u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32,
                width: u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32,
                components: data[i + 9],
            });
        }

        let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
        if length < 2 {
            break;
        }
        i += 2 + length;
    }

    Err(PdfError::ImageError("Could not parse JPEG header".to_string()))
}

/// Read width and height from the PNG IHDR chunk
fn read_png_header(data: &[u8]) -> Result<ImageDimensions> {
    if data.len() < 24 {
        return Err(PdfError::ImageError("PNG data too short".to_string()));
    }

    if &data[12..16] != b"IHDR" {
        return Err(PdfError::ImageError(
            "Invalid PNG: IHDR not found".to_string(),
        ));
    }

    Ok(ImageDimensions {
        width: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
        height: u32::from_be_bytes([data[20], data[21], data[22], data[23]]),
    })
}

fn zlib_compress(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder =
        flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

/// Image XObject ready for embedding
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub filter: ImageFilter,
    /// Encoded sample data (JPEG bytes or zlib-compressed samples)
    pub data: Vec<u8>,
    /// zlib-compressed 8-bit alpha samples, present only for translucent PNGs
    pub alpha: Option<Vec<u8>>,
}

impl ImageXObject {
    /// Create an XObject from JPEG or PNG bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match detect_format(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// Create XObject from JPEG data
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let header = read_jpeg_header(data)?;

        let color_space = match header.components {
            1 => ColorSpace::DeviceGray,
            4 => ColorSpace::DeviceCmyk,
            _ => ColorSpace::DeviceRgb,
        };

        Ok(Self {
            width: header.width,
            height: header.height,
            color_space,
            filter: ImageFilter::Dct,
            data: data.to_vec(),
            alpha: None,
        })
    }

    /// Create XObject from PNG data
    ///
    /// The alpha channel is kept only if some pixel is not fully opaque.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        let (samples, alpha, color_space) = if color_type.has_color() {
            if color_type.has_alpha() {
                let rgba = image.to_rgba8();
                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                let mut alpha = Vec::with_capacity((width * height) as usize);
                for pixel in rgba.pixels() {
                    rgb.extend_from_slice(&pixel.0[..3]);
                    alpha.push(pixel.0[3]);
                }
                (rgb, Some(alpha), ColorSpace::DeviceRgb)
            } else {
                (image.to_rgb8().into_raw(), None, ColorSpace::DeviceRgb)
            }
        } else if color_type.has_alpha() {
            let la = image.to_luma_alpha8();
            let mut gray = Vec::with_capacity((width * height) as usize);
            let mut alpha = Vec::with_capacity((width * height) as usize);
            for pixel in la.pixels() {
                gray.push(pixel.0[0]);
                alpha.push(pixel.0[1]);
            }
            (gray, Some(alpha), ColorSpace::DeviceGray)
        } else {
            (image.to_luma8().into_raw(), None, ColorSpace::DeviceGray)
        };

        let alpha = match alpha {
            Some(alpha) if alpha.iter().any(|&a| a != u8::MAX) => Some(zlib_compress(&alpha)?),
            _ => None,
        };

        Ok(Self {
            width,
            height,
            color_space,
            filter: ImageFilter::Flate,
            data: zlib_compress(&samples)?,
            alpha,
        })
    }

    fn base_dictionary(&self, color_space: ColorSpace, filter: ImageFilter) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", self.width as i64);
        dict.set("Height", self.height as i64);
        dict.set("ColorSpace", Object::Name(color_space.name().to_vec()));
        dict.set("BitsPerComponent", 8);
        dict.set("Filter", Object::Name(filter.name().to_vec()));
        dict
    }

    /// Build the soft mask stream, if this image has one
    pub fn soft_mask_stream(&self) -> Option<Stream> {
        let alpha = self.alpha.as_ref()?;
        let dict = self.base_dictionary(ColorSpace::DeviceGray, ImageFilter::Flate);
        Some(Stream::new(dict, alpha.clone()))
    }

    /// Convert to lopdf Stream object
    ///
    /// `soft_mask` is the object reference of the stream returned by
    /// [`ImageXObject::soft_mask_stream`], once it has been added to the document.
    pub fn to_pdf_stream(&self, soft_mask: Option<lopdf::ObjectId>) -> Stream {
        let mut dict = self.base_dictionary(self.color_space, self.filter);
        if let Some(mask_id) = soft_mask {
            dict.set("SMask", Object::Reference(mask_id));
        }
        // CMYK JPEGs written by Adobe tools store inverted samples
        if self.color_space == ColorSpace::DeviceCmyk && self.filter == ImageFilter::Dct {
            dict.set(
                "Decode",
                Object::Array(
                    [1, 0, 1, 0, 1, 0, 1, 0]
                        .into_iter()
                        .map(Object::Integer)
                        .collect(),
                ),
            );
        }
        Stream::new(dict, self.data.clone())
    }
}

/// Generate operators to draw image at position
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x`, `y` - Lower-left corner in PDF coordinates
/// * `width`, `height` - Display size in points
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}
