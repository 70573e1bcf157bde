use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Branding logo, decoded far enough to embed as a PDF image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logo {
    pub data: LogoData,
    pub width: u32,
    pub height: u32,
    /// Color components per pixel, excluding alpha.
    pub components: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoData {
    /// Baseline JPEG stream, embedded as-is.
    Jpeg(Vec<u8>),
    /// zlib-compressed 8-bit samples, with a compressed soft mask when the image has alpha.
    Flate {
        samples: Vec<u8>,
        alpha: Option<Vec<u8>>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("logo {path} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("logo {path} has unsupported type {mime}; only JPEG and PNG logos are embedded")]
    Unsupported { path: PathBuf, mime: String },
    #[error("logo {path} could not be decoded: {reason}")]
    Malformed { path: PathBuf, reason: &'static str },
}

pub fn load_logo(path: &Path) -> Result<Logo, ResourceError> {
    let guessed = mime_guess::from_path(path).first_or_octet_stream();
    let is_png = if guessed == mime::IMAGE_PNG {
        true
    } else if guessed == mime::IMAGE_JPEG {
        false
    } else {
        return Err(ResourceError::Unsupported {
            path: path.to_path_buf(),
            mime: guessed.essence_str().to_string(),
        });
    };

    let bytes = std::fs::read(path).map_err(|source| ResourceError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let decoded = if is_png {
        decode_png(&bytes)
    } else {
        decode_jpeg(bytes)
    };
    decoded.map_err(|reason| ResourceError::Malformed {
        path: path.to_path_buf(),
        reason,
    })
}

/// Loads the branding logo when configured; any failure is logged and the logo omitted.
pub fn optional_logo(path: Option<&Path>) -> Option<Logo> {
    let path = path?;
    match load_logo(path) {
        Ok(logo) => Some(logo),
        Err(err) => {
            warn!(error = %err, "omitting report logo");
            None
        }
    }
}

fn decode_jpeg(bytes: Vec<u8>) -> Result<Logo, &'static str> {
    let (width, height, components) =
        jpeg_dimensions(&bytes).ok_or("no JPEG start-of-frame segment")?;
    Ok(Logo {
        data: LogoData::Jpeg(bytes),
        width,
        height,
        components,
    })
}

/// Reads width, height, and component count from the first start-of-frame segment.
fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32, u8)> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut offset = 2;
    loop {
        if *bytes.get(offset)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(offset + 1)?;
        if marker == 0xFF {
            offset += 1;
            continue;
        }
        let length = usize::from(u16::from_be_bytes([
            *bytes.get(offset + 2)?,
            *bytes.get(offset + 3)?,
        ]));
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let segment = bytes.get(offset + 4..offset + 2 + length)?;
            let height = u16::from_be_bytes([*segment.get(1)?, *segment.get(2)?]);
            let width = u16::from_be_bytes([*segment.get(3)?, *segment.get(4)?]);
            let components = *segment.get(5)?;
            return Some((u32::from(width), u32::from(height), components));
        }
        if marker == 0xD9 || marker == 0xDA {
            return None;
        }
        offset += 2 + length;
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const TRUNCATED: &str = "truncated PNG chunk";

struct PngHeader {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    interlace: u8,
}

/// Decodes 8-bit, non-interlaced gray or RGB PNGs (with or without alpha) and re-compresses the
/// color samples and the alpha channel separately.
fn decode_png(bytes: &[u8]) -> Result<Logo, &'static str> {
    let mut rest = bytes
        .strip_prefix(&PNG_SIGNATURE)
        .ok_or("missing PNG signature")?;
    let mut header = None;
    let mut compressed = Vec::new();
    loop {
        let (kind, data, tail) = next_chunk(rest)?;
        rest = tail;
        match &kind {
            b"IHDR" => header = Some(parse_png_header(data).ok_or("invalid PNG header")?),
            b"IDAT" => compressed.extend_from_slice(data),
            b"IEND" => break,
            _ => {}
        }
    }

    let header = header.ok_or("PNG header missing")?;
    if header.bit_depth != 8 {
        return Err("only 8-bit PNG logos are supported");
    }
    if header.interlace != 0 {
        return Err("interlaced PNG logos are not supported");
    }
    let (components, has_alpha) = match header.color_type {
        0 => (1, false),
        2 => (3, false),
        4 => (1, true),
        6 => (3, true),
        _ => return Err("palette PNG logos are not supported"),
    };
    let channels = components + usize::from(has_alpha);
    let width = usize::try_from(header.width).map_err(|_| "PNG logo too large")?;
    let height = usize::try_from(header.height).map_err(|_| "PNG logo too large")?;
    let stride = width.checked_mul(channels).ok_or("PNG logo too large")?;

    let mut raw = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(|_| "corrupt PNG image data")?;
    let pixels = unfilter(&raw, stride, channels, height).ok_or("corrupt PNG scanlines")?;

    let (samples, alpha) = if has_alpha {
        let mut color = Vec::with_capacity(width * height * components);
        let mut alpha = Vec::with_capacity(width * height);
        for pixel in pixels.chunks_exact(channels) {
            color.extend_from_slice(&pixel[..components]);
            alpha.push(pixel[components]);
        }
        (color, Some(alpha))
    } else {
        (pixels, None)
    };

    Ok(Logo {
        data: LogoData::Flate {
            samples: deflate(&samples)?,
            alpha: alpha.as_deref().map(deflate).transpose()?,
        },
        width: header.width,
        height: header.height,
        components: components as u8,
    })
}

fn be_u32(bytes: &[u8]) -> Option<u32> {
    bytes.get(..4)?.try_into().ok().map(u32::from_be_bytes)
}

/// Splits off one chunk, returning its type, its payload, and the remaining bytes.
fn next_chunk(bytes: &[u8]) -> Result<([u8; 4], &[u8], &[u8]), &'static str> {
    let length = be_u32(bytes).ok_or(TRUNCATED)?;
    let length = usize::try_from(length).map_err(|_| TRUNCATED)?;
    let kind: [u8; 4] = bytes
        .get(4..8)
        .and_then(|kind| kind.try_into().ok())
        .ok_or(TRUNCATED)?;
    let data_end = length.checked_add(8).ok_or(TRUNCATED)?;
    let data = bytes.get(8..data_end).ok_or(TRUNCATED)?;
    let expected = bytes
        .get(data_end..)
        .and_then(be_u32)
        .ok_or(TRUNCATED)?;

    let mut crc = Crc::new();
    crc.update(&kind);
    crc.update(data);
    if crc.sum() != expected {
        return Err("PNG chunk checksum mismatch");
    }
    Ok((kind, data, &bytes[data_end + 4..]))
}

fn parse_png_header(data: &[u8]) -> Option<PngHeader> {
    if data.len() != 13 {
        return None;
    }
    Some(PngHeader {
        width: be_u32(data)?,
        height: be_u32(&data[4..])?,
        bit_depth: data[8],
        color_type: data[9],
        interlace: data[12],
    })
}

/// Reverses the per-scanline PNG filters; `bpp` is bytes per pixel.
fn unfilter(raw: &[u8], stride: usize, bpp: usize, height: usize) -> Option<Vec<u8>> {
    if raw.len() != height.checked_mul(stride + 1)? {
        return None;
    }
    let mut out = vec![0u8; stride * height];
    for (row, line) in raw.chunks_exact(stride + 1).enumerate() {
        let (filter, source) = (line[0], &line[1..]);
        let (done, rest) = out.split_at_mut(row * stride);
        let prior = row.checked_sub(1).map(|previous| &done[previous * stride..]);
        let current = &mut rest[..stride];

        for i in 0..stride {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up = prior.map_or(0, |prior| prior[i]);
            let up_left = match prior {
                Some(prior) if i >= bpp => prior[i - bpp],
                _ => 0,
            };
            let predicted = match filter {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                _ => return None,
            };
            current[i] = source[i].wrapping_add(predicted);
        }
    }
    Some(out)
}

fn paeth(left: u8, up: u8, up_left: u8) -> u8 {
    let estimate = i16::from(left) + i16::from(up) - i16::from(up_left);
    let to_left = (estimate - i16::from(left)).abs();
    let to_up = (estimate - i16::from(up)).abs();
    let to_up_left = (estimate - i16::from(up_left)).abs();
    if to_left <= to_up && to_left <= to_up_left {
        left
    } else if to_up <= to_up_left {
        up
    } else {
        up_left
    }
}

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, &'static str> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .and_then(|()| encoder.finish())
        .map_err(|_| "failed to compress logo samples")
}

#[cfg(test)]
pub(crate) fn tiny_jpeg_header() -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0 (truncated payload)
        0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x20, 0x00, 0x40, 0x03, 0x01, 0x11, 0x00, // SOF0
        0xFF, 0xD9, // EOI
    ]
}

/// Builds a PNG from filtered scanlines (each prefixed with its filter byte).
#[cfg(test)]
pub(crate) fn encode_test_png(width: u32, height: u32, color_type: u8, scanlines: &[u8]) -> Vec<u8> {
    fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let mut crc = Crc::new();
        crc.update(kind);
        crc.update(data);
        out.extend_from_slice(&crc.sum().to_be_bytes());
    }

    let mut header = Vec::new();
    header.extend_from_slice(&width.to_be_bytes());
    header.extend_from_slice(&height.to_be_bytes());
    header.extend_from_slice(&[8, color_type, 0, 0, 0]);

    let mut out = PNG_SIGNATURE.to_vec();
    chunk(&mut out, b"IHDR", &header);
    chunk(&mut out, b"IDAT", &deflate(scanlines).expect("compress scanlines"));
    chunk(&mut out, b"IEND", &[]);
    out
}
