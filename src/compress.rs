use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::color::Color;
use crate::error::{CanvasError, CanvasResult};

/// Bytes per packed pixel in the flattened byte view.
pub const BYTES_PER_PIXEL: usize = 4;
const RLE_RECORD: usize = 8;

/// Flatten pixels into their `[r, g, b, a]` byte view.
pub fn pixels_to_bytes(pixels: &[Color]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(pixels.len() * BYTES_PER_PIXEL);
    for p in pixels {
        bytes.extend_from_slice(&p.to_array());
    }
    bytes
}

/// Inverse of `pixels_to_bytes`. The length must be a multiple of 4.
pub fn bytes_to_pixels(bytes: &[u8]) -> CanvasResult<Vec<Color>> {
    if bytes.len() % BYTES_PER_PIXEL != 0 {
        return Err(CanvasError::Decompress(format!(
            "{} bytes is not a whole number of pixels",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(BYTES_PER_PIXEL)
        .map(|c| Color::from_array([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// zlib-compress the byte view of a pixel buffer.
pub fn zlib_compress(pixels: &[Color]) -> CanvasResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&pixels_to_bytes(pixels))?;
    Ok(encoder.finish()?)
}

/// Decompress a zlib stream produced by `zlib_compress`. The stream does not
/// record its own size, so the caller supplies the expected byte length.
pub fn zlib_decompress(data: &[u8], expected_len: usize) -> CanvasResult<Vec<Color>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut output = Vec::with_capacity(expected_len);
    decoder
        .read_to_end(&mut output)
        .map_err(|e| CanvasError::Decompress(e.to_string()))?;
    if output.len() != expected_len {
        return Err(CanvasError::Decompress(format!(
            "expected {} bytes, got {}",
            expected_len,
            output.len()
        )));
    }
    bytes_to_pixels(&output)
}

/// Run-length encode packed colors as `(run: u32 LE, color: u32 LE)` records.
pub fn rle_compress(pixels: &[Color]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut iter = pixels.iter().copied();
    let Some(mut current) = iter.next() else {
        return out;
    };
    let mut run: u32 = 1;
    for p in iter {
        if p == current && run < u32::MAX {
            run += 1;
        } else {
            push_run(&mut out, run, current);
            current = p;
            run = 1;
        }
    }
    push_run(&mut out, run, current);
    out
}

fn push_run(out: &mut Vec<u8>, run: u32, color: Color) {
    out.extend_from_slice(&run.to_le_bytes());
    out.extend_from_slice(&color.0.to_le_bytes());
}

/// Decode `rle_compress` output. When `expected_len` is given the pixel count
/// must match it exactly.
pub fn rle_decompress(data: &[u8], expected_len: Option<usize>) -> CanvasResult<Vec<Color>> {
    if data.len() % RLE_RECORD != 0 {
        return Err(CanvasError::Decompress(format!(
            "truncated run record ({} bytes)",
            data.len()
        )));
    }
    let mut pixels = Vec::with_capacity(expected_len.unwrap_or(0));
    for record in data.chunks_exact(RLE_RECORD) {
        let run = u32::from_le_bytes([record[0], record[1], record[2], record[3]]) as usize;
        let color = Color(u32::from_le_bytes([record[4], record[5], record[6], record[7]]));
        if run == 0 {
            return Err(CanvasError::Decompress("zero-length run".to_string()));
        }
        if let Some(limit) = expected_len {
            if pixels.len() + run > limit {
                return Err(CanvasError::Decompress(format!(
                    "runs exceed expected {} pixels",
                    limit
                )));
            }
        }
        pixels.resize(pixels.len() + run, color);
    }
    if let Some(limit) = expected_len {
        if pixels.len() != limit {
            return Err(CanvasError::Decompress(format!(
                "expected {} pixels, got {}",
                limit,
                pixels.len()
            )));
        }
    }
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(len: usize) -> Vec<Color> {
        // xorshift, deterministic
        let mut state: u32 = 0x9E37_79B9;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                Color(state)
            })
            .collect()
    }

    #[test]
    fn test_zlib_round_trip() {
        for pixels in [vec![], vec![Color::WHITE; 4096], noise(1000)] {
            let packed = zlib_compress(&pixels).unwrap();
            let restored = zlib_decompress(&packed, pixels.len() * BYTES_PER_PIXEL).unwrap();
            assert_eq!(restored, pixels);
        }
    }

    #[test]
    fn test_zlib_empty_buffer_is_a_full_stream() {
        let packed = zlib_compress(&[]).unwrap();
        // CMF byte: deflate method, then the adler32 trailer
        assert_eq!(packed[0] & 0x0f, 8);
        assert!(packed.len() >= 6);
        assert!(zlib_decompress(&packed, 0).unwrap().is_empty());
    }

    #[test]
    fn test_zlib_length_mismatch() {
        let pixels = vec![Color::BLACK; 16];
        let packed = zlib_compress(&pixels).unwrap();
        assert!(zlib_decompress(&packed, 60).is_err());
        assert!(zlib_decompress(b"not zlib at all", 64).is_err());
    }

    #[test]
    fn test_rle_round_trip() {
        let mut mixed = vec![Color::TRANSPARENT; 300];
        mixed.extend(noise(50));
        mixed.extend(vec![Color::BLACK; 7]);
        for pixels in [vec![], vec![Color::TRANSPARENT; 10_000], noise(500), mixed] {
            let packed = rle_compress(&pixels);
            assert_eq!(rle_decompress(&packed, Some(pixels.len())).unwrap(), pixels);
            assert_eq!(rle_decompress(&packed, None).unwrap(), pixels);
        }
    }

    #[test]
    fn test_rle_compacts_uniform_runs() {
        let packed = rle_compress(&vec![Color::TRANSPARENT; 10_000]);
        assert_eq!(packed.len(), RLE_RECORD);
    }

    #[test]
    fn test_rle_rejects_corrupt_input() {
        let packed = rle_compress(&[Color::BLACK, Color::WHITE]);
        assert!(rle_decompress(&packed[..5], None).is_err());
        assert!(rle_decompress(&packed, Some(3)).is_err());
        assert!(rle_decompress(&packed, Some(1)).is_err());
        let zero_run = [0u8; RLE_RECORD];
        assert!(rle_decompress(&zero_run, None).is_err());
    }

    #[test]
    fn test_byte_view_channel_order() {
        let bytes = pixels_to_bytes(&[Color::rgba(1, 2, 3, 4)]);
        assert_eq!(bytes, vec![1, 2, 3, 4]);
        assert!(bytes_to_pixels(&[1, 2, 3]).is_err());
    }
}
