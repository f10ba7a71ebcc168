use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, RgbaImage};

use crate::canvas::Canvas;
use crate::config::EditorConfig;
use crate::error::{CanvasError, CanvasResult};

/// Decode a PNG, JPEG, BMP or TGA file into a single-layer canvas.
pub fn load_image(path: impl AsRef<Path>, config: EditorConfig) -> CanvasResult<Canvas> {
    let path = path.as_ref();
    let img = image::open(path)?.to_rgba8();
    let (width, height) = img.dimensions();
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        log::warn!("Rejecting {}: {}x{} is too large", path.display(), width, height);
        return Err(CanvasError::ImageTooLarge { width, height });
    }
    log::info!("Loaded {} ({}x{})", path.display(), width, height);
    Canvas::from_rgba(width as u16, height as u16, img.as_raw(), config)
}

/// Flatten every shown layer over white and encode by file extension.
/// JPEG has no alpha channel, so it is written as RGB.
pub fn export_flattened(canvas: &Canvas, path: impl AsRef<Path>) -> CanvasResult<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path)?;
    let img: RgbaImage = ImageBuffer::from_raw(
        canvas.width() as u32,
        canvas.height() as u32,
        canvas.flatten_rgba()?,
    )
    .ok_or(CanvasError::DimensionMismatch {
        expected: canvas.width() as usize * canvas.height() as usize * 4,
        actual: 0,
    })?;

    if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgba8(img).to_rgb8().save_with_format(path, format)?;
    } else {
        img.save_with_format(path, format)?;
    }
    log::info!("Exported {}x{} image to {}", canvas.width(), canvas.height(), path.display());
    Ok(())
}

/// Text project format: `width height`, then one line per row of
/// `r g b a` decimals. Only the active layer is written.
pub fn to_native_text(canvas: &Canvas) -> CanvasResult<String> {
    let pixels = canvas.layers().active().pixels()?;
    let width = canvas.width() as usize;
    let mut out = format!("{} {}\n", canvas.width(), canvas.height());
    if width == 0 {
        return Ok(out);
    }
    for row in pixels.chunks(width) {
        let mut line = String::with_capacity(width * 16);
        for (i, p) in row.iter().enumerate() {
            if i > 0 {
                line.push(' ');
            }
            line.push_str(&format!("{} {} {} {}", p.r(), p.g(), p.b(), p.a()));
        }
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

pub fn parse_native(text: &str, config: EditorConfig) -> CanvasResult<Canvas> {
    let mut tokens = text.split_whitespace();
    let mut dimension = |name: &str| -> CanvasResult<u16> {
        let token = tokens
            .next()
            .ok_or_else(|| CanvasError::Project(format!("missing {}", name)))?;
        token
            .parse()
            .map_err(|_| CanvasError::Project(format!("bad {} {:?}", name, token)))
    };
    let width = dimension("width")?;
    let height = dimension("height")?;

    let expected = width as usize * height as usize * 4;
    let mut rgba = Vec::with_capacity(expected);
    for token in tokens {
        let value: u8 = token
            .parse()
            .map_err(|_| CanvasError::Project(format!("bad channel value {:?}", token)))?;
        rgba.push(value);
    }
    if rgba.len() != expected {
        return Err(CanvasError::Project(format!(
            "expected {} channel values for {}x{}, found {}",
            expected,
            width,
            height,
            rgba.len()
        )));
    }
    Canvas::from_rgba(width, height, &rgba, config)
}

pub fn save_native(canvas: &Canvas, path: impl AsRef<Path>) -> CanvasResult<()> {
    let path = path.as_ref();
    if canvas.layers().len() > 1 {
        log::warn!(
            "Project {} keeps only the active layer ({} layers open)",
            path.display(),
            canvas.layers().len()
        );
    }
    fs::write(path, to_native_text(canvas)?)?;
    log::info!("Saved project to {}", path.display());
    Ok(())
}

pub fn load_native(path: impl AsRef<Path>, config: EditorConfig) -> CanvasResult<Canvas> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let canvas = parse_native(&text, config).inspect_err(|e| {
        log::warn!("Project {} rejected: {}", path.display(), e);
    })?;
    log::info!("Loaded project {}", path.display());
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn test_native_text_layout() {
        let canvas =
            Canvas::from_rgba(2, 1, &[1, 2, 3, 4, 5, 6, 7, 8], EditorConfig::default()).unwrap();
        assert_eq!(to_native_text(&canvas).unwrap(), "2 1\n1 2 3 4 5 6 7 8\n");

        let tall = Canvas::from_rgba(1, 2, &[0, 0, 0, 255, 10, 20, 30, 40], EditorConfig::default())
            .unwrap();
        assert_eq!(to_native_text(&tall).unwrap(), "1 2\n0 0 0 255\n10 20 30 40\n");
    }

    #[test]
    fn test_parse_native() {
        let canvas = parse_native("1 2\n9 9 9 255\n0 0 0 0\n", EditorConfig::default()).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (1, 2));
        assert_eq!(canvas.pick_color(0, 0), Some(Color::rgb(9, 9, 9)));
    }

    #[test]
    fn test_parse_native_rejects_bad_input() {
        let config = EditorConfig::default;
        assert!(matches!(parse_native("", config()), Err(CanvasError::Project(_))));
        assert!(parse_native("2 x", config()).is_err());
        assert!(parse_native("1 1\n1 2 3", config()).is_err());
        assert!(parse_native("1 1\n1 2 3 4 5", config()).is_err());
        assert!(parse_native("1 1\n1 2 3 256", config()).is_err());
    }
}
