use thiserror::Error;

pub type CanvasResult<T> = Result<T, CanvasError>;

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("Layer limit reached ({max} layers)")]
    LayerLimit { max: usize },
    #[error("Cannot remove the last remaining layer")]
    LastLayer,
    #[error("Layer index {index} out of range ({count} layers)")]
    LayerIndex { index: usize, count: usize },
    #[error("Pixel buffer has {actual} entries, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Decompression failed: {0}")]
    Decompress(String),
    #[error("Palette entry {token:?} is invalid: {reason}")]
    Palette { token: String, reason: &'static str },
    #[error("Cannot remove reserved palette entry {0}")]
    ReservedPaletteEntry(usize),
    #[error("Image of {width}x{height} is too large for a canvas")]
    ImageTooLarge { width: u32, height: u32 },
    #[error("Malformed project file: {0}")]
    Project(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}
