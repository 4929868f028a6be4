use thiserror::Error;

pub type Result<T> = std::result::Result<T, SkyError>;

#[derive(Error, Debug)]
pub enum SkyError {
    #[error("drawing surface unavailable: {width}x{height} is not a usable size")]
    InvalidSurface { width: usize, height: usize },

    #[error("invalid hex color: {0} (expected RRGGBB, e.g. 05004c)")]
    InvalidColor(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
