pub mod clock;
pub mod compositor;
pub mod config;
pub mod error;
pub mod sky;
pub mod surface;
pub mod term;
pub mod terrain;
pub mod viewport;

pub use compositor::{CancelToken, Session};
pub use config::SkyConfig;
pub use error::{Result, SkyError};
