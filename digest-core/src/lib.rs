pub mod config;
pub mod error;
pub mod preprocess;
pub mod scoring;
pub mod time_window;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;
