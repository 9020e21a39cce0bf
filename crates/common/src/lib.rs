pub mod config;
pub mod error;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, GenerationMode, LlmProvider};
pub use error::SajuError;
pub type Result<T> = std::result::Result<T, SajuError>;
