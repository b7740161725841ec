pub mod chunk;
pub mod config;
pub mod error;
pub mod line;

pub use chunk::{Chunks, LineChunker, split_columns};
pub use config::ChunkingConfig;
pub use error::ChunkError;
pub use line::{Line, extract_line};
