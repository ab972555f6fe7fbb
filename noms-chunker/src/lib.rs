mod buzhash;
mod chunker;

pub use buzhash::{BuzHash, DEFAULT_PATTERN, TEST_PATTERN, WINDOW_SIZE};
pub use chunker::Chunker;
