pub mod streams;
pub mod tagger;

pub use streams::StreamConfig;
pub use tagger::TaggerConfig;
