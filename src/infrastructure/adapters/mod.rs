//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod http;
pub mod output;
pub mod transcoder;
pub mod tts;

pub use http::*;
pub use output::*;
pub use transcoder::*;
pub use tts::*;
