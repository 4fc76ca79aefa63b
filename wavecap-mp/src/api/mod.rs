//! HTTP Ingress handlers

mod health;
mod ready;
mod upload;

pub use health::health;
pub use ready::vtt_ready;
pub use upload::upload;
