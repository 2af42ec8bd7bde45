pub mod client;
pub mod error;
pub mod types;
pub mod util;

pub use client::LmStudio;
pub use error::{AiClientError, Result};
pub use types::{ChatRequest, ChatResponse, WireMessage};
