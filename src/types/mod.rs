//! Request and response types for the local inference server.

pub mod generation;
pub mod message;
pub mod model;

pub use generation::*;
pub use message::*;
pub use model::{format_bytes, LocalModel, ModelDetails};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub(crate) fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
