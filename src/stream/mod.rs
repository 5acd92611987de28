//! Streaming NDJSON response reader.
//!
//! Consumes a chunked HTTP body whose payload is one JSON object per line,
//! extracts the incremental text (or pull progress) from each line, and hands
//! it to a caller-supplied callback in arrival order.
//!
//! ```no_run
//! use studio_llm::stream::{read_stream, FrameShape, IncrementalChunk};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(response: reqwest::Response) -> studio_llm::error::Result<()> {
//! let outcome = read_stream(
//!     response.bytes_stream(),
//!     FrameShape::Generate,
//!     &CancellationToken::new(),
//!     |chunk: &IncrementalChunk| {
//!         if let Some(text) = chunk.as_text() {
//!             print!("{text}");
//!         }
//!     },
//! )
//! .await?;
//! println!("\n{} chunks", outcome.chunks);
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod frame;
pub mod reader;

pub use buffer::LineBuffer;
pub use frame::{FrameShape, IncrementalChunk, PullProgress};
pub use reader::{chunks, read_stream, Completion, Flow, NdjsonDecoder, StreamOutcome};
