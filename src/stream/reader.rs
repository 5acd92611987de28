//! The NDJSON read loop.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use super::buffer::LineBuffer;
use super::frame::{DecodeFn, FrameShape, IncrementalChunk};
use crate::error::{LlmError, Result};

/// How a read loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A frame carried `done: true`.
    Done,
    /// The transport closed without a `done` frame.
    EndOfStream,
    /// The caller's cancellation token fired.
    Cancelled,
}

/// Final result of one read loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Concatenation of every text chunk, in arrival order.
    pub text: String,
    /// Number of chunks handed to the callback.
    pub chunks: usize,
    pub completion: Completion,
}

/// Whether the decoder wants more bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Done,
}

/// Synchronous half of the reader: buffering, decoding and dispatch.
///
/// Owns its buffer and accumulator; one decoder serves exactly one response.
#[derive(Debug)]
pub struct NdjsonDecoder {
    shape: FrameShape,
    decode: DecodeFn,
    buffer: LineBuffer,
    accumulated: String,
    chunks: usize,
    done: bool,
}

impl NdjsonDecoder {
    pub fn new(shape: FrameShape) -> Self {
        Self {
            shape,
            decode: shape.decoder(),
            buffer: LineBuffer::new(),
            accumulated: String::new(),
            chunks: 0,
            done: false,
        }
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.accumulated
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one transport chunk, dispatching every complete line in order.
    ///
    /// Once a `done` frame is seen, the rest of the buffer and any later
    /// input are ignored.
    pub fn feed<F>(&mut self, bytes: &[u8], on_chunk: &mut F) -> Result<Flow>
    where
        F: FnMut(&IncrementalChunk),
    {
        if self.done {
            return Ok(Flow::Done);
        }
        self.buffer.push(bytes);
        while let Some(line) = self.buffer.next_line() {
            if self.process_line(&line, on_chunk)? == Flow::Done {
                return Ok(Flow::Done);
            }
        }
        Ok(Flow::Continue)
    }

    /// Process a trailing line the server did not terminate with `\n`.
    pub fn flush<F>(&mut self, on_chunk: &mut F) -> Result<Flow>
    where
        F: FnMut(&IncrementalChunk),
    {
        if self.done {
            return Ok(Flow::Done);
        }
        match self.buffer.take_remainder() {
            Some(rest) => self.process_line(&rest, on_chunk),
            None => Ok(Flow::Continue),
        }
    }

    fn process_line<F>(&mut self, line: &str, on_chunk: &mut F) -> Result<Flow>
    where
        F: FnMut(&IncrementalChunk),
    {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let frame = match (self.decode)(line) {
            Ok(frame) => frame,
            Err(e) => {
                // Keep-alive noise or a garbled line; skip it.
                tracing::trace!(shape = %self.shape, error = %e, "discarding malformed NDJSON line");
                return Ok(Flow::Continue);
            }
        };

        if let Some(message) = frame.error {
            return Err(LlmError::Upstream(message));
        }

        if let Some(chunk) = frame.chunk {
            if let IncrementalChunk::Text(text) = &chunk {
                self.accumulated.push_str(text);
            }
            self.chunks += 1;
            on_chunk(&chunk);
        }

        if frame.done {
            self.done = true;
            return Ok(Flow::Done);
        }
        Ok(Flow::Continue)
    }

    pub fn into_outcome(self, completion: Completion) -> StreamOutcome {
        StreamOutcome {
            text: self.accumulated,
            chunks: self.chunks,
            completion,
        }
    }
}

/// Read an NDJSON response body to completion.
///
/// `on_chunk` runs synchronously for every well-formed, chunk-bearing frame;
/// the transport is not polled again until it returns. The loop ends on the
/// first `done` frame, on end of input, or when `cancel` fires. A frame with
/// an `error` field aborts with [`LlmError::Upstream`]; a transport error
/// mid-stream is returned as-is.
pub async fn read_stream<S, B, E, F>(
    byte_stream: S,
    shape: FrameShape,
    cancel: &CancellationToken,
    mut on_chunk: F,
) -> Result<StreamOutcome>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<LlmError>,
    F: FnMut(&IncrementalChunk),
{
    let mut decoder = NdjsonDecoder::new(shape);
    futures::pin_mut!(byte_stream);

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(%shape, chunks = decoder.chunks, "stream read cancelled");
                return Ok(decoder.into_outcome(Completion::Cancelled));
            }
            next = byte_stream.next() => next,
        };

        match next {
            Some(Ok(bytes)) => {
                if decoder.feed(bytes.as_ref(), &mut on_chunk)? == Flow::Done {
                    tracing::debug!(%shape, chunks = decoder.chunks, "stream done");
                    return Ok(decoder.into_outcome(Completion::Done));
                }
            }
            Some(Err(e)) => return Err(e.into()),
            None => {
                let completion = match decoder.flush(&mut on_chunk)? {
                    Flow::Done => Completion::Done,
                    Flow::Continue => Completion::EndOfStream,
                };
                tracing::debug!(%shape, chunks = decoder.chunks, ?completion, "stream ended");
                return Ok(decoder.into_outcome(completion));
            }
        }
    }
}

/// Pull-based form of [`read_stream`]: yields each chunk as an item.
///
/// The stream ends after the `done` frame or at end of input; an upstream or
/// transport error is yielded once and ends the stream.
pub fn chunks<S, B, E>(
    byte_stream: S,
    shape: FrameShape,
) -> impl Stream<Item = Result<IncrementalChunk>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<LlmError>,
{
    async_stream::stream! {
        let mut decoder = NdjsonDecoder::new(shape);
        let mut byte_stream = std::pin::pin!(byte_stream);
        let mut ready: Vec<IncrementalChunk> = Vec::new();

        while let Some(item) = byte_stream.next().await {
            let bytes = match item {
                Ok(b) => b,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };

            let flow = decoder.feed(bytes.as_ref(), &mut |chunk: &IncrementalChunk| {
                ready.push(chunk.clone())
            });
            for chunk in ready.drain(..) {
                yield Ok(chunk);
            }
            match flow {
                Ok(Flow::Done) => return,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        let flow = decoder.flush(&mut |chunk: &IncrementalChunk| ready.push(chunk.clone()));
        for chunk in ready.drain(..) {
            yield Ok(chunk);
        }
        if let Err(e) = flow {
            yield Err(e);
        }
    }
}
