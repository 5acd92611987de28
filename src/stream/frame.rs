//! Frame shapes and the chunks they carry.
//!
//! Ollama emits one JSON object per line. Three endpoints, three shapes:
//! ```text
//! {"model":"llama3.2","response":"Hel","done":false}
//! {"model":"llama3.2","message":{"role":"assistant","content":"Hel"},"done":false}
//! {"status":"pulling 6a0746a1ec1a","digest":"sha256:6a07...","total":2019377376,"completed":241970}
//! ```

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which response shape a stream carries. Chosen once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FrameShape {
    /// `/api/generate`: text in `response`.
    Generate,
    /// `/api/chat`: text in `message.content`.
    Chat,
    /// `/api/pull`: download progress, no text.
    Pull,
}

/// Decode one trimmed, non-empty line.
pub(crate) type DecodeFn = fn(&str) -> serde_json::Result<Frame>;

impl FrameShape {
    pub(crate) fn decoder(self) -> DecodeFn {
        match self {
            Self::Generate => decode_generate,
            Self::Chat => decode_chat,
            Self::Pull => decode_pull,
        }
    }
}

/// Model download progress reported by the pull endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullProgress {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
}

impl PullProgress {
    /// `floor(completed / total * 100)`, or `None` unless both counts are
    /// present and `total` is non-zero. Saturates at `u64::MAX`.
    pub fn percent(&self) -> Option<u64> {
        match (self.completed, self.total) {
            (Some(completed), Some(total)) if total > 0 => {
                let pct = u128::from(completed) * 100 / u128::from(total);
                Some(u64::try_from(pct).unwrap_or(u64::MAX))
            }
            _ => None,
        }
    }
}

/// The payload of one well-formed, chunk-bearing frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrementalChunk {
    Text(String),
    Progress(PullProgress),
}

impl IncrementalChunk {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Progress(_) => None,
        }
    }

    pub fn as_progress(&self) -> Option<&PullProgress> {
        match self {
            Self::Progress(progress) => Some(progress),
            Self::Text(_) => None,
        }
    }
}

/// What the reader needs from a decoded line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub chunk: Option<IncrementalChunk>,
    pub done: bool,
    pub error: Option<String>,
}

fn text_chunk(text: Option<String>) -> Option<IncrementalChunk> {
    text.filter(|t| !t.is_empty()).map(IncrementalChunk::Text)
}

#[derive(Deserialize)]
struct GenerateLine {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

fn decode_generate(line: &str) -> serde_json::Result<Frame> {
    let raw: GenerateLine = serde_json::from_str(line)?;
    Ok(Frame {
        chunk: text_chunk(raw.response),
        done: raw.done,
        error: raw.error,
    })
}

#[derive(Deserialize)]
struct ChatLine {
    #[serde(default)]
    message: Option<ChatLineMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChatLineMessage {
    #[serde(default)]
    content: Option<String>,
}

fn decode_chat(line: &str) -> serde_json::Result<Frame> {
    let raw: ChatLine = serde_json::from_str(line)?;
    Ok(Frame {
        chunk: text_chunk(raw.message.and_then(|m| m.content)),
        done: raw.done,
        error: raw.error,
    })
}

#[derive(Deserialize)]
struct PullLine {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Final status line of a successful pull; Ollama sends no `done` field.
const PULL_SUCCESS: &str = "success";

fn decode_pull(line: &str) -> serde_json::Result<Frame> {
    let raw: PullLine = serde_json::from_str(line)?;
    let done = raw.done || raw.status.as_deref() == Some(PULL_SUCCESS);
    let chunk = raw
        .status
        .filter(|s| !s.is_empty())
        .map(|status| {
            IncrementalChunk::Progress(PullProgress {
                status,
                digest: raw.digest,
                total: raw.total,
                completed: raw.completed,
            })
        });
    Ok(Frame {
        chunk,
        done,
        error: raw.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_extracts_response() {
        let frame = FrameShape::Generate.decoder()(r#"{"response":"Hel","done":false}"#).unwrap();
        assert_eq!(frame.chunk, Some(IncrementalChunk::Text("Hel".into())));
        assert!(!frame.done);
    }

    #[test]
    fn chat_tolerates_missing_message() {
        let frame = FrameShape::Chat.decoder()(r#"{"done":true}"#).unwrap();
        assert_eq!(frame.chunk, None);
        assert!(frame.done);

        let frame = FrameShape::Chat.decoder()(
            r#"{"message":{"role":"assistant","content":"lo"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(frame.chunk, Some(IncrementalChunk::Text("lo".into())));
    }

    #[test]
    fn empty_text_is_not_a_chunk() {
        let frame = FrameShape::Generate.decoder()(r#"{"response":"","done":false}"#).unwrap();
        assert_eq!(frame.chunk, None);
    }

    #[test]
    fn pull_percentage_is_floored() {
        let frame = FrameShape::Pull.decoder()(
            r#"{"status":"downloading","total":200,"completed":50}"#,
        )
        .unwrap();
        let progress = frame.chunk.as_ref().and_then(|c| c.as_progress()).unwrap();
        assert_eq!(progress.percent(), Some(25));

        let odd = PullProgress {
            status: "downloading".into(),
            digest: None,
            total: Some(3),
            completed: Some(2),
        };
        assert_eq!(odd.percent(), Some(66));
    }

    #[test]
    fn pull_without_counts_has_no_percentage() {
        let frame = FrameShape::Pull.decoder()(r#"{"status":"verifying sha256 digest"}"#).unwrap();
        let progress = frame.chunk.as_ref().and_then(|c| c.as_progress()).unwrap();
        assert_eq!(progress.status, "verifying sha256 digest");
        assert_eq!(progress.percent(), None);

        let zero = PullProgress {
            status: "pulling manifest".into(),
            digest: None,
            total: Some(0),
            completed: Some(0),
        };
        assert_eq!(zero.percent(), None);
    }

    #[test]
    fn overshooting_counts_saturate() {
        let bogus = PullProgress {
            status: "downloading".into(),
            digest: None,
            total: Some(1),
            completed: Some(u64::MAX / 10),
        };
        assert_eq!(bogus.percent(), Some(u64::MAX));

        let over = PullProgress {
            total: Some(100),
            completed: Some(150),
            ..bogus
        };
        assert_eq!(over.percent(), Some(150));
    }

    #[test]
    fn pull_success_status_completes() {
        let frame = FrameShape::Pull.decoder()(r#"{"status":"success"}"#).unwrap();
        assert!(frame.done);
        assert!(frame.chunk.is_some());
    }

    #[test]
    fn error_field_is_captured_for_every_shape() {
        for shape in [FrameShape::Generate, FrameShape::Chat, FrameShape::Pull] {
            let frame = shape.decoder()(r#"{"error":"disk full"}"#).unwrap();
            assert_eq!(frame.error.as_deref(), Some("disk full"), "{shape}");
        }
    }

    #[test]
    fn shape_names_parse() {
        assert_eq!("chat".parse::<FrameShape>().unwrap(), FrameShape::Chat);
        assert_eq!(FrameShape::Pull.to_string(), "pull");
    }
}
