//! Byte-level line buffering for NDJSON bodies.

/// Accumulates transport chunks and hands out complete `\n`-terminated lines.
///
/// Bytes are kept undecoded until a line is complete, so a multi-byte UTF-8
/// character split across two transport chunks decodes intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
    /// Bytes before this offset were already handed out as lines.
    start: usize,
    /// Bytes before this offset are known to hold no `\n`.
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transport chunk. Zero-length chunks are fine.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.start > 0 {
            self.pending.drain(..self.start);
            self.scanned -= self.start;
            self.start = 0;
        }
        self.pending.extend_from_slice(bytes);
    }

    /// Remove and return the next complete line, without its delimiter.
    ///
    /// Returns `None` when no `\n` is buffered yet. Each byte is searched
    /// once, however many chunks a line spans.
    pub fn next_line(&mut self) -> Option<String> {
        let from = self.scanned.max(self.start);
        let Some(offset) = self.pending[from..].iter().position(|&b| b == b'\n') else {
            self.scanned = self.pending.len();
            return None;
        };
        let newline = from + offset;
        let line = String::from_utf8_lossy(&self.pending[self.start..newline]).into_owned();
        self.start = newline + 1;
        self.scanned = self.start;
        Some(line)
    }

    /// Take whatever is left after the last delimiter.
    pub fn take_remainder(&mut self) -> Option<String> {
        let rest = (self.start < self.pending.len())
            .then(|| String::from_utf8_lossy(&self.pending[self.start..]).into_owned());
        self.pending.clear();
        self.start = 0;
        self.scanned = 0;
        rest
    }

    /// Number of bytes waiting for a delimiter.
    pub fn pending_len(&self) -> usize {
        self.pending.len() - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_nothing_until_newline_arrives() {
        let mut buf = LineBuffer::new();
        buf.push(b"{\"resp");
        assert_eq!(buf.next_line(), None);
        buf.push(b"onse\":\"a\"}\n");
        assert_eq!(buf.next_line().as_deref(), Some("{\"response\":\"a\"}"));
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn one_chunk_can_hold_many_lines() {
        let mut buf = LineBuffer::new();
        buf.push(b"a\nb\n\nc");
        assert_eq!(buf.next_line().as_deref(), Some("a"));
        assert_eq!(buf.next_line().as_deref(), Some("b"));
        assert_eq!(buf.next_line().as_deref(), Some(""));
        assert_eq!(buf.next_line(), None);
        assert_eq!(buf.take_remainder().as_deref(), Some("c"));
        assert_eq!(buf.take_remainder(), None);
    }

    #[test]
    fn split_multibyte_character_survives() {
        let text = "héllo\n".as_bytes();
        let (head, tail) = text.split_at(2);
        let mut buf = LineBuffer::new();
        buf.push(head);
        buf.push(&[]);
        buf.push(tail);
        assert_eq!(buf.next_line().as_deref(), Some("héllo"));
    }

    #[test]
    fn long_line_across_many_small_chunks() {
        let line = format!("{{\"response\":\"{}\"}}", "x".repeat(100_000));
        let mut buf = LineBuffer::new();
        for piece in line.as_bytes().chunks(64) {
            buf.push(piece);
            assert_eq!(buf.next_line(), None);
        }
        assert_eq!(buf.pending_len(), line.len());
        buf.push(b"\nrest");
        assert_eq!(buf.next_line().as_deref(), Some(line.as_str()));
        assert_eq!(buf.pending_len(), 4);
        buf.push(b"\n");
        assert_eq!(buf.next_line().as_deref(), Some("rest"));
        assert_eq!(buf.pending_len(), 0);
    }
}
