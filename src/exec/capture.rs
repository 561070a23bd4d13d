// src/exec/capture.rs

//! Bounded in-memory capture of subprocess output.

/// Maximum bytes captured per stream.
///
/// Prevents OOM if a run spews unbounded output. 10 MiB is generous for
/// normal operation; anything past the cap is dropped, not buffered.
pub const CAPTURE_LIMIT: usize = 10 * 1024 * 1024;

/// Notice appended to a stream's captured bytes when the cap was hit.
pub const TRUNCATION_NOTICE: &[u8] = b"\n[output truncated: exceeded 10MiB limit]\n";

/// Fixed-capacity byte sink.
///
/// `write` always reports the full input length as accepted so the pipe
/// pump never sees a short write or an error; past the cap, bytes are
/// silently dropped and `truncated` is set permanently.
#[derive(Debug)]
pub struct CaptureBuffer {
    buf: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl CaptureBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            truncated: false,
        }
    }

    pub fn with_default_limit() -> Self {
        Self::new(CAPTURE_LIMIT)
    }

    /// Accept a chunk, storing at most up to the cap. Always returns
    /// `chunk.len()`.
    pub fn write(&mut self, chunk: &[u8]) -> usize {
        let available = self.limit.saturating_sub(self.buf.len());
        if available == 0 {
            if !chunk.is_empty() {
                self.truncated = true;
            }
            return chunk.len();
        }

        if chunk.len() > available {
            self.buf.extend_from_slice(&chunk[..available]);
            self.truncated = true;
        } else {
            self.buf.extend_from_slice(chunk);
        }

        chunk.len()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Stored bytes, with the truncation notice appended when the cap was
    /// ever exceeded.
    pub fn into_bytes(self) -> Vec<u8> {
        let mut bytes = self.buf;
        if self.truncated {
            bytes.extend_from_slice(TRUNCATION_NOTICE);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stores_everything_under_the_cap() {
        let mut buf = CaptureBuffer::new(16);
        assert_eq!(buf.write(b"hello "), 6);
        assert_eq!(buf.write(b"world"), 5);
        assert!(!buf.truncated());
        assert_eq!(buf.into_bytes(), b"hello world");
    }

    #[test]
    fn drops_bytes_past_the_cap_and_flags_once() {
        let mut buf = CaptureBuffer::new(4);
        assert_eq!(buf.write(b"abcdef"), 6);
        assert!(buf.truncated());
        assert_eq!(buf.len(), 4);

        // Further writes are fully reported but fully dropped.
        assert_eq!(buf.write(b"ghi"), 3);
        assert_eq!(buf.len(), 4);

        let bytes = buf.into_bytes();
        assert!(bytes.starts_with(b"abcd"));
        assert!(bytes.ends_with(TRUNCATION_NOTICE));
    }

    #[test]
    fn exactly_at_the_cap_is_not_truncated() {
        let mut buf = CaptureBuffer::new(4);
        buf.write(b"abcd");
        assert!(!buf.truncated());
        assert_eq!(buf.into_bytes(), b"abcd");
    }

    #[test]
    fn one_byte_past_the_cap_truncates() {
        let mut buf = CaptureBuffer::new(4);
        buf.write(b"abcd");
        buf.write(b"e");
        assert!(buf.truncated());
        assert_eq!(buf.len(), 4);
    }

    proptest! {
        #[test]
        fn never_stores_more_than_the_cap(
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..32),
            limit in 1usize..128,
        ) {
            let mut buf = CaptureBuffer::new(limit);
            let mut total = 0usize;
            let mut was_truncated = false;

            for chunk in &chunks {
                prop_assert_eq!(buf.write(chunk), chunk.len());
                total += chunk.len();

                // Truncation is monotonic.
                if was_truncated {
                    prop_assert!(buf.truncated());
                }
                was_truncated = buf.truncated();
            }

            prop_assert!(buf.len() <= limit);
            prop_assert_eq!(buf.truncated(), total > limit);
        }
    }
}
