//! Reassembly of fragmented frames.

use broker_core::error::AppError;

/// Accumulates partial frames until the terminal fragment arrives.
///
/// The buffer never grows past `max_size` bytes; an overflowing message is
/// discarded as a whole.
#[derive(Debug)]
pub struct FragmentBuffer {
    buffer: String,
    fragments: usize,
    max_size: usize,
}

impl FragmentBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            buffer: String::new(),
            fragments: 0,
            max_size,
        }
    }

    /// Appends a fragment.
    ///
    /// Returns the complete message once `fin` is set, `None` while more
    /// fragments are expected.
    pub fn push(&mut self, chunk: &str, fin: bool) -> Result<Option<String>, AppError> {
        if self.buffer.len() + chunk.len() > self.max_size {
            let received = self.buffer.len() + chunk.len();
            self.clear();
            return Err(AppError::protocol(format!(
                "Message exceeds maximum size of {} bytes ({received} received)",
                self.max_size
            )));
        }

        if fin && self.fragments == 0 {
            return Ok(Some(chunk.to_string()));
        }

        self.buffer.push_str(chunk);
        self.fragments += 1;

        if fin {
            self.fragments = 0;
            Ok(Some(std::mem::take(&mut self.buffer)))
        } else {
            Ok(None)
        }
    }

    /// Whether a message is partially received.
    pub fn is_pending(&self) -> bool {
        self.fragments > 0
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.fragments = 0;
    }
}
