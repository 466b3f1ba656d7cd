//! Accumulates bytes for a field when zero-copy isn't possible: a quoted
//! field containing `""` escapes can't be emitted as a single contiguous
//! slice of the source region, so its content is copied here instead.
//! Reused across fields within one parser; `take` drains it without
//! discarding the underlying allocation.

#[derive(Debug, Default)]
pub struct StringBuilder {
    buf: Vec<u8>,
}

impl StringBuilder {
    pub fn new() -> Self {
        StringBuilder { buf: Vec::with_capacity(256) }
    }

    pub fn append_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    pub fn append_range(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drains the accumulated bytes into an owned `String`, leaving the
    /// builder empty (but its capacity intact) for the next field.
    pub fn take_string(&mut self) -> Result<String, std::string::FromUtf8Error> {
        let cap = self.buf.capacity();
        let bytes = std::mem::replace(&mut self.buf, Vec::with_capacity(cap));
        String::from_utf8(bytes)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_and_drains() {
        let mut sb = StringBuilder::new();
        sb.append_range(b"ab");
        sb.append_byte(b'"');
        sb.append_range(b"c");
        assert_eq!(sb.take_string().unwrap(), "ab\"c");
        assert!(sb.is_empty());
    }

    #[test]
    fn reuses_capacity_after_take() {
        let mut sb = StringBuilder::new();
        sb.append_range(b"first");
        let cap_before = sb.buf.capacity();
        let _ = sb.take_string().unwrap();
        assert_eq!(sb.buf.capacity(), cap_before);
        sb.append_range(b"second");
        assert_eq!(sb.take_string().unwrap(), "second");
    }
}
