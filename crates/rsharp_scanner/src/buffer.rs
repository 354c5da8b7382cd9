//! Seekable input buffers.
//!
//! [`Buffer`] caches a window of the underlying byte stream and supports
//! random repositioning; [`Utf8Buffer`] decodes characters on top of it
//! while positions stay byte offsets.

use crate::ScanError;
use std::io::{self, Read, Seek, SeekFrom};

/// A byte source that can be repositioned.
pub trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

/// A byte-oriented input cache.
///
/// Seekable streams larger than [`Buffer::MAX_BUFFER_LENGTH`] are read
/// through a sliding window; everything else is held fully in memory.
pub struct Buffer {
    /// Cached bytes; the whole input when `stream` is `None`.
    buf: Vec<u8>,
    /// Stream offset of `buf[0]`.
    buf_start: usize,
    /// Read position inside `buf`.
    buf_pos: usize,
    /// Total input length in bytes.
    file_len: usize,
    stream: Option<Box<dyn SeekRead>>,
    /// First I/O failure while refilling the window.
    error: Option<io::Error>,
}

impl Buffer {
    pub const MAX_BUFFER_LENGTH: usize = 64 * 1024;

    /// Wrap bytes already in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let buf = bytes.into();
        Self {
            file_len: buf.len(),
            buf,
            buf_start: 0,
            buf_pos: 0,
            stream: None,
            error: None,
        }
    }

    /// Read a non-seekable source fully into memory.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Buffer a seekable source. Small inputs are read at once; larger ones
    /// keep a window of `MAX_BUFFER_LENGTH` bytes.
    pub fn from_seekable<R: SeekRead + 'static>(mut stream: R) -> io::Result<Self> {
        let file_len = stream.seek(SeekFrom::End(0))? as usize;
        stream.seek(SeekFrom::Start(0))?;
        if file_len <= Self::MAX_BUFFER_LENGTH {
            return Self::from_reader(stream);
        }
        let mut buffer = Self {
            buf: Vec::with_capacity(Self::MAX_BUFFER_LENGTH),
            buf_start: 0,
            buf_pos: 0,
            file_len,
            stream: Some(Box::new(stream)),
            error: None,
        };
        buffer.fill(0);
        Ok(buffer)
    }

    /// Read the next byte, or `None` at end of input.
    #[inline]
    pub fn read(&mut self) -> Option<u8> {
        if self.buf_pos < self.buf.len() {
            let b = self.buf[self.buf_pos];
            self.buf_pos += 1;
            return Some(b);
        }
        let pos = self.pos();
        if pos < self.file_len && self.stream.is_some() {
            self.fill(pos);
            if self.buf_pos < self.buf.len() {
                let b = self.buf[self.buf_pos];
                self.buf_pos += 1;
                return Some(b);
            }
        }
        None
    }

    /// The next byte without consuming it.
    #[inline]
    pub fn peek(&mut self) -> Option<u8> {
        let pos = self.pos();
        let b = self.read();
        self.set_pos(pos);
        b
    }

    /// Current byte offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.buf_start + self.buf_pos
    }

    /// Move to `value` (clamped to the input length). Positions outside
    /// the cached window refill it from the stream.
    pub fn set_pos(&mut self, value: usize) {
        let value = value.min(self.file_len);
        if value >= self.buf_start && value <= self.buf_start + self.buf.len() {
            self.buf_pos = value - self.buf_start;
        } else if self.stream.is_some() {
            self.fill(value);
        } else {
            self.buf_pos = self.buf.len();
        }
    }

    /// Bytes in `begin..end`. The current position is preserved.
    pub fn slice(&mut self, begin: usize, end: usize) -> Vec<u8> {
        let saved = self.pos();
        let end = end.min(self.file_len);
        let mut out = Vec::with_capacity(end.saturating_sub(begin));
        self.set_pos(begin);
        while self.pos() < end {
            match self.read() {
                Some(b) => out.push(b),
                None => break,
            }
        }
        self.set_pos(saved);
        out
    }

    pub fn len(&self) -> usize {
        self.file_len
    }

    pub fn is_empty(&self) -> bool {
        self.file_len == 0
    }

    /// Whether the whole input is cached.
    pub fn is_in_memory(&self) -> bool {
        self.stream.is_none()
    }

    /// The cached bytes when the input is fully in memory.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.is_in_memory().then_some(self.buf.as_slice())
    }

    /// The I/O error that cut the input short, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    fn fill(&mut self, start: usize) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        self.buf.clear();
        self.buf_start = start;
        self.buf_pos = 0;
        let wanted = Self::MAX_BUFFER_LENGTH.min(self.file_len - start);
        self.buf.resize(wanted, 0);
        let result = stream
            .seek(SeekFrom::Start(start as u64))
            .and_then(|_| stream.read_exact(&mut self.buf));
        if let Err(err) = result {
            tracing::warn!(error = %err, offset = start, "failed to refill scanner buffer");
            self.buf.clear();
            self.file_len = start;
            self.error.get_or_insert(err);
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("pos", &self.pos())
            .field("len", &self.file_len)
            .field("windowed", &self.stream.is_some())
            .finish()
    }
}

/// A [`Buffer`] that yields decoded characters.
///
/// Malformed sequences decode to U+FFFD, consuming one byte.
#[derive(Debug)]
pub struct Utf8Buffer {
    inner: Buffer,
    /// The whole input is in memory and known to be valid UTF-8.
    validated: bool,
}

impl Utf8Buffer {
    /// Wrap a buffer, skipping a UTF-8 byte-order mark.
    ///
    /// A leading `EF` that does not start `EF BB BF` is fatal.
    pub fn new(mut inner: Buffer) -> Result<Self, ScanError> {
        if inner.peek() == Some(0xEF) {
            inner.read();
            let second = inner.read();
            let third = inner.read();
            if second != Some(0xBB) || third != Some(0xBF) {
                return Err(ScanError::MalformedByteOrderMark { second, third });
            }
        }
        let validated = inner
            .as_bytes()
            .is_some_and(|bytes| simdutf8::basic::from_utf8(bytes).is_ok());
        Ok(Self { inner, validated })
    }

    /// Wrap text that is already decoded. A leading U+FEFF is skipped like
    /// a byte-order mark.
    pub fn from_text(text: &str) -> Self {
        let mut inner = Buffer::from_bytes(text.as_bytes().to_vec());
        if text.starts_with('\u{FEFF}') {
            inner.set_pos('\u{FEFF}'.len_utf8());
        }
        Self { inner, validated: true }
    }

    /// Read the next character, or `None` at end of input.
    pub fn read(&mut self) -> Option<char> {
        let first = self.inner.read()?;
        if first < 0x80 {
            return Some(first as char);
        }
        let width = match first {
            0xC2..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF4 => 4,
            _ => return Some(char::REPLACEMENT_CHARACTER),
        };
        let mut bytes = [first, 0, 0, 0];
        let restart = self.inner.pos();
        for slot in bytes.iter_mut().take(width).skip(1) {
            match self.inner.read() {
                Some(b) if self.validated || b & 0xC0 == 0x80 => *slot = b,
                _ => {
                    self.inner.set_pos(restart);
                    return Some(char::REPLACEMENT_CHARACTER);
                }
            }
        }
        match std::str::from_utf8(&bytes[..width]) {
            Ok(s) => s.chars().next(),
            Err(_) => {
                self.inner.set_pos(restart);
                Some(char::REPLACEMENT_CHARACTER)
            }
        }
    }

    /// The next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        let pos = self.inner.pos();
        let ch = self.read();
        self.inner.set_pos(pos);
        ch
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.inner.pos()
    }

    pub fn set_pos(&mut self, value: usize) {
        self.inner.set_pos(value);
    }

    /// Text of the byte range `begin..end`.
    pub fn slice(&mut self, begin: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.inner.slice(begin, end)).into_owned()
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.inner.take_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_and_peek() {
        let mut buffer = Buffer::from_bytes(b"ab".to_vec());
        assert_eq!(buffer.peek(), Some(b'a'));
        assert_eq!(buffer.read(), Some(b'a'));
        assert_eq!(buffer.pos(), 1);
        assert_eq!(buffer.read(), Some(b'b'));
        assert_eq!(buffer.read(), None);
        buffer.set_pos(0);
        assert_eq!(buffer.read(), Some(b'a'));
    }

    #[test]
    fn test_windowed_seek_refills() {
        let len = Buffer::MAX_BUFFER_LENGTH * 3 + 17;
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut buffer = Buffer::from_seekable(Cursor::new(data.clone())).unwrap();
        assert!(!buffer.is_in_memory());
        assert_eq!(buffer.len(), len);

        let far = Buffer::MAX_BUFFER_LENGTH * 2 + 5;
        buffer.set_pos(far);
        assert_eq!(buffer.read(), Some(data[far]));
        buffer.set_pos(3);
        assert_eq!(buffer.read(), Some(data[3]));

        // Reading across a window boundary.
        buffer.set_pos(Buffer::MAX_BUFFER_LENGTH - 1);
        assert_eq!(buffer.read(), Some(data[Buffer::MAX_BUFFER_LENGTH - 1]));
        assert_eq!(buffer.read(), Some(data[Buffer::MAX_BUFFER_LENGTH]));

        let slice = buffer.slice(len - 4, len + 10);
        assert_eq!(slice, data[len - 4..].to_vec());
    }

    #[test]
    fn test_utf8_decoding_keeps_byte_positions() {
        let mut buffer = Utf8Buffer::new(Buffer::from_bytes("aé€😀".as_bytes().to_vec())).unwrap();
        assert_eq!(buffer.read(), Some('a'));
        assert_eq!(buffer.read(), Some('é'));
        assert_eq!(buffer.pos(), 3);
        assert_eq!(buffer.read(), Some('€'));
        assert_eq!(buffer.peek(), Some('😀'));
        assert_eq!(buffer.read(), Some('😀'));
        assert_eq!(buffer.pos(), 10);
        assert_eq!(buffer.read(), None);
    }

    #[test]
    fn test_malformed_sequence_decodes_to_replacement() {
        let mut buffer = Utf8Buffer::new(Buffer::from_bytes(vec![b'x', 0xC3, b'y'])).unwrap();
        assert_eq!(buffer.read(), Some('x'));
        assert_eq!(buffer.read(), Some(char::REPLACEMENT_CHARACTER));
        assert_eq!(buffer.read(), Some('y'));
    }

    #[test]
    fn test_byte_order_mark() {
        let mut buffer = Utf8Buffer::new(Buffer::from_bytes(vec![0xEF, 0xBB, 0xBF, b'c'])).unwrap();
        assert_eq!(buffer.pos(), 3);
        assert_eq!(buffer.read(), Some('c'));

        let err = Utf8Buffer::new(Buffer::from_bytes(vec![0xEF, 0xBB, b'c'])).unwrap_err();
        assert!(matches!(
            err,
            ScanError::MalformedByteOrderMark { second: Some(0xBB), third: Some(b'c') }
        ));
    }
}
