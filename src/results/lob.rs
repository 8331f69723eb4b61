use std::io::Cursor;

/// Character large object read from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clob {
    text: String,
}

impl Clob {
    pub(crate) fn new(text: String) -> Self {
        Self { text }
    }

    /// Length in characters.
    #[must_use]
    pub fn length(&self) -> usize {
        self.text.chars().count()
    }

    /// Up to `len` characters starting at the 1-based character `position`.
    #[must_use]
    pub fn sub_string(&self, position: usize, len: usize) -> String {
        self.text
            .chars()
            .skip(position.saturating_sub(1))
            .take(len)
            .collect()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn character_stream(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.text.clone().into_bytes())
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

/// Binary large object read from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
}

impl Blob {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn length(&self) -> usize {
        self.bytes.len()
    }

    /// Up to `len` bytes starting at the 1-based byte `position`.
    #[must_use]
    pub fn bytes(&self, position: usize, len: usize) -> &[u8] {
        let start = position.saturating_sub(1).min(self.bytes.len());
        let end = start.saturating_add(len).min(self.bytes.len());
        &self.bytes[start..end]
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn binary_stream(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.bytes.clone())
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
