use super::scanner::is_word_byte;

pub(super) const LINE_COMMENT: [u8; 2] = *b"--";
pub(super) const BLOCK_OPEN: [u8; 2] = *b"/*";
pub(super) const BLOCK_CLOSE: [u8; 2] = *b"*/";

/// True when the two bytes at `idx` are exactly `pair`.
pub(super) fn pair_at(bytes: &[u8], idx: usize, pair: [u8; 2]) -> bool {
    bytes.get(idx..idx + 2) == Some(&pair[..])
}

/// A `:` opens a named placeholder when it is not part of a `::` cast and a word follows it.
pub(super) fn is_named_placeholder_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b':')
        && (idx == 0 || bytes[idx - 1] != b':')
        && bytes.get(idx + 1).copied().is_some_and(is_word_byte)
}

/// The tag of a `$tag$` opener starting at `start`, e.g. `""` for `$$`.
pub(super) fn dollar_tag(bytes: &[u8], start: usize) -> Option<&str> {
    let rest = bytes.get(start + 1..)?;
    let len = rest.iter().position(|b| !is_word_byte(*b))?;
    if rest[len] != b'$' {
        return None;
    }
    std::str::from_utf8(&rest[..len]).ok()
}

/// True when `$tag$` closes at `idx`.
pub(super) fn closes_dollar_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let Some(rest) = bytes.get(idx + 1..) else {
        return false;
    };
    rest.strip_prefix(tag.as_bytes())
        .is_some_and(|after| after.first() == Some(&b'$'))
}
