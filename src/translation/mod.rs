use std::collections::HashMap;

mod parsers;
mod scanner;

use parsers::{
    BLOCK_CLOSE, BLOCK_OPEN, LINE_COMMENT, closes_dollar_tag, dollar_tag,
    is_named_placeholder_start, pair_at,
};
use scanner::{State, scan_word};

use crate::error::SqlSessionError;

/// Positional marker every named placeholder is rewritten to.
pub const POSITIONAL_MARKER: char = '?';

/// A SQL template with its `:name` placeholders rewritten to positional `?` markers.
///
/// Every occurrence becomes its own marker, so a name used three times owns three positions.
/// Positions are 1-based and count every marker in the rewritten statement:
/// ```rust
/// use sql_session::translation::NamedStatement;
///
/// let parsed = NamedStatement::parse("SELECT * FROM t WHERE a = :x OR b = :y OR c = :x");
/// assert_eq!(parsed.statement(), "SELECT * FROM t WHERE a = ? OR b = ? OR c = ?");
/// assert_eq!(parsed.positions_of("x"), Some(&[1, 3][..]));
/// assert_eq!(parsed.marker_count(), 3);
/// ```
///
/// Quoted strings, quoted identifiers, comments, dollar-quoted blocks and `::type` casts are left
/// untouched. A literal `?` already present in the template is counted as a marker but has no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedStatement {
    statement: String,
    positions: HashMap<String, Vec<usize>>,
    marker_count: usize,
}

impl NamedStatement {
    /// Rewrite a template. Templates without named placeholders come back unchanged.
    #[must_use]
    pub fn parse(sql: &str) -> Self {
        let bytes = sql.as_bytes();
        let mut out: Option<String> = None;
        let mut copied_until = 0;
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        let mut marker_count = 0;
        let mut state = State::Normal;
        let mut idx = 0;

        while idx < bytes.len() {
            let b = bytes[idx];
            match state {
                State::Normal => match b {
                    b'\'' => state = State::SingleQuoted,
                    b'"' => state = State::DoubleQuoted,
                    _ if pair_at(bytes, idx, LINE_COMMENT) => state = State::LineComment,
                    _ if pair_at(bytes, idx, BLOCK_OPEN) => state = State::BlockComment(1),
                    b'$' => {
                        if let Some(tag) = dollar_tag(bytes, idx) {
                            idx += tag.len() + 1;
                            state = State::DollarQuoted(tag.to_string());
                        }
                    }
                    b'?' => marker_count += 1,
                    b':' if is_named_placeholder_start(bytes, idx) => {
                        if let Some((name_end, name)) = scan_word(bytes, idx + 1) {
                            marker_count += 1;
                            positions
                                .entry(name.to_string())
                                .or_default()
                                .push(marker_count);

                            let buf = out.get_or_insert_with(|| String::with_capacity(sql.len()));
                            buf.push_str(&sql[copied_until..idx]);
                            buf.push(POSITIONAL_MARKER);
                            copied_until = name_end;
                            idx = name_end - 1;
                        }
                    }
                    _ => {}
                },
                State::SingleQuoted => {
                    if b == b'\'' {
                        if bytes.get(idx + 1) == Some(&b'\'') {
                            idx += 1; // skip escaped quote
                        } else {
                            state = State::Normal;
                        }
                    }
                }
                State::DoubleQuoted => {
                    if b == b'"' {
                        if bytes.get(idx + 1) == Some(&b'"') {
                            idx += 1; // skip escaped quote
                        } else {
                            state = State::Normal;
                        }
                    }
                }
                State::LineComment => {
                    if b == b'\n' {
                        state = State::Normal;
                    }
                }
                State::BlockComment(depth) => {
                    if pair_at(bytes, idx, BLOCK_OPEN) {
                        state = State::BlockComment(depth + 1);
                        idx += 1;
                    } else if pair_at(bytes, idx, BLOCK_CLOSE) {
                        if depth == 1 {
                            state = State::Normal;
                        } else {
                            state = State::BlockComment(depth - 1);
                        }
                        idx += 1;
                    }
                }
                State::DollarQuoted(ref tag) => {
                    if b == b'$' && closes_dollar_tag(bytes, idx, tag) {
                        let tag_len = tag.len();
                        state = State::Normal;
                        idx += tag_len + 1;
                    }
                }
            }

            idx += 1;
        }

        let statement = match out {
            Some(mut buf) => {
                buf.push_str(&sql[copied_until..]);
                buf
            }
            None => sql.to_string(),
        };

        Self {
            statement,
            positions,
            marker_count,
        }
    }

    /// The rewritten, purely positional statement.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Name -> ordered 1-based marker positions.
    #[must_use]
    pub fn positions(&self) -> &HashMap<String, Vec<usize>> {
        &self.positions
    }

    #[must_use]
    pub fn positions_of(&self, name: &str) -> Option<&[usize]> {
        self.positions.get(name).map(Vec::as_slice)
    }

    /// Total positional markers in [`statement`](Self::statement), named or not.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.marker_count
    }

    #[must_use]
    pub fn has_named_placeholders(&self) -> bool {
        !self.positions.is_empty()
    }

    /// Resolve which name occupies each marker, in marker order.
    ///
    /// # Errors
    /// Returns `SqlSessionError::MalformedQuery` if any marker has no name, e.g. a bare `?`
    /// mixed into a named template.
    pub fn names_by_position(&self) -> Result<Vec<&str>, SqlSessionError> {
        let mut slots: Vec<Option<&str>> = vec![None; self.marker_count];
        for (name, positions) in &self.positions {
            for &position in positions {
                if let Some(slot) = slots.get_mut(position - 1) {
                    *slot = Some(name.as_str());
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| {
                    SqlSessionError::MalformedQuery(format!(
                        "no named parameter occupies position {} in: {}",
                        idx + 1,
                        self.statement
                    ))
                })
            })
            .collect()
    }
}
