use std::collections::HashMap;

pub mod lob;
pub mod row;
pub mod value;

pub use lob::{Blob, Clob};
pub use row::{ColumnIndex, Row};
pub use value::{FromValue, Mismatch};

/// Column labels of a result set, shared by every row of it.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
    // Cache for faster lookups; the lowercase map serves case-insensitive fallback
    index_cache: HashMap<String, usize>,
    lowercase_cache: HashMap<String, usize>,
}

impl ColumnInfo {
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        let mut index_cache = HashMap::with_capacity(names.len());
        let mut lowercase_cache = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // first occurrence wins for duplicate labels
            index_cache.entry(name.clone()).or_insert(i);
            lowercase_cache.entry(name.to_lowercase()).or_insert(i);
        }
        Self {
            names,
            index_cache,
            lowercase_cache,
        }
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact label match first, then case-insensitive.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        if let Some(&idx) = self.index_cache.get(label) {
            return Some(idx);
        }
        self.lowercase_cache.get(&label.to_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_beats_case_insensitive() {
        let info = ColumnInfo::new(vec!["ID".into(), "id".into(), "name".into()]);
        assert_eq!(info.index_of("id"), Some(1));
        assert_eq!(info.index_of("ID"), Some(0));
        assert_eq!(info.index_of("Id"), Some(0));
        assert_eq!(info.index_of("NAME"), Some(2));
        assert_eq!(info.index_of("other"), None);
    }
}
