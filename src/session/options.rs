use std::time::Duration;

use crate::driver::GeneratedKeys;

/// Per-session settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Prepare inserts so the driver reports generated keys.
    pub return_generated_keys: bool,
    /// Explicit key columns; when non-empty these win over `return_generated_keys`.
    pub auto_generated_key_columns: Vec<String>,
    /// `single` fails with `TooManyRows` when more than one row comes back.
    pub strict: bool,
    pub query_timeout: Option<Duration>,
    pub read_only: bool,
}

impl SessionOptions {
    #[must_use]
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::new()
    }

    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub(crate) fn generated_keys(&self) -> GeneratedKeys {
        if !self.auto_generated_key_columns.is_empty() {
            GeneratedKeys::Columns(self.auto_generated_key_columns.clone())
        } else if self.return_generated_keys {
            GeneratedKeys::Auto
        } else {
            GeneratedKeys::None
        }
    }
}

/// Fluent builder for [`SessionOptions`].
#[derive(Debug, Clone, Default)]
pub struct SessionOptionsBuilder {
    opts: SessionOptions,
}

impl SessionOptionsBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn return_generated_keys(mut self, enabled: bool) -> Self {
        self.opts.return_generated_keys = enabled;
        self
    }

    #[must_use]
    pub fn auto_generated_key_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.auto_generated_key_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.opts.strict = strict;
        self
    }

    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.opts.query_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn finish(self) -> SessionOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_columns_take_precedence() {
        let opts = SessionOptions::builder()
            .return_generated_keys(true)
            .auto_generated_key_columns(["id"])
            .finish();
        assert_eq!(
            opts.generated_keys(),
            GeneratedKeys::Columns(vec!["id".to_string()])
        );

        let opts = SessionOptions::builder().return_generated_keys(true).finish();
        assert_eq!(opts.generated_keys(), GeneratedKeys::Auto);
        assert_eq!(SessionOptions::default().generated_keys(), GeneratedKeys::None);
    }

    #[test]
    fn builder_sets_every_field() {
        let opts = SessionOptions::builder()
            .strict(true)
            .read_only(true)
            .query_timeout(Duration::from_secs(3))
            .finish();
        assert!(opts.strict);
        assert!(opts.read_only);
        assert_eq!(opts.query_timeout, Some(Duration::from_secs(3)));
        assert!(SessionOptions::strict().strict);
    }
}
