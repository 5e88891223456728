//! Declarative test case and expectation model.

use std::collections::BTreeMap;
use std::fmt;

use educe::Educe;
use regex::Regex;

/// Which backend executed a case.
///
/// The engine kind decides which flavor of column and row checker a case
/// gets: the reference databases run behind an adapter that reshapes result
/// sets, so their output cannot be compared with the native checkers as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EngineKind {
    /// The in-process SQL engine under test.
    Native,
    /// SQLite running behind the reference-database adapter.
    Sqlite,
    /// MySQL running behind the reference-database adapter.
    Mysql,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The expected outcome facets of one case on one engine kind.
///
/// Every facet is optional: an empty `columns`, empty `rows`, negative
/// `count` or empty `options` means "do not check that facet". The
/// success/failure expectation is always present and defaults to success.
#[derive(Debug, Clone, Educe)]
#[educe(PartialEq)]
pub struct Expectation {
    /// Expected column headers, each a `"name type"` pair. Empty means
    /// the column shape is not checked.
    pub columns: Vec<String>,
    /// Expected rows, one cell per column. Empty means row content is not
    /// checked.
    pub rows: Vec<Vec<String>>,
    /// Expected number of returned or affected rows. Negative means the
    /// count is not checked.
    pub count: i64,
    /// Entries that must appear in the result's option map. Empty means
    /// options are not checked.
    pub options: BTreeMap<String, String>,
    /// Whether the execution is expected to succeed.
    pub success: bool,
    /// When a failure is expected, the actual error message must match this
    /// regex. If absent, any error is accepted.
    #[educe(PartialEq(method(cmp_regex)))]
    pub expected_error: Option<Regex>,
}

/// Use string representation to determine if two regular
/// expressions came from the same text (rather than something
/// more deeply meaningful)
fn cmp_regex(l: &Option<Regex>, r: &Option<Regex>) -> bool {
    match (l, r) {
        (Some(l), Some(r)) => l.as_str().eq(r.as_str()),
        (None, None) => true,
        _ => false,
    }
}

impl Default for Expectation {
    fn default() -> Self {
        Expectation {
            columns: vec![],
            rows: vec![],
            count: -1,
            options: BTreeMap::new(),
            success: true,
            expected_error: None,
        }
    }
}

impl Expectation {
    /// An expectation that only asserts the execution succeeds.
    pub fn success() -> Self {
        Self::default()
    }

    /// An expectation that asserts the execution fails, with any error.
    pub fn failure() -> Self {
        Expectation {
            success: false,
            ..Self::default()
        }
    }

    /// An expectation that asserts the execution fails with an error
    /// matching `pattern`.
    pub fn failure_matching(pattern: Regex) -> Self {
        Expectation {
            success: false,
            expected_error: Some(pattern),
            ..Self::default()
        }
    }

    pub fn with_columns(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rows(
        mut self,
        rows: impl IntoIterator<Item = impl IntoIterator<Item = impl Into<String>>>,
    ) -> Self {
        self.rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = count;
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// A declarative test case: one SQL text plus expectations keyed by engine
/// kind.
///
/// The case carries a default [`Expectation`] and may override it per engine
/// kind, for cases whose outcome legitimately differs between the native
/// engine and the reference databases.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestCase {
    /// Case identifier, used in diagnostics.
    pub desc: String,
    /// The SQL under test.
    pub sql: String,
    /// Default expectation used when no per-engine override exists.
    pub expect: Expectation,
    engine_expect: BTreeMap<EngineKind, Expectation>,
    exclude: Vec<EngineKind>,
}

impl TestCase {
    pub fn new(desc: impl Into<String>, sql: impl Into<String>) -> Self {
        TestCase {
            desc: desc.into(),
            sql: sql.into(),
            ..Self::default()
        }
    }

    /// Sets the default expectation.
    pub fn with_expect(mut self, expect: Expectation) -> Self {
        self.expect = expect;
        self
    }

    /// Overrides the expectation for one engine kind.
    pub fn with_expect_for(mut self, kind: EngineKind, expect: Expectation) -> Self {
        self.engine_expect.insert(kind, expect);
        self
    }

    /// Marks the case as not runnable on `kind`.
    pub fn with_exclude(mut self, kind: EngineKind) -> Self {
        self.exclude.push(kind);
        self
    }

    /// Resolves the expectation for `kind`, falling back to the default.
    pub fn expect_for(&self, kind: EngineKind) -> &Expectation {
        self.engine_expect.get(&kind).unwrap_or(&self.expect)
    }

    /// Returns whether this case is excluded on `kind`.
    pub fn is_excluded(&self, kind: EngineKind) -> bool {
        self.exclude.contains(&kind)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_expect_for_falls_back_to_default() {
        let case = TestCase::new("t", "select 1")
            .with_expect(Expectation::success().with_count(1))
            .with_expect_for(EngineKind::Sqlite, Expectation::success().with_count(2));

        assert_eq!(case.expect_for(EngineKind::Native).count, 1);
        assert_eq!(case.expect_for(EngineKind::Mysql).count, 1);
        assert_eq!(case.expect_for(EngineKind::Sqlite).count, 2);
    }

    #[test]
    fn test_exclusion() {
        let case = TestCase::new("t", "select 1").with_exclude(EngineKind::Mysql);
        assert!(case.is_excluded(EngineKind::Mysql));
        assert!(!case.is_excluded(EngineKind::Native));
    }

    #[test]
    fn test_expectation_equality_compares_regex_text() {
        let a = Expectation::failure_matching(Regex::new("table .* not found").unwrap());
        let b = Expectation::failure_matching(Regex::new("table .* not found").unwrap());
        let c = Expectation::failure_matching(Regex::new("syntax error").unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_default_expectation_checks_nothing_but_success() {
        let expect = Expectation::default();
        assert!(expect.success);
        assert!(expect.columns.is_empty());
        assert!(expect.rows.is_empty());
        assert!(expect.count < 0);
        assert!(expect.options.is_empty());
    }
}
