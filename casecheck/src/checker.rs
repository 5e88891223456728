//! Single-facet validators comparing an [`ExecutionResult`] against an
//! [`Expectation`].
//!
//! Each checker validates exactly one facet (success, column shape, row
//! content, row count, options) and is independently evaluable: no checker
//! looks at another checker's outcome. Which checkers apply to a case is
//! decided by [`select_checkers`](crate::select::select_checkers).

use std::fmt::{self, Display};
use std::sync::Arc;

use itertools::Itertools;
use owo_colors::OwoColorize;
use similar::{ChangeTag, TextDiff};

use crate::case::Expectation;
use crate::executor::ExecutionResult;

/// A single-facet validator.
pub trait Checker {
    /// Checker name used in diagnostics and logs.
    fn name(&self) -> &'static str;

    /// Validate one facet of the actual result against the expectation.
    fn check(&self) -> Result<(), CheckErrorKind>;
}

/// The error type for a failed check, carrying the case it belongs to.
///
/// For colored error message, use `self.display()`.
#[derive(thiserror::Error, Clone)]
#[error("{kind}\nin case {case}\n")]
pub struct CheckError {
    kind: CheckErrorKind,
    case: Arc<str>,
}

impl CheckError {
    /// Returns the corresponding [`CheckErrorKind`] for this error.
    pub fn kind(&self) -> CheckErrorKind {
        self.kind.clone()
    }

    /// Returns the case descriptor this error originated from.
    pub fn case(&self) -> &str {
        &self.case
    }

    pub fn display(&self, colorize: bool) -> CheckErrorDisplay<'_> {
        CheckErrorDisplay {
            err: self,
            colorize,
        }
    }
}

impl fmt::Debug for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// Overrides the `Display` implementation of [`CheckError`] to support
/// controlling colorization.
pub struct CheckErrorDisplay<'a> {
    err: &'a CheckError,
    colorize: bool,
}

impl<'a> Display for CheckErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\nin case {}\n",
            self.err.kind.display(self.colorize),
            self.err.case
        )
    }
}

/// The error kind for a failed check.
///
/// For colored error message, use `self.display()`.
#[derive(thiserror::Error, Debug, Clone)]
pub enum CheckErrorKind {
    #[error("case is expected to fail, but actually succeeded")]
    UnexpectedSuccess,
    #[error("case is expected to succeed, but actually failed: {err}")]
    UnexpectedFailure {
        err: Arc<dyn std::error::Error + Send + Sync>,
    },
    // Remember to also update [`CheckErrorKindDisplay`] if this message is changed.
    #[error("case is expected to fail with error:\n\t{expected_err}\nbut got error:\n\t{err}")]
    ErrorMismatch {
        err: Arc<dyn std::error::Error + Send + Sync>,
        expected_err: String,
    },
    #[error("expected {expected} columns, got {actual} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },
    #[error("column mismatch:\nexpected: {expected}\nactual:   {actual}")]
    ColumnMismatch { expected: String, actual: String },
    // Remember to also update [`CheckErrorKindDisplay`] if this message is changed.
    #[error(
        "row content mismatch:\n[Diff] (-expected|+actual)\n{}",
        format_diff(.expected, .actual, false)
    )]
    RowMismatch { expected: String, actual: String },
    #[error("expected {expected} rows, but got {actual}")]
    CountMismatch { expected: i64, actual: u64 },
    #[error("option {key:?} is expected to be {expected:?}, but got {actual:?}")]
    OptionMismatch {
        key: String,
        expected: String,
        actual: Option<String>,
    },
}

impl CheckErrorKind {
    /// Attaches the case descriptor to this kind.
    pub fn at(self, case: impl Into<Arc<str>>) -> CheckError {
        CheckError {
            kind: self,
            case: case.into(),
        }
    }

    pub fn display(&self, colorize: bool) -> CheckErrorKindDisplay<'_> {
        CheckErrorKindDisplay {
            error: self,
            colorize,
        }
    }
}

/// Overrides the `Display` implementation of [`CheckErrorKind`] to support
/// controlling colorization.
pub struct CheckErrorKindDisplay<'a> {
    error: &'a CheckErrorKind,
    colorize: bool,
}

impl<'a> Display for CheckErrorKindDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.colorize {
            return write!(f, "{}", self.error);
        }
        match self.error {
            CheckErrorKind::ErrorMismatch { err, expected_err } => write!(
                f,
                "case is expected to fail with error:\n\t{}\nbut got error:\n\t{}",
                expected_err.bright_green(),
                err.bright_red(),
            ),
            CheckErrorKind::RowMismatch { expected, actual } => write!(
                f,
                "row content mismatch:\n[Diff] ({}|{})\n{}",
                "-expected".bright_red(),
                "+actual".bright_green(),
                format_diff(expected, actual, true)
            ),
            _ => write!(f, "{}", self.error),
        }
    }
}

fn format_diff(expected: &str, actual: &str, colorize: bool) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    diff.iter_all_changes()
        .map(|change| {
            let line = change.value().trim_end_matches('\n');
            match change.tag() {
                ChangeTag::Equal => format!("    {line}"),
                ChangeTag::Insert if colorize => format!("+   {line}").bright_green().to_string(),
                ChangeTag::Insert => format!("+   {line}"),
                ChangeTag::Delete if colorize => format!("-   {line}").bright_red().to_string(),
                ChangeTag::Delete => format!("-   {line}"),
            }
        })
        .join("\n")
}

/// Trim and replace multiple whitespaces with one.
fn normalize_string(s: &str) -> String {
    s.trim().split_ascii_whitespace().join(" ")
}

/// First whitespace-delimited token of a column header, i.e. the column name
/// of a `"name type"` pair.
fn column_name(header: &str) -> &str {
    header.split_ascii_whitespace().next().unwrap_or("")
}

/// Canonicalize a cell as formatted by an adapter-backed engine: adapters
/// report floats with a trailing `.0` for whole values and use their own
/// NULL casing.
fn canonicalize_adapter_cell(cell: &str) -> String {
    let cell = normalize_string(cell);
    if cell.eq_ignore_ascii_case("null") {
        return "NULL".into();
    }
    if let Some(stripped) = cell.strip_suffix(".0") {
        if stripped.parse::<i64>().is_ok() {
            return stripped.into();
        }
    }
    cell
}

/// The baseline assertion that the execution's success or failure matches
/// the expectation. Always selected, first.
pub struct SuccessChecker<'a> {
    expect: &'a Expectation,
    actual: &'a ExecutionResult,
}

impl<'a> SuccessChecker<'a> {
    pub fn new(expect: &'a Expectation, actual: &'a ExecutionResult) -> Self {
        SuccessChecker { expect, actual }
    }
}

impl Checker for SuccessChecker<'_> {
    fn name(&self) -> &'static str {
        "success"
    }

    fn check(&self) -> Result<(), CheckErrorKind> {
        match (self.actual.error(), self.expect.success) {
            (None, true) => Ok(()),
            (None, false) => Err(CheckErrorKind::UnexpectedSuccess),
            (Some(e), true) => Err(CheckErrorKind::UnexpectedFailure { err: e.clone() }),
            (Some(e), false) => match &self.expect.expected_error {
                Some(expected) if !expected.is_match(&e.to_string()) => {
                    Err(CheckErrorKind::ErrorMismatch {
                        err: e.clone(),
                        expected_err: expected.to_string(),
                    })
                }
                _ => Ok(()),
            },
        }
    }
}

/// Column-shape checker for the native engine: compares `"name type"`
/// headers verbatim, modulo whitespace.
pub struct ColumnsChecker<'a> {
    expect: &'a Expectation,
    actual: &'a ExecutionResult,
}

impl<'a> ColumnsChecker<'a> {
    pub fn new(expect: &'a Expectation, actual: &'a ExecutionResult) -> Self {
        ColumnsChecker { expect, actual }
    }
}

impl Checker for ColumnsChecker<'_> {
    fn name(&self) -> &'static str {
        "columns"
    }

    fn check(&self) -> Result<(), CheckErrorKind> {
        let expected = self
            .expect
            .columns
            .iter()
            .map(|c| normalize_string(c))
            .collect_vec();
        let actual = self
            .actual
            .columns()
            .iter()
            .map(|c| normalize_string(c))
            .collect_vec();
        if expected.len() != actual.len() {
            return Err(CheckErrorKind::ColumnCountMismatch {
                expected: expected.len(),
                actual: actual.len(),
            });
        }
        if expected != actual {
            return Err(CheckErrorKind::ColumnMismatch {
                expected: expected.iter().join(", "),
                actual: actual.iter().join(", "),
            });
        }
        Ok(())
    }
}

/// Column-shape checker for adapter-backed engines: the adapter reports its
/// own type names, so only column names are compared.
pub struct AdapterColumnsChecker<'a> {
    expect: &'a Expectation,
    actual: &'a ExecutionResult,
}

impl<'a> AdapterColumnsChecker<'a> {
    pub fn new(expect: &'a Expectation, actual: &'a ExecutionResult) -> Self {
        AdapterColumnsChecker { expect, actual }
    }
}

impl Checker for AdapterColumnsChecker<'_> {
    fn name(&self) -> &'static str {
        "columns(adapter)"
    }

    fn check(&self) -> Result<(), CheckErrorKind> {
        let expected = self
            .expect
            .columns
            .iter()
            .map(|c| column_name(c))
            .collect_vec();
        let actual = self
            .actual
            .columns()
            .iter()
            .map(|c| column_name(c))
            .collect_vec();
        if expected.len() != actual.len() {
            return Err(CheckErrorKind::ColumnCountMismatch {
                expected: expected.len(),
                actual: actual.len(),
            });
        }
        if expected != actual {
            return Err(CheckErrorKind::ColumnMismatch {
                expected: expected.iter().join(", "),
                actual: actual.iter().join(", "),
            });
        }
        Ok(())
    }
}

/// Row-content checker for the native engine: rows are compared in order,
/// cells whitespace-normalized and joined (as the engine returns them).
pub struct ResultChecker<'a> {
    expect: &'a Expectation,
    actual: &'a ExecutionResult,
}

impl<'a> ResultChecker<'a> {
    pub fn new(expect: &'a Expectation, actual: &'a ExecutionResult) -> Self {
        ResultChecker { expect, actual }
    }
}

impl Checker for ResultChecker<'_> {
    fn name(&self) -> &'static str {
        "result"
    }

    fn check(&self) -> Result<(), CheckErrorKind> {
        let expected = self
            .expect
            .rows
            .iter()
            .map(|row| row.iter().map(|c| normalize_string(c)).join(" "))
            .collect_vec();
        let actual = self
            .actual
            .rows()
            .iter()
            .map(|row| row.iter().map(|c| normalize_string(c)).join(" "))
            .collect_vec();
        if expected != actual {
            return Err(CheckErrorKind::RowMismatch {
                expected: expected.join("\n"),
                actual: actual.join("\n"),
            });
        }
        Ok(())
    }
}

/// Row-content checker for adapter-backed engines.
///
/// Adapter result sets carry no ordering guarantee, so rows are sorted on
/// both sides before comparing, and cells go through
/// [`canonicalize_adapter_cell`] to reconcile the adapter's scalar
/// formatting with the native one.
pub struct AdapterResultChecker<'a> {
    expect: &'a Expectation,
    actual: &'a ExecutionResult,
}

impl<'a> AdapterResultChecker<'a> {
    pub fn new(expect: &'a Expectation, actual: &'a ExecutionResult) -> Self {
        AdapterResultChecker { expect, actual }
    }
}

impl Checker for AdapterResultChecker<'_> {
    fn name(&self) -> &'static str {
        "result(adapter)"
    }

    fn check(&self) -> Result<(), CheckErrorKind> {
        let mut expected = self
            .expect
            .rows
            .iter()
            .map(|row| row.iter().map(|c| canonicalize_adapter_cell(c)).join(" "))
            .collect_vec();
        let mut actual = self
            .actual
            .rows()
            .iter()
            .map(|row| row.iter().map(|c| canonicalize_adapter_cell(c)).join(" "))
            .collect_vec();
        expected.sort_unstable();
        actual.sort_unstable();
        if expected != actual {
            return Err(CheckErrorKind::RowMismatch {
                expected: expected.join("\n"),
                actual: actual.join("\n"),
            });
        }
        Ok(())
    }
}

/// Cardinality checker: compares the expected count against the number of
/// returned rows for queries, or affected rows for statements.
pub struct CountChecker<'a> {
    expect: &'a Expectation,
    actual: &'a ExecutionResult,
}

impl<'a> CountChecker<'a> {
    pub fn new(expect: &'a Expectation, actual: &'a ExecutionResult) -> Self {
        CountChecker { expect, actual }
    }
}

impl Checker for CountChecker<'_> {
    fn name(&self) -> &'static str {
        "count"
    }

    fn check(&self) -> Result<(), CheckErrorKind> {
        // A negative count means "unspecified"; tolerated here even though
        // selection already filters it out.
        if self.expect.count < 0 {
            return Ok(());
        }
        if self.expect.count as u64 != self.actual.count() {
            return Err(CheckErrorKind::CountMismatch {
                expected: self.expect.count,
                actual: self.actual.count(),
            });
        }
        Ok(())
    }
}

/// Option-map checker: every expected entry must be present in the result's
/// option map with the same value. Extra actual entries are ignored.
pub struct OptionsChecker<'a> {
    expect: &'a Expectation,
    actual: &'a ExecutionResult,
}

impl<'a> OptionsChecker<'a> {
    pub fn new(expect: &'a Expectation, actual: &'a ExecutionResult) -> Self {
        OptionsChecker { expect, actual }
    }
}

impl Checker for OptionsChecker<'_> {
    fn name(&self) -> &'static str {
        "options"
    }

    fn check(&self) -> Result<(), CheckErrorKind> {
        for (key, expected) in &self.expect.options {
            let actual = self.actual.options().get(key);
            if actual != Some(expected) {
                return Err(CheckErrorKind::OptionMismatch {
                    key: key.clone(),
                    expected: expected.clone(),
                    actual: actual.cloned(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use regex::Regex;

    use super::*;
    use crate::executor::ExecOutput;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct FakeError(String);

    fn rows_result(columns: &[&str], rows: &[&[&str]]) -> ExecutionResult {
        ExecutionResult::from_output(ExecOutput::Rows {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
            options: BTreeMap::new(),
        })
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(normalize_string("  a   b\tc "), "a b c");
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name("id int"), "id");
        assert_eq!(column_name("id"), "id");
        assert_eq!(column_name(""), "");
    }

    #[test]
    fn test_canonicalize_adapter_cell() {
        assert_eq!(canonicalize_adapter_cell("1.0"), "1");
        assert_eq!(canonicalize_adapter_cell("1.5"), "1.5");
        assert_eq!(canonicalize_adapter_cell("null"), "NULL");
        assert_eq!(canonicalize_adapter_cell(" a "), "a");
    }

    #[test]
    fn test_success_checker_expected_failure_pattern() {
        let expect = Expectation::failure_matching(Regex::new("not found").unwrap());
        let failed = ExecutionResult::from_error(FakeError("table t1 not found".into()));
        assert!(SuccessChecker::new(&expect, &failed).check().is_ok());

        let other = ExecutionResult::from_error(FakeError("syntax error".into()));
        let err = SuccessChecker::new(&expect, &other).check().unwrap_err();
        assert!(matches!(err, CheckErrorKind::ErrorMismatch { .. }));
    }

    #[test]
    fn test_success_checker_unexpected_outcomes() {
        let ok = rows_result(&[], &[]);
        let failed = ExecutionResult::from_error(FakeError("boom".into()));

        let expect_ok = Expectation::success();
        assert!(SuccessChecker::new(&expect_ok, &ok).check().is_ok());
        assert!(matches!(
            SuccessChecker::new(&expect_ok, &failed).check(),
            Err(CheckErrorKind::UnexpectedFailure { .. })
        ));

        let expect_fail = Expectation::failure();
        assert!(SuccessChecker::new(&expect_fail, &failed).check().is_ok());
        assert!(matches!(
            SuccessChecker::new(&expect_fail, &ok).check(),
            Err(CheckErrorKind::UnexpectedSuccess)
        ));
    }

    #[test]
    fn test_columns_checker_compares_types() {
        let expect = Expectation::success().with_columns(["id int", "name string"]);
        let matching = rows_result(&["id  int", "name string"], &[]);
        assert!(ColumnsChecker::new(&expect, &matching).check().is_ok());

        let wrong_type = rows_result(&["id bigint", "name string"], &[]);
        assert!(matches!(
            ColumnsChecker::new(&expect, &wrong_type).check(),
            Err(CheckErrorKind::ColumnMismatch { .. })
        ));

        let wrong_arity = rows_result(&["id int"], &[]);
        assert!(matches!(
            ColumnsChecker::new(&expect, &wrong_arity).check(),
            Err(CheckErrorKind::ColumnCountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_adapter_columns_checker_ignores_types() {
        let expect = Expectation::success().with_columns(["id int", "name string"]);
        let adapter = rows_result(&["id", "name"], &[]);
        assert!(AdapterColumnsChecker::new(&expect, &adapter).check().is_ok());

        let renamed = rows_result(&["id", "label"], &[]);
        assert!(matches!(
            AdapterColumnsChecker::new(&expect, &renamed).check(),
            Err(CheckErrorKind::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn test_result_checker_is_order_sensitive() {
        let expect = Expectation::success().with_rows([["1", "a"], ["2", "b"]]);
        let in_order = rows_result(&["c1", "c2"], &[&["1", "a"], &["2", "b"]]);
        assert!(ResultChecker::new(&expect, &in_order).check().is_ok());

        let reordered = rows_result(&["c1", "c2"], &[&["2", "b"], &["1", "a"]]);
        assert!(matches!(
            ResultChecker::new(&expect, &reordered).check(),
            Err(CheckErrorKind::RowMismatch { .. })
        ));
    }

    #[test]
    fn test_adapter_result_checker_sorts_and_canonicalizes() {
        let expect = Expectation::success().with_rows([["1", "NULL"], ["2", "x"]]);
        let adapter = rows_result(&["c1", "c2"], &[&["2.0", "x"], &["1.0", "null"]]);
        assert!(AdapterResultChecker::new(&expect, &adapter).check().is_ok());

        let wrong = rows_result(&["c1", "c2"], &[&["3.0", "x"], &["1.0", "null"]]);
        assert!(matches!(
            AdapterResultChecker::new(&expect, &wrong).check(),
            Err(CheckErrorKind::RowMismatch { .. })
        ));
    }

    #[test]
    fn test_count_checker() {
        let expect = Expectation::success().with_count(2);
        let two = rows_result(&["c1"], &[&["1"], &["2"]]);
        assert!(CountChecker::new(&expect, &two).check().is_ok());

        let affected = ExecutionResult::from_output(ExecOutput::StatementComplete(2));
        assert!(CountChecker::new(&expect, &affected).check().is_ok());

        let one = rows_result(&["c1"], &[&["1"]]);
        assert!(matches!(
            CountChecker::new(&expect, &one).check(),
            Err(CheckErrorKind::CountMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_options_checker_ignores_extra_actual_keys() {
        let expect = Expectation::success().with_option("mode", "append");
        let mut options = BTreeMap::new();
        options.insert("mode".to_string(), "append".to_string());
        options.insert("ttl".to_string(), "0".to_string());
        let result = ExecutionResult::from_output(ExecOutput::Rows {
            columns: vec![],
            rows: vec![],
            options,
        });
        assert!(OptionsChecker::new(&expect, &result).check().is_ok());

        let missing = rows_result(&[], &[]);
        let err = OptionsChecker::new(&expect, &missing).check().unwrap_err();
        assert!(matches!(
            err,
            CheckErrorKind::OptionMismatch { actual: None, .. }
        ));
    }

    #[test]
    fn test_row_mismatch_renders_plain_diff() {
        let kind = CheckErrorKind::RowMismatch {
            expected: "1 a\n2 b".into(),
            actual: "1 a\n3 c".into(),
        };
        let rendered = kind.to_string();
        assert_eq!(
            rendered,
            "row content mismatch:\n[Diff] (-expected|+actual)\n    1 a\n-   2 b\n+   3 c"
        );
    }

    #[test]
    fn test_check_error_carries_case() {
        let err = CheckErrorKind::UnexpectedSuccess.at("select_const_0");
        assert_eq!(err.case(), "select_const_0");
        assert!(err.to_string().contains("in case select_const_0"));
    }
}
