//! Executor traits and the execution-result model.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

/// What an executor hands back for one successful SQL execution.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExecOutput {
    /// A result set.
    Rows {
        /// Column headers, `"name type"` pairs for the native engine, bare
        /// names for adapter-backed engines.
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
        /// Engine-reported properties of the result, e.g. job or table
        /// options. Empty for engines that report none.
        options: BTreeMap<String, String>,
    },
    /// A statement completed without a result set.
    ///
    /// The number of rows affected is returned.
    StatementComplete(u64),
}

/// The async executor running SQL against the engine under test.
#[async_trait]
pub trait AsyncExecutor: Send {
    /// The error type of SQL execution.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Async run a SQL text and return the output.
    async fn run(&mut self, sql: &str) -> Result<ExecOutput, Self::Error>;

    /// Engine name of the current executor.
    fn engine_name(&self) -> &str {
        ""
    }
}

/// The blocking executor running SQL against the engine under test.
pub trait Executor: Send {
    /// The error type of SQL execution.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run a SQL text and return the output.
    fn run(&mut self, sql: &str) -> Result<ExecOutput, Self::Error>;

    /// Engine name of the current executor.
    fn engine_name(&self) -> &str {
        ""
    }
}

/// Compat-layer for the `AsyncExecutor` and `Executor` traits.
#[async_trait]
impl<E> AsyncExecutor for E
where
    E: Executor,
{
    type Error = <E as Executor>::Error;

    async fn run(&mut self, sql: &str) -> Result<ExecOutput, Self::Error> {
        <E as Executor>::run(self, sql)
    }

    fn engine_name(&self) -> &str {
        <E as Executor>::engine_name(self)
    }
}

/// The actual outcome of running a case against an engine.
///
/// Transport and execution errors are folded into the result rather than
/// propagated: a failed execution is a perfectly checkable outcome, since a
/// case may expect failure.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    ok: bool,
    error: Option<Arc<dyn std::error::Error + Send + Sync>>,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    count: u64,
    options: BTreeMap<String, String>,
}

impl ExecutionResult {
    /// Wraps a successful execution output.
    pub fn from_output(out: ExecOutput) -> Self {
        match out {
            ExecOutput::Rows {
                columns,
                rows,
                options,
            } => {
                let count = rows.len() as u64;
                ExecutionResult {
                    ok: true,
                    error: None,
                    columns,
                    rows,
                    count,
                    options,
                }
            }
            ExecOutput::StatementComplete(count) => ExecutionResult {
                ok: true,
                error: None,
                columns: vec![],
                rows: vec![],
                count,
                options: BTreeMap::new(),
            },
        }
    }

    /// Wraps a failed execution.
    pub fn from_error(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        ExecutionResult {
            ok: false,
            error: Some(Arc::new(err)),
            columns: vec![],
            rows: vec![],
            count: 0,
            options: BTreeMap::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn error(&self) -> Option<&Arc<dyn std::error::Error + Send + Sync>> {
        self.error.as_ref()
    }

    /// Column headers of the result set, empty for statements.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of returned rows for queries, affected rows for statements.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_from_rows_counts_rows() {
        let result = ExecutionResult::from_output(ExecOutput::Rows {
            columns: vec!["a int".into()],
            rows: vec![vec!["1".into()], vec!["2".into()]],
            options: BTreeMap::new(),
        });
        assert!(result.is_ok());
        assert!(result.error().is_none());
        assert_eq!(result.count(), 2);
    }

    #[test]
    fn test_from_statement_keeps_affected_count() {
        let result = ExecutionResult::from_output(ExecOutput::StatementComplete(7));
        assert!(result.is_ok());
        assert_eq!(result.count(), 7);
        assert!(result.rows().is_empty());
    }

    #[test]
    fn test_from_error_is_not_ok() {
        let result = ExecutionResult::from_error(Boom);
        assert!(!result.is_ok());
        assert_eq!(result.error().unwrap().to_string(), "boom");
        assert_eq!(result.count(), 0);
    }
}
