//! Case runner: execute a case through an executor and run its selected
//! checkers.

use std::fmt::{self, Display};
use std::sync::Arc;

use futures::executor::block_on;

use crate::case::{EngineKind, TestCase};
use crate::checker::CheckError;
use crate::executor::{AsyncExecutor, ExecutionResult};
use crate::select::select_checkers;

/// All check failures of one case.
///
/// For colored error message, use `self.display()`.
#[derive(Clone, Debug, thiserror::Error)]
pub struct CaseError {
    case: Arc<str>,
    errors: Vec<CheckError>,
}

impl Display for CaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "case {} failed", self.case)?;
        write!(f, "Caused by:")?;
        for e in &self.errors {
            writeln!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl CaseError {
    /// Returns the case descriptor.
    pub fn case(&self) -> &str {
        &self.case
    }

    /// The individual check failures, in checker order.
    pub fn errors(&self) -> &[CheckError] {
        &self.errors
    }

    pub fn display(&self, colorize: bool) -> CaseErrorDisplay<'_> {
        CaseErrorDisplay {
            err: self,
            colorize,
        }
    }
}

/// Overrides the `Display` implementation of [`CaseError`] to support
/// controlling colorization.
pub struct CaseErrorDisplay<'a> {
    err: &'a CaseError,
    colorize: bool,
}

impl<'a> Display for CaseErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "case {} failed", self.err.case)?;
        write!(f, "Caused by:")?;
        for e in &self.err.errors {
            writeln!(f, "{}", e.display(self.colorize))?;
        }
        Ok(())
    }
}

/// Failures collected over a whole suite.
#[derive(Clone, Debug, thiserror::Error)]
pub struct SuiteError {
    errors: Vec<CaseError>,
}

impl Display for SuiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} case(s) failed", self.errors.len())?;
        write!(f, "Caused by:")?;
        for e in &self.errors {
            writeln!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl SuiteError {
    pub fn errors(&self) -> &[CaseError] {
        &self.errors
    }

    pub fn display(&self, colorize: bool) -> SuiteErrorDisplay<'_> {
        SuiteErrorDisplay {
            err: self,
            colorize,
        }
    }
}

/// Overrides the `Display` implementation of [`SuiteError`] to support
/// controlling colorization.
pub struct SuiteErrorDisplay<'a> {
    err: &'a SuiteError,
    colorize: bool,
}

impl<'a> Display for SuiteErrorDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} case(s) failed", self.err.errors.len())?;
        write!(f, "Caused by:")?;
        for e in &self.err.errors {
            writeln!(f, "{}", e.display(self.colorize))?;
        }
        Ok(())
    }
}

/// Case runner against one executor.
pub struct Runner<E: AsyncExecutor> {
    executor: E,
    engine_kind: EngineKind,
}

impl<E: AsyncExecutor> Runner<E> {
    /// Creates a new runner on the given executor.
    pub fn new(executor: E, engine_kind: EngineKind) -> Self {
        Runner {
            executor,
            engine_kind,
        }
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine_kind
    }

    /// Executes the case's SQL and wraps the outcome.
    ///
    /// Executor errors are folded into the result rather than returned: a
    /// failing execution is a checkable outcome, since the case may expect
    /// failure.
    pub async fn execute_case(&mut self, case: &TestCase) -> ExecutionResult {
        match self.executor.run(&case.sql).await {
            Ok(out) => ExecutionResult::from_output(out),
            Err(e) => ExecutionResult::from_error(e),
        }
    }

    /// Runs a single case: execute, select the applicable checkers, run each
    /// in order and aggregate every failure.
    ///
    /// Excluded cases are skipped and report success.
    pub async fn run_case_async(&mut self, case: &TestCase) -> Result<(), CaseError> {
        if case.is_excluded(self.engine_kind) {
            tracing::info!(case = %case.desc, engine = %self.engine_kind, "case excluded, skipping");
            return Ok(());
        }
        tracing::info!(case = %case.desc, engine = %self.engine_kind, sql = %case.sql, "checking");

        let result = self.execute_case(case).await;
        let checkers = select_checkers(Some(case), &result, self.engine_kind);

        let mut errors = vec![];
        for checker in &checkers {
            match checker.check() {
                Ok(()) => tracing::debug!(case = %case.desc, checker = checker.name(), "passed"),
                Err(kind) => {
                    tracing::debug!(case = %case.desc, checker = checker.name(), "failed");
                    errors.push(kind.at(case.desc.as_str()));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CaseError {
                case: case.desc.as_str().into(),
                errors,
            })
        }
    }

    /// Runs a single case.
    pub fn run_case(&mut self, case: &TestCase) -> Result<(), CaseError> {
        block_on(self.run_case_async(case))
    }

    /// Runs every case in the suite, collecting all case failures.
    pub async fn run_suite_async<'a>(
        &mut self,
        cases: impl IntoIterator<Item = &'a TestCase>,
    ) -> Result<(), SuiteError> {
        let mut errors = vec![];
        for case in cases {
            if let Err(e) = self.run_case_async(case).await {
                errors.push(e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(SuiteError { errors })
        }
    }

    /// Runs every case in the suite.
    pub fn run_suite<'a>(
        &mut self,
        cases: impl IntoIterator<Item = &'a TestCase>,
    ) -> Result<(), SuiteError> {
        block_on(self.run_suite_async(cases))
    }
}
