//! Declarative SQL test-case checker.
//!
//! A [`TestCase`] carries one SQL text and its expected outcome facets —
//! column shape, row content, row count, result options and the implicit
//! success/failure expectation — optionally overridden per engine kind.
//! Running a case through an executor produces an [`ExecutionResult`], and
//! [`select_checkers`] decides which [`Checker`]s validate it: adapter-backed
//! reference engines (sqlite, mysql) get adapter-aware column and row
//! comparison, the native engine gets the exact ones.
//!
//! # Usage
//!
//! Implement [`Executor`] for your engine connection:
//!
//! ```ignore
//! struct Database {...}
//!
//! impl casecheck::Executor for Database {
//!     type Error = ...;
//!     fn run(&mut self, sql: &str) -> Result<ExecOutput, Self::Error> {
//!         ...
//!     }
//! }
//! ```
//!
//! Create a [`Runner`] on it and run your cases:
//!
//! ```ignore
//! let mut runner = casecheck::Runner::new(Database::new(), EngineKind::Native);
//! runner.run_suite(&cases)?;
//! ```
//!
//! You can also execute a case and drive the selected checkers yourself:
//!
//! ```ignore
//! let checkers = casecheck::select_checkers(Some(&case), &result, kind);
//! for checker in checkers {
//!     checker.check()?;
//! }
//! ```

pub mod case;
pub mod checker;
pub mod executor;
pub mod runner;
pub mod select;

pub use self::case::*;
pub use self::checker::*;
pub use self::executor::*;
pub use self::runner::*;
pub use self::select::*;

pub mod harness;
