//! Checker selection: decide which checkers apply to one executed case.

use crate::case::{EngineKind, TestCase};
use crate::checker::{
    AdapterColumnsChecker, AdapterResultChecker, Checker, ColumnsChecker, CountChecker,
    OptionsChecker, ResultChecker, SuccessChecker,
};
use crate::executor::ExecutionResult;

/// Assembles the ordered list of checkers to run for one executed case.
///
/// The success checker always comes first: it is the baseline assertion
/// that the execution succeeded or failed as expected. After it come the
/// column-shape check, the row-content check, the row-count check and the
/// options check, each selected only when the resolved expectation
/// specifies that facet.
///
/// The engine kind picks the checker flavor: both adapter-backed engines
/// take the adapter columns checker, while only sqlite takes the adapter
/// rows checker — mysql rows compare with the native checker.
///
/// An absent `case` yields an empty list: nothing to verify is a valid
/// outcome, not an error. The function is pure and returns a fresh list on
/// every call; checkers never look at each other's results.
pub fn select_checkers<'a>(
    case: Option<&'a TestCase>,
    result: &'a ExecutionResult,
    kind: EngineKind,
) -> Vec<Box<dyn Checker + 'a>> {
    let Some(case) = case else {
        return vec![];
    };
    let expect = case.expect_for(kind);

    let mut checkers: Vec<Box<dyn Checker + 'a>> =
        vec![Box::new(SuccessChecker::new(expect, result))];

    if !expect.columns.is_empty() {
        match kind {
            EngineKind::Sqlite | EngineKind::Mysql => {
                checkers.push(Box::new(AdapterColumnsChecker::new(expect, result)))
            }
            EngineKind::Native => checkers.push(Box::new(ColumnsChecker::new(expect, result))),
        }
    }

    if !expect.rows.is_empty() {
        match kind {
            EngineKind::Sqlite => {
                checkers.push(Box::new(AdapterResultChecker::new(expect, result)))
            }
            EngineKind::Native | EngineKind::Mysql => {
                checkers.push(Box::new(ResultChecker::new(expect, result)))
            }
        }
    }

    if expect.count >= 0 {
        checkers.push(Box::new(CountChecker::new(expect, result)));
    }

    if !expect.options.is_empty() {
        checkers.push(Box::new(OptionsChecker::new(expect, result)));
    }

    checkers
}
