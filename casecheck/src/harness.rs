use futures::executor::block_on;
pub use libtest_mimic::{run, Arguments, Failed, Trial};

use crate::case::{EngineKind, TestCase};
use crate::executor::AsyncExecutor;
use crate::runner::Runner;

/// * `executor_fn`: `fn() -> impl AsyncExecutor`
/// * `kind`: the [`EngineKind`] the executor runs against.
/// * `suite_fn`: `fn() -> Vec<TestCase>`, the suite to check.
#[macro_export]
macro_rules! harness {
    ($executor_fn:path, $kind:expr, $suite_fn:path) => {
        fn main() {
            let kind = $kind;
            let mut tests = vec![];

            for case in $suite_fn() {
                let excluded = case.is_excluded(kind);
                tests.push(
                    $crate::harness::Trial::test(case.desc.clone(), move || {
                        $crate::harness::test(&case, $executor_fn(), kind)
                    })
                    .with_ignored_flag(excluded),
                );
            }

            if tests.is_empty() {
                panic!("no test case in suite");
            }

            $crate::harness::run(&$crate::harness::Arguments::from_args(), tests).exit();
        }
    };
}

pub fn test(case: &TestCase, executor: impl AsyncExecutor, kind: EngineKind) -> Result<(), Failed> {
    let mut runner = Runner::new(executor, kind);
    block_on(runner.run_case_async(case))?;
    Ok(())
}
