//! Shared test utilities for promptfmt.

pub mod fixtures;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

impl<I, E> TestCase<I, E> {
    pub const fn new(name: &'static str, input: I, expected: E) -> Self {
        Self {
            name,
            input,
            expected,
        }
    }
}

/// Run every case, collecting all mismatches instead of stopping at the
/// first one.
pub fn run_table_tests<I, E, F>(cases: &[TestCase<I, E>], test_fn: F) -> Result<(), String>
where
    I: std::fmt::Debug,
    E: std::fmt::Debug + PartialEq,
    F: Fn(&I) -> E,
{
    let failures: Vec<String> = cases
        .iter()
        .filter_map(|case| {
            let actual = test_fn(&case.input);
            (actual != case.expected).then(|| {
                format!(
                    "'{}': input {:?}: expected {:?}, got {:?}",
                    case.name, case.input, case.expected, actual
                )
            })
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_table_tests_reports_every_failure() {
        let cases = [
            TestCase::new("double one", 1, 2),
            TestCase::new("double two", 2, 5),
            TestCase::new("double three", 3, 7),
        ];
        let err = run_table_tests(&cases, |n| n * 2).unwrap_err();
        assert_eq!(err.lines().count(), 2);
        assert!(err.contains("'double two'"));
        assert!(run_table_tests(&cases[..1], |n| n * 2).is_ok());
    }
}
