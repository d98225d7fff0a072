//! Combines alternative ways of detecting the same setting into one outcome.

use crate::results::{CheckStatus, CheckerResult};
use log::{debug, info};

/// Runs every alternative and passes if any one of them passes.
///
/// Each alternative is a description of the detection method and a closure producing its
/// outcome. All alternatives are run even once one has passed, so that a failure can list what
/// every method found. When none passes the outcome is `FAIL`, or `ERROR` if no alternative
/// could reach a verdict at all.
///
/// When `skip_reason` is given, nothing is run and the outcome is `SKIP` with that reason.
pub fn evaluate_any<I, F>(skip_reason: Option<&str>, alternatives: I) -> CheckerResult
where
    I: IntoIterator<Item = (String, F)>,
    F: FnOnce() -> CheckerResult,
{
    if let Some(reason) = skip_reason {
        info!("Skipping: {}", reason);
        return CheckerResult::skip(reason);
    }

    let outcomes: Vec<(String, CheckerResult)> = alternatives
        .into_iter()
        .map(|(description, check)| {
            let outcome = check();
            debug!("[{}] {}: {}", outcome.status, description, outcome.explanation);
            (description, outcome)
        })
        .collect();

    if outcomes.is_empty() {
        return CheckerResult::error("no detection methods given");
    }

    if let Some((description, outcome)) = outcomes
        .iter()
        .find(|(_, outcome)| outcome.status == CheckStatus::PASS)
    {
        return CheckerResult::pass(format!("{}: {}", description, outcome.explanation));
    }

    let status = if outcomes
        .iter()
        .all(|(_, outcome)| outcome.status == CheckStatus::ERROR)
    {
        CheckStatus::ERROR
    } else {
        CheckStatus::FAIL
    };
    let explanation = outcomes
        .iter()
        .map(|(description, outcome)| {
            format!("[{}] {}: {}", outcome.status, description, outcome.explanation)
        })
        .collect::<Vec<String>>()
        .join("; ");
    CheckerResult::new(status, explanation)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::Cell;

    type Thunk<'a> = Box<dyn FnOnce() -> CheckerResult + 'a>;

    fn alternative<'a>(description: &str, result: CheckerResult) -> (String, Thunk<'a>) {
        (description.to_string(), Box::new(move || result))
    }

    #[test]
    fn any_pass_passes() {
        let result = evaluate_any(
            None,
            vec![
                alternative("config file", CheckerResult::fail("found 10255, expected 0")),
                alternative("service flag", CheckerResult::pass("found \"0\", expected 0")),
            ],
        );
        assert_eq!(result.status, CheckStatus::PASS);
        assert!(result.explanation.starts_with("service flag"));
    }

    #[test]
    fn all_alternatives_run() {
        let runs = Cell::new(0);
        let counter = &runs;
        let count = move |result: CheckerResult| {
            move || {
                counter.set(counter.get() + 1);
                result
            }
        };
        let result = evaluate_any(
            None,
            vec![
                ("a".to_string(), count(CheckerResult::pass("ok"))),
                ("b".to_string(), count(CheckerResult::fail("no"))),
                ("c".to_string(), count(CheckerResult::error("unreachable"))),
            ],
        );
        assert_eq!(result.status, CheckStatus::PASS);
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn failure_lists_every_alternative() {
        let result = evaluate_any(
            None,
            vec![
                alternative("config file", CheckerResult::fail("found false")),
                alternative("service flag", CheckerResult::error("source unavailable")),
            ],
        );
        assert_eq!(result.status, CheckStatus::FAIL);
        assert_eq!(
            result.explanation,
            "[FAIL] config file: found false; [ERROR] service flag: source unavailable"
        );
    }

    #[test]
    fn only_errors_is_error() {
        let result = evaluate_any(
            None,
            vec![
                alternative("config file", CheckerResult::error("no inputs given")),
                alternative("service flag", CheckerResult::error("systemctl failed")),
            ],
        );
        assert_eq!(result.status, CheckStatus::ERROR);
        assert!(result.explanation.contains("no inputs given"));
        assert!(result.explanation.contains("systemctl failed"));
    }

    #[test]
    fn order_does_not_change_status() {
        let outcomes = [
            CheckerResult::fail("a"),
            CheckerResult::error("b"),
            CheckerResult::pass("c"),
        ];
        let forward: Vec<_> = outcomes
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, r)| alternative(&i.to_string(), r))
            .collect();
        let reverse: Vec<_> = outcomes
            .iter()
            .cloned()
            .enumerate()
            .rev()
            .map(|(i, r)| alternative(&i.to_string(), r))
            .collect();
        assert_eq!(evaluate_any(None, forward).status, CheckStatus::PASS);
        assert_eq!(evaluate_any(None, reverse).status, CheckStatus::PASS);

        let forward = vec![
            alternative("a", CheckerResult::fail("a")),
            alternative("b", CheckerResult::error("b")),
        ];
        let reverse = vec![
            alternative("b", CheckerResult::error("b")),
            alternative("a", CheckerResult::fail("a")),
        ];
        assert_eq!(evaluate_any(None, forward).status, CheckStatus::FAIL);
        assert_eq!(evaluate_any(None, reverse).status, CheckStatus::FAIL);
    }

    #[test]
    fn skip_runs_nothing() {
        let ran = Cell::new(false);
        let result = evaluate_any(
            Some("N/A - Node using external authority/tool to handle certificate rotation"),
            vec![(
                "config file".to_string(),
                || {
                    ran.set(true);
                    CheckerResult::pass("")
                },
            )],
        );
        assert_eq!(result.status, CheckStatus::SKIP);
        assert!(result.explanation.contains("external authority"));
        assert!(!ran.get());
    }

    #[test]
    fn no_alternatives() {
        let none: Vec<(String, Thunk<'static>)> = Vec::new();
        assert_eq!(evaluate_any(None, none).status, CheckStatus::ERROR);
    }
}
