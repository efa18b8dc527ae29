//! Discrete math: propositional logic and counting

use crate::{area_failure, conclude, unparsed};
use regex::Regex;
use sigma_plugin::prelude::*;
use std::sync::OnceLock;

pub struct DiscreteSolver;

static DISCRETE_SUBJECTS: [Subject; 1] = [Subject::Discrete];
static DISCRETE_MODES: [Mode; 3] = [Mode::Auto, Mode::Logic, Mode::Combinatorics];
static DISCRETE_EXAMPLES: [&str; 4] = ["p & (p | q)", "p -> q", "C(5,2)", "P(5,2)"];

impl SolverPlugin for DiscreteSolver {
    fn meta(&self) -> SolverMeta {
        SolverMeta {
            name: "discrete",
            description: "Simplify propositional formulas; count combinations and permutations",
            subjects: &DISCRETE_SUBJECTS,
            modes: &DISCRETE_MODES,
            examples: &DISCRETE_EXAMPLES,
        }
    }

    fn dispatch(&self, parsed: &ParsedExpression, mode: Mode, ctx: &SolveContext) -> ResultEnvelope {
        match mode {
            Mode::Auto | Mode::Logic => simplify_logic(parsed, ctx),
            Mode::Combinatorics => combinatorics(parsed, ctx),
            other => ResultEnvelope::unsupported_mode(other.as_str()),
        }
    }
}

// ========== Logic ==========

fn simplify_logic(parsed: &ParsedExpression, ctx: &SolveContext) -> ResultEnvelope {
    let e = match parsed {
        ParsedExpression::Expression(e) => e,
        ParsedExpression::Raw(text) => return unparsed(text),
        ParsedExpression::Matrix(_) => {
            return ResultEnvelope::failure(
                "Logic simplification error: expected a formula, got a matrix",
                Vec::new(),
            )
        }
    };
    let mut rec = ctx.recorder();
    rec.add("Initial expression", None, Some(e), None, None);

    let simplified = match ctx.engine().simplify_logic(e) {
        Ok(s) => s,
        Err(err) => return area_failure("Logic simplification", &err, rec),
    };
    rec.add("Apply logical identities", Some(e), Some(&simplified), None, None);

    let latex = rec.render(&simplified);
    ResultEnvelope::success(latex, rec.finalize())
}

// ========== Combinatorics ==========

/// `C(n, r)` or `P(n, r)` with whatever sits between the parentheses
fn template_regex(letter: char) -> Option<&'static Regex> {
    static COMBINATION: OnceLock<Option<Regex>> = OnceLock::new();
    static PERMUTATION: OnceLock<Option<Regex>> = OnceLock::new();
    let cell = if letter == 'C' { &COMBINATION } else { &PERMUTATION };
    cell.get_or_init(|| Regex::new(&format!(r"\b{}\(\s*([^(),]*?)\s*,\s*([^(),]*?)\s*\)", letter)).ok())
        .as_ref()
}

/// A matched counting template
#[derive(Debug, Clone, PartialEq)]
enum Template {
    Combination(u64, u64),
    Permutation(u64, u64),
}

/// First `C(…)` template, else first `P(…)`; arguments must be
/// non-negative integer literals
fn find_template(text: &str) -> Result<Option<Template>, SigmaError> {
    for letter in ['C', 'P'] {
        let caps = match template_regex(letter).and_then(|re| re.captures(text)) {
            Some(c) => c,
            None => continue,
        };
        let (n_text, r_text) = (&caps[1], &caps[2]);
        return match (n_text.parse::<u64>(), r_text.parse::<u64>()) {
            (Ok(n), Ok(r)) if letter == 'C' => Ok(Some(Template::Combination(n, r))),
            (Ok(n), Ok(r)) => Ok(Some(Template::Permutation(n, r))),
            _ => Err(SigmaError::unsupported(format!(
                "{}({}, {}) needs non-negative integer literals",
                letter, n_text, r_text
            ))
            .with_suggestion("Write the counts as whole numbers, e.g. C(5, 2)")),
        };
    }
    Ok(None)
}

fn combinatorics(parsed: &ParsedExpression, ctx: &SolveContext) -> ResultEnvelope {
    let engine = ctx.engine();
    let mut rec = ctx.recorder();

    let text = match parsed {
        ParsedExpression::Expression(e) if ctx.raw.trim().is_empty() => e.to_string(),
        ParsedExpression::Raw(text) if ctx.raw.trim().is_empty() => text.clone(),
        _ => ctx.raw.clone(),
    };
    match parsed {
        ParsedExpression::Expression(e) => rec.add("Parse query", None, Some(e), None, None),
        ParsedExpression::Matrix(m) => rec.add("Parse query", None, Some(m), None, None),
        ParsedExpression::Raw(raw) => rec.add("Parse query", None, Some(raw), None, None),
    }

    let template = match find_template(&text) {
        Ok(t) => t,
        Err(err) => return area_failure("Combinatorics", &err, rec),
    };

    match template {
        Some(Template::Combination(n, r)) => {
            let value = match engine.binomial(n, r) {
                Ok(v) => Expr::Number(v),
                Err(err) => return area_failure("Combinatorics", &err, rec),
            };
            rec.add(
                &format!("Combination C({},{})", n, r),
                None,
                Some(&value),
                Some(combination_note(n, r)),
                None,
            );
            let latex = rec.render(&value);
            ResultEnvelope::success(latex, rec.finalize())
        }
        Some(Template::Permutation(n, r)) => {
            let value = match engine.permutations(n, r) {
                Ok(v) => Expr::Number(v),
                Err(err) => return area_failure("Combinatorics", &err, rec),
            };
            rec.add(
                &format!("Permutation P({},{})", n, r),
                None,
                Some(&value),
                Some(permutation_note(n, r)),
                None,
            );
            let latex = rec.render(&value);
            ResultEnvelope::success(latex, rec.finalize())
        }
        None => {
            let e = match parsed {
                ParsedExpression::Expression(e) => e,
                ParsedExpression::Raw(text) => return unparsed(text),
                ParsedExpression::Matrix(_) => {
                    return ResultEnvelope::failure(
                        "Combinatorics error: expected an expression, got a matrix",
                        rec.finalize(),
                    )
                }
            };
            let value = match engine.evaluate(e) {
                Ok(v) => v,
                Err(err) => return area_failure("Combinatorics", &err, rec),
            };
            rec.add("Evaluate", Some(e), Some(&value), None, None);
            conclude("Combinatorics", &value, rec)
        }
    }
}

fn combination_note(n: u64, r: u64) -> String {
    if r > n {
        return format!("r > n: no way to choose {} of {}, so C({},{}) = 0", r, n, n, r);
    }
    format!("n!/(r!(n-r)!) = {}!/({}!{}!)", n, r, n - r)
}

fn permutation_note(n: u64, r: u64) -> String {
    if r > n {
        return format!("r > n: no way to arrange {} of {}, so P({},{}) = 0", r, n, n, r);
    }
    format!("n!/(n-r)! = {}!/{}!", n, n - r)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(raw: &str, mode: Mode) -> ResultEnvelope {
        let parsed = match sigma_expr::parse_infix(raw) {
            Ok(e) => ParsedExpression::Expression(e),
            Err(_) => ParsedExpression::Raw(raw.to_string()),
        };
        let ctx = SolveContext::default().with_subject(Subject::Discrete).with_raw(raw);
        DiscreteSolver.dispatch(&parsed, mode, &ctx)
    }

    fn rules(env: &ResultEnvelope) -> Vec<&str> {
        env.steps.iter().map(|s| s.rule.as_str()).collect()
    }

    mod logic_tests {
        use super::*;

        #[test]
        fn test_absorption() {
            let env = run("p & (p | q)", Mode::Logic);
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env), vec!["Initial expression", "Apply logical identities"]);
            assert_eq!(env.result_latex.as_deref(), Some("p"));
        }

        #[test]
        fn test_auto_is_logic() {
            let env = run("p | ~p", Mode::Auto);
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(env.result_latex.as_deref(), Some("\\text{True}"));
        }

        #[test]
        fn test_non_logical_input() {
            let env = run("x + 1", Mode::Logic);
            assert!(!env.ok);
            assert!(env.errors[0].starts_with("Logic simplification error:"));
            assert_eq!(rules(&env), vec!["Initial expression"]);
        }
    }

    mod counting_tests {
        use super::*;

        #[test]
        fn test_combination() {
            let env = run("C(5,2)", Mode::Combinatorics);
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env), vec!["Parse query", "Combination C(5,2)"]);
            assert_eq!(env.steps[1].note.as_deref(), Some("n!/(r!(n-r)!) = 5!/(2!3!)"));
            assert_eq!(env.result_latex.as_deref(), Some("10"));
        }

        #[test]
        fn test_permutation_with_spaces() {
            let env = run("P(5, 2)", Mode::Combinatorics);
            assert_eq!(rules(&env)[1], "Permutation P(5,2)");
            assert_eq!(env.steps[1].note.as_deref(), Some("n!/(n-r)! = 5!/3!"));
            assert_eq!(env.result_latex.as_deref(), Some("20"));
        }

        #[test]
        fn test_combination_checked_first() {
            let env = run("P(4,1) + C(4,2)", Mode::Combinatorics);
            assert_eq!(rules(&env)[1], "Combination C(4,2)");
        }

        #[test]
        fn test_non_integer_arguments_rejected() {
            let env = run("C(n,2)", Mode::Combinatorics);
            assert!(!env.ok);
            assert_eq!(
                env.errors,
                vec!["Combinatorics error: C(n, 2) needs non-negative integer literals".to_string()]
            );
        }

        #[test]
        fn test_choose_more_than_available() {
            let env = run("C(3,5)", Mode::Combinatorics);
            assert_eq!(env.result_latex.as_deref(), Some("0"));
            assert_eq!(
                env.steps[1].note.as_deref(),
                Some("r > n: no way to choose 5 of 3, so C(3,5) = 0")
            );
            let env = run("P(2,4)", Mode::Combinatorics);
            assert_eq!(env.result_latex.as_deref(), Some("0"));
            assert!(!env.steps[1].note.as_deref().unwrap().contains('-'));
        }

        #[test]
        fn test_fallback_evaluates() {
            let env = run("5!", Mode::Combinatorics);
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env), vec!["Parse query", "Evaluate"]);
            assert_eq!(env.result_latex.as_deref(), Some("120"));
        }

        #[test]
        fn test_template_found_in_raw_text() {
            assert_eq!(find_template("how many C( 6 , 3 )?").unwrap(), Some(Template::Combination(6, 3)));
            assert_eq!(find_template("ABC(1,2)").unwrap(), None);
            assert_eq!(find_template("no template").unwrap(), None);
        }
    }

    #[test]
    fn test_unsupported_modes() {
        let env = run("p", Mode::Recurrence);
        assert_eq!(env.errors, vec!["Unsupported mode: recurrence".to_string()]);
        assert!(env.steps.is_empty());
    }
}
