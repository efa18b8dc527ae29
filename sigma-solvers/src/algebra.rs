//! Algebra: equation solving and expression simplification

use crate::{area_failure, conclude, unparsed};
use sigma_plugin::prelude::*;

pub struct AlgebraSolver;

static ALGEBRA_SUBJECTS: [Subject; 1] = [Subject::Algebra];
static ALGEBRA_MODES: [Mode; 2] = [Mode::Auto, Mode::Algebra];
static ALGEBRA_EXAMPLES: [&str; 3] = ["2x + 3x", "(x + 1)^2 - 1", "x^2 + 3x - 4 = 0"];

impl SolverPlugin for AlgebraSolver {
    fn meta(&self) -> SolverMeta {
        SolverMeta {
            name: "algebra",
            description: "Solve equations for a variable, or expand, factor and simplify an expression",
            subjects: &ALGEBRA_SUBJECTS,
            modes: &ALGEBRA_MODES,
            examples: &ALGEBRA_EXAMPLES,
        }
    }

    fn dispatch(&self, parsed: &ParsedExpression, mode: Mode, ctx: &SolveContext) -> ResultEnvelope {
        if !matches!(mode, Mode::Auto | Mode::Algebra) {
            return ResultEnvelope::unsupported_mode(mode.as_str());
        }
        if let Err(err) = ctx.check_names() {
            return area_failure("Algebra", &err, ctx.recorder());
        }
        match parsed {
            ParsedExpression::Raw(text) if text.contains('=') => solve_equation_text(text, ctx),
            ParsedExpression::Raw(text) => unparsed(text),
            ParsedExpression::Expression(eq @ Expr::Equation(..)) => solve_equation(eq.clone(), ctx),
            ParsedExpression::Expression(e) => simplify_steps(e, ctx),
            ParsedExpression::Matrix(_) => ResultEnvelope::failure(
                "Algebra error: expected an expression, got a matrix",
                Vec::new(),
            ),
        }
    }
}

fn solve_equation_text(text: &str, ctx: &SolveContext) -> ResultEnvelope {
    match ctx.engine().parse_equation(text, &[], &ctx.var()) {
        Ok(eq) => solve_equation(eq, ctx),
        Err(err) => area_failure("Equation solving", &err, ctx.recorder()),
    }
}

fn solve_equation(eq: Expr, ctx: &SolveContext) -> ResultEnvelope {
    let var = ctx.var();
    let mut rec = ctx.recorder();
    rec.add("Parse equation", None, Some(&eq), None, None);

    let roots = match ctx.engine().solve(&eq, &var) {
        Ok(roots) => roots,
        Err(err) => return area_failure("Equation solving", &err, rec),
    };
    let solutions = Expr::List(roots);
    rec.add(&format!("Solve for {}", var), Some(&eq), Some(&solutions), None, None);

    let result = match &solutions {
        Expr::List(roots) if roots.is_empty() => "No solution".to_string(),
        other => rec.render(other),
    };
    ResultEnvelope::success(result, rec.finalize())
}

/// Expand, factor, simplify; each step recorded only when it changes something
fn simplify_steps(e: &Expr, ctx: &SolveContext) -> ResultEnvelope {
    let engine = ctx.engine();
    let mut rec = ctx.recorder();
    rec.add("Initial expression", None, Some(e), None, None);

    let mut current = e.clone();
    let passes: [(&str, fn(&dyn Engine, &Expr) -> Expr); 3] = [
        ("Expand (distribute)", |eng, x| eng.expand(x)),
        ("Factor", |eng, x| eng.factor(x)),
        ("Simplify", |eng, x| eng.simplify(x)),
    ];
    for (rule, pass) in passes {
        let next = pass(engine, &current);
        if next != current {
            rec.add(rule, Some(&current), Some(&next), None, None);
            current = next;
        }
    }

    conclude("Algebra", &current, rec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(parsed: ParsedExpression, mode: Mode) -> ResultEnvelope {
        AlgebraSolver.dispatch(&parsed, mode, &SolveContext::default())
    }

    fn expr(text: &str) -> ParsedExpression {
        ParsedExpression::Expression(sigma_expr::parse_infix(text).unwrap())
    }

    fn rules(env: &ResultEnvelope) -> Vec<&str> {
        env.steps.iter().map(|s| s.rule.as_str()).collect()
    }

    #[test]
    fn test_like_terms_collected() {
        let env = run(expr("2x + 3x"), Mode::Auto);
        assert!(env.ok, "{:?}", env.errors);
        assert_eq!(rules(&env)[0], "Initial expression");
        assert_eq!(rules(&env)[1], "Expand (distribute)");
        assert_eq!(env.result_latex.as_deref(), Some("5 x"));
    }

    #[test]
    fn test_unchanged_expression_has_single_step() {
        let env = run(expr("x"), Mode::Algebra);
        assert!(env.ok);
        assert_eq!(rules(&env), vec!["Initial expression"]);
        assert_eq!(env.result_latex.as_deref(), Some("x"));
    }

    #[test]
    fn test_quadratic_equation() {
        let env = run(ParsedExpression::Raw("x^2 + 3x - 4 = 0".into()), Mode::Auto);
        assert!(env.ok, "{:?}", env.errors);
        assert_eq!(rules(&env), vec!["Parse equation", "Solve for x"]);
        assert_eq!(env.result_latex.as_deref(), Some("\\left[ -4, \\  1\\right]"));
    }

    #[test]
    fn test_custom_variable() {
        let ctx = SolveContext::default().with_options(Options::new().with("var", "t"));
        let env = AlgebraSolver.dispatch(&ParsedExpression::Raw("2t = 6".into()), Mode::Auto, &ctx);
        assert_eq!(rules(&env)[1], "Solve for t");
        assert_eq!(env.result_latex.as_deref(), Some("\\left[ 3\\right]"));
    }

    #[test]
    fn test_division_by_zero_fails() {
        for text in ["1/0", "x/0"] {
            let env = run(expr(text), Mode::Auto);
            assert!(!env.ok, "{} should fail", text);
            assert_eq!(
                env.errors,
                vec!["Algebra error: undefined result (division by zero or an indeterminate form)".to_string()]
            );
            assert_eq!(rules(&env)[0], "Initial expression");
            assert!(env.result_latex.is_none());
        }
    }

    #[test]
    fn test_no_solution() {
        let env = run(ParsedExpression::Raw("x^2 + 1 = x^2".into()), Mode::Auto);
        assert!(env.ok);
        assert_eq!(env.result_latex.as_deref(), Some("No solution"));
    }

    #[test]
    fn test_identity_is_an_error() {
        let env = run(ParsedExpression::Raw("x + 1 = 1 + x".into()), Mode::Auto);
        assert!(!env.ok);
        assert!(env.errors[0].starts_with("Equation solving error:"));
        assert_eq!(rules(&env), vec!["Parse equation"]);
    }

    #[test]
    fn test_unsupported_mode() {
        let env = run(expr("x"), Mode::Derivative);
        assert_eq!(env.errors, vec!["Unsupported mode: derivative".to_string()]);
        assert!(env.steps.is_empty());
    }

    #[test]
    fn test_raw_without_equation() {
        let env = run(ParsedExpression::Raw("x +* 2".into()), Mode::Auto);
        assert_eq!(env.errors, vec!["Unable to parse query: 'x +* 2'".to_string()]);
    }
}
