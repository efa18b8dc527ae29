//! Calculus: derivatives, integrals, limits, series and ODEs
//!
//! Options read here: `var`, `definite`/`lower`/`upper`, `point`, `dir`,
//! `n` and `func`. Integral, limit and derivative wrappers parsed from the
//! query take precedence over the options.

mod rules;

pub use rules::detect_rule;

use crate::{area_failure, conclude, unparsed};
use sigma_plugin::prelude::*;

/// Series order when the `n` option is absent
pub const DEFAULT_SERIES_ORDER: u32 = 6;

pub struct CalculusSolver;

static CALCULUS_SUBJECTS: [Subject; 2] = [Subject::Calc1, Subject::Calc2];
static CALCULUS_MODES: [Mode; 6] = [
    Mode::Auto,
    Mode::Derivative,
    Mode::Integral,
    Mode::Limit,
    Mode::Series,
    Mode::Ode,
];
static CALCULUS_EXAMPLES: [&str; 5] = [
    "sin(x^2)",
    "\\int_0^1 x^2 dx",
    "\\lim_{x \\to 0} \\frac{\\sin x}{x}",
    "exp(x)",
    "y'' + y = 0",
];

impl SolverPlugin for CalculusSolver {
    fn meta(&self) -> SolverMeta {
        SolverMeta {
            name: "calculus",
            description: "Derivatives with rule narration, integrals, limits, Taylor series and linear ODEs",
            subjects: &CALCULUS_SUBJECTS,
            modes: &CALCULUS_MODES,
            examples: &CALCULUS_EXAMPLES,
        }
    }

    fn dispatch(&self, parsed: &ParsedExpression, mode: Mode, ctx: &SolveContext) -> ResultEnvelope {
        match mode {
            Mode::Auto | Mode::Derivative | Mode::Integral | Mode::Limit | Mode::Series | Mode::Ode => {}
            other => return ResultEnvelope::unsupported_mode(other.as_str()),
        }
        if let Err(err) = ctx.check_names() {
            return area_failure("Calculus", &err, ctx.recorder());
        }
        if mode == Mode::Ode {
            return do_ode(parsed, ctx);
        }
        let e = match parsed {
            ParsedExpression::Expression(e) => e,
            ParsedExpression::Raw(text) => return unparsed(text),
            ParsedExpression::Matrix(_) => {
                return ResultEnvelope::failure("Calculus error: expected an expression, got a matrix", Vec::new())
            }
        };
        match mode {
            Mode::Integral => do_integral(e, ctx),
            Mode::Limit => do_limit(e, ctx),
            Mode::Series => do_series(e, ctx),
            _ => do_derivative(e, ctx),
        }
    }
}

// ========== Derivative ==========

fn do_derivative(e: &Expr, ctx: &SolveContext) -> ResultEnvelope {
    let engine = ctx.engine();
    let (target, var, order) = match e {
        Expr::Derivative(inner, var, n) => (inner.as_ref(), var.clone(), *n),
        other => (other, ctx.var(), 1),
    };
    let mut rec = ctx.recorder();
    rec.add("Initial expression", None, Some(target), None, None);

    let rule = detect_rule(target, &var);
    rec.add(&format!("{}: prepare", rule), Some(target), None, None, None);

    let mut result = target.clone();
    for _ in 0..order {
        result = match engine.differentiate(&result, &var) {
            Ok(d) => d,
            Err(err) => return area_failure("Derivative", &err, rec),
        };
    }
    let label = if order == 1 {
        format!("Apply d/d{}", var)
    } else {
        format!("Apply d^{}/d{}^{}", order, var, order)
    };
    rec.add(&label, Some(target), Some(&result), None, None);

    let simplified = engine.simplify(&result);
    if simplified != result {
        rec.add("Simplify", Some(&result), Some(&simplified), None, None);
        result = simplified;
    }

    conclude("Derivative", &result, rec)
}

// ========== Integral ==========

fn do_integral(e: &Expr, ctx: &SolveContext) -> ResultEnvelope {
    let engine = ctx.engine();
    let rec = ctx.recorder();

    let (integrand, var, wrapped_bounds) = match e {
        Expr::Integral { integrand, var, bounds } => (
            integrand.as_ref(),
            var.clone(),
            bounds.as_ref().map(|(lo, hi)| (lo.as_ref().clone(), hi.as_ref().clone())),
        ),
        other => (other, ctx.var(), None),
    };

    let bounds = match wrapped_bounds {
        Some(b) => Some(b),
        None if ctx.options.flag("definite") => match (ctx.options.text("lower"), ctx.options.text("upper")) {
            (Some(lo), Some(hi)) => match (parse_point(engine, &lo), parse_point(engine, &hi)) {
                (Ok(lo), Ok(hi)) => Some((lo, hi)),
                (Err(err), _) | (_, Err(err)) => return area_failure("Integration", &err, rec),
            },
            _ => None,
        },
        None => None,
    };

    match bounds {
        Some((lower, upper)) => definite_integral(integrand, &var, &lower, &upper, rec, engine),
        None => indefinite_integral(integrand, &var, rec, engine),
    }
}

fn definite_integral(
    integrand: &Expr,
    var: &str,
    lower: &Expr,
    upper: &Expr,
    mut rec: StepRecorder<'_>,
    engine: &dyn Engine,
) -> ResultEnvelope {
    rec.add("Initial expression", None, Some(integrand), None, None);
    rec.add(
        "Set up definite integral",
        Some(integrand),
        None,
        Some(format!("∫[{}, {}] ... d{}", lower, upper, var)),
        None,
    );
    let result = match engine.integrate_definite(integrand, var, lower, upper) {
        Ok(r) => r,
        Err(err) => return area_failure("Integration", &err, rec),
    };
    rec.add(
        &format!("Evaluate from {} to {}", lower, upper),
        Some(integrand),
        Some(&result),
        None,
        None,
    );
    conclude("Integration", &result, rec)
}

fn indefinite_integral(integrand: &Expr, var: &str, mut rec: StepRecorder<'_>, engine: &dyn Engine) -> ResultEnvelope {
    rec.add("Initial expression", None, Some(integrand), None, None);
    rec.add(
        "Set up indefinite integral",
        Some(integrand),
        None,
        Some(format!("∫ ... d{}", var)),
        None,
    );
    if matches!(integrand.shape(), Shape::Sum(_)) {
        rec.add(
            "Apply sum rule",
            Some(integrand),
            None,
            Some("∫(f + g) = ∫f + ∫g".to_string()),
            None,
        );
    }

    let mut result = match engine.integrate(integrand, var) {
        Ok(r) => r,
        Err(err) => return area_failure("Integration", &err, rec),
    };
    rec.add("Integrate", Some(integrand), Some(&result), None, None);

    let simplified = engine.simplify(&result);
    if simplified != result {
        rec.add("Simplify", Some(&result), Some(&simplified), None, None);
        result = simplified;
    }

    conclude("Integration", &result, rec)
}

// ========== Limit ==========

fn do_limit(e: &Expr, ctx: &SolveContext) -> ResultEnvelope {
    let engine = ctx.engine();
    let mut rec = ctx.recorder();

    let (target, var, point, dir) = match e {
        Expr::Limit { expr, var, point, dir } => (expr.as_ref(), var.clone(), point.as_ref().clone(), *dir),
        other => {
            let point = match parse_point(engine, &ctx.options.text_or("point", "0")) {
                Ok(p) => p,
                Err(err) => return area_failure("Limit", &err, rec),
            };
            let dir = match ctx.options.text("dir") {
                Some(d) => match Direction::parse(&d) {
                    Some(dir) => dir,
                    None => {
                        let err = SigmaError::validation(format!("direction must be '+', '-' or '+-', got '{}'", d));
                        return area_failure("Limit", &err, rec);
                    }
                },
                None => Direction::Plus,
            };
            (other, ctx.var(), point, dir)
        }
    };

    rec.add(&format!("Limit as {} → {}", var, point), Some(target), None, None, None);
    let result = match engine.limit(target, &var, &point, dir) {
        Ok(r) => r,
        Err(err) => return area_failure("Limit", &err, rec),
    };
    rec.add("Evaluate limit", Some(target), Some(&result), None, None);

    conclude("Limit", &result, rec)
}

// ========== Series ==========

fn do_series(e: &Expr, ctx: &SolveContext) -> ResultEnvelope {
    let engine = ctx.engine();
    let mut rec = ctx.recorder();
    let var = ctx.var();

    let point = match parse_point(engine, &ctx.options.text_or("point", "0")) {
        Ok(p) => p,
        Err(err) => return area_failure("Series", &err, rec),
    };
    let order = match series_order(&ctx.options) {
        Ok(n) => n,
        Err(err) => return area_failure("Series", &err, rec),
    };

    rec.add(&format!("Taylor series centered at {}={}", var, point), Some(e), None, None, None);
    let result = match engine.series(e, &var, &point, order) {
        Ok(r) => r,
        Err(err) => return area_failure("Series", &err, rec),
    };
    rec.add(&format!("Expand to order {}", order), Some(e), Some(&result), None, None);

    conclude("Series", &result, rec)
}

fn series_order(options: &Options) -> Result<u32, SigmaError> {
    match options.text("n") {
        None => Ok(DEFAULT_SERIES_ORDER),
        Some(n) => n
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|k| *k >= 1)
            .ok_or_else(|| SigmaError::validation(format!("series order must be a positive integer, got '{}'", n))),
    }
}

// ========== ODE ==========

fn do_ode(parsed: &ParsedExpression, ctx: &SolveContext) -> ResultEnvelope {
    let engine = ctx.engine();
    let mut rec = ctx.recorder();
    let var = ctx.var();
    let func = ctx.options.text_or("func", "y");

    let text = if ctx.raw.trim().is_empty() {
        match parsed {
            ParsedExpression::Raw(text) => text.clone(),
            ParsedExpression::Expression(e) => e.to_string(),
            ParsedExpression::Matrix(_) => {
                return ResultEnvelope::failure("ODE error: expected an equation, got a matrix", Vec::new())
            }
        }
    } else {
        ctx.raw.clone()
    };

    let eq = match engine.parse_equation(&text, &[func.as_str()], &var) {
        Ok(eq @ Expr::Equation(..)) => eq,
        Ok(lhs) => Expr::equation(lhs, Expr::int(0)),
        Err(err) => return area_failure("ODE", &err, rec),
    };
    rec.add("Differential equation", None, Some(&eq), None, None);

    let unknown = match engine.unknown_function(&eq, &func, &var) {
        Some(u) => u,
        None => return ResultEnvelope::failure("No unknown function found in equation", rec.finalize()),
    };
    rec.add("Unknown function", None, Some(&unknown), Some(format!("Solve for {}", unknown)), None);

    let solution = match engine.dsolve(&eq, &unknown) {
        Ok(s) => s,
        Err(err) => return area_failure("ODE", &err, rec),
    };
    rec.add("Apply dsolve", Some(&eq), Some(&solution), None, None);

    conclude("ODE", &solution, rec)
}

// ========== Helpers ==========

/// A limit point or bound: a number, a constant, or signed infinity
fn parse_point(engine: &dyn Engine, text: &str) -> Result<Expr, SigmaError> {
    let t = text.trim();
    let (negative, name) = match t.strip_prefix('-') {
        Some(rest) => (true, rest.trim()),
        None => (false, t.strip_prefix('+').unwrap_or(t).trim()),
    };
    if matches!(name.to_ascii_lowercase().as_str(), "oo" | "inf" | "infinity") {
        return Ok(if negative { Expr::neg_infinity() } else { Expr::infinity() });
    }
    engine.parse_evaluating(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_plugin::NativeEngine;

    fn expr(text: &str) -> ParsedExpression {
        ParsedExpression::Expression(sigma_expr::parse_infix(text).unwrap())
    }

    fn run(parsed: ParsedExpression, mode: Mode, options: Options) -> ResultEnvelope {
        let ctx = SolveContext::default()
            .with_subject(Subject::Calc1)
            .with_options(options);
        CalculusSolver.dispatch(&parsed, mode, &ctx)
    }

    fn rules(env: &ResultEnvelope) -> Vec<&str> {
        env.steps.iter().map(|s| s.rule.as_str()).collect()
    }

    mod derivative_tests {
        use super::*;

        #[test]
        fn test_chain_rule_narrated() {
            let env = run(expr("sin(x^2)"), Mode::Derivative, Options::new());
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env)[..3], ["Initial expression", "Chain Rule: prepare", "Apply d/dx"]);
            assert_eq!(env.steps[1].after_latex, None);
            let result = env.result_latex.unwrap();
            assert!(result.contains("\\cos"), "{}", result);
        }

        #[test]
        fn test_auto_is_derivative() {
            let env = run(expr("x^3"), Mode::Auto, Options::new());
            assert_eq!(rules(&env)[1], "Power Rule: prepare");
            assert_eq!(env.result_latex.as_deref(), Some("3 x^{2}"));
        }

        #[test]
        fn test_wrapper_sets_variable_and_order() {
            let env = run(expr("Derivative(t^3, t, 2)"), Mode::Derivative, Options::new());
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env)[2], "Apply d^2/dt^2");
            assert_eq!(env.result_latex.as_deref(), Some("6 t"));
        }

        #[test]
        fn test_variable_must_be_a_name() {
            for bad in ["2", "x y"] {
                let env = run(expr("x^2"), Mode::Derivative, Options::new().with("var", bad));
                assert!(!env.ok, "var '{}' accepted", bad);
                assert!(env.steps.is_empty());
                assert!(env.errors[0].starts_with("Calculus error: option 'var' must be a name"), "{:?}", env.errors);
            }
            let env = run(expr("x^2"), Mode::Ode, Options::new().with("func", "y(x)"));
            assert!(env.errors[0].contains("option 'func'"), "{:?}", env.errors);
        }

        #[test]
        fn test_square_root_symbol() {
            let env = run(expr("√x"), Mode::Derivative, Options::new());
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env)[1], "Power Rule: prepare");
        }

        #[test]
        fn test_raw_input_fails() {
            let env = run(ParsedExpression::Raw("sin(".into()), Mode::Derivative, Options::new());
            assert_eq!(env.errors, vec!["Unable to parse query: 'sin('".to_string()]);
        }
    }

    mod integral_tests {
        use super::*;

        #[test]
        fn test_indefinite_sum_rule() {
            let env = run(expr("x^2 + cos(x)"), Mode::Integral, Options::new());
            assert!(env.ok, "{:?}", env.errors);
            let r = rules(&env);
            assert_eq!(r[..4], ["Initial expression", "Set up indefinite integral", "Apply sum rule", "Integrate"]);
            assert_eq!(env.steps[1].note.as_deref(), Some("∫ ... dx"));
            assert_eq!(env.steps[2].note.as_deref(), Some("∫(f + g) = ∫f + ∫g"));
        }

        #[test]
        fn test_definite_from_options() {
            let opts = Options::new().with("definite", true).with("lower", 0i64).with("upper", 1i64);
            let env = run(expr("x^2"), Mode::Integral, opts);
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env), vec!["Initial expression", "Set up definite integral", "Evaluate from 0 to 1"]);
            assert_eq!(env.steps[1].note.as_deref(), Some("∫[0, 1] ... dx"));
            assert_eq!(env.result_latex.as_deref(), Some("\\frac{1}{3}"));
        }

        #[test]
        fn test_definite_flag_without_bounds_is_indefinite() {
            let opts = Options::new().with("definite", true).with("lower", 0i64);
            let env = run(expr("x"), Mode::Integral, opts);
            assert_eq!(rules(&env)[1], "Set up indefinite integral");
        }

        #[test]
        fn test_integral_wrapper_bounds() {
            let env = run(expr("Integral(2*x, x, 1, 3)"), Mode::Integral, Options::new());
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env)[2], "Evaluate from 1 to 3");
            assert_eq!(env.result_latex.as_deref(), Some("8"));
        }
    }

    mod limit_series_tests {
        use super::*;

        #[test]
        fn test_limit_at_infinity() {
            let opts = Options::new().with("point", "infinity");
            let env = run(expr("1/x"), Mode::Limit, opts);
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env), vec!["Limit as x → oo", "Evaluate limit"]);
            assert_eq!(env.result_latex.as_deref(), Some("0"));
        }

        #[test]
        fn test_limit_default_point() {
            let env = run(expr("sin(x)/x"), Mode::Limit, Options::new());
            assert_eq!(rules(&env)[0], "Limit as x → 0");
            assert_eq!(env.result_latex.as_deref(), Some("1"));
        }

        #[test]
        fn test_bad_direction() {
            let opts = Options::new().with("dir", "sideways");
            let env = run(expr("x"), Mode::Limit, opts);
            assert!(!env.ok);
            assert!(env.errors[0].starts_with("Limit error:"));
        }

        #[test]
        fn test_series_labels() {
            let opts = Options::new().with("n", 4i64);
            let env = run(expr("exp(x)"), Mode::Series, opts);
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env), vec!["Taylor series centered at x=0", "Expand to order 4"]);
            assert!(env.result_latex.unwrap().contains("O\\left("));
        }

        #[test]
        fn test_series_bad_order() {
            let env = run(expr("exp(x)"), Mode::Series, Options::new().with("n", "many"));
            assert!(env.errors[0].starts_with("Series error:"));
            assert!(env.steps.is_empty());
        }
    }

    mod ode_tests {
        use super::*;

        fn ode(raw: &str) -> ResultEnvelope {
            let ctx = SolveContext::default().with_subject(Subject::Calc2).with_raw(raw);
            CalculusSolver.dispatch(&ParsedExpression::Raw(raw.into()), Mode::Ode, &ctx)
        }

        #[test]
        fn test_harmonic_oscillator() {
            let env = ode("y'' + y = 0");
            assert!(env.ok, "{:?}", env.errors);
            assert_eq!(rules(&env), vec!["Differential equation", "Unknown function", "Apply dsolve"]);
            assert_eq!(env.steps[1].note.as_deref(), Some("Solve for y(x)"));
        }

        #[test]
        fn test_bare_expression_set_to_zero() {
            let env = ode("y' - y");
            assert!(env.ok, "{:?}", env.errors);
            let eq = env.steps[0].after_latex.as_deref().unwrap();
            assert!(eq.ends_with("= 0"), "{}", eq);
        }

        #[test]
        fn test_primed_application() {
            let env = ode("y'(x) = y(x)");
            assert!(env.ok, "{:?}", env.errors);
            let sol = env.result_latex.unwrap();
            assert!(sol.contains("e^{x}"), "{}", sol);

            let options = Options::new().with("func", "f").with("var", "t");
            let ctx = SolveContext::default()
                .with_subject(Subject::Calc2)
                .with_raw("f'(t) = f(t)")
                .with_options(options);
            let env = CalculusSolver.dispatch(&ParsedExpression::Raw("f'(t) = f(t)".into()), Mode::Ode, &ctx);
            assert!(env.ok, "{:?}", env.errors);
            let sol = env.result_latex.unwrap();
            assert!(sol.contains("e^{t}"), "{}", sol);
        }

        #[test]
        fn test_missing_unknown_function() {
            let env = ode("x^2 = 1");
            assert_eq!(env.errors, vec!["No unknown function found in equation".to_string()]);
            assert_eq!(rules(&env), vec!["Differential equation"]);
        }
    }

    #[test]
    fn test_unsupported_modes() {
        let env = run(expr("x"), Mode::Recurrence, Options::new());
        assert_eq!(env.errors, vec!["Unsupported mode: recurrence".to_string()]);
        let env = run(expr("x"), Mode::Rref, Options::new());
        assert_eq!(env.errors, vec!["Unsupported mode: rref".to_string()]);
    }

    #[test]
    fn test_parse_point() {
        let engine = NativeEngine::new();
        assert_eq!(parse_point(&engine, "oo").unwrap(), Expr::infinity());
        assert_eq!(parse_point(&engine, "-Infinity").unwrap(), Expr::neg_infinity());
        assert_eq!(parse_point(&engine, "2").unwrap(), Expr::int(2));
        assert!(parse_point(&engine, "2 +").is_err());
    }
}
