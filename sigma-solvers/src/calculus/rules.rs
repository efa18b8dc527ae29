//! Differentiation rule narration

use sigma_expr::{Expr, Function, Shape};

/// Name the differentiation rule that applies at the top of `expr`.
///
/// Total and deterministic; only the outermost shape is inspected.
pub fn detect_rule(expr: &Expr, var: &str) -> String {
    match expr.shape() {
        Shape::Product(_) => "Product Rule".to_string(),
        Shape::Power(base, exp) if base.contains_symbol(var) && exp.is_number() => "Power Rule".to_string(),
        Shape::Sum(_) => "Sum Rule".to_string(),
        Shape::Function(f, arg) if narrated(f) => {
            if arg.is_symbol(var) {
                format!("{} derivative", f.name())
            } else {
                "Chain Rule".to_string()
            }
        }
        _ => "Differentiation".to_string(),
    }
}

fn narrated(f: Function) -> bool {
    matches!(
        f,
        Function::Sin | Function::Cos | Function::Exp | Function::Ln | Function::Tan
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(text: &str) -> String {
        detect_rule(&sigma_expr::parse_infix(text).unwrap(), "x")
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(rule("x*sin(x)"), "Product Rule");
        assert_eq!(rule("x^3"), "Power Rule");
        assert_eq!(rule("x^2 + x"), "Sum Rule");
        assert_eq!(rule("sin(x^2)"), "Chain Rule");
        assert_eq!(rule("sin(x)"), "sin derivative");
        assert_eq!(rule("log(x)"), "log derivative");
        assert_eq!(rule("exp(x)"), "exp derivative");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(rule("2^x"), "Differentiation");
        assert_eq!(rule("y^2"), "Differentiation");
        assert_eq!(rule("asin(x)"), "Differentiation");
        assert_eq!(rule("x"), "Differentiation");
        assert_eq!(rule("7"), "Differentiation");
    }

    #[test]
    fn test_respects_variable() {
        let e = sigma_expr::parse_infix("cos(t)").unwrap();
        assert_eq!(detect_rule(&e, "t"), "cos derivative");
        assert_eq!(detect_rule(&e, "x"), "Chain Rule");
    }

    #[test]
    fn test_deterministic() {
        let e = sigma_expr::parse_infix("x^2*exp(x) + 1").unwrap();
        assert_eq!(detect_rule(&e, "x"), detect_rule(&e, "x"));
    }
}
