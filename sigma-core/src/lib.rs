//! Sigma Core - Fundamental types
//!
//! This crate provides the core types used throughout Sigma:
//! - `Number`: exact rational numbers with an approximate fallback
//! - `Value`: option and metadata values (numbers, text, booleans)
//! - `SigmaError`: structured errors with machine-readable codes

mod error;
mod number;
mod value;

pub use error::{codes, ErrorContext, Severity, SigmaError};
pub use number::{Number, NumberError};
pub use value::Value;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::codes;
    pub use crate::{Number, Severity, SigmaError, Value};
}

#[cfg(test)]
mod tests {
    use super::*;

    mod number_tests {
        use super::*;

        #[test]
        fn test_from_i64() {
            let n = Number::from_i64(42);
            assert_eq!(n.to_i64(), Some(42));
            assert!(n.is_exact_integer());
        }

        #[test]
        fn test_from_str_decimal_is_exact() {
            let n = Number::from_str("3.25").unwrap();
            assert!(!n.is_integer());
            assert_eq!(n.to_string(), "13/4");
        }

        #[test]
        fn test_from_str_fraction() {
            let n = Number::from_str("2/6").unwrap();
            assert_eq!(n, Number::from_ratio(1, 3));
            assert!(Number::from_str("1/0").is_err());
        }

        #[test]
        fn test_from_str_scientific() {
            assert_eq!(Number::from_str("1.5e2").unwrap().to_i64(), Some(150));
            assert_eq!(Number::from_str("25e-2").unwrap(), Number::from_ratio(1, 4));
        }

        #[test]
        fn test_from_str_rejects_garbage() {
            assert!(Number::from_str("abc").is_err());
            assert!(Number::from_str("").is_err());
            assert!(Number::from_str("1.2.3").is_err());
        }

        #[test]
        fn test_arithmetic() {
            let a = Number::from_ratio(1, 2);
            let b = Number::from_ratio(1, 3);
            assert_eq!(a.add(&b), Number::from_ratio(5, 6));
            assert_eq!(a.sub(&b), Number::from_ratio(1, 6));
            assert_eq!(a.mul(&b), Number::from_ratio(1, 6));
            assert_eq!(a.checked_div(&b).unwrap(), Number::from_ratio(3, 2));
        }

        #[test]
        fn test_division_by_zero() {
            let a = Number::from_i64(1);
            assert_eq!(a.checked_div(&Number::zero()), Err(NumberError::DivisionByZero));
        }

        #[test]
        fn test_pow() {
            let two_thirds = Number::from_ratio(2, 3);
            assert_eq!(two_thirds.pow(2).unwrap(), Number::from_ratio(4, 9));
            assert_eq!(two_thirds.pow(-1).unwrap(), Number::from_ratio(3, 2));
            assert!(Number::zero().pow(-1).is_err());
        }

        #[test]
        fn test_exact_roots() {
            assert_eq!(Number::from_i64(49).exact_root(2), Some(Number::from_i64(7)));
            assert_eq!(Number::from_ratio(8, 27).exact_root(3), Some(Number::from_ratio(2, 3)));
            assert_eq!(Number::from_i64(-8).exact_root(3), Some(Number::from_i64(-2)));
            assert_eq!(Number::from_i64(2).exact_root(2), None);
            assert_eq!(Number::from_i64(-4).exact_root(2), None);
        }

        #[test]
        fn test_pow_exact_rational_exponent() {
            let four = Number::from_i64(4);
            assert_eq!(four.pow_exact(&Number::from_ratio(3, 2)), Some(Number::from_i64(8)));
            assert_eq!(Number::from_i64(2).pow_exact(&Number::from_ratio(1, 2)), None);
        }

        #[test]
        fn test_extract_power_factor() {
            let (outside, inside) = Number::from_i64(72).extract_power_factor(2).unwrap();
            assert_eq!(outside, Number::from_i64(6));
            assert_eq!(inside, Number::from_i64(2));
        }

        #[test]
        fn test_factorial_and_binomial() {
            assert_eq!(Number::factorial(5).unwrap(), Number::from_i64(120));
            assert_eq!(Number::binomial(5, 2).unwrap(), Number::from_i64(10));
            assert_eq!(Number::binomial(2, 5).unwrap(), Number::zero());
            assert_eq!(Number::permutations(5, 2).unwrap(), Number::from_i64(20));
            assert!(Number::factorial(1_000_000).is_err());
        }

        #[test]
        fn test_gcd_lcm() {
            let a = Number::from_i64(12);
            let b = Number::from_i64(-18);
            assert_eq!(a.gcd(&b), Some(Number::from_i64(6)));
            assert_eq!(a.lcm(&b), Some(Number::from_i64(36)));
            assert_eq!(Number::from_ratio(1, 2).gcd(&a), None);
        }

        #[test]
        fn test_approx_contaminates() {
            let exact = Number::from_i64(1);
            let approx = Number::from_f64(0.5);
            let sum = exact.add(&approx);
            assert!(!sum.is_exact());
            assert_eq!(sum.to_f64(), Some(1.5));
        }

        #[test]
        fn test_display() {
            assert_eq!(Number::from_i64(-7).to_string(), "-7");
            assert_eq!(Number::from_ratio(-1, 2).to_string(), "-1/2");
            assert_eq!(Number::from_f64(1.5).to_string(), "1.5");
            assert_eq!(Number::from_f64(2.0).to_string(), "2");
        }

        #[test]
        fn test_ordering() {
            let mut v = vec![Number::from_i64(3), Number::from_ratio(-1, 2), Number::from_i64(1)];
            v.sort();
            assert_eq!(v[0], Number::from_ratio(-1, 2));
            assert_eq!(v[2], Number::from_i64(3));
        }
    }

    mod value_tests {
        use super::*;

        #[test]
        fn test_value_accessors() {
            let v = Value::from("x");
            assert_eq!(v.as_text(), Some("x"));
            assert!(v.as_number().is_none());
            assert_eq!(Value::from(true).as_bool(), Some(true));
        }

        #[test]
        fn test_value_to_number() {
            assert_eq!(Value::from("6").to_number(), Some(Number::from_i64(6)));
            assert_eq!(Value::from("oo").to_number(), None);
        }

        #[test]
        fn test_value_json_bridge() {
            let json = serde_json::json!({"n": 8, "var": "t", "definite": true});
            let n = Value::from_json(&json["n"]);
            assert_eq!(n, Value::from(8));
            assert_eq!(n.to_json(), serde_json::json!(8));
            assert_eq!(Value::from_json(&json["var"]), Value::from("t"));
            assert!(Value::from_json(&json["definite"]).is_truthy());
        }

        #[test]
        fn test_value_serde_round_trip_shape() {
            let v = Value::List(vec![Value::from(1), Value::from("a")]);
            let s = serde_json::to_string(&v).unwrap();
            assert_eq!(s, r#"[1,"a"]"#);
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_error_display() {
            let err = SigmaError::unsupported_mode("eigen");
            assert_eq!(err.code, codes::UNSUPPORTED_MODE);
            assert!(err.to_string().starts_with("[UNSUPPORTED_MODE] Unsupported mode: eigen"));
        }

        #[test]
        fn test_error_builders() {
            let err = SigmaError::computation("no roots")
                .with_expression("x^2 + 1")
                .with_note("while solving");
            let ctx = err.context.unwrap();
            assert_eq!(ctx.expression.as_deref(), Some("x^2 + 1"));
            assert_eq!(ctx.notes, vec!["while solving".to_string()]);
        }

        #[test]
        fn test_from_number_error() {
            let err: SigmaError = NumberError::DivisionByZero.into();
            assert_eq!(err.code, codes::DIV_ZERO);
            assert_eq!(SigmaError::parse_warning("x").severity, Severity::Warning);
        }
    }
}
