//! Query vocabulary: subjects, modes and options

use serde::{Deserialize, Serialize};
use sigma_core::{SigmaError, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Course area a query belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Algebra,
    /// Linear algebra
    La,
    Calc1,
    Calc2,
    Discrete,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Algebra,
        Subject::La,
        Subject::Calc1,
        Subject::Calc2,
        Subject::Discrete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Algebra => "algebra",
            Subject::La => "la",
            Subject::Calc1 => "calc1",
            Subject::Calc2 => "calc2",
            Subject::Discrete => "discrete",
        }
    }

    /// Lenient lookup used at the request boundary: unknown names are algebra
    pub fn from_name(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::debug!(subject = name, "unknown subject, routing to algebra");
            Subject::Algebra
        })
    }
}

impl FromStr for Subject {
    type Err = SigmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Subject::ALL
            .into_iter()
            .find(|sub| sub.as_str() == lower)
            .ok_or_else(|| SigmaError::validation(format!("Unknown subject: {}", s)))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    Algebra,
    Derivative,
    Integral,
    Limit,
    Series,
    Ode,
    Rref,
    Eigen,
    Det,
    Nullspace,
    Logic,
    Combinatorics,
    Recurrence,
}

impl Mode {
    pub const ALL: [Mode; 14] = [
        Mode::Auto,
        Mode::Algebra,
        Mode::Derivative,
        Mode::Integral,
        Mode::Limit,
        Mode::Series,
        Mode::Ode,
        Mode::Rref,
        Mode::Eigen,
        Mode::Det,
        Mode::Nullspace,
        Mode::Logic,
        Mode::Combinatorics,
        Mode::Recurrence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Algebra => "algebra",
            Mode::Derivative => "derivative",
            Mode::Integral => "integral",
            Mode::Limit => "limit",
            Mode::Series => "series",
            Mode::Ode => "ode",
            Mode::Rref => "rref",
            Mode::Eigen => "eigen",
            Mode::Det => "det",
            Mode::Nullspace => "nullspace",
            Mode::Logic => "logic",
            Mode::Combinatorics => "combinatorics",
            Mode::Recurrence => "recurrence",
        }
    }
}

impl FromStr for Mode {
    type Err = SigmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| SigmaError::unsupported_mode(s))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form query options.
///
/// Documented keys: `var`, `definite`, `lower`, `upper`, `point`, `dir`,
/// `n`, `func`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: BTreeMap<String, Value>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Options from a JSON object; anything else yields no options
    pub fn from_json(json: &serde_json::Value) -> Self {
        let entries = json
            .as_object()
            .map(|obj| obj.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect())
            .unwrap_or_default();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).filter(|v| !v.is_null())
    }

    /// Option rendered as text (numbers and booleans included)
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| v.to_string()).filter(|s| !s.trim().is_empty())
    }

    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.text(key).unwrap_or_else(|| default.to_string())
    }

    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::is_truthy)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_parse() {
        assert_eq!("calc1".parse::<Subject>().unwrap(), Subject::Calc1);
        assert_eq!(" LA ".parse::<Subject>().unwrap(), Subject::La);
        assert!("geometry".parse::<Subject>().is_err());
        assert_eq!(Subject::from_name("geometry"), Subject::Algebra);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("nullspace".parse::<Mode>().unwrap(), Mode::Nullspace);
        let err = "integrate".parse::<Mode>().unwrap_err();
        assert!(err.message.contains("Unsupported mode: integrate"));
    }

    #[test]
    fn test_mode_serde_names() {
        assert_eq!(serde_json::to_string(&Mode::Combinatorics).unwrap(), "\"combinatorics\"");
        assert_eq!(serde_json::to_string(&Subject::Calc2).unwrap(), "\"calc2\"");
    }

    #[test]
    fn test_options_accessors() {
        let opts = Options::from_json(&serde_json::json!({"var": "t", "n": 4, "definite": true, "point": null}));
        assert_eq!(opts.text_or("var", "x"), "t");
        assert_eq!(opts.text("n").as_deref(), Some("4"));
        assert!(opts.flag("definite"));
        assert!(opts.get("point").is_none());
        assert_eq!(Options::new().text_or("var", "x"), "x");
    }
}
