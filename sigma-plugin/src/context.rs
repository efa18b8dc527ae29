//! Per-request solve context

use crate::engine::{Engine, NativeEngine};
use crate::query::{Options, Subject};
use crate::steps::{StepRecorder, DEFAULT_MAX_STEPS};
use sigma_core::SigmaError;
use std::sync::Arc;

/// Everything a solver needs besides the parsed expression
pub struct SolveContext {
    pub engine: Arc<dyn Engine>,
    pub subject: Subject,
    /// The query text as received
    pub raw: String,
    pub options: Options,
    pub max_steps: usize,
}

impl SolveContext {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            subject: Subject::Algebra,
            raw: String::new(),
            options: Options::new(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Fresh recorder bounded by this context's step limit
    pub fn recorder(&self) -> StepRecorder<'_> {
        StepRecorder::new(self.engine.as_ref(), self.max_steps)
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Variable of interest, `x` unless the `var` option says otherwise
    pub fn var(&self) -> String {
        self.options.text_or("var", "x")
    }

    /// The `var` and `func` options, when given, must be plain names
    pub fn check_names(&self) -> Result<(), SigmaError> {
        for key in ["var", "func"] {
            if let Some(name) = self.options.text(key) {
                if !is_name(&name) {
                    return Err(SigmaError::validation(format!(
                        "option '{}' must be a name like 'x' or 'theta', got '{}'",
                        key, name
                    )));
                }
            }
        }
        Ok(())
    }
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == '_')
}

impl Default for SolveContext {
    fn default() -> Self {
        Self::new(Arc::new(NativeEngine::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let ctx = SolveContext::default()
            .with_subject(Subject::Calc1)
            .with_raw("sin(t)")
            .with_options(Options::new().with("var", "t"))
            .with_max_steps(5);
        assert_eq!(ctx.subject, Subject::Calc1);
        assert_eq!(ctx.var(), "t");
        assert_eq!(ctx.max_steps, 5);
        assert!(ctx.recorder().is_empty());
    }

    #[test]
    fn test_default_var() {
        assert_eq!(SolveContext::default().var(), "x");
        assert!(SolveContext::default().check_names().is_ok());
    }

    #[test]
    fn test_names_checked() {
        let ctx = |key: &str, value: &str| SolveContext::default().with_options(Options::new().with(key, value));
        assert!(ctx("var", "t").check_names().is_ok());
        assert!(ctx("var", "x_1").check_names().is_ok());
        assert!(ctx("func", "theta").check_names().is_ok());
        for bad in ["2", "x y", "", "x²", "x+1"] {
            let err = ctx("var", bad).check_names().unwrap_err();
            assert_eq!(err.code, sigma_core::codes::VALIDATION_ERROR, "{}", bad);
        }
        assert!(ctx("func", "y'").check_names().is_err());
    }
}
