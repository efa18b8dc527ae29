//! Step recording
//!
//! A recorder is created per request. It renders the before/after values of
//! each step through the engine and stops accepting steps once full.

use crate::engine::Engine;
use serde::{Deserialize, Serialize};
use sigma_core::{SigmaError, Value};
use sigma_expr::Expr;
use sigma_matrix::Matrix;
use std::collections::BTreeMap;

/// Default bound on recorded steps
pub const DEFAULT_MAX_STEPS: usize = 200;

/// One entry of a solution trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the trace
    pub index: usize,
    pub rule: String,
    pub before_latex: Option<String>,
    pub after_latex: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

pub type StepSequence = Vec<Step>;

/// Anything a step can display
pub trait Renderable {
    fn render(&self, engine: &dyn Engine) -> Result<String, SigmaError>;
    /// Plain textual form used when rendering fails
    fn plain(&self) -> String;
}

impl Renderable for Expr {
    fn render(&self, engine: &dyn Engine) -> Result<String, SigmaError> {
        engine.latex(self)
    }

    fn plain(&self) -> String {
        self.to_string()
    }
}

impl Renderable for Matrix {
    fn render(&self, engine: &dyn Engine) -> Result<String, SigmaError> {
        engine.matrix_latex(self)
    }

    fn plain(&self) -> String {
        self.to_string()
    }
}

/// Raw text is shown as is
impl Renderable for String {
    fn render(&self, _engine: &dyn Engine) -> Result<String, SigmaError> {
        Ok(self.to_string())
    }

    fn plain(&self) -> String {
        self.to_string()
    }
}

pub struct StepRecorder<'a> {
    engine: &'a dyn Engine,
    steps: Vec<Step>,
    max_steps: usize,
}

impl<'a> StepRecorder<'a> {
    pub fn new(engine: &'a dyn Engine, max_steps: usize) -> Self {
        Self {
            engine,
            steps: Vec::new(),
            max_steps,
        }
    }

    pub fn render(&self, value: &dyn Renderable) -> String {
        match value.render(self.engine) {
            Ok(latex) => latex,
            Err(err) => {
                tracing::warn!(error = %err, "LaTeX rendering failed, using plain text");
                value.plain()
            }
        }
    }

    /// Append a step; silently ignored once the bound is reached
    pub fn add(
        &mut self,
        rule: &str,
        before: Option<&dyn Renderable>,
        after: Option<&dyn Renderable>,
        note: Option<String>,
        meta: Option<BTreeMap<String, Value>>,
    ) {
        if self.is_full() {
            return;
        }
        let step = Step {
            index: self.steps.len() + 1,
            rule: rule.to_string(),
            before_latex: before.map(|b| self.render(b)),
            after_latex: after.map(|a| self.render(a)),
            note,
            meta: meta.unwrap_or_default(),
        };
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.steps.len() >= self.max_steps
    }

    pub fn finalize(self) -> StepSequence {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NativeEngine;

    #[test]
    fn test_indices_are_contiguous() {
        let engine = NativeEngine::new();
        let mut rec = StepRecorder::new(&engine, DEFAULT_MAX_STEPS);
        let x = Expr::sym("x");
        rec.add("Initial expression", Some(&x), None, None, None);
        rec.add("Simplify", Some(&x), Some(&x), Some("nothing to do".into()), None);
        let steps = rec.finalize();
        let indices: Vec<usize> = steps.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(steps[1].after_latex.as_deref(), Some("x"));
    }

    #[test]
    fn test_cap_enforced_exactly() {
        let engine = NativeEngine::new();
        let mut rec = StepRecorder::new(&engine, 3);
        for i in 0..7 {
            rec.add(&format!("step {}", i), None, None, None, None);
        }
        assert!(rec.is_full());
        let steps = rec.finalize();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2].rule, "step 2");
    }

    #[test]
    fn test_render_falls_back_to_plain() {
        let engine = NativeEngine::new();
        let rec = StepRecorder::new(&engine, DEFAULT_MAX_STEPS);
        let mut deep = Expr::sym("x");
        for _ in 0..(sigma_expr::MAX_RENDER_DEPTH + 1) {
            deep = Expr::Func(sigma_expr::Function::Sin, Box::new(deep));
        }
        let shown = rec.render(&deep);
        assert!(shown.starts_with("sin(sin("));
    }

    #[test]
    fn test_text_and_meta() {
        let engine = NativeEngine::new();
        let mut rec = StepRecorder::new(&engine, DEFAULT_MAX_STEPS);
        let mut meta = BTreeMap::new();
        meta.insert("var".to_string(), Value::from("x"));
        let raw = "x^2 = 4".to_string();
        rec.add("Parse equation", Some(&raw), None, None, Some(meta));
        let steps = rec.finalize();
        assert_eq!(steps[0].before_latex.as_deref(), Some("x^2 = 4"));
        assert_eq!(steps[0].meta["var"], Value::from("x"));
    }
}
