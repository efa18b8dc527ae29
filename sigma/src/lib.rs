//! Sigma - step-by-step math solving
//!
//! Free-form queries (plain notation, LaTeX or matrix literals) are
//! classified, parsed through a cascade of strategies and routed to the
//! solver for their subject, which records a bounded trace of steps.
//!
//! ```ignore
//! let sigma = Sigma::with_standard_solvers();
//! let env = sigma.solve(Subject::Algebra, "2x + 3x", Mode::Auto, &Options::new());
//! assert_eq!(env.result_latex.as_deref(), Some("5 x"));
//! ```

mod classify;
mod parser;
mod render;

pub use classify::{classify, Format, LATEX_MARKERS};
pub use parser::{parse, Strategy};
pub use render::Renderer;

pub use sigma_plugin::{
    Engine, Mode, NativeEngine, Options, ParsedExpression, ResultEnvelope, SolverRegistry, Step, StepSequence,
    Subject, DEFAULT_MAX_STEPS,
};

use sigma_plugin::SolveContext;
use std::sync::Arc;

/// Main Sigma engine. Immutable once built, shareable across threads.
pub struct Sigma {
    registry: Arc<SolverRegistry>,
    engine: Arc<dyn Engine>,
    max_steps: usize,
}

impl Sigma {
    pub fn new(registry: SolverRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            engine: Arc::new(NativeEngine::new()),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_standard_solvers() -> Self {
        Self::new(sigma_solvers::standard_registry())
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn Engine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_registry(mut self, registry: SolverRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Classify and parse without solving
    pub fn parse(&self, subject: Subject, raw: &str) -> (ParsedExpression, Vec<String>) {
        parser::parse(self.engine.as_ref(), subject, raw)
    }

    pub fn solve(&self, subject: Subject, raw: &str, mode: Mode, options: &Options) -> ResultEnvelope {
        let (parsed, warnings) = self.parse(subject, raw);
        let ctx = SolveContext::new(self.engine.clone())
            .with_subject(subject)
            .with_raw(raw.trim())
            .with_options(options.clone())
            .with_max_steps(self.max_steps);
        let env = self.registry.dispatch(&parsed, mode, &ctx);
        tracing::debug!(subject = %subject, mode = %mode, ok = env.ok, steps = env.steps.len(), "solved");
        env.with_warnings(warnings)
    }

    /// Solve with subject and mode given by name, as they arrive on the wire.
    ///
    /// Unknown subjects route to algebra; unknown modes fail with
    /// `Unsupported mode`.
    pub fn solve_named(&self, subject: &str, raw: &str, mode: &str, options: &Options) -> ResultEnvelope {
        let subject = Subject::from_name(subject);
        match mode.parse::<Mode>() {
            Ok(mode) => self.solve(subject, raw, mode, options),
            Err(err) => {
                let (_, warnings) = self.parse(subject, raw);
                ResultEnvelope::from_error(&err).with_warnings(warnings)
            }
        }
    }

    pub fn help(&self, name: Option<&str>) -> serde_json::Value {
        self.registry.help(name)
    }

    pub fn list_solvers(&self) -> serde_json::Value {
        self.registry.list_solvers()
    }
}

impl Default for Sigma {
    fn default() -> Self {
        Self::with_standard_solvers()
    }
}

/// Solve one query with the standard solvers
pub fn solve(subject: &str, raw: &str, mode: &str, options: &Options) -> ResultEnvelope {
    Sigma::with_standard_solvers().solve_named(subject, raw, mode, options)
}
