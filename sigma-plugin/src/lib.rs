//! Sigma Plugin System
//!
//! The contracts between the request pipeline and the solvers:
//! - `SolverPlugin` dispatchers registered per subject in a `SolverRegistry`
//! - `Engine`, the symbolic capability surface, with `NativeEngine`
//! - `StepRecorder` for bounded solution traces
//! - `ParsedExpression` in, `ResultEnvelope` out

mod context;
mod engine;
mod envelope;
mod query;
mod registry;
mod steps;
mod traits;

pub use context::SolveContext;
pub use engine::{Engine, NativeEngine};
pub use envelope::{ParsedExpression, ResultEnvelope};
pub use query::{Mode, Options, Subject};
pub use registry::SolverRegistry;
pub use steps::{Renderable, Step, StepRecorder, StepSequence, DEFAULT_MAX_STEPS};
pub use traits::{SolverMeta, SolverPlugin};

/// Re-export core types for solver authors
pub mod prelude {
    pub use crate::{
        Engine, Mode, Options, ParsedExpression, Renderable, ResultEnvelope, SolveContext, SolverMeta,
        SolverPlugin, SolverRegistry, StepRecorder, Subject,
    };
    pub use sigma_core::prelude::*;
    pub use sigma_expr::{Direction, Expr, Function, Shape};
    pub use sigma_matrix::{Eigenpair, Matrix};
}
