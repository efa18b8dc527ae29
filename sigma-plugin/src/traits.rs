//! Solver plugin trait

use crate::context::SolveContext;
use crate::envelope::{ParsedExpression, ResultEnvelope};
use crate::query::{Mode, Subject};
use serde::Serialize;

/// Metadata for a solver plugin
#[derive(Debug, Clone, Serialize)]
pub struct SolverMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub subjects: &'static [Subject],
    pub modes: &'static [Mode],
    pub examples: &'static [&'static str],
}

/// Dispatcher for one subject area.
///
/// `dispatch` is total: every failure is reported inside the envelope.
pub trait SolverPlugin: Send + Sync {
    fn meta(&self) -> SolverMeta;
    fn dispatch(&self, parsed: &ParsedExpression, mode: Mode, ctx: &SolveContext) -> ResultEnvelope;
}
