//! Sigma Standard Solvers
//!
//! One dispatcher per subject area, each turning a parsed query into a
//! step trace and a result envelope.

pub mod algebra;
pub mod calculus;
pub mod discrete;
pub mod linear_algebra;

pub use calculus::detect_rule;

use sigma_core::SigmaError;
use sigma_expr::Expr;
use sigma_plugin::{ResultEnvelope, SolverRegistry, StepRecorder};

/// Load the standard solvers into a registry
pub fn load_standard_solvers(registry: SolverRegistry) -> SolverRegistry {
    registry
        .with_solver(algebra::AlgebraSolver)
        .with_solver(calculus::CalculusSolver)
        .with_solver(linear_algebra::LinearAlgebraSolver)
        .with_solver(discrete::DiscreteSolver)
}

/// Create registry with the standard solvers
pub fn standard_registry() -> SolverRegistry {
    load_standard_solvers(SolverRegistry::new())
}

/// Envelope for a collaborator failure, keeping the steps recorded so far
pub(crate) fn area_failure(area: &str, err: &SigmaError, rec: StepRecorder<'_>) -> ResultEnvelope {
    tracing::warn!(area, code = %err.code, error = %err.message, "solver step failed");
    ResultEnvelope::failure(format!("{} error: {}", area, err.message), rec.finalize())
}

/// Success envelope for a final result. Undefined values (`1/0`, `0/0`,
/// `oo - oo`) are reported as a failure of `area` instead.
pub(crate) fn conclude(area: &str, result: &Expr, rec: StepRecorder<'_>) -> ResultEnvelope {
    if result.contains(&Expr::undefined()) {
        let err = SigmaError::computation("undefined result (division by zero or an indeterminate form)");
        return area_failure(area, &err, rec);
    }
    let latex = rec.render(result);
    ResultEnvelope::success(latex, rec.finalize())
}

/// Envelope for input no parse strategy understood
pub(crate) fn unparsed(raw: &str) -> ResultEnvelope {
    ResultEnvelope::failure(format!("Unable to parse query: '{}'", raw), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_plugin::Subject;

    #[test]
    fn test_every_subject_routed() {
        let registry = standard_registry();
        for subject in Subject::ALL {
            assert!(registry.get(subject).is_some(), "no solver for {}", subject);
        }
        assert_eq!(registry.list_solvers().as_array().map(|a| a.len()), Some(4));
    }

    #[test]
    fn test_calculus_serves_both_courses() {
        let registry = standard_registry();
        let calc1 = registry.get(Subject::Calc1).map(|s| s.meta().name);
        let calc2 = registry.get(Subject::Calc2).map(|s| s.meta().name);
        assert_eq!(calc1, Some("calculus"));
        assert_eq!(calc1, calc2);
    }
}
