//! Solver Registry

use crate::context::SolveContext;
use crate::envelope::{ParsedExpression, ResultEnvelope};
use crate::query::{Mode, Subject};
use crate::traits::{SolverMeta, SolverPlugin};
use serde_json::{json, Value as Json};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps subjects to their dispatchers
pub struct SolverRegistry {
    solvers: HashMap<Subject, Arc<dyn SolverPlugin>>,
    by_name: HashMap<String, Arc<dyn SolverPlugin>>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self {
            solvers: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a solver for every subject its metadata lists
    pub fn with_solver<S: SolverPlugin + 'static>(mut self, s: S) -> Self {
        let meta = s.meta();
        let solver: Arc<dyn SolverPlugin> = Arc::new(s);
        for subject in meta.subjects {
            self.solvers.insert(*subject, solver.clone());
        }
        self.by_name.insert(meta.name.to_lowercase(), solver);
        self
    }

    pub fn get(&self, subject: Subject) -> Option<&dyn SolverPlugin> {
        self.solvers.get(&subject).map(|s| s.as_ref())
    }

    /// Solver for `subject`, falling back to the algebra solver
    pub fn route(&self, subject: Subject) -> Option<&dyn SolverPlugin> {
        self.get(subject).or_else(|| {
            tracing::debug!(subject = %subject, "no solver registered, falling back to algebra");
            self.get(Subject::Algebra)
        })
    }

    pub fn dispatch(&self, parsed: &ParsedExpression, mode: Mode, ctx: &SolveContext) -> ResultEnvelope {
        match self.route(ctx.subject) {
            Some(solver) => {
                tracing::debug!(solver = solver.meta().name, mode = %mode, kind = parsed.kind(), "dispatching");
                solver.dispatch(parsed, mode, ctx)
            }
            None => ResultEnvelope::failure(
                format!("No solver registered for subject '{}'", ctx.subject),
                Vec::new(),
            ),
        }
    }

    pub fn help(&self, name: Option<&str>) -> Json {
        match name {
            Some(n) => self.help_for(n),
            None => self.general_help(),
        }
    }

    fn help_for(&self, name: &str) -> Json {
        let lower = name.to_lowercase();
        if let Some(s) = self.by_name.get(&lower) {
            return meta_to_help(&s.meta());
        }
        if let Ok(subject) = lower.parse::<Subject>() {
            if let Some(s) = self.get(subject) {
                return meta_to_help(&s.meta());
            }
        }
        json!({
            "error": {
                "code": "NOT_FOUND",
                "message": format!("No solver or subject named '{}'", name),
            }
        })
    }

    fn general_help(&self) -> Json {
        let mut subjects: Vec<(&Subject, &Arc<dyn SolverPlugin>)> = self.solvers.iter().collect();
        subjects.sort_by_key(|(s, _)| **s);
        let routes: serde_json::Map<String, Json> = subjects
            .into_iter()
            .map(|(s, solver)| (s.to_string(), Json::String(solver.meta().name.to_string())))
            .collect();
        json!({
            "subjects": routes,
            "solvers": self.names(),
            "usage": "Call help('solver_name') for the modes and examples of one solver.",
        })
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn list_solvers(&self) -> Json {
        let solvers: Vec<Json> = self
            .names()
            .iter()
            .filter_map(|n| self.by_name.get(n))
            .map(|s| {
                let meta = s.meta();
                json!({
                    "name": meta.name,
                    "description": meta.description,
                    "subjects": meta.subjects,
                    "modes": meta.modes,
                })
            })
            .collect();
        Json::Array(solvers)
    }
}

fn meta_to_help(meta: &SolverMeta) -> Json {
    serde_json::to_value(meta).unwrap_or(Json::Null)
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    static ECHO_SUBJECTS: [Subject; 1] = [Subject::Algebra];
    static ECHO_MODES: [Mode; 1] = [Mode::Auto];

    impl SolverPlugin for Echo {
        fn meta(&self) -> SolverMeta {
            SolverMeta {
                name: "echo",
                description: "Returns the parsed kind",
                subjects: &ECHO_SUBJECTS,
                modes: &ECHO_MODES,
                examples: &[],
            }
        }

        fn dispatch(&self, parsed: &ParsedExpression, mode: Mode, _ctx: &SolveContext) -> ResultEnvelope {
            if mode != Mode::Auto {
                return ResultEnvelope::unsupported_mode(mode.as_str());
            }
            ResultEnvelope::success(parsed.kind(), Vec::new())
        }
    }

    #[test]
    fn test_fallback_to_algebra() {
        let registry = SolverRegistry::new().with_solver(Echo);
        assert!(registry.get(Subject::La).is_none());
        let ctx = SolveContext::default().with_subject(Subject::La);
        let env = registry.dispatch(&ParsedExpression::Raw("?".into()), Mode::Auto, &ctx);
        assert!(env.ok);
        assert_eq!(env.result_latex.as_deref(), Some("raw"));
    }

    #[test]
    fn test_empty_registry_fails_cleanly() {
        let registry = SolverRegistry::new();
        let env = registry.dispatch(&ParsedExpression::Raw("?".into()), Mode::Auto, &SolveContext::default());
        assert!(!env.ok);
        assert_eq!(env.errors.len(), 1);
    }

    #[test]
    fn test_help_and_listing() {
        let registry = SolverRegistry::new().with_solver(Echo);
        assert_eq!(registry.help(Some("ECHO"))["name"], json!("echo"));
        assert_eq!(registry.help(Some("algebra"))["modes"], json!(["auto"]));
        assert!(registry.help(Some("nope"))["error"].is_object());
        assert_eq!(registry.help(None)["subjects"]["algebra"], json!("echo"));
        assert_eq!(registry.list_solvers()[0]["subjects"], json!(["algebra"]));
    }
}
