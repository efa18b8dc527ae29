//! Markdown renderer
//!
//! Renders a result envelope as markdown for human-facing transports.

use sigma_plugin::{ResultEnvelope, Step};

/// Envelope renderer
pub struct Renderer {
    show_meta: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self { show_meta: false }
    }

    /// Also list each step's meta entries
    pub fn with_meta(mut self, show: bool) -> Self {
        self.show_meta = show;
        self
    }

    pub fn render(&self, env: &ResultEnvelope) -> String {
        let mut output = String::new();

        output.push_str("## Result\n\n");
        match (&env.result_latex, env.ok) {
            (Some(latex), true) => output.push_str(&format!("$$\n{}\n$$\n\n", latex)),
            (None, true) => output.push_str("_No result._\n\n"),
            (_, false) => output.push_str("**Failed**\n\n"),
        }

        if !env.steps.is_empty() {
            output.push_str("## Steps\n\n");
            for step in &env.steps {
                output.push_str(&self.render_step(step));
            }
            output.push('\n');
        }

        for (title, items) in [("Warnings", &env.warnings), ("Errors", &env.errors)] {
            if items.is_empty() {
                continue;
            }
            output.push_str(&format!("## {}\n\n", title));
            for item in items {
                output.push_str(&format!("- {}\n", item));
            }
            output.push('\n');
        }

        if let Some(ms) = env.elapsed_ms {
            output.push_str(&format!("_{:.1} ms_\n", ms));
        }

        output
    }

    fn render_step(&self, step: &Step) -> String {
        let mut line = format!("{}. **{}**", step.index, step.rule);
        match (&step.before_latex, &step.after_latex) {
            (Some(b), Some(a)) => line.push_str(&format!(": ${}$ → ${}$", b, a)),
            (Some(b), None) => line.push_str(&format!(": ${}$", b)),
            (None, Some(a)) => line.push_str(&format!(": ${}$", a)),
            (None, None) => {}
        }
        if let Some(note) = &step.note {
            line.push_str(&format!(" _({})_", note));
        }
        line.push('\n');
        if self.show_meta {
            for (k, v) in &step.meta {
                line.push_str(&format!("   - {}: {}\n", k, v));
            }
        }
        line
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_core::Value;
    use std::collections::BTreeMap;

    fn step(index: usize, rule: &str, before: Option<&str>, after: Option<&str>, note: Option<&str>) -> Step {
        Step {
            index,
            rule: rule.to_string(),
            before_latex: before.map(String::from),
            after_latex: after.map(String::from),
            note: note.map(String::from),
            meta: BTreeMap::new(),
        }
    }

    #[test]
    fn test_success_document() {
        let env = ResultEnvelope::success(
            "5 x",
            vec![
                step(1, "Initial expression", None, Some("2 x + 3 x"), None),
                step(2, "Expand (distribute)", Some("2 x + 3 x"), Some("5 x"), None),
            ],
        )
        .with_elapsed_ms(2.0);
        let md = Renderer::new().render(&env);
        assert!(md.contains("$$\n5 x\n$$"));
        assert!(md.contains("1. **Initial expression**: $2 x + 3 x$\n"));
        assert!(md.contains("2. **Expand (distribute)**: $2 x + 3 x$ → $5 x$\n"));
        assert!(md.ends_with("_2.0 ms_\n"));
        assert!(!md.contains("## Errors"));
    }

    #[test]
    fn test_failure_document() {
        let env = ResultEnvelope::failure(
            "Limit error: boom",
            vec![step(1, "Limit as x → 0", Some("x"), None, Some("approach"))],
        )
        .with_warnings(vec!["Plain parse warning: bad".into()]);
        let md = Renderer::new().render(&env);
        assert!(md.contains("**Failed**"));
        assert!(md.contains("_(approach)_"));
        assert!(md.contains("## Warnings\n\n- Plain parse warning: bad\n"));
        assert!(md.contains("## Errors\n\n- Limit error: boom\n"));
    }

    #[test]
    fn test_meta_listing() {
        let mut s = step(1, "Parse query", None, None, None);
        s.meta.insert("source".into(), Value::from("raw"));
        let env = ResultEnvelope::success("10", vec![s]);
        assert!(Renderer::new().with_meta(true).render(&env).contains("   - source: raw\n"));
        assert!(!Renderer::new().render(&env).contains("source"));
    }
}
