//! Linear algebra: RREF, eigen decomposition, determinant, nullspace

use crate::area_failure;
use sigma_plugin::prelude::*;

pub struct LinearAlgebraSolver;

static LA_SUBJECTS: [Subject; 1] = [Subject::La];
static LA_MODES: [Mode; 5] = [Mode::Auto, Mode::Rref, Mode::Eigen, Mode::Det, Mode::Nullspace];
static LA_EXAMPLES: [&str; 3] = [
    "[[1,2],[3,4]]",
    "\\begin{bmatrix}2 & 0\\\\0 & 3\\end{bmatrix}",
    "[1,2],[2,4]",
];

impl SolverPlugin for LinearAlgebraSolver {
    fn meta(&self) -> SolverMeta {
        SolverMeta {
            name: "linear_algebra",
            description: "Row reduction, eigenvalues and eigenvectors, determinants and nullspaces of matrices",
            subjects: &LA_SUBJECTS,
            modes: &LA_MODES,
            examples: &LA_EXAMPLES,
        }
    }

    fn dispatch(&self, parsed: &ParsedExpression, mode: Mode, ctx: &SolveContext) -> ResultEnvelope {
        if !LA_MODES.contains(&mode) {
            return ResultEnvelope::unsupported_mode(mode.as_str());
        }
        let m = match parsed.as_matrix() {
            Some(m) => m,
            None => return ResultEnvelope::failure("Expression must be a matrix", Vec::new()),
        };
        match mode {
            Mode::Eigen => do_eigen(m, ctx),
            Mode::Det => do_det(m, ctx),
            Mode::Nullspace => do_nullspace(m, ctx),
            _ => do_rref(m, ctx),
        }
    }
}

fn do_rref(m: &Matrix, ctx: &SolveContext) -> ResultEnvelope {
    let mut rec = ctx.recorder();
    rec.add("Initial matrix", None, Some(m), None, None);

    let (reduced, pivots) = ctx.engine().rref(m);
    rec.add(
        "Compute RREF",
        Some(m),
        Some(&reduced),
        Some(format!("Pivot columns: {:?}", pivots)),
        None,
    );

    let latex = rec.render(&reduced);
    ResultEnvelope::success(latex, rec.finalize())
}

fn do_eigen(m: &Matrix, ctx: &SolveContext) -> ResultEnvelope {
    if !m.is_square() {
        return ResultEnvelope::failure("Matrix must be square for eigenvalues", Vec::new());
    }
    let mut rec = ctx.recorder();
    rec.add("Initial matrix", None, Some(m), None, None);

    let pairs = match ctx.engine().eigenvects(m) {
        Ok(p) => p,
        Err(err) => return area_failure("Eigenvalue", &err, rec),
    };
    let spectrum = multiplicities_latex(&pairs, &rec);
    rec.add(
        "Compute eigenvalues",
        Some(m),
        Some(&spectrum),
        Some("eigenvalue: multiplicity".to_string()),
        None,
    );

    for pair in &pairs {
        let rule = format!("Eigenvector for λ={}", pair.value);
        match pair.vectors.first() {
            Some(v) => rec.add(&rule, None, Some(v), None, None),
            None => rec.add(&rule, None, None, None, None),
        }
    }

    ResultEnvelope::success(spectrum, rec.finalize())
}

/// `{λ₁ : m₁, λ₂ : m₂}` in LaTeX
fn multiplicities_latex(pairs: &[Eigenpair], rec: &StepRecorder<'_>) -> String {
    let items: Vec<String> = pairs
        .iter()
        .map(|p| format!("{} : {}", rec.render(&p.value), p.multiplicity))
        .collect();
    format!("\\left\\{{ {}\\right\\}}", items.join(", \\  "))
}

fn do_det(m: &Matrix, ctx: &SolveContext) -> ResultEnvelope {
    if !m.is_square() {
        return ResultEnvelope::failure("Matrix must be square for determinant", Vec::new());
    }
    let mut rec = ctx.recorder();
    rec.add("Initial matrix", None, Some(m), None, None);

    let det = match ctx.engine().det(m) {
        Ok(d) => d,
        Err(err) => return area_failure("Determinant", &err, rec),
    };
    rec.add("Compute determinant", Some(m), Some(&det), None, None);

    let latex = rec.render(&det);
    ResultEnvelope::success(latex, rec.finalize())
}

fn do_nullspace(m: &Matrix, ctx: &SolveContext) -> ResultEnvelope {
    let mut rec = ctx.recorder();
    rec.add("Initial matrix", None, Some(m), None, None);

    let basis = ctx.engine().nullspace(m);
    let shown: Vec<String> = basis.iter().map(|v| rec.render(v)).collect();
    let latex = format!("\\left[ {}\\right]", shown.join(", \\  "));
    rec.add(
        "Compute nullspace",
        Some(m),
        Some(&latex),
        Some(format!("Dimension: {}", basis.len())),
        None,
    );

    ResultEnvelope::success(latex, rec.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(text: &str) -> ParsedExpression {
        ParsedExpression::Matrix(Matrix::parse_literal(text).unwrap())
    }

    fn run(parsed: ParsedExpression, mode: Mode) -> ResultEnvelope {
        let ctx = SolveContext::default().with_subject(Subject::La);
        LinearAlgebraSolver.dispatch(&parsed, mode, &ctx)
    }

    fn rules(env: &ResultEnvelope) -> Vec<&str> {
        env.steps.iter().map(|s| s.rule.as_str()).collect()
    }

    #[test]
    fn test_rref_pivots_in_note() {
        let env = run(matrix("[[1,2],[3,4]]"), Mode::Auto);
        assert!(env.ok, "{:?}", env.errors);
        assert_eq!(rules(&env), vec!["Initial matrix", "Compute RREF"]);
        assert_eq!(env.steps[1].note.as_deref(), Some("Pivot columns: [0, 1]"));
        assert_eq!(
            env.result_latex.as_deref(),
            Some("\\left[\\begin{matrix}1 & 0\\\\0 & 1\\end{matrix}\\right]")
        );
    }

    #[test]
    fn test_eigen_steps() {
        let env = run(matrix("[[2,0],[0,3]]"), Mode::Eigen);
        assert!(env.ok, "{:?}", env.errors);
        assert_eq!(
            rules(&env),
            vec!["Initial matrix", "Compute eigenvalues", "Eigenvector for λ=2", "Eigenvector for λ=3"]
        );
        assert_eq!(env.steps[1].note.as_deref(), Some("eigenvalue: multiplicity"));
        assert_eq!(env.result_latex.as_deref(), Some("\\left\\{ 2 : 1, \\  3 : 1\\right\\}"));
    }

    #[test]
    fn test_repeated_eigenvalue_multiplicity() {
        let env = run(matrix("[[1,1],[0,1]]"), Mode::Eigen);
        assert_eq!(env.result_latex.as_deref(), Some("\\left\\{ 1 : 2\\right\\}"));
        assert_eq!(env.steps.len(), 3);
    }

    #[test]
    fn test_determinant() {
        let env = run(matrix("[[1,2],[3,4]]"), Mode::Det);
        assert_eq!(rules(&env), vec!["Initial matrix", "Compute determinant"]);
        assert_eq!(env.result_latex.as_deref(), Some("-2"));
    }

    #[test]
    fn test_nullspace_dimension() {
        let env = run(matrix("[[1,2],[2,4]]"), Mode::Nullspace);
        assert!(env.ok);
        assert_eq!(env.steps[1].note.as_deref(), Some("Dimension: 1"));
        let full_rank = run(matrix("[[1,0],[0,1]]"), Mode::Nullspace);
        assert_eq!(full_rank.steps[1].note.as_deref(), Some("Dimension: 0"));
    }

    #[test]
    fn test_validation_before_compute() {
        let env = run(ParsedExpression::Expression(Expr::sym("x")), Mode::Rref);
        assert_eq!(env.errors, vec!["Expression must be a matrix".to_string()]);
        assert!(env.steps.is_empty());

        let env = run(matrix("[[1,2,3],[4,5,6]]"), Mode::Eigen);
        assert_eq!(env.errors, vec!["Matrix must be square for eigenvalues".to_string()]);
        let env = run(matrix("[[1,2,3],[4,5,6]]"), Mode::Det);
        assert_eq!(env.errors, vec!["Matrix must be square for determinant".to_string()]);
    }

    #[test]
    fn test_rectangular_rref_and_nullspace_allowed() {
        assert!(run(matrix("[[1,2,3],[4,5,6]]"), Mode::Rref).ok);
        assert!(run(matrix("[[1,2,3],[4,5,6]]"), Mode::Nullspace).ok);
    }

    #[test]
    fn test_unsupported_mode() {
        let env = run(matrix("[[1]]"), Mode::Logic);
        assert_eq!(env.errors, vec!["Unsupported mode: logic".to_string()]);
    }
}
