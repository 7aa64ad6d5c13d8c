// Pre-solve reductions applied before a problem reaches a back-end

use crate::domain::models::{
    Constraint, LinearExpr, ObjectiveFunction, OptimizationProblem, VarId, Variable,
};

const TRIVIAL_TOLERANCE: f64 = 1e-9;

/// A problem with fixed variables substituted out and trivial rows dropped
#[derive(Debug, Clone)]
pub struct Presolved {
    pub problem: OptimizationProblem,
    /// Reduced index for every original variable, `None` when fixed
    mapping: Vec<Option<VarId>>,
    /// Pinned value for every fixed original variable
    fixed: Vec<Option<f64>>,
    pub fixed_variables: usize,
    pub deactivated_constraints: usize,
}

impl Presolved {
    /// Expand reduced solver values to the original variable vector.
    pub fn restore(&self, reduced_values: &[f64]) -> Vec<f64> {
        self.mapping
            .iter()
            .zip(&self.fixed)
            .map(|(mapped, fixed)| match (mapped, fixed) {
                (_, Some(value)) => *value,
                (Some(var), None) => reduced_values.get(var.0).copied().unwrap_or(0.0),
                (None, None) => 0.0,
            })
            .collect()
    }

    /// True when nothing is left for a back-end to decide.
    pub fn is_empty(&self) -> bool {
        self.problem.variables.is_empty()
    }
}

/// A constraint with no variable terms left that can never hold
#[derive(Debug, Clone, PartialEq)]
pub struct TrivialViolation {
    pub constraint: String,
    pub lhs: f64,
    pub bound: f64,
}

impl std::fmt::Display for TrivialViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "constraint '{}' reduces to {} against bound {} and cannot hold",
            self.constraint, self.lhs, self.bound
        )
    }
}

/// Substitute fixed variables and deactivate constraints with no terms left.
pub fn presolve(problem: &OptimizationProblem) -> Result<Presolved, TrivialViolation> {
    let fixed: Vec<Option<f64>> = problem.variables.iter().map(Variable::fixed_value).collect();

    let mut variables = Vec::new();
    let mut mapping = Vec::with_capacity(problem.variables.len());
    for (variable, pinned) in problem.variables.iter().zip(&fixed) {
        if pinned.is_some() {
            mapping.push(None);
        } else {
            mapping.push(Some(VarId(variables.len())));
            variables.push(variable.clone());
        }
    }

    let reduce = |expr: &LinearExpr| {
        let mut reduced = LinearExpr {
            terms: Vec::with_capacity(expr.terms.len()),
            constant: expr.constant,
        };
        for &(var, coefficient) in &expr.terms {
            match (mapping[var.0], fixed[var.0]) {
                (_, Some(value)) => reduced.constant += coefficient * value,
                (Some(mapped), None) => reduced.add_term(mapped, coefficient),
                (None, None) => {}
            }
        }
        reduced
    };

    let mut constraints = Vec::with_capacity(problem.constraints.len());
    let mut deactivated = 0;
    for constraint in &problem.constraints {
        let expression = reduce(&constraint.expression);
        if expression.is_constant() {
            let lhs = expression.constant;
            if !constraint
                .constraint_type
                .holds(lhs, constraint.bound, TRIVIAL_TOLERANCE)
            {
                return Err(TrivialViolation {
                    constraint: constraint.name.clone(),
                    lhs,
                    bound: constraint.bound,
                });
            }
            deactivated += 1;
            continue;
        }
        constraints.push(Constraint {
            expression,
            ..constraint.clone()
        });
    }

    let objective = ObjectiveFunction {
        optimization_type: problem.objective.optimization_type,
        expression: reduce(&problem.objective.expression),
    };

    let fixed_variables = fixed.iter().filter(|v| v.is_some()).count();
    Ok(Presolved {
        problem: OptimizationProblem {
            name: problem.name.clone(),
            objective,
            constraints,
            variables,
        },
        mapping,
        fixed,
        fixed_variables,
        deactivated_constraints: deactivated,
    })
}
