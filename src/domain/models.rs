use super::value_objects::{
    ConstraintType, OptimizationType, SolverStatus, TerminationCondition, VariableType,
};

/// Index of a variable inside its [`OptimizationProblem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// Decision variable in an optimization problem
#[derive(Debug, Clone)]
pub struct Variable {
    pub variable_type: VariableType,
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub name: String,
}

impl Variable {
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Continuous,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Integer,
            lower_bound: 0.0,
            upper_bound: None,
            name: name.into(),
        }
    }

    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            variable_type: VariableType::Binary,
            lower_bound: 0.0,
            upper_bound: Some(1.0),
            name: name.into(),
        }
    }

    pub fn with_bounds(mut self, lower: f64, upper: Option<f64>) -> Self {
        self.lower_bound = lower;
        self.upper_bound = upper;
        self
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.variable_type,
            VariableType::Integer | VariableType::Binary
        )
    }

    /// Value the variable is pinned to when its bounds coincide.
    pub fn fixed_value(&self) -> Option<f64> {
        self.upper_bound
            .filter(|upper| (upper - self.lower_bound).abs() <= f64::EPSILON)
            .map(|_| self.lower_bound)
    }
}

/// Sparse affine expression `Σ coefficient·x + constant`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn with_term(mut self, var: VarId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn is_constant(&self) -> bool {
        self.terms.iter().all(|&(_, coefficient)| coefficient == 0.0)
    }

    /// Evaluate against a full assignment of variable values.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(VarId(i), coefficient)| coefficient * values.get(i).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

/// Objective function to minimize or maximize
#[derive(Debug, Clone)]
pub struct ObjectiveFunction {
    pub optimization_type: OptimizationType,
    pub expression: LinearExpr,
}

impl ObjectiveFunction {
    pub fn maximize(expression: LinearExpr) -> Self {
        Self {
            optimization_type: OptimizationType::Maximize,
            expression,
        }
    }

    pub fn minimize(expression: LinearExpr) -> Self {
        Self {
            optimization_type: OptimizationType::Minimize,
            expression,
        }
    }
}

/// Linear constraint `expression <op> bound`
#[derive(Debug, Clone)]
pub struct Constraint {
    pub constraint_type: ConstraintType,
    pub expression: LinearExpr,
    pub bound: f64,
    /// Constraint family, e.g. `cluster_capacity`
    pub family: &'static str,
    pub name: String,
}

impl Constraint {
    pub fn new(
        family: &'static str,
        expression: LinearExpr,
        constraint_type: ConstraintType,
        bound: f64,
    ) -> Self {
        Self {
            constraint_type,
            expression,
            bound,
            family,
            name: family.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether the constraint holds for a full assignment of values.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        self.constraint_type
            .holds(self.expression.evaluate(values), self.bound, tolerance)
    }
}

/// Complete optimization problem
#[derive(Debug, Clone)]
pub struct OptimizationProblem {
    pub name: String,
    pub objective: ObjectiveFunction,
    pub constraints: Vec<Constraint>,
    pub variables: Vec<Variable>,
}

impl OptimizationProblem {
    pub fn new(name: impl Into<String>, objective: ObjectiveFunction) -> Self {
        Self {
            name: name.into(),
            objective,
            constraints: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn set_objective(&mut self, objective: ObjectiveFunction) {
        self.objective = objective;
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_integer_variables(&self) -> usize {
        self.variables.iter().filter(|v| v.is_integer()).count()
    }

    pub fn is_mixed_integer(&self) -> bool {
        self.num_integer_variables() > 0
    }

    /// Structural check: every referenced variable exists, bounds are ordered
    /// and all coefficients are finite.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let num_vars = self.num_variables();
        let mut errors = Vec::new();

        let mut check_expr = |owner: &str, expr: &LinearExpr| {
            for &(VarId(i), coefficient) in &expr.terms {
                if i >= num_vars {
                    errors.push(format!("{owner} references unknown variable #{i}"));
                }
                if !coefficient.is_finite() {
                    errors.push(format!("{owner} has non-finite coefficient {coefficient}"));
                }
            }
        };

        check_expr("objective", &self.objective.expression);
        for constraint in &self.constraints {
            check_expr(&format!("constraint '{}'", constraint.name), &constraint.expression);
        }

        for constraint in &self.constraints {
            if !constraint.bound.is_finite() {
                errors.push(format!(
                    "constraint '{}' has non-finite bound {}",
                    constraint.name, constraint.bound
                ));
            }
        }

        for var in &self.variables {
            if let Some(upper) = var.upper_bound {
                if var.lower_bound > upper {
                    errors.push(format!(
                        "variable '{}' has lower bound ({}) > upper bound ({})",
                        var.name, var.lower_bound, upper
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Statistics about the solve process
#[derive(Debug, Clone, Default)]
pub struct SolverStatistics {
    pub solve_time_ms: f64,
    pub num_variables: u32,
    pub num_constraints: u32,
    pub num_integer_vars: u32,
    pub fixed_variables: u32,
    pub deactivated_constraints: u32,
}

/// Solution to an optimization problem
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolverStatus,
    pub termination: TerminationCondition,
    pub objective_value: Option<f64>,
    pub variable_values: Vec<f64>,
    pub message: String,
    pub statistics: SolverStatistics,
}

impl Solution {
    pub fn new(
        status: SolverStatus,
        termination: TerminationCondition,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            termination,
            objective_value: None,
            variable_values: Vec::new(),
            message: message.into(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn optimal(value: f64, variable_values: Vec<f64>) -> Self {
        Self {
            status: SolverStatus::Ok,
            termination: TerminationCondition::Optimal,
            objective_value: Some(value),
            variable_values,
            message: "Optimal solution found".to_string(),
            statistics: SolverStatistics::default(),
        }
    }

    pub fn infeasible(message: impl Into<String>) -> Self {
        Self::new(SolverStatus::Ok, TerminationCondition::Infeasible, message)
    }

    pub fn with_statistics(mut self, statistics: SolverStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolverStatus::Ok && self.termination == TerminationCondition::Optimal
    }

    /// Value of a variable, zero when the solver returned no values.
    pub fn value(&self, var: VarId) -> f64 {
        self.variable_values.get(var.0).copied().unwrap_or(0.0)
    }
}
