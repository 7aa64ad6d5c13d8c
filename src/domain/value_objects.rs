// Value objects shared by the model builders, the solver adapters and the
// result interpreter

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Type of decision variable in the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    /// Continuous real number (x ∈ ℝ)
    Continuous,
    /// Integer number (x ∈ ℤ)
    Integer,
    /// Binary variable (x ∈ {0, 1})
    Binary,
}

/// Type of constraint comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    /// Less than or equal (≤)
    LessThanOrEqual,
    /// Equal (=)
    Equal,
    /// Greater than or equal (≥)
    GreaterThanOrEqual,
}

impl ConstraintType {
    /// Whether `lhs <op> rhs` holds within `tolerance`.
    pub fn holds(self, lhs: f64, rhs: f64, tolerance: f64) -> bool {
        match self {
            ConstraintType::LessThanOrEqual => lhs <= rhs + tolerance,
            ConstraintType::Equal => (lhs - rhs).abs() <= tolerance,
            ConstraintType::GreaterThanOrEqual => lhs >= rhs - tolerance,
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintType::LessThanOrEqual => write!(f, "<="),
            ConstraintType::Equal => write!(f, "=="),
            ConstraintType::GreaterThanOrEqual => write!(f, ">="),
        }
    }
}

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationType {
    /// Minimize the objective function
    Minimize,
    /// Maximize the objective function
    Maximize,
}

/// Overall outcome of the solver run, independent of what it proved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverStatus {
    /// The solver ran to completion
    Ok,
    /// The solver stopped early (limits reached) but returned normally
    Warning,
    /// The solver reported an internal error
    Error,
    /// The solver was interrupted
    Aborted,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStatus::Ok => write!(f, "ok"),
            SolverStatus::Warning => write!(f, "warning"),
            SolverStatus::Error => write!(f, "error"),
            SolverStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// What the solver proved about the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCondition {
    /// Proven optimal solution
    Optimal,
    /// Feasible solution found, optimality not proven
    Feasible,
    /// Problem has no feasible solution
    Infeasible,
    /// Objective can be improved infinitely
    Unbounded,
    /// Time limit reached
    MaxTimeLimit,
    /// Solver error occurred
    Error,
}

impl fmt::Display for TerminationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationCondition::Optimal => write!(f, "optimal"),
            TerminationCondition::Feasible => write!(f, "feasible"),
            TerminationCondition::Infeasible => write!(f, "infeasible"),
            TerminationCondition::Unbounded => write!(f, "unbounded"),
            TerminationCondition::MaxTimeLimit => write!(f, "maxTimeLimit"),
            TerminationCondition::Error => write!(f, "error"),
        }
    }
}

/// Solver backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverBackend {
    /// COIN-OR CBC, run as an external executable
    Cbc,
    /// GNU GLPK (`glpsol`), run as an external executable
    Glpk,
    /// Bundled pure-Rust MILP solver
    Microlp,
    /// HiGHS, linked in-process
    Highs,
}

impl SolverBackend {
    /// Every backend known to the configuration surface.
    pub const ALL: [SolverBackend; 4] = [
        SolverBackend::Cbc,
        SolverBackend::Glpk,
        SolverBackend::Microlp,
        SolverBackend::Highs,
    ];

    /// Short configuration identifier (`cbc`, `glpk`, ...).
    pub fn key(self) -> &'static str {
        match self {
            SolverBackend::Cbc => "cbc",
            SolverBackend::Glpk => "glpk",
            SolverBackend::Microlp => "microlp",
            SolverBackend::Highs => "highs",
        }
    }

    /// External backends are separate processes located through an executable path.
    pub fn is_external(self) -> bool {
        matches!(self, SolverBackend::Cbc | SolverBackend::Glpk)
    }
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverBackend::Cbc => write!(f, "COIN-OR CBC"),
            SolverBackend::Glpk => write!(f, "GLPK"),
            SolverBackend::Microlp => write!(f, "microlp"),
            SolverBackend::Highs => write!(f, "HiGHS"),
        }
    }
}

impl FromStr for SolverBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SolverBackend::ALL
            .into_iter()
            .find(|backend| backend.key() == wanted)
            .ok_or_else(|| format!("unknown solver '{s}' (expected one of cbc, glpk, microlp, highs)"))
    }
}
