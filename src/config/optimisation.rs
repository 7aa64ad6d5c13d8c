//! Solver selection and per-back-end options

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ValidationError;
use crate::domain::value_objects::SolverBackend;
use crate::model::DEFAULT_OVERRUN_PENALTY;

/// Optimisation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimisationConfig {
    /// Back-end used when a request does not name one
    #[serde(default = "default_solver")]
    pub solver: SolverBackend,

    /// Objective penalty per unit of budget overrun
    #[serde(default = "default_overrun_penalty")]
    pub overrun_penalty: f64,

    /// Options per back-end
    #[serde(default)]
    pub solvers: SolverOptionsTable,

    /// Explicit executable locations tried once when the bare name fails
    #[serde(default)]
    pub executables: FallbackExecutables,
}

/// Numeric options handed to a back-end
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SolverOptions {
    pub time_limit_secs: Option<f64>,
    /// Relative MIP gap, e.g. `0.01`
    pub mip_gap: Option<f64>,
    pub seed: Option<u32>,
    pub threads: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolverOptionsTable {
    #[serde(default = "default_cbc_options")]
    pub cbc: SolverOptions,
    #[serde(default = "default_glpk_options")]
    pub glpk: SolverOptions,
    #[serde(default)]
    pub microlp: SolverOptions,
    #[serde(default = "default_highs_options")]
    pub highs: SolverOptions,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FallbackExecutables {
    pub cbc: Option<PathBuf>,
    pub glpk: Option<PathBuf>,
}

impl OptimisationConfig {
    pub fn options_for(&self, backend: SolverBackend) -> &SolverOptions {
        match backend {
            SolverBackend::Cbc => &self.solvers.cbc,
            SolverBackend::Glpk => &self.solvers.glpk,
            SolverBackend::Microlp => &self.solvers.microlp,
            SolverBackend::Highs => &self.solvers.highs,
        }
    }

    /// Fallback executable; in-process back-ends never have one.
    pub fn fallback_for(&self, backend: SolverBackend) -> Option<&Path> {
        match backend {
            SolverBackend::Cbc => self.executables.cbc.as_deref(),
            SolverBackend::Glpk => self.executables.glpk.as_deref(),
            SolverBackend::Microlp | SolverBackend::Highs => None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.overrun_penalty.is_finite() || self.overrun_penalty <= 0.0 {
            return Err(ValidationError::InvalidOverrunPenalty(self.overrun_penalty));
        }
        for backend in SolverBackend::ALL {
            let options = self.options_for(backend);
            if let Some(limit) = options.time_limit_secs {
                if !limit.is_finite() || limit <= 0.0 {
                    return Err(ValidationError::InvalidTimeLimit {
                        solver: backend.key(),
                    });
                }
            }
            if let Some(gap) = options.mip_gap {
                if !(0.0..1.0).contains(&gap) {
                    return Err(ValidationError::InvalidMipGap {
                        solver: backend.key(),
                        value: gap,
                    });
                }
            }
            if let Some(path) = self.fallback_for(backend) {
                if path.as_os_str().is_empty() {
                    return Err(ValidationError::InvalidExecutable {
                        solver: backend.key(),
                        path: path.to_path_buf(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for OptimisationConfig {
    fn default() -> Self {
        Self {
            solver: default_solver(),
            overrun_penalty: default_overrun_penalty(),
            solvers: SolverOptionsTable::default(),
            executables: FallbackExecutables::default(),
        }
    }
}

impl Default for SolverOptionsTable {
    fn default() -> Self {
        Self {
            cbc: default_cbc_options(),
            glpk: default_glpk_options(),
            microlp: SolverOptions::default(),
            highs: default_highs_options(),
        }
    }
}

fn default_solver() -> SolverBackend {
    SolverBackend::Microlp
}

fn default_overrun_penalty() -> f64 {
    DEFAULT_OVERRUN_PENALTY
}

fn default_cbc_options() -> SolverOptions {
    SolverOptions {
        time_limit_secs: Some(600.0),
        mip_gap: Some(0.01),
        seed: Some(999),
        threads: None,
    }
}

fn default_glpk_options() -> SolverOptions {
    SolverOptions {
        time_limit_secs: Some(600.0),
        mip_gap: Some(0.02),
        seed: Some(999),
        threads: None,
    }
}

fn default_highs_options() -> SolverOptions {
    SolverOptions {
        time_limit_secs: Some(600.0),
        mip_gap: Some(0.01),
        seed: Some(999),
        threads: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = OptimisationConfig::default();
        assert_eq!(config.solver, SolverBackend::Microlp);
        assert_eq!(config.overrun_penalty, 10_000.0);
        assert_eq!(config.options_for(SolverBackend::Glpk).mip_gap, Some(0.02));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn only_external_backends_have_fallbacks() {
        let mut config = OptimisationConfig::default();
        config.executables.cbc = Some(PathBuf::from("/opt/cbc/bin/cbc"));

        assert_eq!(
            config.fallback_for(SolverBackend::Cbc),
            Some(Path::new("/opt/cbc/bin/cbc"))
        );
        assert_eq!(config.fallback_for(SolverBackend::Microlp), None);
    }

    #[test]
    fn rejects_out_of_range_gap() {
        let mut config = OptimisationConfig::default();
        config.solvers.cbc.mip_gap = Some(1.5);
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidMipGap {
                solver: "cbc",
                value: 1.5
            })
        );
    }
}
