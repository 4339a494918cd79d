//! Per-run proving parameters.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StarkError};

/// Immutable parameters of one proof run.
///
/// | Field | Description |
/// |-------|-------------|
/// | `transition_constraint_degree` | Bound on the AIR degree; sizes the trace domain. |
/// | `expansion_factor` | FRI domain blow-up over the trace domain. |
/// | `num_randomizers` | Filler rows appended to the trace. |
/// | `num_colinearity_checks` | Spot checks per FRI round. |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarkConfig {
    pub transition_constraint_degree: usize,
    pub expansion_factor: usize,
    pub num_randomizers: usize,
    pub num_colinearity_checks: usize,
}

impl Default for StarkConfig {
    fn default() -> Self {
        Self {
            transition_constraint_degree: 2,
            expansion_factor: 4,
            num_randomizers: 2,
            num_colinearity_checks: 1,
        }
    }
}

impl StarkConfig {
    /// Parameters sized for the register machine's degree-10 constraints.
    pub fn machine() -> Self {
        Self {
            transition_constraint_degree: 11,
            expansion_factor: 4,
            num_randomizers: 1,
            num_colinearity_checks: 1,
        }
    }

    pub fn with_transition_constraint_degree(mut self, degree: usize) -> Self {
        self.transition_constraint_degree = degree;
        self
    }

    pub fn with_expansion_factor(mut self, factor: usize) -> Self {
        self.expansion_factor = factor;
        self
    }

    pub fn with_num_randomizers(mut self, count: usize) -> Self {
        self.num_randomizers = count;
        self
    }

    pub fn with_num_colinearity_checks(mut self, count: usize) -> Self {
        self.num_colinearity_checks = count;
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StarkError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.transition_constraint_degree == 0 {
            return Err(StarkError::InvalidConfig(
                "transition constraint degree must be positive".into(),
            ));
        }
        if self.expansion_factor < 2 || !self.expansion_factor.is_power_of_two() {
            return Err(StarkError::InvalidConfig(format!(
                "expansion factor {} is not a power of two >= 2",
                self.expansion_factor
            )));
        }
        if self.num_colinearity_checks == 0 {
            return Err(StarkError::InvalidConfig(
                "at least one colinearity check is required".into(),
            ));
        }
        Ok(())
    }
}
