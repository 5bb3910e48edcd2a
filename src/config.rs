//! # Aggregation settings
//!
//! Every field has a default, so hosts may deserialize partial configs.

use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings of the minimum-volume ellipse fit
#[derive(Clone, Debug, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct EllipseFitConfig {
    /// Relative optimality gap at which the iteration stops
    #[derivative(Default(value = "1e-12"))]
    pub tolerance: f64,
    #[derivative(Default(value = "1000"))]
    pub max_iterations: usize,
    /// Point clouds whose minor/major variance ratio falls below this are treated as collinear
    #[derivative(Default(value = "1e-9"))]
    pub degeneracy_ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Derivative, Serialize, Deserialize)]
#[derivative(Default)]
#[serde(default)]
pub struct AggregationConfig {
    /// Buckets with fewer member ids produce no group
    #[derivative(Default(value = "2"))]
    pub min_group_size: usize,
    pub ellipse: EllipseFitConfig,
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_group_size < 2 {
            return Err(Error::config(format!(
                "min_group_size must be at least 2, got {}",
                self.min_group_size
            )));
        }
        self.ellipse.validate()
    }
}

impl EllipseFitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > 0.0) {
            return Err(Error::config(format!("ellipse tolerance must be positive, got {}", self.tolerance)));
        }
        if self.max_iterations == 0 {
            return Err(Error::config("ellipse max_iterations must be non-zero"));
        }
        if !(self.degeneracy_ratio >= 0.0) {
            return Err(Error::config(format!(
                "ellipse degeneracy_ratio must not be negative, got {}",
                self.degeneracy_ratio
            )));
        }
        Ok(())
    }
}
