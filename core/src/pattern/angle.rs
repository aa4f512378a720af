use serde::{Deserialize, Serialize};

use crate::math::units::TO_RAD;

/// Sampling direction on the far-field sphere, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleCoordinate {
    pub theta: f64,
    pub phi: f64,
}

impl AngleCoordinate {
    pub const fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }

    pub fn theta_rad(&self) -> f64 {
        self.theta * TO_RAD
    }

    pub fn phi_rad(&self) -> f64 {
        self.phi * TO_RAD
    }
}
