use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::math::units::{power_db, TO_DEG, TO_RAD};

/// Complex amplitudes of the two polarisation components.
///
/// Only the rectangular pair is stored; magnitudes, phases and decibel forms
/// are recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexField {
    pub e_theta: Complex64,
    pub e_phi: Complex64,
}

impl ComplexField {
    pub const fn new(e_theta: Complex64, e_phi: Complex64) -> Self {
        Self { e_theta, e_phi }
    }

    /// Builds the pair from magnitudes and phases given in degrees.
    pub fn from_polar_deg(theta_abs: f64, theta_deg: f64, phi_abs: f64, phi_deg: f64) -> Self {
        Self {
            e_theta: Complex64::from_polar(theta_abs, theta_deg * TO_RAD),
            e_phi: Complex64::from_polar(phi_abs, phi_deg * TO_RAD),
        }
    }

    pub fn e_theta_abs(&self) -> f64 {
        self.e_theta.norm()
    }

    /// `10·log10(|E_theta|)`.
    pub fn e_theta_abs_db(&self) -> f64 {
        power_db(self.e_theta_abs())
    }

    pub fn e_theta_phase_deg(&self) -> f64 {
        self.e_theta.arg() * TO_DEG
    }

    pub fn e_phi_abs(&self) -> f64 {
        self.e_phi.norm()
    }

    /// `10·log10(|E_phi|)`.
    pub fn e_phi_abs_db(&self) -> f64 {
        power_db(self.e_phi_abs())
    }

    pub fn e_phi_phase_deg(&self) -> f64 {
        self.e_phi.arg() * TO_DEG
    }

    /// Total magnitude across both polarisations.
    pub fn abs(&self) -> f64 {
        (self.e_theta.norm_sqr() + self.e_phi.norm_sqr()).sqrt()
    }

    pub fn abs_db(&self) -> f64 {
        power_db(self.abs())
    }

    /// Component-wise combination: real parts and imaginary parts are each
    /// summed in quadrature.
    pub fn combined(&self) -> Complex64 {
        Complex64::new(
            self.e_theta.re.hypot(self.e_phi.re),
            self.e_theta.im.hypot(self.e_phi.im),
        )
    }
}
