/// Degrees per radian.
pub const TO_DEG: f64 = 180.0 / std::f64::consts::PI;
/// Radians per degree.
pub const TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Power-domain decibels, `10·log10(value)`.
pub fn power_db(value: f64) -> f64 {
    10.0 * value.log10()
}

/// Amplitude-ratio decibels, `20·log10(value)`.
pub fn amplitude_db(value: f64) -> f64 {
    20.0 * value.log10()
}

pub fn from_power_db(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

pub fn from_amplitude_db(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Returns a linear power value, converting only when the source is in dB.
pub fn linear_from_power(value: f64, is_db: bool) -> f64 {
    if is_db {
        from_power_db(value)
    } else {
        value
    }
}

/// Returns a linear amplitude ratio, converting only when the source is in dB.
pub fn linear_from_amplitude(value: f64, is_db: bool) -> f64 {
    if is_db {
        from_amplitude_db(value)
    } else {
        value
    }
}

/// Returns degrees, converting only when the source is in radians.
pub fn degrees(value: f64, is_deg: bool) -> f64 {
    if is_deg {
        value
    } else {
        value * TO_DEG
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_and_amplitude_db_diverge() {
        assert_eq!(power_db(1.0), 0.0);
        assert_eq!(amplitude_db(1.0), 0.0);
        assert_eq!(power_db(10.0), 10.0);
        assert_eq!(amplitude_db(10.0), 20.0);
    }

    #[test]
    fn db_conversions_invert() {
        assert!((from_power_db(power_db(2.0)) - 2.0).abs() < 1e-12);
        assert!((from_amplitude_db(amplitude_db(0.25)) - 0.25).abs() < 1e-12);
        assert!((power_db(4.0) - 6.020_599_913_279_624).abs() < 1e-12);
    }

    #[test]
    fn degrees_passes_through_or_converts() {
        assert_eq!(degrees(90.0, true), 90.0);
        assert!((degrees(std::f64::consts::PI, false) - 180.0).abs() < 1e-12);
        assert_eq!(linear_from_power(3.0, false), 3.0);
        assert_eq!(linear_from_amplitude(20.0, true), 10.0);
    }
}
