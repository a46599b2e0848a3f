use thiserror::Error;

/// Construction-time validation failures.
///
/// These indicate a wiring or configuration defect. Nothing in the stepping
/// path returns an error; runtime degeneracies are absorbed instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A physical constant is non-finite or not strictly positive.
    #[error("parameter `{name}` must be finite and positive, got {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// A `[min, max]` band is flipped or contains a non-finite bound.
    #[error("bounds `{name}` are invalid: min {min} must be finite and below max {max}")]
    InvalidBounds { name: &'static str, min: f64, max: f64 },

    /// A coefficient that must lie strictly inside (0, 1).
    #[error("coefficient `{name}` must lie in (0, 1), got {value}")]
    InvalidCoefficient { name: &'static str, value: f64 },

    /// The analytics history must hold at least one sample.
    #[error("history capacity must be at least 1")]
    ZeroCapacity,
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

pub(crate) fn unit_open(name: &'static str, value: f64) -> Result<(), SimError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SimError::InvalidCoefficient { name, value })
    }
}

pub(crate) fn band(name: &'static str, min: f64, max: f64) -> Result<(), SimError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(SimError::InvalidBounds { name, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_and_non_positive() {
        assert!(positive("mass", 1.0).is_ok());
        assert!(positive("mass", 0.0).is_err());
        assert!(positive("mass", f64::NAN).is_err());
        assert!(non_negative("friction", 0.0).is_ok());
        assert!(non_negative("friction", -0.1).is_err());
    }

    #[test]
    fn band_must_be_ordered() {
        assert!(band("output", -1.0, 1.0).is_ok());
        assert_eq!(
            band("output", 1.0, -1.0),
            Err(SimError::InvalidBounds { name: "output", min: 1.0, max: -1.0 })
        );
        assert!(band("output", f64::NEG_INFINITY, 1.0).is_err());
    }

    #[test]
    fn coefficient_is_open_interval() {
        assert!(unit_open("alpha", 0.5).is_ok());
        assert!(unit_open("alpha", 0.0).is_err());
        assert!(unit_open("alpha", 1.0).is_err());
        assert!(unit_open("alpha", f64::NAN).is_err());
    }
}
