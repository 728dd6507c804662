use crate::CoreError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Interpret a grid value as a whole number (stage counts and the like).
///
/// Values within 1e-9 of an integer are accepted so that `10.0` read from
/// YAML maps to `10`.
pub fn as_whole_number(v: Real, what: &'static str) -> Result<u32, CoreError> {
    let v = ensure_finite(v, what)?;
    let rounded = v.round();
    if (v - rounded).abs() > 1e-9 || rounded < 0.0 || rounded > u32::MAX as f64 {
        return Err(CoreError::NotInteger { what, value: v });
    }
    Ok(rounded as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn whole_numbers() {
        assert_eq!(as_whole_number(10.0, "stages").unwrap(), 10);
        assert_eq!(as_whole_number(7.000_000_000_1, "stages").unwrap(), 7);
        assert!(matches!(
            as_whole_number(2.5, "stages"),
            Err(CoreError::NotInteger { .. })
        ));
        assert!(as_whole_number(-1.0, "stages").is_err());
        assert!(as_whole_number(f64::INFINITY, "stages").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn integers_survive_as_whole_numbers(n in 0u32..100_000) {
            prop_assert_eq!(as_whole_number(n as f64, "n").unwrap(), n);
        }

        #[test]
        fn half_steps_are_rejected(n in 0u32..100_000) {
            prop_assert!(as_whole_number(n as f64 + 0.5, "n").is_err());
        }
    }
}
