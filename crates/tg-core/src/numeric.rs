use crate::{TgError, TgResult};

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> TgResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TgError::NonFinite { what, value: v })
    }
}

/// Bit pattern of a float with `-0.0` folded into `0.0`.
///
/// Used to key graph nodes by observed value; callers must reject NaN first.
pub fn canonical_bits(v: Real) -> u64 {
    if v == 0.0 { 0.0_f64.to_bits() } else { v.to_bits() }
}

/// Min–max normalization into `[0, 1]`; a degenerate span maps to 0.
pub fn min_max_normalize(v: Real, min: Real, max: Real) -> Real {
    let span = max - min;
    if !(span > 0.0) {
        return 0.0;
    }
    ((v - min) / span).clamp(0.0, 1.0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_value_stays_in_unit_interval(
            v in -1e6_f64..1e6,
            a in -1e6_f64..1e6,
            b in -1e6_f64..1e6,
        ) {
            let (min, max) = if a <= b { (a, b) } else { (b, a) };
            let n = min_max_normalize(v, min, max);
            prop_assert!((0.0..=1.0).contains(&n));
        }
    }
}
