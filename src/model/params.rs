//! Parameter values: fixed constants, unbound placeholders, and bound results.
//!
//! Purpose
//! -------
//! Define the closed tagged variant [`Param`] used for every component
//! parameter in a model: a plain numeric constant, an unbound [`Fittable`]
//! placeholder awaiting optimization, or a bound [`Fitted`] value that
//! behaves as a real number while retaining its bounds for post-hoc
//! boundary-hit diagnostics.
//!
//! Key behaviors
//! -------------
//! - [`Fittable`] carries a `default` starting point and closed `[minval,
//!   maxval]` bounds, with `±∞` meaning unconstrained. Each construction
//!   allocates a fresh [`FittableId`]; *copying* a `Fittable` preserves the
//!   id, which is how two parameter slots are declared numerically equal.
//! - [`Fittable::make_fitted`] resolves a raw optimizer value into a
//!   [`Fitted`] clamped into the bounds, so `minval ≤ value ≤ maxval` holds
//!   even for optimization backends that ignore box constraints.
//! - [`Fitted`] exposes the 1%-of-range boundary-hit predicates used by the
//!   fit diagnostics.
//!
//! Invariants & assumptions
//! ------------------------
//! - `minval < maxval` and `minval ≤ default ≤ maxval`, validated at
//!   construction.
//! - Identity (not value equality) drives deduplication in the binding
//!   registry: two independently constructed `Fittable`s with identical
//!   numbers are distinct parameters.
use crate::model::errors::{ModelError, ModelResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Fraction of a bound's range below which a fitted value counts as having
/// hit that bound.
const BOUNDARY_FRACTION: f64 = 0.01;

static NEXT_FITTABLE_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a fittable parameter.
///
/// Two parameter slots holding `Fittable`s with the same id are constrained
/// to be numerically equal after fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FittableId(u64);

/// An unbound parameter placeholder with a default starting point and
/// closed bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fittable {
    id: FittableId,
    pub default: f64,
    pub minval: f64,
    pub maxval: f64,
}

impl Fittable {
    /// Construct a fittable with the given default and bounds, allocating a
    /// fresh identity.
    ///
    /// # Errors
    /// - [`ModelError::InvalidFittableBounds`] if `minval >= maxval` or
    ///   either bound is NaN.
    /// - [`ModelError::InvalidFittableDefault`] if the default is not finite
    ///   or falls outside the bounds.
    pub fn new(default: f64, minval: f64, maxval: f64) -> ModelResult<Fittable> {
        if minval.is_nan() || maxval.is_nan() {
            return Err(ModelError::InvalidFittableBounds {
                minval,
                maxval,
                reason: "Bounds must not be NaN.",
            });
        }
        if minval >= maxval {
            return Err(ModelError::InvalidFittableBounds {
                minval,
                maxval,
                reason: "Lower bound must be strictly below upper bound.",
            });
        }
        if !default.is_finite() {
            return Err(ModelError::InvalidFittableDefault {
                default,
                minval,
                maxval,
                reason: "Default must be finite.",
            });
        }
        if default < minval || default > maxval {
            return Err(ModelError::InvalidFittableDefault {
                default,
                minval,
                maxval,
                reason: "Default must lie inside the bounds.",
            });
        }
        let id = FittableId(NEXT_FITTABLE_ID.fetch_add(1, Ordering::Relaxed));
        Ok(Fittable { id, default, minval, maxval })
    }

    /// Construct an unconstrained fittable (`-∞`, `+∞` bounds).
    pub fn unbounded(default: f64) -> ModelResult<Fittable> {
        Fittable::new(default, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Stable identity used for deduplication across parameter slots.
    pub fn id(&self) -> FittableId {
        self.id
    }

    /// Resolve a raw optimizer value into a [`Fitted`] carrying these
    /// bounds. The value is clamped into `[minval, maxval]` so the `Fitted`
    /// range invariant holds even when the proposing backend ignores box
    /// constraints.
    pub fn make_fitted(&self, value: f64) -> Fitted {
        Fitted { value: value.clamp(self.minval, self.maxval), minval: self.minval, maxval: self.maxval }
    }

    /// Box constraint in the `(min, max)` form optimizer backends expect,
    /// with `None` standing for an unconstrained side.
    pub fn constraint(&self) -> (Option<f64>, Option<f64>) {
        let lo = if self.minval.is_finite() { Some(self.minval) } else { None };
        let hi = if self.maxval.is_finite() { Some(self.maxval) } else { None };
        (lo, hi)
    }
}

/// A bound parameter: the concrete numeric result of fitting, still aware
/// of the range it was constrained to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fitted {
    pub value: f64,
    pub minval: f64,
    pub maxval: f64,
}

impl Fitted {
    /// True when the value sits within 1% of the bound range of the lower
    /// bound. Always false for an unconstrained range.
    pub fn at_lower_boundary(&self) -> bool {
        let range = self.maxval - self.minval;
        range.is_finite() && (self.value - self.minval) / range < BOUNDARY_FRACTION
    }

    /// True when the value sits within 1% of the bound range of the upper
    /// bound. Always false for an unconstrained range.
    pub fn at_upper_boundary(&self) -> bool {
        let range = self.maxval - self.minval;
        range.is_finite() && (self.maxval - self.value) / range < BOUNDARY_FRACTION
    }

    /// True when either bound was hit.
    pub fn at_boundary(&self) -> bool {
        self.at_lower_boundary() || self.at_upper_boundary()
    }
}

/// Value of a component parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Param {
    /// A fixed numeric constant.
    Fixed(f64),
    /// An unbound placeholder awaiting optimization.
    Unbound(Fittable),
    /// The bound result of an optimization.
    Bound(Fitted),
}

impl Param {
    /// Numeric value used when solving: the constant, the fitted value, or
    /// the fittable's default for a not-yet-bound placeholder.
    pub fn value(&self) -> f64 {
        match self {
            Param::Fixed(v) => *v,
            Param::Unbound(fittable) => fittable.default,
            Param::Bound(fitted) => fitted.value,
        }
    }

    /// The unbound placeholder, if this parameter is one.
    pub fn fittable(&self) -> Option<Fittable> {
        match self {
            Param::Unbound(fittable) => Some(*fittable),
            _ => None,
        }
    }

    /// The bound value, if this parameter has been fitted.
    pub fn fitted(&self) -> Option<Fitted> {
        match self {
            Param::Bound(fitted) => Some(*fitted),
            _ => None,
        }
    }

    pub fn is_unbound(&self) -> bool {
        matches!(self, Param::Unbound(_))
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Fixed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fittable_validates_bounds_and_default() {
        assert!(Fittable::new(0.0, -1.0, 1.0).is_ok());
        assert!(matches!(
            Fittable::new(0.0, 1.0, -1.0),
            Err(ModelError::InvalidFittableBounds { .. })
        ));
        assert!(matches!(
            Fittable::new(5.0, -1.0, 1.0),
            Err(ModelError::InvalidFittableDefault { .. })
        ));
        assert!(matches!(
            Fittable::new(f64::NAN, -1.0, 1.0),
            Err(ModelError::InvalidFittableDefault { .. })
        ));
    }

    #[test]
    fn identities_are_unique_per_construction_and_preserved_by_copy() {
        let a = Fittable::new(0.0, -1.0, 1.0).unwrap();
        let b = Fittable::new(0.0, -1.0, 1.0).unwrap();
        let a_copy = a;
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), a_copy.id());
    }

    #[test]
    fn make_fitted_clamps_into_bounds() {
        let fittable = Fittable::new(0.0, -1.0, 1.0).unwrap();
        assert_eq!(fittable.make_fitted(0.5).value, 0.5);
        assert_eq!(fittable.make_fitted(3.0).value, 1.0);
        assert_eq!(fittable.make_fitted(-3.0).value, -1.0);
    }

    #[test]
    fn constraint_maps_infinite_sides_to_none() {
        let bounded = Fittable::new(0.0, -1.0, 1.0).unwrap();
        assert_eq!(bounded.constraint(), (Some(-1.0), Some(1.0)));
        let free = Fittable::unbounded(0.0).unwrap();
        assert_eq!(free.constraint(), (None, None));
    }

    #[test]
    fn boundary_predicates_use_one_percent_of_range() {
        let fittable = Fittable::new(0.0, 0.0, 100.0).unwrap();
        assert!(fittable.make_fitted(0.5).at_lower_boundary());
        assert!(fittable.make_fitted(99.5).at_upper_boundary());
        assert!(!fittable.make_fitted(50.0).at_boundary());
        // Unconstrained ranges never report a hit.
        let free = Fittable::unbounded(0.0).unwrap();
        assert!(!free.make_fitted(0.0).at_boundary());
    }

    #[test]
    fn param_value_resolution() {
        let fittable = Fittable::new(0.25, -1.0, 1.0).unwrap();
        assert_eq!(Param::Fixed(2.0).value(), 2.0);
        assert_eq!(Param::Unbound(fittable).value(), 0.25);
        assert_eq!(Param::Bound(fittable.make_fitted(0.75)).value(), 0.75);
    }
}
