//! Binding registry between fittable parameters and optimizer coordinates.
//!
//! Purpose
//! -------
//! Walk a model's component descriptor tables, collect every unbound
//! parameter, and fix a stable coordinate order for the optimizer. Two
//! parameter slots sharing one [`Fittable`] identity collapse into a
//! single coordinate, and writing a candidate back fans the same fitted
//! value out to every slot.
//!
//! Invariants & assumptions
//! ------------------------
//! - Registry order is discovery order: role order, then declaration order
//!   within each component. It never changes after `discover`.
//! - `apply` is the only route by which optimizer candidates reach a
//!   model, so every written value has passed through
//!   [`Fittable::make_fitted`] and respects its bounds.
use ndarray::{Array1, ArrayView1};

use crate::{
    fit::errors::{FitError, FitResult},
    model::{
        components::Role,
        ddm::Model,
        params::{Fittable, Param},
    },
};

/// One component parameter slot a registry coordinate writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSlot {
    pub role: Role,
    pub name: &'static str,
}

/// One optimizer coordinate: a fittable and the slots sharing it.
#[derive(Debug, Clone, PartialEq)]
pub struct BindingRecord {
    pub fittable: Fittable,
    pub slots: Vec<ParamSlot>,
}

/// Ordered registry of a model's fittable parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBinding {
    records: Vec<BindingRecord>,
}

impl ParamBinding {
    /// Collect the model's unbound parameters into a registry.
    pub fn discover(model: &Model) -> ParamBinding {
        let mut records: Vec<BindingRecord> = Vec::new();
        for role in Role::ALL {
            for (name, param) in model.component(role).params() {
                if let Param::Unbound(fittable) = param {
                    let slot = ParamSlot { role, name };
                    match records.iter_mut().find(|r| r.fittable.id() == fittable.id()) {
                        Some(record) => record.slots.push(slot),
                        None => records.push(BindingRecord { fittable, slots: vec![slot] }),
                    }
                }
            }
        }
        ParamBinding { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[BindingRecord] {
        &self.records
    }

    /// Starting vector: each fittable's declared default.
    pub fn x0(&self) -> Array1<f64> {
        Array1::from_iter(self.records.iter().map(|r| r.fittable.default))
    }

    /// Per-coordinate box constraints, `None` for an unconstrained side.
    pub fn constraints(&self) -> Vec<(Option<f64>, Option<f64>)> {
        self.records.iter().map(|r| r.fittable.constraint()).collect()
    }

    /// Project a candidate into the box constraints.
    pub fn clamp(&self, x: ArrayView1<f64>) -> Array1<f64> {
        Array1::from_iter(
            self.records
                .iter()
                .zip(x.iter())
                .map(|(r, &v)| v.clamp(r.fittable.minval, r.fittable.maxval)),
        )
    }

    /// Write a candidate vector into the model, fanning each coordinate
    /// out to every slot bound to it.
    ///
    /// # Errors
    /// [`FitError::DimensionMismatch`] if `x` does not match the registry
    /// length. Parameter writes themselves cannot fail for a registry
    /// discovered from the same model.
    pub fn apply(&self, model: &mut Model, x: ArrayView1<f64>) -> FitResult<()> {
        if x.len() != self.records.len() {
            return Err(FitError::DimensionMismatch {
                expected: self.records.len(),
                found: x.len(),
            });
        }
        for (record, &value) in self.records.iter().zip(x.iter()) {
            let fitted = record.fittable.make_fitted(value);
            for slot in &record.slots {
                model.component_mut(slot.role).set_param(slot.name, Param::Bound(fitted))?;
            }
        }
        Ok(())
    }
}
