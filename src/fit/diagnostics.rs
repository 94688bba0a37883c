//! Post-fit boundary diagnostics.
//!
//! A fitted value resting against one of its declared bounds usually
//! means the bound, not the data, chose the value. These helpers walk a
//! model's descriptor tables and report every such parameter so callers
//! can widen the offending ranges and refit.
use crate::model::{components::Role, ddm::Model, params::Param};

/// Which side of the range a fitted value landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Lower,
    Upper,
}

/// One fitted parameter resting against a bound.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryHit {
    /// Component family the parameter belongs to.
    pub component: &'static str,
    pub role: Role,
    pub name: &'static str,
    /// Fitted value.
    pub value: f64,
    /// The bound it rests against.
    pub limit: f64,
    pub side: BoundSide,
}

/// True when the parameter is fitted and sits within 1% of its range of
/// either bound. Fixed and not-yet-fitted parameters never hit.
pub fn dependence_hit_boundary(param: &Param) -> bool {
    match param {
        Param::Bound(fitted) => fitted.at_boundary(),
        Param::Fixed(_) | Param::Unbound(_) => false,
    }
}

/// Every fitted parameter of the model currently resting against a bound.
pub fn hit_boundary(model: &Model) -> Vec<BoundaryHit> {
    let mut hits = Vec::new();
    for role in Role::ALL {
        let component = model.component(role);
        for (name, param) in component.params() {
            if let Param::Bound(fitted) = param {
                if fitted.at_lower_boundary() {
                    hits.push(BoundaryHit {
                        component: component.component_name(),
                        role,
                        name,
                        value: fitted.value,
                        limit: fitted.minval,
                        side: BoundSide::Lower,
                    });
                } else if fitted.at_upper_boundary() {
                    hits.push(BoundaryHit {
                        component: component.component_name(),
                        role,
                        name,
                        value: fitted.value,
                        limit: fitted.maxval,
                        side: BoundSide::Upper,
                    });
                }
            }
        }
    }
    hits
}
