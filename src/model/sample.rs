//! Immutable reaction-time samples with condition covariates.
//!
//! A [`Sample`] is consumed read-only by the fitting engine: it can be
//! subset by condition and enumerate the distinct condition combinations a
//! model requires, but it is never mutated.
use crate::model::errors::{ModelError, ModelResult};
use std::collections::{BTreeMap, BTreeSet};

/// Trial-level condition covariates, keyed by name.
pub type Conditions = BTreeMap<String, f64>;

/// A single observed trial: reaction time, response correctness, and the
/// conditions it was recorded under.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub rt: f64,
    pub correct: bool,
    pub conditions: Conditions,
}

impl Trial {
    pub fn new(rt: f64, correct: bool, conditions: Conditions) -> Trial {
        Trial { rt, correct, conditions }
    }
}

/// An immutable collection of observed trials.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    trials: Vec<Trial>,
}

impl Sample {
    /// Construct a sample from trials, validating every reaction time.
    ///
    /// # Errors
    /// - [`ModelError::EmptySample`] if no trials are supplied.
    /// - [`ModelError::InvalidReactionTime`] if any reaction time is
    ///   non-finite or negative.
    pub fn new(trials: Vec<Trial>) -> ModelResult<Sample> {
        if trials.is_empty() {
            return Err(ModelError::EmptySample);
        }
        for (index, trial) in trials.iter().enumerate() {
            if !trial.rt.is_finite() {
                return Err(ModelError::InvalidReactionTime {
                    index,
                    value: trial.rt,
                    reason: "Reaction times must be finite.",
                });
            }
            if trial.rt < 0.0 {
                return Err(ModelError::InvalidReactionTime {
                    index,
                    value: trial.rt,
                    reason: "Reaction times must be non-negative.",
                });
            }
        }
        Ok(Sample { trials })
    }

    /// Convenience constructor from plain correct/error reaction times with
    /// no condition covariates.
    pub fn from_rts(correct: &[f64], error: &[f64]) -> ModelResult<Sample> {
        let trials = correct
            .iter()
            .map(|&rt| Trial::new(rt, true, Conditions::new()))
            .chain(error.iter().map(|&rt| Trial::new(rt, false, Conditions::new())))
            .collect();
        Sample::new(trials)
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Largest reaction time in the sample.
    pub fn max_rt(&self) -> f64 {
        self.trials.iter().map(|t| t.rt).fold(0.0, f64::max)
    }

    /// The trials whose covariates match every entry of `conditions`.
    ///
    /// Matching is exact (condition values are labels, not measurements).
    /// The result may be empty; it is an internal view, not a validated
    /// top-level sample.
    pub fn subset(&self, conditions: &Conditions) -> Sample {
        let trials = self
            .trials
            .iter()
            .filter(|trial| {
                conditions.iter().all(|(name, value)| {
                    trial.conditions.get(name).map(|v| v.to_bits()) == Some(value.to_bits())
                })
            })
            .cloned()
            .collect();
        Sample { trials }
    }

    /// Distinct combinations of the `required` condition covariates present
    /// in the sample, in deterministic order.
    ///
    /// # Errors
    /// - [`ModelError::MissingCondition`] if any trial lacks one of the
    ///   required covariates.
    pub fn condition_combinations(&self, required: &[String]) -> ModelResult<Vec<Conditions>> {
        let mut seen: BTreeSet<Vec<(String, u64)>> = BTreeSet::new();
        let mut combos = Vec::new();
        for trial in &self.trials {
            let mut key = Vec::with_capacity(required.len());
            for name in required {
                match trial.conditions.get(name) {
                    Some(&value) => key.push((name.clone(), value.to_bits())),
                    None => return Err(ModelError::MissingCondition { name: name.clone() }),
                }
            }
            if seen.insert(key.clone()) {
                combos.push(
                    key.into_iter().map(|(name, bits)| (name, f64::from_bits(bits))).collect(),
                );
            }
        }
        Ok(combos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conds(pairs: &[(&str, f64)]) -> Conditions {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn construction_validates_reaction_times() {
        assert!(matches!(Sample::new(vec![]), Err(ModelError::EmptySample)));
        let bad = vec![Trial::new(-0.1, true, Conditions::new())];
        assert!(matches!(Sample::new(bad), Err(ModelError::InvalidReactionTime { .. })));
        let nan = vec![Trial::new(f64::NAN, true, Conditions::new())];
        assert!(matches!(Sample::new(nan), Err(ModelError::InvalidReactionTime { .. })));
    }

    #[test]
    fn subset_matches_all_given_conditions() {
        let sample = Sample::new(vec![
            Trial::new(0.3, true, conds(&[("coh", 0.1), ("block", 1.0)])),
            Trial::new(0.4, false, conds(&[("coh", 0.1), ("block", 2.0)])),
            Trial::new(0.5, true, conds(&[("coh", 0.2), ("block", 1.0)])),
        ])
        .unwrap();
        assert_eq!(sample.subset(&conds(&[("coh", 0.1)])).len(), 2);
        assert_eq!(sample.subset(&conds(&[("coh", 0.1), ("block", 2.0)])).len(), 1);
        assert_eq!(sample.subset(&conds(&[("coh", 0.9)])).len(), 0);
    }

    #[test]
    fn condition_combinations_deduplicate_and_validate() {
        let sample = Sample::new(vec![
            Trial::new(0.3, true, conds(&[("coh", 0.1)])),
            Trial::new(0.4, false, conds(&[("coh", 0.1)])),
            Trial::new(0.5, true, conds(&[("coh", 0.2)])),
        ])
        .unwrap();
        let required = vec!["coh".to_string()];
        let combos = sample.condition_combinations(&required).unwrap();
        assert_eq!(combos.len(), 2);

        let missing = vec!["contrast".to_string()];
        assert!(matches!(
            sample.condition_combinations(&missing),
            Err(ModelError::MissingCondition { .. })
        ));
    }

    #[test]
    fn empty_required_set_yields_single_empty_combination() {
        let sample = Sample::from_rts(&[0.3, 0.5], &[0.4]).unwrap();
        let combos = sample.condition_combinations(&[]).unwrap();
        assert_eq!(combos, vec![Conditions::new()]);
    }

    #[test]
    fn max_rt_spans_correct_and_error_trials() {
        let sample = Sample::from_rts(&[0.3, 0.5], &[0.9]).unwrap();
        assert_eq!(sample.max_rt(), 0.9);
    }
}
