//! LOS (Level of Service) thresholds and per-schema flow capacities
//! (spec §4.1 step 6, §6.1 `los_rulebook`).
//!
//! The default thresholds are the ones spec.md §4.1 states literally;
//! `LosRulebook` additionally supports per-schema-class overrides loaded
//! from the `AnalysisRequest.los_rulebook` path/inline config, matching
//! the teacher workspace's pattern of a default-plus-override config
//! struct (`gat-core`'s rulebook/limits style) rather than a hardcoded
//! switch statement.

use std::collections::BTreeMap;

use courseflow_core::{LosClass, PerSquareMeter, RatePerMeterPerMin, SchemaClass};
use serde::{Deserialize, Serialize};

/// Areal-density breakpoints (p/m²) for the six LOS classes, in ascending
/// order: a bin is class `A` if `areal < a_max`, `B` if `< b_max`, etc.,
/// and `F` otherwise. Defaults from spec §4.1 step 6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LosThresholds {
    pub a_max: f64,
    pub b_max: f64,
    pub c_max: f64,
    pub d_max: f64,
    pub e_max: f64,
}

impl Default for LosThresholds {
    fn default() -> Self {
        Self {
            a_max: 0.36,
            b_max: 0.54,
            c_max: 0.72,
            d_max: 1.08,
            e_max: 1.63,
        }
    }
}

impl LosThresholds {
    /// Classify an areal density. Monotone step function, as required by
    /// the `Bin` invariant in spec §3.
    pub fn classify(&self, areal: PerSquareMeter) -> LosClass {
        let v = areal.value();
        if v < self.a_max {
            LosClass::A
        } else if v < self.b_max {
            LosClass::B
        } else if v < self.c_max {
            LosClass::C
        } else if v < self.d_max {
            LosClass::D
        } else if v < self.e_max {
            LosClass::E
        } else {
            LosClass::F
        }
    }
}

/// Flow capacity (p/m/min) used to compute `flow_utilization` (spec
/// §4.1 step 5), keyed by schema class. Defaults are conservative
/// planning-level values consistent with pedestrian level-of-service
/// literature (Fruin-style capacities); overridable per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowCapacities {
    pub start_corral: f64,
    pub on_course_narrow: f64,
    pub on_course_open: f64,
}

impl Default for FlowCapacities {
    fn default() -> Self {
        Self {
            start_corral: 60.0,
            on_course_narrow: 82.0,
            on_course_open: 100.0,
        }
    }
}

impl FlowCapacities {
    pub fn for_schema(&self, schema: SchemaClass) -> RatePerMeterPerMin {
        let v = match schema {
            SchemaClass::StartCorral => self.start_corral,
            SchemaClass::OnCourseNarrow => self.on_course_narrow,
            SchemaClass::OnCourseOpen => self.on_course_open,
        };
        RatePerMeterPerMin(v)
    }
}

/// Full rulebook: global LOS thresholds and flow capacities, plus
/// optional per-segment (`seg_id`) overrides of either (spec §6.1,
/// `los_rulebook` path/inline override).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LosRulebook {
    pub thresholds: LosThresholds,
    pub capacities: FlowCapacities,
    #[serde(default)]
    pub segment_threshold_overrides: BTreeMap<String, LosThresholds>,
}

impl LosRulebook {
    pub fn thresholds_for(&self, seg_id: &str) -> &LosThresholds {
        self.segment_threshold_overrides
            .get(seg_id)
            .unwrap_or(&self.thresholds)
    }

    pub fn classify(&self, seg_id: &str, areal: PerSquareMeter) -> LosClass {
        self.thresholds_for(seg_id).classify(areal)
    }

    pub fn capacity_for(&self, schema: SchemaClass) -> RatePerMeterPerMin {
        self.capacities.for_schema(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_classify_spec_examples() {
        let t = LosThresholds::default();
        assert_eq!(t.classify(PerSquareMeter(0.1)), LosClass::A);
        assert_eq!(t.classify(PerSquareMeter(0.4)), LosClass::B);
        assert_eq!(t.classify(PerSquareMeter(0.6)), LosClass::C);
        assert_eq!(t.classify(PerSquareMeter(1.0)), LosClass::D);
        assert_eq!(t.classify(PerSquareMeter(1.2)), LosClass::E);
        assert_eq!(t.classify(PerSquareMeter(2.0)), LosClass::F);
    }

    #[test]
    fn segment_override_takes_precedence() {
        let mut rb = LosRulebook::default();
        rb.segment_threshold_overrides.insert(
            "A1".to_string(),
            LosThresholds {
                a_max: 1.0,
                ..Default::default()
            },
        );
        assert_eq!(rb.classify("A1", PerSquareMeter(0.5)), LosClass::A);
        assert_eq!(rb.classify("B2", PerSquareMeter(0.5)), LosClass::C);
    }
}
