//! Flow engine configuration (spec §4.2 `FlowParams`, §6.1).

/// Inputs to `flow_day` (spec §4.2 public contract).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    /// Minimum copresence duration, in seconds, for two runners' conflict
    /// zone dwells to count as a genuine encounter rather than a momentary
    /// graze (spec §4.2 step 3).
    pub min_overlap_dwell_s: f64,
    /// Minimum `|directional_gain_s|` an order-flip must clear to count
    /// toward the strict (publication-gating) overtake count (spec §4.2
    /// step 5, "strict-first" rule).
    pub strict_gain_s: f64,
}

impl Default for FlowParams {
    fn default() -> Self {
        Self {
            min_overlap_dwell_s: 5.0,
            strict_gain_s: 2.0,
        }
    }
}
