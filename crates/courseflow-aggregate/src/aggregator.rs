//! Canonical Aggregator (spec §4.3).
//!
//! Rolls the binning engine's `(seg_id, j, k)` cells up into one
//! `SegmentWindow` per `(seg_id, k)` — the single per-segment-per-window
//! density number every report and map layer reads from (GLOSSARY,
//! "Canonical").

use std::collections::BTreeMap;

use courseflow_core::{Bin, PerSquareMeter, SegmentWindow};

/// Roll a day's bins up into per-`(seg_id, k)` segment windows, sorted by
/// `(seg_id, k)` (spec §6.3 determinism property).
pub fn aggregate_day(bins: &[Bin]) -> Vec<SegmentWindow> {
    let mut groups: BTreeMap<(String, i64), Vec<&Bin>> = BTreeMap::new();
    for bin in bins {
        groups
            .entry((bin.seg_id.clone(), bin.k))
            .or_default()
            .push(bin);
    }

    let mut windows = Vec::with_capacity(groups.len());
    for ((seg_id, k), cells) in groups {
        let t_start = cells[0].t_start;
        let t_end = cells[0].t_end;

        let total_len: f64 = cells
            .iter()
            .map(|b| (b.km_end - b.km_start).to_meters().value())
            .sum();
        let density_mean = if total_len > 0.0 {
            let weighted: f64 = cells
                .iter()
                .map(|b| {
                    b.areal_density_p_per_m2.value() * (b.km_end - b.km_start).to_meters().value()
                })
                .sum();
            PerSquareMeter(weighted / total_len)
        } else {
            PerSquareMeter(0.0)
        };

        let density_peak = cells
            .iter()
            .map(|b| b.areal_density_p_per_m2)
            .fold(PerSquareMeter(0.0), |acc, d| acc.max(d));

        let n_bins = cells.iter().filter(|b| b.concurrent_count > 0).count() as u32;

        windows.push(SegmentWindow {
            seg_id,
            k,
            t_start,
            t_end,
            density_mean,
            density_peak,
            n_bins,
        });
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use courseflow_core::{BinSeverity, Kilometers, LosClass, RatePerMeterPerMin, Seconds};

    fn bin(j: i64, k: i64, km_start: f64, km_end: f64, count: u32, density: f64) -> Bin {
        Bin {
            seg_id: "A1".to_string(),
            j,
            k,
            km_start: Kilometers(km_start),
            km_end: Kilometers(km_end),
            t_start: Seconds(k as f64 * 30.0),
            t_end: Seconds((k + 1) as f64 * 30.0),
            concurrent_count: count,
            areal_density_p_per_m2: PerSquareMeter(density),
            linear_rate_per_m_per_min: RatePerMeterPerMin(0.0),
            flow_utilization: 0.0,
            los_class: LosClass::A,
            severity: BinSeverity::None,
            flag_reason: None,
        }
    }

    #[test]
    fn peak_is_the_max_and_mean_is_length_weighted() {
        let bins = vec![
            bin(0, 0, 0.0, 0.1, 5, 0.5),
            bin(1, 0, 0.1, 0.2, 10, 1.0),
        ];
        let windows = aggregate_day(&bins);
        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert_eq!(w.density_peak, PerSquareMeter(1.0));
        // equal-length bins -> plain average of 0.5 and 1.0
        assert!((w.density_mean.value() - 0.75).abs() < 1e-9);
        assert_eq!(w.n_bins, 2);
    }

    #[test]
    fn unoccupied_bins_do_not_count_toward_n_bins() {
        let bins = vec![bin(0, 0, 0.0, 0.1, 0, 0.0), bin(1, 0, 0.1, 0.2, 3, 0.4)];
        let windows = aggregate_day(&bins);
        assert_eq!(windows[0].n_bins, 1);
    }

    #[test]
    fn groups_are_independent_per_segment_and_window() {
        let mut bins = vec![bin(0, 0, 0.0, 0.1, 5, 0.5)];
        let mut other = bin(0, 1, 0.0, 0.1, 7, 0.9);
        other.seg_id = "A1".to_string();
        bins.push(other);
        let windows = aggregate_day(&bins);
        assert_eq!(windows.len(), 2);
    }
}
