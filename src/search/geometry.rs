//! Road geometry synthesis.
//!
//! Turns a configuration's integer indices into a center-line polyline by
//! sampling per-section segment counts and curvatures, then walking the
//! Frenet heading equation with a fixed step length. The step length comes
//! from approximating a circle of the minimum admissible radius with a
//! 70-gon; the same discretization yields the global curvature bound.

use std::f64::consts::{PI, TAU};

use rand::prelude::*;

use crate::schema::{ConfigError, Configuration, GeometryConfig, RoadGeometry};

/// Sides of the polygon approximating the minimum-radius circle.
const NGON_SIDES: f64 = 70.0;

/// Seedable random source for road synthesis.
///
/// All randomness in synthesis (start heading, sub-interval sampling) flows
/// through one of these, so a fixed seed reproduces a road exactly.
pub struct GeometryRng {
    rng: StdRng,
}

impl GeometryRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with entropy from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform start heading in `[0, 2π)`.
    fn heading(&mut self) -> f64 {
        self.rng.gen_range(0.0..TAU)
    }

    /// Divide `[lo, hi)` into `n` equal sub-intervals and sample uniformly
    /// inside the i-th. Indices at or beyond `n` land past `hi`.
    fn in_subinterval(&mut self, lo: f64, hi: f64, n: usize, i: usize) -> f64 {
        let size = (hi - lo) / n as f64;
        lo + self.rng.gen_range(i as f64 * size..(i + 1) as f64 * size)
    }
}

/// Converts configurations into road geometries.
///
/// Derived constants (`ds`, segment-count bounds, curvature bound) are
/// computed once at construction and never change afterwards.
pub struct RoadSynthesizer {
    section_count: usize,
    value_count: usize,
    map_size: f64,
    lane_width: f64,
    /// Straight-segment step length.
    ds: f64,
    min_segment_count: usize,
    max_segment_count: usize,
    /// Maximum admissible |curvature| under the n-gon discretization.
    curvature_bound: f64,
}

impl RoadSynthesizer {
    /// Validate the geometry parameters and derive the synthesis constants.
    pub fn new(config: &GeometryConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let ds = 2.0 * config.min_radius * (PI / NGON_SIDES).sin();
        let section_count = config.road_section_count as f64;
        let max_segment_count =
            (config.map_size * config.max_road_scalar / section_count / ds) as usize;
        let min_segment_count =
            (config.map_size * config.min_road_scalar / section_count / ds) as usize;
        if min_segment_count == 0 || max_segment_count <= min_segment_count {
            return Err(ConfigError::DegenerateSegmentBounds {
                min: min_segment_count,
                max: max_segment_count,
            });
        }

        Ok(Self {
            section_count: config.road_section_count,
            value_count: config.param_value_count,
            map_size: config.map_size,
            lane_width: config.lane_width,
            ds,
            min_segment_count,
            max_segment_count,
            curvature_bound: TAU / (NGON_SIDES * ds),
        })
    }

    /// Step length between consecutive center-line points.
    #[inline]
    pub fn ds(&self) -> f64 {
        self.ds
    }

    /// Inclusive-exclusive segment-count sampling bounds per section.
    #[inline]
    pub fn segment_count_bounds(&self) -> (usize, usize) {
        (self.min_segment_count, self.max_segment_count)
    }

    /// Maximum admissible curvature magnitude.
    #[inline]
    pub fn curvature_bound(&self) -> f64 {
        self.curvature_bound
    }

    /// Synthesize the road geometry selected by a configuration.
    ///
    /// The start position is the origin; the start heading and the value
    /// sampled inside each index's sub-interval are drawn from `rng`, so
    /// identical configuration and rng seed give identical geometry.
    pub fn synthesize(&self, configuration: &Configuration, rng: &mut GeometryRng) -> RoadGeometry {
        let heading = rng.heading();

        let segment_counts: Vec<usize> = configuration
            .length_indices(self.section_count)
            .iter()
            .map(|&i| {
                rng.in_subinterval(
                    self.min_segment_count as f64,
                    self.max_segment_count as f64,
                    self.value_count,
                    i,
                ) as usize
            })
            .collect();

        let mut kappas = Vec::new();
        for (section, &index) in configuration
            .curvature_indices(self.section_count)
            .iter()
            .enumerate()
        {
            let kappa = rng.in_subinterval(
                -self.curvature_bound,
                self.curvature_bound,
                self.value_count,
                index,
            );
            kappas.extend(std::iter::repeat(kappa).take(segment_counts[section]));
        }

        self.trace(heading, &kappas)
    }

    /// Euler walk of the Frenet heading equation: advance `ds` along the
    /// current heading, then turn by `kappa * ds`. Classifies the result
    /// against the map and reframes it when possible.
    fn trace(&self, start_heading: f64, kappas: &[f64]) -> RoadGeometry {
        let steps = kappas.len() + 1;
        let mut points = Vec::with_capacity(steps + 1);

        let (mut x, mut y) = (0.0f64, 0.0f64);
        let mut theta = start_heading;
        points.push((x, y));

        let (mut min_x, mut min_y) = (x, y);
        let (mut max_x, mut max_y) = (x, y);
        for i in 0..steps {
            x += self.ds * theta.cos();
            y += self.ds * theta.sin();
            points.push((x, y));
            if i + 1 < steps {
                theta += kappas[i] * self.ds;
            }

            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        let fit = self.map_size - 2.0 * self.lane_width;
        let is_reframable = (max_x - min_x) <= fit && (max_y - min_y) <= fit;
        let mut is_in_map = min_x > self.lane_width
            && max_x < self.map_size - self.lane_width
            && min_y > self.lane_width
            && max_y < self.map_size - self.lane_width;

        if is_reframable {
            reframe(&mut points, min_x, min_y, self.lane_width);
            is_in_map = true;
        }

        RoadGeometry {
            points,
            is_in_map,
            is_reframable,
        }
    }
}

/// Translate points so the bounding-box minimum corner lands at
/// `(lane_width, lane_width)`.
fn reframe(points: &mut [(f64, f64)], min_x: f64, min_y: f64, lane_width: f64) {
    for (x, y) in points.iter_mut() {
        *x = *x - min_x + lane_width;
        *y = *y - min_y + lane_width;
    }
}

/// Heuristic self-intersection check for a road of the given lane width.
///
/// Flags the road when its center line crosses itself or when the two lane
/// boundaries, approximated by offsetting the center line sideways by
/// `lane_width`, intersect each other. The offset is a per-vertex normal
/// offset, so sharply folded roads can slip through; false negatives are
/// acceptable here, false positives are not expected.
pub fn is_likely_self_intersecting(points: &[(f64, f64)], lane_width: f64) -> bool {
    if points.len() < 2 {
        return false;
    }
    if !is_simple(points) {
        return true;
    }
    let left = offset_polyline(points, lane_width);
    let right = offset_polyline(points, -lane_width);
    polylines_intersect(&left, &right)
}

/// Offset each vertex along the normal of its local direction (the averaged
/// direction of the adjacent segments). Positive offsets move left.
fn offset_polyline(points: &[(f64, f64)], offset: f64) -> Vec<(f64, f64)> {
    let n = points.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = if i == 0 { points[0] } else { points[i - 1] };
        let next = if i + 1 == n { points[n - 1] } else { points[i + 1] };
        let (dx, dy) = (next.0 - prev.0, next.1 - prev.1);
        let len = (dx * dx + dy * dy).sqrt();
        if len < f64::EPSILON {
            out.push(points[i]);
            continue;
        }
        out.push((
            points[i].0 - dy / len * offset,
            points[i].1 + dx / len * offset,
        ));
    }
    out
}

/// True when no two non-adjacent segments of the polyline intersect.
fn is_simple(points: &[(f64, f64)]) -> bool {
    let segments = points.len().saturating_sub(1);
    for i in 0..segments {
        for j in (i + 2)..segments {
            if segments_intersect(points[i], points[i + 1], points[j], points[j + 1]) {
                return false;
            }
        }
    }
    true
}

/// True when any segment of `a` intersects any segment of `b`.
fn polylines_intersect(a: &[(f64, f64)], b: &[(f64, f64)]) -> bool {
    for i in 0..a.len().saturating_sub(1) {
        for j in 0..b.len().saturating_sub(1) {
            if segments_intersect(a[i], a[i + 1], b[j], b[j + 1]) {
                return true;
            }
        }
    }
    false
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Axis-aligned bounding-box containment of a collinear point.
fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

/// Segment intersection via orientation tests, collinear touches included.
fn segments_intersect(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
