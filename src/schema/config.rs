//! Configuration types for the combinatorial road search.

use serde::{Deserialize, Serialize};

fn default_road_section_count() -> usize {
    5
}
fn default_param_value_count() -> usize {
    5
}
fn default_map_size() -> f64 {
    200.0
}
fn default_lane_width() -> f64 {
    10.0
}
fn default_min_radius() -> f64 {
    15.0
}
fn default_max_road_scalar() -> f64 {
    1.2
}
fn default_min_road_scalar() -> f64 {
    0.6
}

/// Road geometry parameters, fixed for the lifetime of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Number of length/curvature sections per road.
    #[serde(default = "default_road_section_count")]
    pub road_section_count: usize,
    /// Number of discrete values each length/curvature parameter can take.
    #[serde(default = "default_param_value_count")]
    pub param_value_count: usize,
    /// Edge length of the square map.
    #[serde(default = "default_map_size")]
    pub map_size: f64,
    /// Lane width in map units; also the reframing margin.
    #[serde(default = "default_lane_width")]
    pub lane_width: f64,
    /// Minimum admissible turn radius.
    #[serde(default = "default_min_radius")]
    pub min_radius: f64,
    /// Maximum total road length as a multiple of the map size.
    #[serde(default = "default_max_road_scalar")]
    pub max_road_scalar: f64,
    /// Minimum total road length as a multiple of the map size.
    #[serde(default = "default_min_road_scalar")]
    pub min_road_scalar: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            road_section_count: default_road_section_count(),
            param_value_count: default_param_value_count(),
            map_size: default_map_size(),
            lane_width: default_lane_width(),
            min_radius: default_min_radius(),
            max_road_scalar: default_max_road_scalar(),
            min_road_scalar: default_min_road_scalar(),
        }
    }
}

impl GeometryConfig {
    /// Validate raw parameters before any derivation happens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.road_section_count == 0 {
            return Err(ConfigError::NoSections);
        }
        if self.param_value_count == 0 {
            return Err(ConfigError::NoParamValues);
        }
        if self.map_size <= 0.0 {
            return Err(ConfigError::NonPositiveMapSize);
        }
        if self.lane_width <= 0.0 {
            return Err(ConfigError::NonPositiveLaneWidth);
        }
        if self.min_radius <= 0.0 {
            return Err(ConfigError::NonPositiveMinRadius);
        }
        if self.min_road_scalar <= 0.0 || self.max_road_scalar <= self.min_road_scalar {
            return Err(ConfigError::InvalidRoadScalars {
                min: self.min_road_scalar,
                max: self.max_road_scalar,
            });
        }
        Ok(())
    }
}

/// How repeated fitness observations for one configuration combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitnessAggregation {
    /// Running arithmetic mean over all observations.
    #[default]
    Average,
    /// Smallest observation seen so far.
    Minimum,
    /// First observation wins; later ones are ignored.
    First,
}

fn default_use_seed() -> bool {
    true
}
fn default_seed_best() -> bool {
    true
}
fn default_best_ratio() -> f64 {
    0.1
}
fn default_rerun() -> bool {
    true
}
fn default_max_strength() -> u32 {
    5
}

/// Top-level configuration for a strength-escalation search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Road geometry parameters.
    pub geometry: GeometryConfig,
    /// Seed each higher strength with previously evaluated configurations.
    #[serde(default = "default_use_seed")]
    pub use_seed: bool,
    /// Seed with only the best-scoring fraction instead of the whole suite.
    #[serde(default = "default_seed_best")]
    pub seed_best: bool,
    /// Fraction of a suite retained as seeds, in `[0, 1]`.
    #[serde(default = "default_best_ratio")]
    pub best_ratio: f64,
    /// Re-evaluate configurations that already have a cached evaluation.
    #[serde(default = "default_rerun")]
    pub rerun: bool,
    /// Fitness aggregation policy for repeated observations.
    #[serde(default)]
    pub aggregation: FitnessAggregation,
    /// Highest interaction strength reached within one episode.
    #[serde(default = "default_max_strength")]
    pub max_strength: u32,
    /// Random seed for reproducible road synthesis.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            geometry: GeometryConfig::default(),
            use_seed: default_use_seed(),
            seed_best: default_seed_best(),
            best_ratio: default_best_ratio(),
            rerun: default_rerun(),
            aggregation: FitnessAggregation::default(),
            max_strength: default_max_strength(),
            random_seed: None,
        }
    }
}

impl SearchConfig {
    /// Validate the whole run configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry.validate()?;
        if !(0.0..=1.0).contains(&self.best_ratio) {
            return Err(ConfigError::BestRatioOutOfRange(self.best_ratio));
        }
        if self.max_strength < 2 {
            return Err(ConfigError::MaxStrengthTooLow(self.max_strength));
        }
        Ok(())
    }
}

/// Configuration validation errors, raised before any episode starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("road section count must be non-zero")]
    NoSections,
    #[error("parameter value count must be non-zero")]
    NoParamValues,
    #[error("map size must be positive")]
    NonPositiveMapSize,
    #[error("lane width must be positive")]
    NonPositiveLaneWidth,
    #[error("minimum radius must be positive")]
    NonPositiveMinRadius,
    #[error("road length scalars must satisfy 0 < min < max (got min={min}, max={max})")]
    InvalidRoadScalars { min: f64, max: f64 },
    #[error(
        "derived segment-count bounds are degenerate (min={min}, max={max}); \
         increase the road scalars or the map size"
    )]
    DegenerateSegmentBounds { min: usize, max: usize },
    #[error("best ratio must lie in [0, 1] (got {0})")]
    BestRatioOutOfRange(f64),
    #[error("maximum strength must be at least 2 (got {0})")]
    MaxStrengthTooLow(u32),
}
