//! Road and configuration value types shared across the search.

use serde::{Deserialize, Serialize};

/// One combinatorial test configuration: `2 * road_section_count` integer
/// indices, each in `[0, param_value_count)`. The first half selects
/// per-section length values, the second half per-section curvature values.
///
/// Configurations are compared and hashed by value; they key the fitness
/// map and the evaluation cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(pub Vec<usize>);

impl Configuration {
    /// Number of indices in the configuration.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Per-section length indices (first half).
    pub fn length_indices(&self, section_count: usize) -> &[usize] {
        &self.0[..section_count]
    }

    /// Per-section curvature indices (second half).
    pub fn curvature_indices(&self, section_count: usize) -> &[usize] {
        &self.0[section_count..]
    }
}

impl From<Vec<usize>> for Configuration {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

/// Center-line road geometry produced by the synthesizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadGeometry {
    /// Ordered center-line points.
    pub points: Vec<(f64, f64)>,
    /// Whether the road lies inside the map margins.
    pub is_in_map: bool,
    /// Whether the road's bounding box fits the map after translation.
    pub is_reframable: bool,
}

/// Evaluation vector returned by the external evaluator.
///
/// Non-empty by contract; element 0 is the scalar fitness, lower is better.
/// Trailing elements are opaque to the search and carried through to the
/// run history untouched.
pub type Evaluation = Vec<f64>;

/// One run-history entry: a synthesized road and its evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedRoad {
    pub road: RoadGeometry,
    pub evaluation: Evaluation,
}
