//! Search module - strength escalation over combinatorially generated roads.
//!
//! The pieces compose as a pipeline:
//!
//! - **Geometry** (`geometry`): turns a configuration's integer indices into
//!   a center-line road with map-fit classification and reframing
//! - **Fitness** (`fitness`): per-configuration aggregation of evaluation
//!   scores and stable top-k seed selection
//! - **Matching** (`matching`): the positionwise agreement filter that keeps
//!   escalated suites consistent with their seeds
//! - **Engine** (`engine`): drives episodes of increasing strength against a
//!   suite backend, an evaluate callback and a budget signal

mod engine;
mod fitness;
mod geometry;
mod matching;

pub use engine::{BudgetFn, EvaluateFn, EvaluationError, SearchEngine, SearchError};
pub use fitness::{FitnessMap, FitnessRecord, take_best};
pub use geometry::{GeometryRng, RoadSynthesizer, is_likely_self_intersecting};
pub use matching::has_m_match;
