//! Combinatorial strength-escalation search for critical road scenarios.
//!
//! This crate searches for effective test scenarios for autonomous-vehicle
//! perception and control. It asks an external combinatorial backend for a
//! test suite of a given interaction strength, turns each abstract
//! configuration into a concrete road geometry, scores the road through a
//! caller-supplied evaluation callback, and seeds the next, stronger suite
//! from the best-scoring configurations. Episodes escalate from strength 2
//! to a configured maximum and restart until an external budget signal ends
//! the run.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: configuration and road value types
//! - `generator`: the contract to external test-suite backends
//! - `search`: geometry synthesis, fitness aggregation and the engine
//!
//! # Example
//!
//! ```rust,no_run
//! use road_search::{
//!     Configuration, GeneratorError, ParameterModel, SearchConfig, SearchEngine,
//!     TestSuiteGenerator,
//! };
//!
//! // Stand-in for an external covering-array backend.
//! struct FixedSuite;
//!
//! impl TestSuiteGenerator for FixedSuite {
//!     fn configure(&mut self, _model: ParameterModel) {}
//!
//!     fn generate(&mut self, _strength: u32) -> Result<Vec<Configuration>, GeneratorError> {
//!         Ok(vec![Configuration(vec![0; 10]), Configuration(vec![1; 10])])
//!     }
//!
//!     fn generate_seeded(
//!         &mut self,
//!         strength: u32,
//!         _seeds: &[Configuration],
//!     ) -> Result<Vec<Configuration>, GeneratorError> {
//!         self.generate(strength)
//!     }
//! }
//!
//! let mut remaining = 100i32;
//! let mut engine = SearchEngine::new(
//!     SearchConfig::default(),
//!     FixedSuite,
//!     // Hunt for roads whose final point has a small x coordinate.
//!     Box::new(|road| Ok(vec![road.points.last().map_or(0.0, |p| p.0)])),
//!     Box::new(move || {
//!         remaining -= 1;
//!         remaining >= 0
//!     }),
//! )
//! .expect("valid configuration");
//!
//! let history = engine.run().expect("search aborted");
//! println!("{} scenarios evaluated", history.len());
//! ```

pub mod generator;
pub mod schema;
pub mod search;

// Re-export commonly used types
pub use generator::{GeneratorError, ParameterModel, TestSuiteGenerator};
pub use schema::{
    ConfigError, Configuration, EvaluatedRoad, Evaluation, FitnessAggregation, GeometryConfig,
    RoadGeometry, SearchConfig,
};
pub use search::{
    BudgetFn, EvaluateFn, EvaluationError, FitnessMap, FitnessRecord, GeometryRng,
    RoadSynthesizer, SearchEngine, SearchError, has_m_match, is_likely_self_intersecting,
    take_best,
};
