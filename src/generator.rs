//! Contract to external combinatorial test-suite backends.
//!
//! Backends (covering-array tools driven through files or subprocesses) are
//! not part of this crate. They plug in by implementing [`TestSuiteGenerator`]
//! and can reuse [`ParameterModel`] for the model and seed serialization
//! formats every known backend shares.

use serde::{Deserialize, Serialize};

use crate::schema::Configuration;

/// The parameter model a backend is configured with: each road section
/// contributes one `Length` and one `Kappa` column, each ranging over
/// `[0, param_value_count)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterModel {
    pub road_section_count: usize,
    pub param_value_count: usize,
}

impl ParameterModel {
    /// Column names in suite order: `Length0..`, then `Kappa0..`.
    pub fn column_names(&self) -> Vec<String> {
        let lengths = (0..self.road_section_count).map(|i| format!("Length{i}"));
        let kappas = (0..self.road_section_count).map(|i| format!("Kappa{i}"));
        lengths.chain(kappas).collect()
    }

    /// Model description consumed by backends: one line per column listing
    /// its admissible values, optionally annotated with the `(int)` type tag
    /// some backends require.
    pub fn model_string(&self, with_types: bool) -> String {
        let type_tag = if with_types { "(int)" } else { "" };
        let values = (0..self.param_value_count)
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        self.column_names()
            .iter()
            .map(|name| format!("{name}{type_tag}: {values}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Seed suite serialization: a header line of column names followed by
    /// one row per configuration, all joined with `separator`.
    pub fn seed_string(&self, seeds: &[Configuration], separator: &str) -> String {
        let header = self.column_names().join(separator);
        let mut lines = vec![header];
        for seed in seeds {
            lines.push(
                seed.0
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(separator),
            );
        }
        lines.join("\n")
    }
}

/// Failures reported by a suite backend.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The backend tool could not be invoked or exited abnormally.
    #[error("backend invocation failed: {0}")]
    Backend(String),
    /// The backend produced output that does not parse as a suite.
    #[error("backend produced unparseable output: {0}")]
    Parse(String),
    /// Reading or writing a backend exchange file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A source of combinatorial test suites at a requested interaction strength.
///
/// Implementations are configured exactly once before the first generation
/// request. [`TestSuiteGenerator::generate_suite`] is the entry point the
/// search engine uses; it treats an empty seed list as an unseeded request.
pub trait TestSuiteGenerator {
    /// Fix the parameter model for all subsequent generation requests.
    fn configure(&mut self, model: ParameterModel);

    /// Generate a suite covering all interactions of the given strength.
    fn generate(&mut self, strength: u32) -> Result<Vec<Configuration>, GeneratorError>;

    /// Generate a suite of the given strength extending the seed
    /// configurations.
    fn generate_seeded(
        &mut self,
        strength: u32,
        seeds: &[Configuration],
    ) -> Result<Vec<Configuration>, GeneratorError>;

    /// Dispatch to [`TestSuiteGenerator::generate`] when `seeds` is empty,
    /// otherwise to [`TestSuiteGenerator::generate_seeded`].
    fn generate_suite(
        &mut self,
        strength: u32,
        seeds: &[Configuration],
    ) -> Result<Vec<Configuration>, GeneratorError> {
        if seeds.is_empty() {
            self.generate(strength)
        } else {
            self.generate_seeded(strength, seeds)
        }
    }
}
