//! The strength-escalation search engine.
//!
//! An engine owns the synthesizer, the fitness map, the evaluation cache and
//! the run history, and drives an unbounded sequence of episodes. Each
//! episode evaluates an unseeded suite at the base strength, then escalates
//! strength by strength up to the configured maximum, seeding every new suite
//! from the best configurations of the previous one. Only the external
//! budget signal ends a run; backend or evaluator failures abort it.

use std::collections::HashMap;

use log::{debug, info};

use crate::generator::{GeneratorError, ParameterModel, TestSuiteGenerator};
use crate::schema::{ConfigError, Configuration, EvaluatedRoad, Evaluation, SearchConfig};

use super::fitness::{FitnessMap, FitnessRecord, take_best};
use super::geometry::{GeometryRng, RoadSynthesizer};
use super::matching::has_m_match;

/// Every episode starts with an unseeded suite at this strength.
const BASE_STRENGTH: u32 = 2;

/// Scores a synthesized road. Element 0 of the result is the scalar
/// fitness, lower is better.
pub type EvaluateFn =
    Box<dyn FnMut(&crate::schema::RoadGeometry) -> Result<Evaluation, EvaluationError>>;

/// Reports whether evaluation budget remains. Polled once after every
/// completed evaluate call; the first `false` is permanent.
pub type BudgetFn = Box<dyn FnMut() -> bool>;

/// Failure of the external evaluate callback.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// The evaluator returned an empty evaluation vector.
    #[error("evaluator returned an empty evaluation")]
    Empty,
    /// The evaluator itself failed.
    #[error("evaluation failed: {0}")]
    Failed(String),
}

/// Fatal search failures. The history accumulated before the failure stays
/// readable through [`SearchEngine::history`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The test-suite backend failed.
    #[error("test suite generation failed: {0}")]
    Generator(#[from] GeneratorError),
    /// The backend returned a configuration of the wrong width.
    #[error(
        "suite at strength {strength} contains a configuration of width {actual}, \
         expected {expected}"
    )]
    MalformedSuite {
        strength: u32,
        expected: usize,
        actual: usize,
    },
    /// The evaluate callback failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

/// Orchestrates strength escalation over a combinatorial suite backend.
pub struct SearchEngine<G: TestSuiteGenerator> {
    config: SearchConfig,
    synthesizer: RoadSynthesizer,
    generator: G,
    evaluate: EvaluateFn,
    budget: BudgetFn,
    rng: GeometryRng,
    fitness: FitnessMap,
    cache: HashMap<Configuration, Evaluation>,
    history: Vec<EvaluatedRoad>,
    exhausted: bool,
}

impl<G: TestSuiteGenerator> SearchEngine<G> {
    /// Validate the configuration, derive the geometry constants and
    /// configure the backend with the parameter model.
    pub fn new(
        config: SearchConfig,
        mut generator: G,
        evaluate: EvaluateFn,
        budget: BudgetFn,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let synthesizer = RoadSynthesizer::new(&config.geometry)?;
        generator.configure(ParameterModel {
            road_section_count: config.geometry.road_section_count,
            param_value_count: config.geometry.param_value_count,
        });

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let fitness = FitnessMap::new(config.aggregation);

        Ok(Self {
            config,
            synthesizer,
            generator,
            evaluate,
            budget,
            rng: GeometryRng::new(seed),
            fitness,
            cache: HashMap::new(),
            history: Vec::new(),
            exhausted: false,
        })
    }

    /// Run episodes until the budget signal goes false.
    ///
    /// Returns the full ordered history of evaluated roads, ending at the
    /// last evaluation recorded before exhaustion. Backend and evaluator
    /// failures abort the run; the partial history remains available
    /// through [`SearchEngine::history`].
    pub fn run(&mut self) -> Result<&[EvaluatedRoad], SearchError> {
        loop {
            debug!("starting episode at strength {BASE_STRENGTH}");
            let suite = self.request_suite(BASE_STRENGTH, &[])?;
            let mut current = self.evaluate_suite(suite, false)?;
            if self.exhausted {
                break;
            }

            for strength in (BASE_STRENGTH + 1)..=self.config.max_strength {
                let suite = if self.config.use_seed {
                    let seeds = self.select_seeds(&current);
                    let suite = self.request_suite(strength, &seeds)?;
                    let requested = suite.len();
                    let kept: Vec<Configuration> = suite
                        .into_iter()
                        .filter(|c| has_m_match(c, &seeds, (strength - 1) as usize))
                        .collect();
                    debug!(
                        "strength {strength}: kept {} of {requested} configurations \
                         consistent with {} seeds",
                        kept.len(),
                        seeds.len()
                    );
                    kept
                } else {
                    self.request_suite(strength, &[])?
                };

                let reuse_cache = self.config.use_seed && !self.config.rerun;
                current = self.evaluate_suite(suite, reuse_cache)?;
                if self.exhausted {
                    break;
                }
            }
            if self.exhausted {
                break;
            }
            debug!(
                "episode complete at strength {}; restarting",
                self.config.max_strength
            );
        }

        info!(
            "budget exhausted; {} evaluated scenarios recorded",
            self.history.len()
        );
        Ok(&self.history)
    }

    /// Full history of evaluated roads so far, in evaluation order.
    pub fn history(&self) -> &[EvaluatedRoad] {
        &self.history
    }

    /// Consume the engine, keeping only the history.
    pub fn into_history(self) -> Vec<EvaluatedRoad> {
        self.history
    }

    /// Aggregated fitness record of a configuration, if one was evaluated.
    pub fn fitness(&self, configuration: &Configuration) -> Option<&FitnessRecord> {
        self.fitness.get(configuration)
    }

    /// Request a suite and reject configurations of the wrong width.
    fn request_suite(
        &mut self,
        strength: u32,
        seeds: &[Configuration],
    ) -> Result<Vec<Configuration>, SearchError> {
        let suite = self.generator.generate_suite(strength, seeds)?;
        let expected = 2 * self.config.geometry.road_section_count;
        for configuration in &suite {
            if configuration.len() != expected {
                return Err(SearchError::MalformedSuite {
                    strength,
                    expected,
                    actual: configuration.len(),
                });
            }
        }
        Ok(suite)
    }

    /// Synthesize and score every configuration of a suite in order.
    ///
    /// With `reuse_cache`, configurations that already have a cached
    /// evaluation skip the evaluate call (and the budget poll that follows
    /// it). Budget exhaustion discards the evaluation that observed it and
    /// returns the suite's partial results; the exhausted flag makes the
    /// run stop for good.
    fn evaluate_suite(
        &mut self,
        suite: Vec<Configuration>,
        reuse_cache: bool,
    ) -> Result<Vec<(Configuration, Evaluation)>, SearchError> {
        let mut evaluated = Vec::with_capacity(suite.len());
        for configuration in suite {
            let road = self.synthesizer.synthesize(&configuration, &mut self.rng);
            let evaluation = match self.cache.get(&configuration) {
                Some(cached) if reuse_cache => cached.clone(),
                _ => {
                    let evaluation = (self.evaluate)(&road)?;
                    if evaluation.is_empty() {
                        return Err(EvaluationError::Empty.into());
                    }
                    if !(self.budget)() {
                        self.exhausted = true;
                        return Ok(evaluated);
                    }
                    evaluation
                }
            };
            self.cache.insert(configuration.clone(), evaluation.clone());
            self.history.push(EvaluatedRoad {
                road,
                evaluation: evaluation.clone(),
            });
            evaluated.push((configuration, evaluation));
        }
        Ok(evaluated)
    }

    /// Fold the suite's evaluations into the fitness map and pick the seed
    /// configurations for the next strength: the best `best_ratio` fraction
    /// when `seed_best` is set, otherwise the whole suite.
    fn select_seeds(&mut self, current: &[(Configuration, Evaluation)]) -> Vec<Configuration> {
        let mut scored = Vec::with_capacity(current.len());
        for (configuration, evaluation) in current {
            let fitness = self.fitness.update(configuration, evaluation[0]);
            scored.push((configuration.clone(), fitness));
        }

        if !self.config.seed_best {
            return scored.into_iter().map(|(c, _)| c).collect();
        }

        let count = (scored.len() as f64 * self.config.best_ratio) as usize;
        take_best(&scored, |(_, fitness)| *fitness, count)
            .into_iter()
            .map(|(configuration, _)| configuration)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::schema::{FitnessAggregation, GeometryConfig};

    fn test_config() -> SearchConfig {
        SearchConfig {
            geometry: GeometryConfig {
                road_section_count: 2,
                param_value_count: 3,
                ..Default::default()
            },
            random_seed: Some(7),
            ..Default::default()
        }
    }

    fn c(values: [usize; 4]) -> Configuration {
        Configuration(values.to_vec())
    }

    /// Backend stub returning scripted suites and recording every request.
    struct ScriptedGenerator {
        base: Vec<Configuration>,
        escalated: Vec<Configuration>,
        model: Rc<RefCell<Option<ParameterModel>>>,
        unseeded_calls: Rc<RefCell<Vec<u32>>>,
        seeded_calls: Rc<RefCell<Vec<(u32, Vec<Configuration>)>>>,
        fail_at_strength: Option<u32>,
    }

    impl ScriptedGenerator {
        fn new(base: Vec<Configuration>, escalated: Vec<Configuration>) -> Self {
            Self {
                base,
                escalated,
                model: Rc::new(RefCell::new(None)),
                unseeded_calls: Rc::new(RefCell::new(Vec::new())),
                seeded_calls: Rc::new(RefCell::new(Vec::new())),
                fail_at_strength: None,
            }
        }
    }

    impl TestSuiteGenerator for ScriptedGenerator {
        fn configure(&mut self, model: ParameterModel) {
            *self.model.borrow_mut() = Some(model);
        }

        fn generate(&mut self, strength: u32) -> Result<Vec<Configuration>, GeneratorError> {
            self.unseeded_calls.borrow_mut().push(strength);
            if self.fail_at_strength == Some(strength) {
                return Err(GeneratorError::Backend("backend exploded".into()));
            }
            Ok(if strength == BASE_STRENGTH {
                self.base.clone()
            } else {
                self.escalated.clone()
            })
        }

        fn generate_seeded(
            &mut self,
            strength: u32,
            seeds: &[Configuration],
        ) -> Result<Vec<Configuration>, GeneratorError> {
            self.seeded_calls.borrow_mut().push((strength, seeds.to_vec()));
            if self.fail_at_strength == Some(strength) {
                return Err(GeneratorError::Backend("backend exploded".into()));
            }
            Ok(self.escalated.clone())
        }
    }

    /// Evaluator returning 1.0, 2.0, .. in call order, counting calls.
    fn counting_evaluator(calls: Rc<RefCell<usize>>) -> EvaluateFn {
        Box::new(move |_road| {
            *calls.borrow_mut() += 1;
            Ok(vec![*calls.borrow() as f64])
        })
    }

    /// Budget allowing `polls` polls, counting them.
    fn counting_budget(allowed: usize, polls: Rc<RefCell<usize>>) -> BudgetFn {
        Box::new(move || {
            *polls.borrow_mut() += 1;
            *polls.borrow() <= allowed
        })
    }

    #[test]
    fn test_budget_cuts_run_after_three_evaluations() {
        let config = SearchConfig {
            use_seed: false,
            max_strength: 2,
            ..test_config()
        };
        let generator = ScriptedGenerator::new(
            vec![c([0, 0, 0, 0]), c([1, 1, 1, 1]), c([2, 2, 2, 2]), c([0, 1, 2, 0])],
            vec![],
        );

        let calls = Rc::new(RefCell::new(0));
        let polls = Rc::new(RefCell::new(0));
        let mut engine = SearchEngine::new(
            config,
            generator,
            counting_evaluator(Rc::clone(&calls)),
            counting_budget(3, Rc::clone(&polls)),
        )
        .unwrap();

        let history = engine.run().unwrap();
        // The fourth evaluation observes exhaustion and is discarded.
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].evaluation, vec![3.0]);
        assert_eq!(*calls.borrow(), 4);
        assert_eq!(*polls.borrow(), 4);
    }

    #[test]
    fn test_model_is_configured_once() {
        let generator = ScriptedGenerator::new(vec![c([0, 0, 0, 0])], vec![]);
        let model = Rc::clone(&generator.model);
        let polls = Rc::new(RefCell::new(0));
        let mut engine = SearchEngine::new(
            test_config(),
            generator,
            counting_evaluator(Rc::new(RefCell::new(0))),
            counting_budget(0, polls),
        )
        .unwrap();
        engine.run().unwrap();

        assert_eq!(
            *model.borrow(),
            Some(ParameterModel {
                road_section_count: 2,
                param_value_count: 3,
            })
        );
    }

    #[test]
    fn test_seeding_selects_two_best_in_original_order() {
        let config = SearchConfig {
            best_ratio: 0.5,
            aggregation: FitnessAggregation::Minimum,
            max_strength: 3,
            ..test_config()
        };
        let base = vec![c([0, 0, 0, 0]), c([1, 1, 1, 1]), c([2, 2, 2, 2]), c([0, 1, 2, 0])];
        let generator = ScriptedGenerator::new(base.clone(), vec![]);
        let seeded_calls = Rc::clone(&generator.seeded_calls);

        let calls = Rc::new(RefCell::new(0));
        let mut engine = SearchEngine::new(
            config,
            generator,
            counting_evaluator(Rc::clone(&calls)),
            counting_budget(4, Rc::new(RefCell::new(0))),
        )
        .unwrap();

        let history = engine.run().unwrap();
        assert_eq!(history.len(), 4);

        // Fitness in call order was [1, 2, 3, 4]; the best half are the
        // first two base configurations, in their original order.
        let recorded = seeded_calls.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, 3);
        assert_eq!(recorded[0].1, vec![base[0].clone(), base[1].clone()]);
    }

    #[test]
    fn test_escalated_suite_is_filtered_against_seeds() {
        let config = SearchConfig {
            best_ratio: 1.0,
            max_strength: 3,
            ..test_config()
        };
        // [2,2,2,2] agrees with neither seed on 2 positions and must be
        // dropped; [0,0,0,0] self-matches and survives.
        let generator = ScriptedGenerator::new(
            vec![c([0, 0, 0, 0]), c([1, 1, 1, 1])],
            vec![c([0, 0, 0, 0]), c([2, 2, 2, 2])],
        );

        let calls = Rc::new(RefCell::new(0));
        let mut engine = SearchEngine::new(
            config,
            generator,
            counting_evaluator(Rc::clone(&calls)),
            counting_budget(3, Rc::new(RefCell::new(0))),
        )
        .unwrap();

        let history = engine.run().unwrap();
        // Two base evaluations plus the surviving escalated configuration;
        // rerun defaults to true, so it was re-evaluated, not reused.
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].evaluation, vec![3.0]);
        assert_eq!(*calls.borrow(), 4);
    }

    #[test]
    fn test_cached_evaluation_reused_without_budget_poll() {
        let config = SearchConfig {
            rerun: false,
            best_ratio: 1.0,
            max_strength: 3,
            ..test_config()
        };
        let generator = ScriptedGenerator::new(
            vec![c([0, 0, 0, 0]), c([1, 1, 1, 1])],
            vec![c([0, 0, 0, 0])],
        );

        let calls = Rc::new(RefCell::new(0));
        let polls = Rc::new(RefCell::new(0));
        let mut engine = SearchEngine::new(
            config,
            generator,
            counting_evaluator(Rc::clone(&calls)),
            counting_budget(2, Rc::clone(&polls)),
        )
        .unwrap();

        let history = engine.run().unwrap();
        // Base pair evaluated, then the escalated configuration reuses the
        // cached evaluation (no evaluate call, no poll). The next episode's
        // first evaluation observes exhaustion and is discarded.
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].evaluation, history[0].evaluation);
        assert_eq!(*calls.borrow(), 3);
        assert_eq!(*polls.borrow(), 3);
    }

    #[test]
    fn test_unseeded_escalation_requests_every_strength() {
        let config = SearchConfig {
            use_seed: false,
            max_strength: 4,
            ..test_config()
        };
        let generator = ScriptedGenerator::new(vec![c([0, 0, 0, 0])], vec![c([1, 1, 1, 1])]);
        let unseeded_calls = Rc::clone(&generator.unseeded_calls);

        let mut engine = SearchEngine::new(
            config,
            generator,
            counting_evaluator(Rc::new(RefCell::new(0))),
            counting_budget(3, Rc::new(RefCell::new(0))),
        )
        .unwrap();

        engine.run().unwrap();
        // One full episode (strengths 2, 3, 4), then the restarted episode's
        // base suite observes exhaustion.
        assert_eq!(*unseeded_calls.borrow(), vec![2, 3, 4, 2]);
    }

    #[test]
    fn test_generator_failure_aborts_with_partial_history() {
        let config = SearchConfig {
            use_seed: false,
            max_strength: 3,
            ..test_config()
        };
        let mut generator = ScriptedGenerator::new(vec![c([0, 0, 0, 0]), c([1, 1, 1, 1])], vec![]);
        generator.fail_at_strength = Some(3);

        let mut engine = SearchEngine::new(
            config,
            generator,
            counting_evaluator(Rc::new(RefCell::new(0))),
            counting_budget(100, Rc::new(RefCell::new(0))),
        )
        .unwrap();

        let result = engine.run();
        assert!(matches!(result, Err(SearchError::Generator(_))));
        assert_eq!(engine.history().len(), 2);
    }

    #[test]
    fn test_evaluator_failure_aborts_with_partial_history() {
        let generator =
            ScriptedGenerator::new(vec![c([0, 0, 0, 0]), c([1, 1, 1, 1]), c([2, 2, 2, 2])], vec![]);

        let calls = Rc::new(RefCell::new(0));
        let calls_in_evaluator = Rc::clone(&calls);
        let evaluate: EvaluateFn = Box::new(move |_road| {
            *calls_in_evaluator.borrow_mut() += 1;
            if *calls_in_evaluator.borrow() == 3 {
                Err(EvaluationError::Failed("simulator crashed".into()))
            } else {
                Ok(vec![1.0])
            }
        });

        let mut engine = SearchEngine::new(
            test_config(),
            generator,
            evaluate,
            counting_budget(100, Rc::new(RefCell::new(0))),
        )
        .unwrap();

        let result = engine.run();
        assert!(matches!(result, Err(SearchError::Evaluation(_))));
        assert_eq!(engine.history().len(), 2);
    }

    #[test]
    fn test_empty_evaluation_is_rejected() {
        let generator = ScriptedGenerator::new(vec![c([0, 0, 0, 0])], vec![]);
        let evaluate: EvaluateFn = Box::new(|_road| Ok(vec![]));

        let mut engine = SearchEngine::new(
            test_config(),
            generator,
            evaluate,
            counting_budget(100, Rc::new(RefCell::new(0))),
        )
        .unwrap();

        assert!(matches!(
            engine.run(),
            Err(SearchError::Evaluation(EvaluationError::Empty))
        ));
    }

    #[test]
    fn test_malformed_suite_width_is_rejected() {
        let generator = ScriptedGenerator::new(vec![Configuration(vec![0, 0, 0])], vec![]);

        let mut engine = SearchEngine::new(
            test_config(),
            generator,
            counting_evaluator(Rc::new(RefCell::new(0))),
            counting_budget(100, Rc::new(RefCell::new(0))),
        )
        .unwrap();

        assert!(matches!(
            engine.run(),
            Err(SearchError::MalformedSuite {
                strength: 2,
                expected: 4,
                actual: 3,
            })
        ));
    }

    #[test]
    fn test_invalid_configuration_rejected_at_construction() {
        let config = SearchConfig {
            max_strength: 1,
            ..test_config()
        };
        let generator = ScriptedGenerator::new(vec![], vec![]);
        let result = SearchEngine::new(
            config,
            generator,
            counting_evaluator(Rc::new(RefCell::new(0))),
            counting_budget(0, Rc::new(RefCell::new(0))),
        );
        assert!(matches!(result, Err(ConfigError::MaxStrengthTooLow(1))));
    }
}
