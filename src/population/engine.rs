//! The population and its generational operators.
//!
//! [`Population`] owns the chromosomes of the current generation and
//! exposes each step of the generational transition as its own operation:
//! sort → mutate → recombine → (kill) → sort.

use super::config::{Composition, PopulationConfig};
use super::error::EvolutionError;
use super::fanout::{self, Production};
use super::types::{Chromosome, Score};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// A generation of chromosomes plus the engine state that evolves it.
///
/// The population owns its random generator (seeded from
/// [`PopulationConfig::seed`]), so two populations built from the same
/// configuration, seed and factory evolve identically.
///
/// Ordering is only guaranteed right after [`sort`](Population::sort) or
/// [`evolve`](Population::evolve); the intermediate operators append to the
/// end and leave the population unsorted.
///
/// # Usage
///
/// ```ignore
/// let config = PopulationConfig::default().with_max_population(1000).with_seed(42);
/// let mut population = Population::from_factory(config, 1000, |rng| MyChromosome::random(rng))?;
/// loop {
///     population.evolve()?;
///     if population.best_fit().map(|c| c.fitness()) == Some(0) {
///         break;
///     }
/// }
/// ```
pub struct Population<C: Chromosome> {
    members: Vec<C>,
    config: PopulationConfig,
    rng: StdRng,
    generation: usize,
}

impl<C: Chromosome> Population<C> {
    /// Builds a population of `size` chromosomes produced by `factory`.
    ///
    /// The factory receives the population's own generator, so a seeded
    /// configuration also fixes the initial population.
    pub fn from_factory<F>(
        config: PopulationConfig,
        size: usize,
        mut factory: F,
    ) -> Result<Self, EvolutionError>
    where
        F: FnMut(&mut StdRng) -> C,
    {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let members = (0..size).map(|_| factory(&mut rng)).collect();
        Ok(Self {
            members,
            config,
            rng,
            generation: 0,
        })
    }

    /// Wraps existing chromosomes in a population.
    pub fn from_members(config: PopulationConfig, members: Vec<C>) -> Result<Self, EvolutionError> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Ok(Self {
            members,
            config,
            rng,
            generation: 0,
        })
    }

    /// Number of chromosomes currently held.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the population holds no chromosomes.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The chromosomes, in their current order.
    pub fn members(&self) -> &[C] {
        &self.members
    }

    /// Consumes the population and returns its chromosomes.
    pub fn into_members(self) -> Vec<C> {
        self.members
    }

    /// The configuration this population was built with.
    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    /// Number of completed [`evolve`](Population::evolve) calls.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The best chromosome, i.e. the first element.
    ///
    /// Only meaningful while the population is sorted; this accessor does
    /// not sort. Returns `None` for an empty population.
    pub fn best_fit(&self) -> Option<&C> {
        self.members.first()
    }

    /// The worst chromosome, i.e. the last element. Same precondition as
    /// [`best_fit`](Population::best_fit).
    pub fn worst_fit(&self) -> Option<&C> {
        self.members.last()
    }

    /// Sorts by descending fitness and truncates to `max_population`.
    ///
    /// The sort is stable: chromosomes with equal fitness keep their
    /// relative order. Fitness is evaluated once per chromosome.
    pub fn sort(&mut self) {
        let mut scored: Vec<(C::Score, C)> = self
            .members
            .drain(..)
            .map(|chromosome| (chromosome.fitness(), chromosome))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.config.max_population);
        self.members = scored.into_iter().map(|(_, chromosome)| chromosome).collect();
    }

    /// Appends one mutated copy of each of the first
    /// `floor(len * mutation_rate)` chromosomes.
    ///
    /// On a sorted population this mutates the best-fit prefix. The
    /// originals are kept. Returns the number of mutants added.
    pub fn mutate(&mut self) -> usize {
        let count = self.config.mutant_count(self.members.len());
        let rng = &mut self.rng;
        let mutants: Vec<C> = self.members[..count]
            .iter()
            .map(|chromosome| chromosome.mutate(rng))
            .collect();
        self.members.extend(mutants);
        count
    }

    /// Produces `floor(len * repopulation_rate)` offspring and merges them
    /// according to the configured [`Composition`].
    ///
    /// Parents are drawn uniformly from `[0, len)`, independently for each
    /// offspring; both draws may hit the same chromosome. Returns the number
    /// of offspring produced.
    ///
    /// # Errors
    ///
    /// [`EvolutionError::InsufficientPopulation`] when fewer than two
    /// chromosomes are present. Deadline and worker failures leave the
    /// population untouched.
    pub fn recombine(&mut self) -> Result<usize, EvolutionError> {
        let deadline = self.deadline();
        let offspring = self.breed(deadline)?;
        let produced = offspring.len();
        self.compose(offspring);
        Ok(produced)
    }

    /// Removes `floor(len * death_rate)` chromosomes chosen uniformly at
    /// random, one at a time. Returns the number removed.
    ///
    /// Not part of [`evolve`](Population::evolve) unless
    /// [`PopulationConfig::kill_enabled`] is set.
    pub fn kill(&mut self) -> usize {
        let dead = self.config.death_count(self.members.len());
        for _ in 0..dead {
            let index = self.rng.random_range(0..self.members.len());
            self.members.swap_remove(index);
        }
        dead
    }

    /// Runs one generation: sort, mutate, recombine, optional kill, sort.
    ///
    /// Afterwards the population is sorted and [`best_fit`](Population::best_fit)
    /// is valid.
    ///
    /// # Errors
    ///
    /// A failed recombination fails the whole generation. Mutants are
    /// discarded and the population is left sorted and truncated, as it was
    /// after the first sort.
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        let deadline = self.deadline();

        self.sort();
        let survivors = self.members.len();
        self.mutate();

        let offspring = match self.breed(deadline) {
            Ok(offspring) => offspring,
            Err(err) => {
                self.members.truncate(survivors);
                if matches!(err, EvolutionError::GenerationTimedOut { .. }) {
                    log::warn!("generation {} abandoned: {err}", self.generation + 1);
                }
                return Err(err);
            }
        };
        self.compose(offspring);

        if self.config.kill_enabled {
            self.kill();
        }
        self.sort();
        self.generation += 1;

        if let (Some(best), Some(worst)) = (self.best_fit(), self.worst_fit()) {
            log::debug!(
                "generation {}: best {:?}, worst {:?}, size {}",
                self.generation,
                best.fitness(),
                worst.fitness(),
                self.members.len()
            );
        }
        Ok(())
    }

    fn deadline(&self) -> Option<Instant> {
        self.config
            .generation_timeout()
            .map(|timeout| Instant::now() + timeout)
    }

    /// Draws the parent pairs and per-task seeds, then fans the productions
    /// out. The population is only read until all offspring are in.
    fn breed(&mut self, deadline: Option<Instant>) -> Result<Vec<C>, EvolutionError> {
        let len = self.members.len();
        if len < 2 {
            return Err(EvolutionError::InsufficientPopulation { len });
        }

        let count = self.config.offspring_count(len);
        let productions: Vec<Production> = (0..count)
            .map(|slot| Production {
                slot,
                first: self.rng.random_range(0..len),
                second: self.rng.random_range(0..len),
                seed: self.rng.random(),
            })
            .collect();

        fanout::recombine_all(&self.members, &productions, self.config.parallel, deadline)
    }

    fn compose(&mut self, offspring: Vec<C>) {
        match self.config.composition {
            Composition::Additive => self.members.extend(offspring),
            Composition::Replacing => self.members = offspring,
        }
    }
}

impl<C: Chromosome + Clone> Clone for Population<C> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
            config: self.config.clone(),
            rng: self.rng.clone(),
            generation: self.generation,
        }
    }
}

impl<C: Chromosome + std::fmt::Debug> std::fmt::Debug for Population<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Population")
            .field("generation", &self.generation)
            .field("len", &self.members.len())
            .field("members", &self.members)
            .finish()
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rand::random()),
    }
}

// ============================================================================
// Tests
// ============================================================================
