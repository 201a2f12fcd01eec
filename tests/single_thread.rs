//! Generations complete when the global rayon pool has a single thread,
//! as on a one-core host or with `RAYON_NUM_THREADS=1`.
//!
//! Lives in its own test binary so the global pool can be pinned to one
//! thread before anything else touches it.

use rand::Rng;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use u_evolve::population::{Chromosome, Population, PopulationConfig};

#[derive(Debug, Clone, PartialEq)]
struct Bits(Vec<bool>);

impl Chromosome for Bits {
    type Score = i32;

    fn fitness(&self) -> i32 {
        self.0.iter().filter(|&&bit| bit).count() as i32
    }

    fn recombine<R: Rng>(&self, peer: &Self, rng: &mut R) -> Self {
        let split = rng.random_range(0..self.0.len());
        let mut bits = self.0[..split].to_vec();
        bits.extend_from_slice(&peer.0[split..]);
        Bits(bits)
    }

    fn mutate<R: Rng>(&self, rng: &mut R) -> Self {
        let mut bits = self.0.clone();
        let i = rng.random_range(0..bits.len());
        bits[i] = !bits[i];
        Bits(bits)
    }
}

#[test]
fn evolve_completes_on_single_thread_global_pool() {
    // Fails only if the global pool was already built, which cannot happen
    // in this binary.
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build_global();
    assert_eq!(rayon::current_num_threads(), 1);

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let config = PopulationConfig::default()
            .with_max_population(20)
            .with_seed(1);
        let mut population =
            Population::from_factory(config, 20, |rng| Bits((0..16).map(|_| rng.random()).collect()))
                .unwrap();
        let outcome = (0..5).try_for_each(|_| population.evolve());
        let _ = tx.send(outcome.map(|()| population));
    });

    let population = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("evolve did not finish on a single-thread pool")
        .unwrap();

    assert_eq!(population.generation(), 5);
    assert!(population.len() <= 20);
}
