//! Recombination fan-out/fan-in.
//!
//! Each offspring is produced by its own task. Tasks read the population
//! snapshot, call [`Chromosome::recombine`] once, and send the child into a
//! bounded channel sized exactly to the number of productions. The
//! coordinator drains exactly that many results before returning, so the
//! snapshot is never written while a task can still read it.

use super::error::EvolutionError;
use super::types::Chromosome;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Instant;

/// One offspring production: which slot it fills, which parents it reads,
/// and the seed for the task's private generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Production {
    pub slot: usize,
    pub first: usize,
    pub second: usize,
    pub seed: u64,
}

/// Runs every production and returns the offspring in slot order.
///
/// Results arrive in completion order; they are placed back by slot so a
/// seeded run reproduces the same population regardless of scheduling.
///
/// When `deadline` passes before all results are in, the generation is
/// abandoned: tasks that have not started skip their work, partial results
/// are dropped, and [`EvolutionError::GenerationTimedOut`] is returned. A task
/// that panics propagates its panic once the scope closes.
///
/// The coordinator stays on the calling thread. When that thread is itself
/// a pool worker, it runs pending productions while it waits, so a
/// single-thread pool still completes the barrier.
pub(crate) fn recombine_all<C: Chromosome>(
    members: &[C],
    productions: &[Production],
    parallel: bool,
    deadline: Option<Instant>,
) -> Result<Vec<C>, EvolutionError> {
    let expected = productions.len();
    if expected == 0 {
        return Ok(Vec::new());
    }

    let (tx, rx) = sync_channel::<(usize, C)>(expected);

    if !parallel {
        for (received, production) in productions.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(EvolutionError::GenerationTimedOut { received, expected });
            }
            produce(members, production, &tx);
        }
        drop(tx);
        return fan_in(&rx, expected, deadline);
    }

    let abandoned_flag = AtomicBool::new(false);
    let abandoned = &abandoned_flag;
    rayon::in_place_scope(move |scope| {
        for production in productions {
            let tx = tx.clone();
            scope.spawn(move |_| {
                if abandoned.load(Ordering::Relaxed) {
                    return;
                }
                produce(members, production, &tx);
            });
        }
        drop(tx);

        let collected = fan_in(&rx, expected, deadline);
        if collected.is_err() {
            abandoned.store(true, Ordering::Relaxed);
        }
        collected
    })
}

fn produce<C: Chromosome>(members: &[C], production: &Production, tx: &SyncSender<(usize, C)>) {
    let mut rng = StdRng::seed_from_u64(production.seed);
    let child = members[production.first].recombine(&members[production.second], &mut rng);
    // The receiver only goes away once the generation has been abandoned.
    let _ = tx.send((production.slot, child));
}

/// Reads exactly `expected` results.
fn fan_in<C>(
    rx: &Receiver<(usize, C)>,
    expected: usize,
    deadline: Option<Instant>,
) -> Result<Vec<C>, EvolutionError> {
    let mut slots: Vec<Option<C>> = (0..expected).map(|_| None).collect();
    let mut received = 0usize;

    while received < expected {
        let (slot, child) = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Disconnected) => {
                return Err(EvolutionError::WorkersLost { received, expected });
            }
            Err(TryRecvError::Empty) => {
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Err(EvolutionError::GenerationTimedOut { received, expected });
                }
                // On a pool thread, queued productions may only run here.
                if let Some(rayon::Yield::Executed) = rayon::yield_now() {
                    continue;
                }
                wait(rx, deadline, received, expected)?
            }
        };
        slots[slot] = Some(child);
        received += 1;
    }

    log::trace!("fan-in complete: {expected} offspring");
    Ok(slots.into_iter().flatten().collect())
}

/// Blocks for the next result. Only called once no production is left
/// queued for the current thread.
fn wait<C>(
    rx: &Receiver<(usize, C)>,
    deadline: Option<Instant>,
    received: usize,
    expected: usize,
) -> Result<(usize, C), EvolutionError> {
    match deadline {
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            rx.recv_timeout(remaining).map_err(|err| match err {
                RecvTimeoutError::Timeout => EvolutionError::GenerationTimedOut { received, expected },
                RecvTimeoutError::Disconnected => EvolutionError::WorkersLost { received, expected },
            })
        }
        None => rx
            .recv()
            .map_err(|_| EvolutionError::WorkersLost { received, expected }),
    }
}
