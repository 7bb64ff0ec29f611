//! Running independent batches of trajectories on worker threads
//!
//! Trajectories share nothing but the read-only region tree, so a run is
//! split into batches, each stepped by its own engine with its own random
//! stream. Listeners that must see every batch (such as
//! [`SharedTally`](crate::SharedTally)) are shared between the engines by
//! the factory.

use rayon::prelude::*;

use crate::context::SimulationContext;
use crate::engine::MonteCarloSim;
use crate::error::SimulationError;

/// How to split a run into batches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParallelPlan {
    /// Master seed; batch `i` uses stream `i` of it
    pub seed: u64,
    /// Total trajectories across all batches
    pub trajectories: u64,
    /// Number of batches (at least 1)
    pub batches: usize,
}

impl ParallelPlan {
    pub fn new(seed: u64, trajectories: u64, batches: usize) -> Self {
        Self {
            seed,
            trajectories,
            batches: batches.max(1),
        }
    }

    /// Trajectories in batch `index`; the remainder goes to the first batches
    pub fn batch_size(&self, index: usize) -> u64 {
        let batches = self.batches as u64;
        let base = self.trajectories / batches;
        let extra = self.trajectories % batches;
        base + u64::from((index as u64) < extra)
    }
}

/// Run `plan` on the rayon thread pool
///
/// `make_sim` builds the engine for one batch from its index and random
/// stream. Returns the number of trajectories run, or the first error any
/// batch hit.
pub fn run_parallel<F>(plan: ParallelPlan, make_sim: F) -> Result<u64, SimulationError>
where
    F: Fn(usize, SimulationContext) -> Result<MonteCarloSim, SimulationError> + Send + Sync,
{
    log::info!(
        "Running {} trajectories in {} batches on {} threads",
        plan.trajectories,
        plan.batches,
        rayon::current_num_threads()
    );
    let counts = (0..plan.batches)
        .into_par_iter()
        .map(|index| {
            let count = plan.batch_size(index);
            let ctx = SimulationContext::for_stream(plan.seed, index as u64);
            let mut sim = make_sim(index, ctx)?;
            sim.run_multiple(count)?;
            log::debug!("Batch {} finished {} trajectories", index, count);
            Ok(count)
        })
        .collect::<Result<Vec<u64>, SimulationError>>()?;
    Ok(counts.into_iter().sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_sizes_cover_total() {
        let plan = ParallelPlan::new(0, 10, 4);
        let sizes: Vec<u64> = (0..4).map(|i| plan.batch_size(i)).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2]);
        assert_eq!(sizes.iter().sum::<u64>(), 10);
    }

    #[test]
    fn test_zero_batches_becomes_one() {
        let plan = ParallelPlan::new(0, 5, 0);
        assert_eq!(plan.batches, 1);
        assert_eq!(plan.batch_size(0), 5);
    }
}
