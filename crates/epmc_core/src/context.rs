//! Per-run random stream and electron id source
//!
//! Everything random in a trajectory draws from the context handed to the
//! engine, so a seed fully determines a run and parallel workers can each
//! own an independent stream.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bits reserved for electron ids within one stream
const STREAM_ID_BITS: u32 = 40;

/// Random generator and id counter for one simulation stream
#[derive(Clone, Debug)]
pub struct SimulationContext {
    rng: StdRng,
    next_id: u64,
    seed: u64,
    stream: u64,
}

impl SimulationContext {
    /// Context for a single-threaded run
    pub fn seeded(seed: u64) -> Self {
        Self::for_stream(seed, 0)
    }

    /// Independent stream `stream` derived from `seed`
    ///
    /// Streams draw from differently seeded generators and hand out ids from
    /// disjoint ranges, so electrons from parallel workers never share an id.
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(mix(seed, stream)),
            next_id: (stream << STREAM_ID_BITS) + 1,
            seed,
            stream,
        }
    }

    /// The random generator
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Uniform sample in `[0, 1)`
    pub fn uniform(&mut self) -> f64 {
        self.rng.random()
    }

    /// Take the next electron id (ids start at 1; 0 marks "no parent")
    pub fn next_electron_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stream(&self) -> u64 {
        self.stream
    }
}

/// SplitMix64 finalizer over the seed and stream index
fn mix(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
