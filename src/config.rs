use rand::rngs::OsRng;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// How the builder picks the axis it sorts a node's primitives along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SplitAxisPolicy {
    /// Uniformly random among X, Y and Z, drawn per node.
    #[default]
    Random,
    /// Axis of greatest extent of the node's box.
    Longest,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BvhConfig {
    pub split_axis: SplitAxisPolicy,
    /// Seed for the random axis choice; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl BvhConfig {
    pub fn seeded(seed: u64) -> Self {
        BvhConfig {
            split_axis: SplitAxisPolicy::Random,
            seed: Some(seed),
        }
    }

    pub fn longest_axis() -> Self {
        BvhConfig {
            split_axis: SplitAxisPolicy::Longest,
            seed: None,
        }
    }

    pub fn rng(&self) -> Xoshiro256PlusPlus {
        let seed = self.seed.unwrap_or_else(|| OsRng.next_u64());
        log::debug!("split axis seed: {}", seed);
        Xoshiro256PlusPlus::seed_from_u64(seed)
    }
}
