use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_xoshiro::Xoshiro256StarStar;
use sha2::{Digest, Sha256};

/// Upper bound for generated seeds, small enough to retype by hand.
const MAX_GENERATED_SEED: u64 = 100_000;

/// A fresh seed for runs that did not pin one.
pub fn random_seed() -> u64 {
    rand::thread_rng().gen_range(0..MAX_GENERATED_SEED)
}

/// Generator for one sibling set.
///
/// Derived from the run seed and the set's context so every set shuffles
/// independently and no shared generator is advanced.
fn context_rng(seed: u64, context: &str) -> Xoshiro256StarStar {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(context.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    Xoshiro256StarStar::from_seed(bytes)
}

pub(super) fn shuffle<T>(items: &mut [T], seed: u64, context: &str) {
    items.shuffle(&mut context_rng(seed, context));
}
