use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const STEP_DERIVATION_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;
const SIM_DERIVATION_PRIME: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// Create a deterministic RNG from a seed.
pub fn create_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Derive the RNG for one cell of one model in one step.
///
/// Every cell gets its own stream, so the draws do not depend on which thread
/// evaluates which cell.
pub fn derive_cell_rng(seed: u64, step: u64, sim: usize, cell: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(
        seed ^ step.wrapping_mul(STEP_DERIVATION_PRIME)
            ^ (sim as u64).wrapping_add(1).wrapping_mul(SIM_DERIVATION_PRIME),
    );
    rng.set_stream(cell as u64);
    rng
}
