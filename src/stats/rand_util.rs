use oorandom::Rand64;

pub type Rng = Rand64;

/// Returns a generator for the `stream`th independent sequence of `seed`.
///
/// Each isolation tree draws from its own stream so that growing the trees in parallel yields the
/// same forest as growing them one after the other.
pub fn seeded(seed: u64, stream: u64) -> Rng {
    let hi = splitmix(seed);
    let lo = splitmix(hi ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));

    Rand64::new((u128::from(hi) << 64) | u128::from(lo))
}

/// Draws `amount` distinct indices from `0..n` (partial Fisher-Yates)
///
/// # Panics
///
/// Panics if `amount > n`
pub fn sample_indices(rng: &mut Rng, n: usize, amount: usize) -> Vec<usize> {
    assert!(amount <= n);

    let mut indices: Vec<usize> = (0..n).collect();
    for i in 0..amount {
        let j = i + rng.rand_range(0..(n - i) as u64) as usize;
        indices.swap(i, j);
    }
    indices.truncate(amount);
    indices
}

/// Uniform draw from `[low, high)`
pub fn uniform(rng: &mut Rng, low: f64, high: f64) -> f64 {
    low + (high - low) * rng.rand_float()
}

fn splitmix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}
