use rand::prelude::*;
use rand::rngs::StdRng;

/// Random values spread over `[-1000, 1000)`, or `None` when `size` is too small to be useful
pub fn vec(size: usize, start: usize) -> Option<Vec<f64>> {
    if size > start + 2 {
        let mut rng = StdRng::from_entropy();

        Some((0..size).map(|_| rng.gen_range(-1e3..1e3)).collect())
    } else {
        None
    }
}
