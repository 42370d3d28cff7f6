//! Univariate analysis

mod percentiles;
mod sample;

pub use self::percentiles::Percentiles;
pub use self::sample::Sample;

/// Flags the values strictly above the `100 * (1 - contamination)`th percentile of `scores`.
///
/// This is how every score-based detector turns its scores into outlier flags: with a
/// contamination of 0.1 roughly the top tenth of the scores is flagged.
pub fn flag_top_fraction(scores: &[f64], contamination: f64) -> Vec<bool> {
    if scores.is_empty() {
        return vec![];
    }

    let threshold = Sample::new(scores)
        .percentiles()
        .at(100.0 * (1.0 - contamination));

    scores.iter().map(|&s| s > threshold).collect()
}
