use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use itertools::Itertools;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::detect::Detector;
use crate::error::{Error, Result};
use crate::matrix::{FeatureMatrix, Flags};

/// How strict the detection is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Isolation forest alone
    Simple,
    /// Majority vote (2 of 3) of isolation forest, local outlier factor and histogram score
    Balanced,
    /// Union of isolation forest, local outlier factor, histogram score and DBSCAN noise
    Complex,
}

impl Mode {
    pub const ALL: [&'static str; 3] = ["simple", "balanced", "complex"];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Simple => "simple",
            Mode::Balanced => "balanced",
            Mode::Complex => "complex",
        }
    }
}

impl Default for Mode {
    fn default() -> Mode {
        Mode::Simple
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Mode> {
        match s {
            "simple" => Ok(Mode::Simple),
            "balanced" => Ok(Mode::Balanced),
            "complex" => Ok(Mode::Complex),
            other => Err(Error::InvalidMode(other.to_owned())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merges the votes of several detectors into one flag per row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// A row is an outlier iff at least this many detectors flag it
    AtLeast(usize),
    /// A row is an outlier iff any detector flags it
    Any,
}

impl Combinator {
    /// # Panics
    ///
    /// Panics if the votes differ in length from `nrows`
    pub fn combine(self, votes: &[Flags], nrows: usize) -> Flags {
        assert!(votes.iter().all(|v| v.len() == nrows));

        (0..nrows)
            .map(|i| {
                let count = votes.iter().filter(|v| v[i]).count();
                match self {
                    Combinator::AtLeast(threshold) => count >= threshold,
                    Combinator::Any => count > 0,
                }
            })
            .collect::<Vec<_>>()
            .into()
    }
}

/// A detection policy: a combinator applied to the votes of a fixed list of detectors
#[derive(Clone)]
pub struct Policy {
    combinator: Combinator,
    detectors: Vec<Arc<dyn Detector>>,
}

impl Policy {
    pub fn new(combinator: Combinator, detectors: Vec<Arc<dyn Detector>>) -> Policy {
        Policy {
            combinator,
            detectors,
        }
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn detectors(&self) -> &[Arc<dyn Detector>] {
        &self.detectors
    }

    /// Runs every detector on `features` and combines their votes.
    ///
    /// The detectors are independent of each other; with the `rayon` feature they run in
    /// parallel. The first detector error aborts the whole policy.
    pub fn run(&self, features: &FeatureMatrix) -> Result<Flags> {
        debug!(
            "running {} ({:?})",
            self.detectors.iter().map(|d| d.name()).join(", "),
            self.combinator
        );

        #[cfg(feature = "rayon")]
        let votes = self
            .detectors
            .par_iter()
            .map(|detector| vote(detector.as_ref(), features))
            .collect::<Result<Vec<_>>>()?;
        #[cfg(not(feature = "rayon"))]
        let votes = self
            .detectors
            .iter()
            .map(|detector| vote(detector.as_ref(), features))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.combinator.combine(&votes, features.nrows()))
    }
}

fn vote(detector: &dyn Detector, features: &FeatureMatrix) -> Result<Flags> {
    let flags = elapsed!(detector.name(), detector.detect(features))?;
    debug!("{} flagged {} rows", detector.name(), flags.count());
    debug_assert_eq!(flags.len(), features.nrows());

    Ok(flags)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::detect::test::{matrix, stubs, Fixed};
    use crate::detect::Detectors;

    const T: bool = true;
    const F: bool = false;

    #[test]
    fn mode_tokens() {
        assert_eq!("simple".parse::<Mode>().unwrap(), Mode::Simple);
        assert_eq!("balanced".parse::<Mode>().unwrap(), Mode::Balanced);
        assert_eq!("complex".parse::<Mode>().unwrap(), Mode::Complex);
        assert_eq!(Mode::default(), Mode::Simple);
        assert!(matches!(
            "Simple".parse::<Mode>(),
            Err(Error::InvalidMode(ref s)) if s == "Simple"
        ));
        assert!("".parse::<Mode>().is_err());

        for token in &Mode::ALL {
            assert_eq!(token.parse::<Mode>().unwrap().to_string(), *token);
        }
    }

    #[test]
    fn policy_per_mode() {
        let detectors = stubs(vec![F], vec![F], None, vec![F]);
        let shape = |mode| {
            let policy = detectors.policy(mode);
            (policy.combinator(), policy.detectors().len())
        };

        assert_eq!(shape(Mode::Simple), (Combinator::AtLeast(1), 1));
        assert_eq!(shape(Mode::Balanced), (Combinator::AtLeast(2), 3));
        assert_eq!(shape(Mode::Complex), (Combinator::Any, 4));
    }

    #[test]
    fn balanced_is_a_two_vote_majority() {
        // Every combination of three votes, one per row
        let isolation = vec![F, T, F, F, T, T, F, T];
        let lof = vec![F, F, T, F, T, F, T, T];
        let histogram = vec![F, F, F, T, F, T, T, T];

        let detectors = stubs(isolation, lof, Some(histogram), vec![F; 8]);
        let flags = detectors.policy(Mode::Balanced).run(&matrix(8)).unwrap();

        assert_eq!(&*flags, &[F, F, F, F, T, T, T, T]);
    }

    #[test]
    fn complex_is_the_union() {
        let detectors = stubs(
            vec![T, F, F, F, F],
            vec![F, T, F, F, F],
            Some(vec![F, F, T, F, F]),
            vec![F, F, F, T, F],
        );
        let flags = detectors.policy(Mode::Complex).run(&matrix(5)).unwrap();

        assert_eq!(&*flags, &[T, T, T, T, F]);
    }

    #[test]
    fn simple_follows_the_isolation_forest() {
        let detectors = stubs(vec![T, F, T], vec![F, T, F], Some(vec![F, T, F]), vec![T; 3]);
        let flags = detectors.policy(Mode::Simple).run(&matrix(3)).unwrap();

        assert_eq!(&*flags, &[T, F, T]);
    }

    #[test]
    fn balanced_without_histogram_needs_both_remaining_votes() {
        let isolation = vec![F, T, F, T];
        let lof = vec![F, F, T, T];

        let degraded = stubs(isolation.clone(), lof.clone(), None, vec![F; 4])
            .policy(Mode::Balanced)
            .run(&matrix(4))
            .unwrap();
        let both = Policy::new(
            Combinator::AtLeast(2),
            vec![
                Arc::new(Fixed("isolation", isolation)) as Arc<dyn Detector>,
                Arc::new(Fixed("lof", lof)),
            ],
        )
        .run(&matrix(4))
        .unwrap();

        assert_eq!(degraded, both);
        assert_eq!(&*degraded, &[F, F, F, T]);
    }

    #[test]
    fn complex_without_histogram_is_the_union_of_the_rest() {
        let flags = stubs(vec![T, F, F], vec![F, F, F], None, vec![F, F, T])
            .policy(Mode::Complex)
            .run(&matrix(3))
            .unwrap();

        assert_eq!(&*flags, &[T, F, T]);
    }

    struct Failing;

    impl Detector for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn detect(&self, features: &FeatureMatrix) -> Result<Flags> {
            Err(Error::InsufficientData {
                detector: "failing",
                required: 100,
                got: features.nrows(),
            })
        }
    }

    #[test]
    fn detector_errors_propagate() {
        let mut detectors: Detectors = stubs(vec![F; 2], vec![F; 2], Some(vec![F; 2]), vec![F; 2]);
        detectors.local_outlier_factor = Arc::new(Failing);

        assert!(detectors.policy(Mode::Simple).run(&matrix(2)).is_ok());
        assert!(matches!(
            detectors.policy(Mode::Balanced).run(&matrix(2)),
            Err(Error::InsufficientData { got: 2, .. })
        ));
    }

    #[test]
    fn combinators() {
        let votes = vec![Flags::from(vec![T, F, T]), Flags::from(vec![T, F, F])];

        assert_eq!(&*Combinator::AtLeast(2).combine(&votes, 3), &[T, F, F]);
        assert_eq!(&*Combinator::Any.combine(&votes, 3), &[T, F, T]);
        assert_eq!(&*Combinator::AtLeast(1).combine(&[], 2), &[F, F]);
    }
}
