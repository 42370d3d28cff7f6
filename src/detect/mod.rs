//! Outlier detectors and the policies that combine them.
//!
//! Every detector exposes the same capability, `detect(matrix) -> flags`, and re-fits itself
//! from scratch on each call. Policies ([`Policy`]) are declarative combinators over a list of
//! detectors; which detectors exist is decided once, when [`Detectors`] is built, and passed to
//! the policy layer from there.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::matrix::{FeatureMatrix, Flags};

mod dbscan;
#[cfg(feature = "hbos")]
mod hbos;
mod isolation_forest;
mod lof;
mod policy;

pub use self::dbscan::Dbscan;
#[cfg(feature = "hbos")]
pub use self::hbos::Hbos;
pub use self::isolation_forest::IsolationForest;
pub use self::lof::LocalOutlierFactor;
pub use self::policy::{Combinator, Mode, Policy};

/// A binary outlier classifier over the rows of a feature matrix
pub trait Detector: Send + Sync {
    /// Human readable name, used in logs and errors
    fn name(&self) -> &'static str;

    /// Fits the detector to `features` and flags the outlying rows.
    ///
    /// The returned flags have one entry per row of `features`.
    fn detect(&self, features: &FeatureMatrix) -> Result<Flags>;
}

/// Stand-in for a detector that is not compiled into this build: it never flags anything.
pub struct Unavailable {
    name: &'static str,
}

impl Unavailable {
    pub fn new(name: &'static str) -> Unavailable {
        Unavailable { name }
    }
}

impl Detector for Unavailable {
    fn name(&self) -> &'static str {
        self.name
    }

    fn detect(&self, features: &FeatureMatrix) -> Result<Flags> {
        warn!(
            "{}; counting it as \"not an outlier\" for every row",
            Error::OptionalDetectorUnavailable {
                detector: self.name
            }
        );

        Ok(Flags::none(features.nrows()))
    }
}

/// The detectors available to the policy layer.
///
/// Built once at start-up with [`Detectors::available`]; tests build it by hand to inject stub
/// detectors.
#[derive(Clone)]
pub struct Detectors {
    pub isolation_forest: Arc<dyn Detector>,
    pub local_outlier_factor: Arc<dyn Detector>,
    /// The histogram-based outlier score is optional; `None` when it's not compiled in
    pub histogram: Option<Arc<dyn Detector>>,
    pub dbscan: Arc<dyn Detector>,
}

impl Detectors {
    pub const HISTOGRAM: &'static str = "histogram-based outlier score";

    /// Every detector this build supports, configured from `config`
    pub fn available(config: &Config) -> Detectors {
        let detectors = Detectors {
            isolation_forest: Arc::new(IsolationForest::new(config)),
            local_outlier_factor: Arc::new(LocalOutlierFactor::new(config)),
            histogram: histogram(config),
            dbscan: Arc::new(Dbscan::new(config)),
        };

        if detectors.histogram.is_none() {
            info!(
                "{}",
                Error::OptionalDetectorUnavailable {
                    detector: Detectors::HISTOGRAM
                }
            );
        }

        detectors
    }

    /// The histogram detector, or an always-false stand-in when it's missing
    fn histogram_or_stub(&self) -> Arc<dyn Detector> {
        match &self.histogram {
            Some(detector) => Arc::clone(detector),
            None => Arc::new(Unavailable::new(Detectors::HISTOGRAM)),
        }
    }

    /// Assembles the detection policy of `mode`
    pub fn policy(&self, mode: Mode) -> Policy {
        match mode {
            Mode::Simple => Policy::new(
                Combinator::AtLeast(1),
                vec![Arc::clone(&self.isolation_forest)],
            ),
            Mode::Balanced => Policy::new(
                Combinator::AtLeast(2),
                vec![
                    Arc::clone(&self.isolation_forest),
                    Arc::clone(&self.local_outlier_factor),
                    self.histogram_or_stub(),
                ],
            ),
            Mode::Complex => Policy::new(
                Combinator::Any,
                vec![
                    Arc::clone(&self.isolation_forest),
                    Arc::clone(&self.local_outlier_factor),
                    self.histogram_or_stub(),
                    Arc::clone(&self.dbscan),
                ],
            ),
        }
    }
}

#[cfg(feature = "hbos")]
fn histogram(config: &Config) -> Option<Arc<dyn Detector>> {
    Some(Arc::new(Hbos::new(config)))
}

#[cfg(not(feature = "hbos"))]
fn histogram(_: &Config) -> Option<Arc<dyn Detector>> {
    None
}
