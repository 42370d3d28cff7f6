//! Outlier detection for uploaded tabular data.
//!
//! A request goes through three stages:
//!
//! 1. ingestion: the uploaded CSV or spreadsheet is parsed ([`Dataset::parse`]), sorted by its
//!    time column if it has one, imputed and standardized ([`preprocess`])
//! 2. detection: a [`Policy`] picked by the [`Mode`] runs its detectors over the standardized
//!    matrix and combines their votes
//! 3. presentation: the flagged rows are placed on a plane and described as a [`Chart`]
//!
//! ```no_run
//! use outlierscope::{analysis, Config, Detectors, Mode, Upload};
//! # fn main() -> outlierscope::Result<()> {
//!
//! let detectors = Detectors::available(&Config::default());
//! let upload = Upload::open("measurements.csv".as_ref())?;
//! let outcome = analysis::run(&upload, Mode::Balanced, &detectors)?;
//!
//! println!("{}", outcome.summary);
//! # Ok(())
//! # }
//! ```

#![warn(bare_trait_objects)]
#![cfg_attr(
    feature = "cargo-clippy",
    allow(
        clippy::transmute_ptr_to_ptr, // Used in the stats code
    )
)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

// Needs to be declared before other modules
// in order to be usable there.
#[macro_use]
mod macros_private;

pub mod analysis;
pub mod chart;
mod config;
pub mod dataset;
pub mod detect;
mod error;
pub mod matrix;
#[cfg(feature = "plotters")]
pub mod plot;
pub mod preprocess;
pub mod report;
pub mod stats;
pub mod upload;

pub use crate::analysis::Outcome;
pub use crate::chart::Chart;
pub use crate::config::Config;
pub use crate::dataset::Dataset;
pub use crate::detect::{Detector, Detectors, Mode, Policy};
pub use crate::error::{log_error, Error, Result};
pub use crate::matrix::{FeatureMatrix, Flags};
pub use crate::report::Outputs;
pub use crate::upload::{Format, Upload};
