//! One detection request, from the uploaded bytes to the chart.

use crate::chart::{self, Chart};
use crate::dataset::Dataset;
use crate::detect::{Detectors, Mode};
use crate::error::Result;
use crate::matrix::Flags;
use crate::preprocess::{self, Prepared};
use crate::report;
use crate::upload::Upload;

/// Everything a request produces
#[derive(Debug, Clone)]
pub struct Outcome {
    pub mode: Mode,
    pub prepared: Prepared,
    pub flags: Flags,
    pub chart: Chart,
    pub summary: String,
}

/// Ingests `upload`, flags its outlying rows under `mode` and charts the result.
///
/// Nothing is kept between calls: every detector is fit afresh on this upload.
pub fn run(upload: &Upload, mode: Mode, detectors: &Detectors) -> Result<Outcome> {
    info!("analyzing {:?} in {} mode", upload.filename(), mode);

    let dataset = elapsed!("Parsing the upload", Dataset::parse(upload))?;
    let prepared = elapsed!("Preprocessing", preprocess::preprocess(dataset))?;

    let policy = detectors.policy(mode);
    let flags = elapsed!("Detection", policy.run(&prepared.features))?;

    let chart = elapsed!("Charting", {
        let positions = chart::positions(
            &prepared.numeric,
            &prepared.features,
            prepared.time_axis.as_ref(),
        );
        if prepared.numeric.ncols() == 1 {
            chart::line(&positions, &flags, positions.line_title())
        } else {
            chart::scatter(&positions, &flags, chart::SCATTER_TITLE)
        }
    });

    let summary = report::summary(flags.count(), flags.len());
    info!("{}", summary);

    Ok(Outcome {
        mode,
        prepared,
        flags,
        chart,
        summary,
    })
}
