//! Summary line and file exporters.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::Writer;

use crate::analysis::Outcome;
use crate::chart::Chart;
use crate::error::{log_error, Error, Result};

/// `Detected {outliers} outliers out of {total} data points.`
pub fn summary(outliers: usize, total: usize) -> String {
    format!("Detected {} outliers out of {} data points.", outliers, total)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|inner| Error::AccessError {
        path: path.to_owned(),
        inner,
    })
}

/// Writes the chart description as pretty-printed JSON
pub fn write_json(chart: &Chart, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, chart)?;
    writer.flush().map_err(|inner| Error::AccessError {
        path: path.to_owned(),
        inner,
    })?;

    debug!("wrote {:?}", path);
    Ok(())
}

/// Writes one record per row: the row number, its time (if the dataset has a time axis), the
/// feature values on their original scale and whether the row was flagged.
pub fn write_csv(outcome: &Outcome, path: &Path) -> Result<()> {
    let writer = Writer::from_writer(create(path)?);
    let mut writer = FlagWriter { writer };
    writer.write_data(outcome)?;

    debug!("wrote {:?}", path);
    Ok(())
}

struct FlagWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> FlagWriter<W> {
    fn write_data(&mut self, outcome: &Outcome) -> Result<()> {
        let prepared = &outcome.prepared;
        let time = prepared.time_axis.as_ref();

        let mut header = vec!["row".to_owned()];
        if let Some(axis) = time {
            header.push(axis.name.clone());
        }
        header.extend(prepared.numeric.names.iter().cloned());
        header.push("is_outlier".to_owned());
        self.writer.write_record(&header)?;

        for (row, &flagged) in outcome.flags.iter().enumerate() {
            let mut record = vec![row.to_string()];
            if let Some(axis) = time {
                record.push(
                    axis.values[row]
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default(),
                );
            }
            record.extend(
                prepared
                    .numeric
                    .columns
                    .iter()
                    .map(|column| column[row].to_string()),
            );
            record.push(flagged.to_string());
            self.writer.write_record(&record)?;
        }

        self.writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

/// Where to export the result of a request; every destination is optional.
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    pub json: Option<PathBuf>,
    pub svg: Option<PathBuf>,
    pub csv: Option<PathBuf>,
}

impl Outputs {
    /// Writes every requested export.
    ///
    /// A failing export doesn't stop the others; each failure is logged and the first one is
    /// returned.
    pub fn write(&self, outcome: &Outcome) -> Result<()> {
        let mut results = vec![];

        if let Some(path) = &self.json {
            results.push(write_json(&outcome.chart, path));
        }
        if let Some(path) = &self.svg {
            results.push(write_svg(&outcome.chart, path));
        }
        if let Some(path) = &self.csv {
            results.push(write_csv(outcome, path));
        }

        let mut first = None;
        for result in results {
            if let Err(e) = result {
                log_error(&e);
                first.get_or_insert(e);
            }
        }

        match first {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(feature = "plotters")]
fn write_svg(chart: &Chart, path: &Path) -> Result<()> {
    crate::plot::render_svg(chart, path)
}

#[cfg(not(feature = "plotters"))]
fn write_svg(_: &Chart, path: &Path) -> Result<()> {
    Err(Error::RenderError {
        path: path.to_owned(),
        reason: "this build has no SVG renderer".to_owned(),
    })
}
