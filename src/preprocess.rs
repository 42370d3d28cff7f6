//! Turning a decoded dataset into the numeric matrix the detectors consume.
//!
//! In order:
//!
//! 1. a time column, if any, orders the rows and leaves the feature set
//! 2. entirely empty columns are dropped
//! 3. with a time column, every column is forward- then backward-filled
//! 4. the remaining gaps of numeric columns get the column's median
//! 5. non-numeric columns are dropped
//! 6. every numeric column is standardized

use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::dataset::{Column, Dataset, Values};
use crate::error::{Error, Result};
use crate::matrix::FeatureMatrix;
use crate::stats::univariate::Sample;

/// The time column that was pulled out of the features to serve as the x-axis
#[derive(Debug, Clone, PartialEq)]
pub struct TimeAxis {
    pub name: String,
    pub values: Vec<Option<NaiveDateTime>>,
}

/// Imputed numeric columns, before scaling
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    pub names: Vec<String>,
    pub columns: Vec<Vec<f64>>,
}

impl NumericTable {
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }
}

/// Output of the ingestion stage
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Present iff a time column was found; rows are sorted by it
    pub time_axis: Option<TimeAxis>,
    /// Numeric features on their original scale, for display
    pub numeric: NumericTable,
    /// Standardized features, for detection
    pub features: FeatureMatrix,
}

/// Cleans `dataset` and standardizes its numeric columns
pub fn preprocess(dataset: Dataset) -> Result<Prepared> {
    let time = dataset.time_column();
    let mut columns = dataset.into_columns();

    let time_axis = time.map(|(index, values)| {
        let order = chronological_order(&values);
        let column = columns.remove(index);
        for column in columns.iter_mut() {
            column.values.reorder(&order);
        }

        info!("using {:?} as the time axis", column.name);
        TimeAxis {
            name: column.name,
            values: order.iter().map(|&i| values[i]).collect(),
        }
    });

    columns.retain(|column| {
        let keep = !column.values.is_all_missing();
        if !keep {
            debug!("dropping empty column {:?}", column.name);
        }
        keep
    });

    if time_axis.is_some() {
        for column in columns.iter_mut() {
            column.values.fill_forward_backward();
        }
    }

    let (names, columns): (Vec<String>, Vec<Vec<f64>>) = columns
        .into_iter()
        .filter_map(|Column { name, values }| match values {
            Values::Numeric(cells) => Some((name, impute_median(cells))),
            _ => {
                debug!("dropping non-numeric column {:?}", name);
                None
            }
        })
        .unzip();

    if columns.is_empty() {
        return Err(Error::NoNumericFeatures);
    }

    let features = standardize(&columns)?;
    Ok(Prepared {
        time_axis,
        numeric: NumericTable { names, columns },
        features,
    })
}

/// Rescales every column to zero mean and unit (population) variance
///
/// Constant columns have nothing to scale and become all zeros. Each column is first divided by
/// its largest magnitude, so the sum and the squared deviations stay finite for any finite input.
pub fn standardize(columns: &[Vec<f64>]) -> Result<FeatureMatrix> {
    let mut scaled = Vec::with_capacity(columns.len());
    for (j, column) in columns.iter().enumerate() {
        let max_abs = column.iter().fold(0.0_f64, |max, x| max.max(x.abs()));
        let unit = if max_abs > 0.0 && max_abs.is_finite() {
            max_abs
        } else {
            1.0
        };
        let column: Vec<f64> = column.iter().map(|x| x / unit).collect();

        let sample = Sample::new(&column);
        let mean = sample.mean();
        let std_dev = sample.std_dev(Some(mean));
        let scale = if std_dev > 0.0 { std_dev } else { 1.0 };

        let column: Vec<f64> = column.iter().map(|x| (x - mean) / scale).collect();
        if !column.iter().all(|x| x.is_finite()) {
            return Err(Error::Decode {
                reason: format!("column {} cannot be standardized", j),
            });
        }
        scaled.push(column);
    }

    Ok(FeatureMatrix::from_columns(&scaled))
}

/// Stable order of the rows by time; rows without a time go last
fn chronological_order(times: &[Option<NaiveDateTime>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&a, &b| match (times[a], times[b]) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    order
}

/// Fills the gaps with the median of the present values.
///
/// The column must have at least one present value.
fn impute_median(cells: Vec<Option<f64>>) -> Vec<f64> {
    let present: Vec<f64> = cells.iter().filter_map(|&x| x).collect();
    if present.len() == cells.len() {
        return present;
    }

    let median = Sample::new(&present).median();
    cells.into_iter().map(|x| x.unwrap_or(median)).collect()
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use quickcheck::{quickcheck, TestResult};

    use super::*;
    use crate::stats::test;
    use crate::upload::Upload;

    fn prepare(text: &str) -> Result<Prepared> {
        let upload = Upload::from_bytes("test.csv", text.as_bytes().to_vec());
        preprocess(Dataset::parse(&upload)?)
    }

    quickcheck! {
        fn standardized_columns_have_zero_mean_and_unit_variance(size: usize, start: usize) -> TestResult {
            if let Some(v) = test::vec(size, start) {
                let column = v[start..].to_vec();
                let m = standardize(&[column]).unwrap();
                let scaled = m.column(0);
                let sample = Sample::new(&scaled);

                TestResult::from_bool(
                    sample.mean().abs() < 1e-9 && (sample.std_dev(None) - 1.0).abs() < 1e-9,
                )
            } else {
                TestResult::discard()
            }
        }
    }

    #[test]
    fn standardizes_every_column() {
        let p = prepare("a,b\n1,10\n2,20\n3,30\n4,40\n").unwrap();

        assert_eq!(p.features.nrows(), 4);
        assert_eq!(p.features.ncols(), 2);
        for j in 0..2 {
            let column = p.features.column(j);
            let sample = Sample::new(&column);
            assert_relative_eq!(sample.mean(), 0.0, epsilon = 1e-12);
            assert_relative_eq!(sample.std_dev(None), 1.0, epsilon = 1e-12);
        }
        assert_eq!(p.numeric.columns[1], vec![10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn huge_values_are_standardized() {
        // The column sum overflows
        let p = prepare("a\n1e308\n1.5e308\n1.7e308\n").unwrap();
        let column = p.features.column(0);
        assert!(column.iter().all(|x| x.is_finite()));
        assert!(column[0] < column[1] && column[1] < column[2]);
        assert_relative_eq!(Sample::new(&column).std_dev(None), 1.0, epsilon = 1e-9);

        // Only the squared deviations overflow
        let p = prepare("a,b\n1e160,1\n2e160,2\n9e160,3\n").unwrap();
        let column = p.features.column(0);
        assert!(column[2] > 1.0);
        assert_relative_eq!(Sample::new(&column).mean(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(Sample::new(&column).std_dev(None), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn tiny_values_are_standardized() {
        let m = standardize(&[vec![1e-310, 2e-310, 3e-310]]).unwrap();
        assert_relative_eq!(m.get(0, 0), -(1.5_f64.sqrt()), epsilon = 1e-3);
        assert_relative_eq!(m.get(2, 0), 1.5_f64.sqrt(), epsilon = 1e-3);
    }

    #[test]
    fn constant_column_becomes_zeros() {
        let p = prepare("a,b\n5,1\n5,2\n5,3\n").unwrap();
        assert_eq!(p.features.column(0), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn missing_values_get_the_median() {
        let p = prepare("a\n1\n\n3\n10\n").unwrap();
        assert_eq!(p.numeric.columns[0], vec![1.0, 3.0, 3.0, 10.0]);
    }

    #[test]
    fn non_numeric_and_empty_columns_are_dropped() {
        let p = prepare("name,x,blank,y\nfoo,1,,4\nbar,2,,5\nbaz,3,,6\n").unwrap();
        assert_eq!(p.numeric.names, vec!["x", "y"]);
        assert!(p.time_axis.is_none());
    }

    #[test]
    fn no_numeric_columns() {
        assert!(matches!(
            prepare("name,colour\nfoo,red\nbar,blue\n"),
            Err(Error::NoNumericFeatures)
        ));
        assert!(matches!(
            prepare("name,blank\nfoo,\nbar,\n"),
            Err(Error::NoNumericFeatures)
        ));
    }

    #[test]
    fn time_column_sorts_and_leaves_the_features() {
        let p = prepare(
            "timestamp,value\n\
             2021-01-03,30\n\
             2021-01-01,10\n\
             2021-01-02,20\n",
        )
        .unwrap();

        let axis = p.time_axis.unwrap();
        assert_eq!(axis.name, "timestamp");
        assert_eq!(
            axis.values
                .iter()
                .map(|t| t.unwrap().date().to_string())
                .collect::<Vec<_>>(),
            vec!["2021-01-01", "2021-01-02", "2021-01-03"]
        );
        assert_eq!(p.numeric.names, vec!["value"]);
        assert_eq!(p.numeric.columns[0], vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn time_series_gaps_are_filled_forward_then_backward() {
        let p = prepare(
            "date,v\n\
             2021-01-01,\n\
             2021-01-02,2\n\
             2021-01-03,\n\
             2021-01-04,8\n",
        )
        .unwrap();

        assert_eq!(p.numeric.columns[0], vec![2.0, 2.0, 2.0, 8.0]);
    }

    fn at(secs: i64) -> Option<NaiveDateTime> {
        chrono::DateTime::from_timestamp(secs, 0).map(|t| t.naive_utc())
    }

    #[test]
    fn rows_without_time_go_last() {
        assert_eq!(
            chronological_order(&[
                None,
                at(10),
                at(5),
            ]),
            vec![2, 1, 0]
        );
    }
}
