//! Chart descriptions.
//!
//! A [`Chart`] is a plain, serializable description of what to draw: titles, axes and a list of
//! series. Building one never looks at the detectors, it only splits already-placed points by
//! their outlier flag.

use chrono::NaiveDateTime;

use crate::matrix::{FeatureMatrix, Flags};
use crate::preprocess::{NumericTable, TimeAxis};
use crate::stats::pca::Pca;

pub const SCATTER_TITLE: &str = "Outlier Detection Scatter Plot";
pub const TIME_SERIES_TITLE: &str = "Time Series Anomaly Detection";
pub const SINGLE_FEATURE_TITLE: &str = "Outlier Detection (Single Feature)";

/// Horizontal coordinate of a point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum X {
    Number(f64),
    Time(NaiveDateTime),
    /// The row had no timestamp
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// Row of the (time-sorted) dataset this point stands for
    pub row: usize,
    pub x: X,
    pub y: f64,
}

/// Rows placed on a plane, before they're split by flag
#[derive(Debug, Clone, PartialEq)]
pub struct Positions {
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<Point>,
    is_time: bool,
}

impl Positions {
    /// Whether the horizontal coordinates are timestamps
    pub fn is_time(&self) -> bool {
        self.is_time
    }

    /// Title that fits a line chart of these positions
    pub fn line_title(&self) -> &'static str {
        if self.is_time {
            TIME_SERIES_TITLE
        } else {
            SINGLE_FEATURE_TITLE
        }
    }
}

/// Chooses how to place the rows on a plane.
///
/// * more than two features: first two principal components of the standardized `features`
/// * two features: the two columns of `numeric`, on their original scale
/// * one feature: the value of `numeric` against the time axis, or the row index without one
pub fn positions(
    numeric: &NumericTable,
    features: &FeatureMatrix,
    time_axis: Option<&TimeAxis>,
) -> Positions {
    match numeric.ncols() {
        1 => {
            let (x, is_time): (Vec<X>, bool) = match time_axis {
                Some(axis) => (
                    axis.values
                        .iter()
                        .map(|t| t.map_or(X::Missing, X::Time))
                        .collect(),
                    true,
                ),
                None => (
                    (0..numeric.nrows()).map(|i| X::Number(i as f64)).collect(),
                    false,
                ),
            };

            Positions {
                x_label: if is_time { "Time" } else { "Index" }.to_owned(),
                y_label: "Value".to_owned(),
                points: zip_points(x, numeric.columns[0].iter().cloned()),
                is_time,
            }
        }
        2 => Positions {
            x_label: numeric.names[0].clone(),
            y_label: numeric.names[1].clone(),
            points: zip_points(
                numeric.columns[0].iter().map(|&x| X::Number(x)),
                numeric.columns[1].iter().cloned(),
            ),
            is_time: false,
        },
        _ => {
            let pca = Pca::fit(features, 2);
            debug!("explained variance: {:?}", pca.explained_variance());
            let projected = pca.transform(features);

            Positions {
                x_label: "PC1".to_owned(),
                y_label: "PC2".to_owned(),
                points: zip_points(
                    projected.iter().map(|p| X::Number(p[0])),
                    projected.iter().map(|p| p[1]),
                ),
                is_time: false,
            }
        }
    }
}

fn zip_points<I, J>(xs: I, ys: J) -> Vec<Point>
where
    I: IntoIterator<Item = X>,
    J: IntoIterator<Item = f64>,
{
    xs.into_iter()
        .zip(ys)
        .enumerate()
        .map(|(row, (x, y))| Point { row, x, y })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Cyan,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbol {
    Circle,
    X,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub symbol: Symbol,
    pub size: u32,
}

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    Markers,
    LinesMarkers,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: &'static str,
    pub style: Style,
    pub color: Color,
    pub marker: Marker,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub time: bool,
}

/// What to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub legend_title: Option<String>,
    pub series: Vec<Series>,
}

/// Splits `points` into (unflagged, flagged)
fn split(points: &[Point], flags: &Flags) -> (Vec<Point>, Vec<Point>) {
    assert_eq!(points.len(), flags.len());

    points.iter().partition(|p| !flags[p.row])
}

/// Scatter chart with a `Normal` and an `Outlier` series
pub fn scatter(positions: &Positions, flags: &Flags, title: &str) -> Chart {
    let (normal, outliers) = split(&positions.points, flags);
    let marker = Marker {
        symbol: Symbol::Circle,
        size: 6,
    };

    Chart {
        title: title.to_owned(),
        x_axis: Axis {
            title: positions.x_label.clone(),
            time: positions.is_time,
        },
        y_axis: Axis {
            title: positions.y_label.clone(),
            time: false,
        },
        legend_title: Some("Point Type".to_owned()),
        series: vec![
            Series {
                name: "Normal",
                style: Style::Markers,
                color: Color::Cyan,
                marker,
                points: normal,
            },
            Series {
                name: "Outlier",
                style: Style::Markers,
                color: Color::Red,
                marker,
                points: outliers,
            },
        ],
    }
}

/// Line chart of the unflagged points, with the flagged ones overlaid as crosses
pub fn line(positions: &Positions, flags: &Flags, title: &str) -> Chart {
    let (normal, outliers) = split(&positions.points, flags);
    let x_title = if positions.is_time { "Time" } else { "Index" };

    Chart {
        title: title.to_owned(),
        x_axis: Axis {
            title: x_title.to_owned(),
            time: positions.is_time,
        },
        y_axis: Axis {
            title: "Value".to_owned(),
            time: false,
        },
        legend_title: None,
        series: vec![
            Series {
                name: "Data",
                style: Style::LinesMarkers,
                color: Color::Cyan,
                marker: Marker {
                    symbol: Symbol::Circle,
                    size: 5,
                },
                points: normal,
            },
            Series {
                name: "Outliers",
                style: Style::Markers,
                color: Color::Red,
                marker: Marker {
                    symbol: Symbol::X,
                    size: 8,
                },
                points: outliers,
            },
        ],
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;
    use crate::preprocess::standardize;

    fn table(names: &[&str], columns: Vec<Vec<f64>>) -> (NumericTable, FeatureMatrix) {
        let features = standardize(&columns).unwrap();
        (
            NumericTable {
                names: names.iter().map(|s| s.to_string()).collect(),
                columns,
            },
            features,
        )
    }

    #[test]
    fn two_features_keep_their_scale_and_names() {
        let (numeric, features) = table(&["height", "weight"], vec![vec![1.0, 2.0], vec![50.0, 60.0]]);
        let p = positions(&numeric, &features, None);

        assert_eq!(p.x_label, "height");
        assert_eq!(p.y_label, "weight");
        assert_eq!(p.points[1], Point { row: 1, x: X::Number(2.0), y: 60.0 });
        assert!(!p.is_time());
    }

    #[test]
    fn many_features_are_projected() {
        let (numeric, features) = table(
            &["a", "b", "c"],
            vec![
                vec![1.0, 2.0, 3.0, 4.0],
                vec![2.0, 4.0, 6.0, 8.1],
                vec![0.0, 1.0, 0.0, 1.0],
            ],
        );
        let p = positions(&numeric, &features, None);

        assert_eq!(p.x_label, "PC1");
        assert_eq!(p.y_label, "PC2");
        assert_eq!(p.points.len(), 4);
        let pc1: f64 = p
            .points
            .iter()
            .map(|point| match point.x {
                X::Number(x) => x,
                _ => panic!("projected x should be a number"),
            })
            .sum();
        assert_relative_eq!(pc1, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn single_feature_uses_the_index_or_the_time() {
        let (numeric, features) = table(&["v"], vec![vec![3.0, 4.0]]);

        let p = positions(&numeric, &features, None);
        assert_eq!((p.x_label.as_str(), p.y_label.as_str()), ("Index", "Value"));
        assert_eq!(p.points[1].x, X::Number(1.0));
        assert_eq!(p.line_title(), SINGLE_FEATURE_TITLE);

        let t = chrono::DateTime::from_timestamp(0, 0).map(|t| t.naive_utc());
        let axis = TimeAxis {
            name: "date".to_owned(),
            values: vec![t, None],
        };
        let p = positions(&numeric, &features, Some(&axis));
        assert_eq!(p.x_label, "Time");
        assert_eq!(p.points[0].x, X::Time(t.unwrap()));
        assert_eq!(p.points[1].x, X::Missing);
        assert_eq!(p.line_title(), TIME_SERIES_TITLE);
    }

    #[test]
    fn scatter_splits_by_flag() {
        let (numeric, features) = table(&["a", "b"], vec![vec![1.0, 2.0, 3.0], vec![1.0, 1.0, 9.0]]);
        let p = positions(&numeric, &features, None);
        let chart = scatter(&p, &vec![false, false, true].into(), SCATTER_TITLE);

        assert_eq!(chart.title, SCATTER_TITLE);
        assert_eq!(chart.legend_title.as_deref(), Some("Point Type"));
        assert_eq!(chart.series[0].name, "Normal");
        assert_eq!(chart.series[0].color, Color::Cyan);
        assert_eq!(chart.series[0].points.len(), 2);
        assert_eq!(chart.series[1].name, "Outlier");
        assert_eq!(chart.series[1].color, Color::Red);
        assert_eq!(chart.series[1].points[0].row, 2);
    }

    #[test]
    fn line_overlays_outliers_as_crosses() {
        let (numeric, features) = table(&["v"], vec![vec![1.0, 1.1, 9.0, 1.0]]);
        let p = positions(&numeric, &features, None);
        let chart = line(&p, &vec![false, false, true, false].into(), p.line_title());

        assert_eq!(chart.title, SINGLE_FEATURE_TITLE);
        assert_eq!(chart.x_axis.title, "Index");
        assert_eq!(chart.y_axis.title, "Value");

        let data = &chart.series[0];
        assert_eq!((data.name, data.style, data.marker.size), ("Data", Style::LinesMarkers, 5));
        assert_eq!(data.points.iter().map(|p| p.row).collect::<Vec<_>>(), vec![0, 1, 3]);

        let outliers = &chart.series[1];
        assert_eq!(outliers.name, "Outliers");
        assert_eq!(outliers.marker, Marker { symbol: Symbol::X, size: 8 });
        assert_eq!(outliers.points[0].y, 9.0);
    }

    #[test]
    fn serializes_timestamps_and_gaps() {
        let t = chrono::NaiveDate::from_ymd_opt(2021, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        let json = serde_json::to_value(&[
            Point { row: 0, x: X::Time(t), y: 1.0 },
            Point { row: 1, x: X::Missing, y: 2.0 },
        ])
        .unwrap();

        assert_eq!(json[0]["x"], "2021-01-02T03:04:05");
        assert!(json[1]["x"].is_null());
    }
}
