//! Point time series as returned by the forecast and analysis services.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::catalog::Parameter;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSeries {
    pub approved_time: Option<DateTime<Utc>>,
    pub reference_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_series: Vec<TimeStep>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeStep {
    pub valid_time: DateTime<Utc>,
    #[serde(default)]
    pub parameters: Vec<NamedValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedValue {
    pub name: String,
    pub level_type: Option<String>,
    pub level: Option<i32>,
    pub unit: Option<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub valid_time: DateTime<Utc>,
    pub value: f64,
    pub unit: &'static str,
}

impl TimeStep {
    pub fn find(&self, name: &str) -> Option<&NamedValue> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Projects `parameter` out of the first `limit` timesteps (all when `None`).
///
/// Steps that do not carry the parameter, or carry it without values, are
/// skipped.
pub fn extract(
    series: &PointSeries,
    parameter: &Parameter,
    limit: Option<usize>,
) -> Vec<SeriesPoint> {
    series
        .time_series
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .filter_map(|step| {
            let value = step.find(parameter.id).and_then(|p| p.values.first().copied());
            if value.is_none() {
                debug!("no {} value at {}", parameter.id, step.valid_time);
            }
            value.map(|value| SeriesPoint {
                valid_time: step.valid_time,
                value,
                unit: parameter.unit,
            })
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{find, ANALYSIS_PARAMETERS};

    fn decode(steps: &[&[(&str, f64)]]) -> PointSeries {
        serde_json::from_value(sample::series(steps)).unwrap()
    }

    #[test]
    fn decodes_provider_layout() {
        let series = decode(&[&[("t", 4.2), ("r", 81.0)]]);

        assert!(series.approved_time.is_some());
        let step = &series.time_series[0];
        let t = step.find("t").unwrap();
        assert_eq!(t.level_type.as_deref(), Some("hl"));
        assert_eq!(t.level, Some(2));
        assert_eq!(t.values, vec![4.2]);
        assert!(step.find("ws").is_none());
    }

    #[test]
    fn extract_respects_limit() {
        let series = decode(&[&[("t", 1.0)], &[("t", 2.0)], &[("t", 3.0)]]);
        let t = find(ANALYSIS_PARAMETERS, "1").unwrap();

        let points = extract(&series, t, Some(2));

        assert_eq!(points.iter().map(|p| p.value).collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(points[0].unit, "°C");
    }

    #[test]
    fn extract_skips_steps_without_values() {
        let mut series = decode(&[&[("t", 1.0)], &[("t", 2.0)]]);
        series.time_series[1].parameters[0].values.clear();
        let t = find(ANALYSIS_PARAMETERS, "1").unwrap();

        assert_eq!(extract(&series, t, None).len(), 1);
    }
}
