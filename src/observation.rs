use std::fmt;

use chrono::{Local, TimeZone};
use getset::{CopyGetters, Getters};
use itertools::Itertools;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    catalog::{self, Parameter},
    http::{get_json, Fetch, FetchError},
};

/// A reporting station as listed in a parameter's station catalog.
///
/// `active` defaults to false, so stations that omit it are filtered out.
/// `height`, `latitude` and `longitude` default to 0. `key` may arrive as a
/// string or a number and is kept as a string.
#[derive(Debug, Clone, Deserialize, Getters, CopyGetters)]
pub struct Station {
    #[serde(deserialize_with = "key_as_string")]
    #[getset(get = "pub")]
    key: String,

    #[getset(get = "pub")]
    name: String,

    #[serde(default)]
    #[getset(get_copy = "pub")]
    active: bool,

    #[serde(default)]
    #[getset(get_copy = "pub")]
    height: f64,

    #[serde(default)]
    #[getset(get_copy = "pub")]
    latitude: f64,

    #[serde(default)]
    #[getset(get_copy = "pub")]
    longitude: f64,
}

fn key_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Key::deserialize(deserializer)? {
        Key::Text(text) => text,
        Key::Number(number) => number.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize, Getters, CopyGetters)]
pub struct Period {
    #[getset(get = "pub")]
    key: String,

    #[getset(get_copy = "pub")]
    from: Option<i64>,

    #[getset(get_copy = "pub")]
    to: Option<i64>,

    #[getset(get = "pub")]
    summary: Option<String>,
}

/// A measured value as delivered: usually a decimal string, sometimes a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => write!(f, "{}", n),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationValue {
    /// Epoch milliseconds.
    pub date: i64,
    pub value: Option<RawValue>,
    pub quality: Option<String>,
}

/// Windows tried, in order, when looking for the latest value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationPeriod {
    LatestHour,
    LatestDay,
}

impl ObservationPeriod {
    pub const FALLBACK_ORDER: [ObservationPeriod; 2] =
        [ObservationPeriod::LatestHour, ObservationPeriod::LatestDay];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationPeriod::LatestHour => "latest-hour",
            ObservationPeriod::LatestDay => "latest-day",
        }
    }
}

impl fmt::Display for ObservationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Observation {
    pub period: ObservationPeriod,
    pub value: ObservationValue,
}

#[derive(Debug, Deserialize)]
struct StationCatalog {
    #[serde(default)]
    station: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct StationPeriods {
    #[serde(default)]
    period: Vec<Period>,
}

#[derive(Debug, Deserialize)]
struct PeriodData {
    #[serde(default)]
    value: Option<Vec<ObservationValue>>,
}

pub struct ObservationService<F> {
    fetcher: F,
    base_url: String,
}

impl<F: Fetch> ObservationService<F> {
    pub fn new(fetcher: F, base_url: &str) -> Self {
        ObservationService {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn parameter_url(&self, parameter_id: &str) -> String {
        format!("{}/parameter/{}", self.base_url, parameter_id)
    }

    fn station_url(&self, parameter_id: &str, station_id: &str) -> String {
        format!("{}/station/{}", self.parameter_url(parameter_id), station_id)
    }

    /// Active stations reporting `parameter_id`, sorted by name.
    /// Failures are logged and yield an empty list.
    pub async fn list_stations(&self, parameter_id: &str) -> Vec<Station> {
        let url = format!("{}.json", self.parameter_url(parameter_id));

        match get_json::<_, StationCatalog>(&self.fetcher, &url).await {
            Ok(catalog) => catalog
                .station
                .into_iter()
                .filter_map(|entry| match serde_json::from_value::<Station>(entry) {
                    Ok(station) => Some(station),
                    Err(e) => {
                        warn!("skipping malformed station entry: {}", e);
                        None
                    }
                })
                .filter(|s| s.active)
                .sorted_by(|a, b| a.name.cmp(&b.name))
                .collect(),
            Err(e) => {
                warn!("error getting stations: {}", e);
                Vec::new()
            }
        }
    }

    /// Periods available for a station, most recent key first.
    pub async fn list_periods(&self, parameter_id: &str, station_id: &str) -> Vec<Period> {
        let url = format!("{}.json", self.station_url(parameter_id, station_id));

        match get_json::<_, StationPeriods>(&self.fetcher, &url).await {
            Ok(periods) => {
                if periods.period.is_empty() {
                    warn!(
                        "no data periods available for station {} with parameter {}",
                        station_id, parameter_id
                    );
                }
                periods
                    .period
                    .into_iter()
                    .sorted_by(|a, b| b.key.cmp(&a.key))
                    .collect()
            }
            Err(e) => {
                warn!("error getting periods: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn period_values(
        &self,
        parameter_id: &str,
        station_id: &str,
        period: ObservationPeriod,
    ) -> Result<Vec<ObservationValue>, FetchError> {
        let url = format!(
            "{}/period/{}/data.json",
            self.station_url(parameter_id, station_id),
            period
        );
        let data: PeriodData = get_json(&self.fetcher, &url).await?;

        Ok(data.value.unwrap_or_default())
    }

    /// Most recent value, trying `latest-hour` before `latest-day`.
    /// `None` means neither window had data.
    pub async fn latest_observation(
        &self,
        parameter_id: &str,
        station_id: &str,
    ) -> Option<Observation> {
        for period in ObservationPeriod::FALLBACK_ORDER {
            match self.period_values(parameter_id, station_id, period).await {
                Ok(mut values) => match values.pop() {
                    Some(value) => return Some(Observation { period, value }),
                    None => debug!("no {} data available", period),
                },
                Err(e) => debug!("no {} data available: {}", period, e),
            }
        }

        warn!("no recent measurements available for station {}", station_id);
        None
    }
}

/// `YYYY-MM-DD HH:MM: <value> <unit>` in local time. Values are rounded per
/// unit when numeric; anything that cannot be interpreted is shown raw.
pub fn format_observation(value: &ObservationValue, parameter: &Parameter) -> String {
    let unit = parameter.unit;
    let raw = value
        .value
        .as_ref()
        .map_or_else(|| "No value".to_owned(), RawValue::to_string);

    let Some(timestamp) = Local.timestamp_millis_opt(value.date).single() else {
        warn!("error formatting data: invalid timestamp {}", value.date);
        return format!("{}: {} {}", value.date, raw, unit);
    };
    let stamp = timestamp.format("%Y-%m-%d %H:%M");

    match value.value.as_ref().and_then(RawValue::as_f64) {
        Some(number) if catalog::decimals(unit).is_some() => {
            format!("{}: {}", stamp, catalog::format_value(number, unit))
        }
        _ => format!("{}: {} {}", stamp, raw, unit),
    }
}
