use std::{
    fmt,
    io::{self, BufRead, Write},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::{
    console::Console,
    http::{get_json, Fetch, FetchError},
    utils::Spinner,
};

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("{axis} must be between {min} and {max}")]
    OutOfRange {
        axis: &'static str,
        min: f64,
        max: f64,
    },

    #[error("location could not be determined")]
    Undeterminable,

    #[error(transparent)]
    Lookup(#[from] FetchError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// `lon/<lon>/lat/<lat>` with at most six decimals, as the point APIs expect.
    pub fn point_path(&self) -> String {
        format!(
            "lon/{}/lat/{}",
            round6(self.longitude),
            round6(self.latitude)
        )
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn check_axis(value: f64, axis: &'static str, limit: f64) -> Result<f64, LocationError> {
    if !(-limit..=limit).contains(&value) {
        return Err(LocationError::OutOfRange {
            axis,
            min: -limit,
            max: limit,
        });
    }

    Ok(value)
}

fn parse_axis(input: &str, axis: &'static str, limit: f64) -> Result<f64, LocationError> {
    let input = input.trim();
    let value: f64 = input
        .parse()
        .map_err(|_| LocationError::NotANumber(input.to_owned()))?;

    check_axis(value, axis, limit)
}

pub fn parse_latitude(input: &str) -> Result<f64, LocationError> {
    parse_axis(input, "latitude", 90.0)
}

pub fn parse_longitude(input: &str) -> Result<f64, LocationError> {
    parse_axis(input, "longitude", 180.0)
}

#[derive(Debug, Deserialize)]
struct IpLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Looks the caller up by IP. A missing or `(0, 0)` answer counts as
/// undeterminable.
pub async fn locate_by_ip<F: Fetch>(fetcher: &F, url: &str) -> Result<Coordinates, LocationError> {
    let found: IpLocation = get_json(fetcher, url).await?;

    match (found.latitude, found.longitude) {
        (Some(latitude), Some(longitude)) if latitude != 0.0 || longitude != 0.0 => {
            Ok(Coordinates {
                latitude: check_axis(latitude, "latitude", 90.0)?,
                longitude: check_axis(longitude, "longitude", 180.0)?,
            })
        }
        _ => Err(LocationError::Undeterminable),
    }
}

enum Step {
    Start,
    Automatic,
    Manual,
    Resolved(Coordinates),
}

/// Walks the user from a choice of automatic or manual lookup to a point.
/// Returns `None` when manual entry is cancelled.
pub async fn resolve<F, R, W>(
    fetcher: &F,
    geolocation_url: &str,
    console: &mut Console<R, W>,
) -> io::Result<Option<Coordinates>>
where
    F: Fetch,
    R: BufRead,
    W: Write,
{
    let mut step = Step::Start;

    loop {
        step = match step {
            Step::Start => {
                if console.confirm("Detect location automatically from IP address? (y/n): ")? {
                    Step::Automatic
                } else {
                    Step::Manual
                }
            }
            Step::Automatic => {
                let located = {
                    let _spinner = Spinner::start("Detecting location...");
                    locate_by_ip(fetcher, geolocation_url).await
                };
                match located {
                    Ok(coordinates) => {
                        console.say(format!("Detected location: {}", coordinates))?;
                        if console.confirm("Use this location? (y/n): ")? {
                            Step::Resolved(coordinates)
                        } else {
                            Step::Manual
                        }
                    }
                    Err(e) => {
                        warn!("automatic location failed, falling back to manual entry: {}", e);
                        console.say("Could not determine your location automatically.")?;
                        Step::Manual
                    }
                }
            }
            Step::Manual => match manual_entry(console)? {
                Some(coordinates) => Step::Resolved(coordinates),
                None => return Ok(None),
            },
            Step::Resolved(coordinates) => return Ok(Some(coordinates)),
        };
    }
}

fn ask_axis<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    prompt: &str,
    parse: fn(&str) -> Result<f64, LocationError>,
) -> io::Result<Option<f64>> {
    loop {
        let answer = console.ask(prompt)?;
        if answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        match parse(&answer) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => console.say(format!("Invalid input: {}", e))?,
        }
    }
}

/// Prompts until both axes are in range; `q` cancels.
pub fn manual_entry<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> io::Result<Option<Coordinates>> {
    let Some(latitude) = ask_axis(
        console,
        "Enter latitude (-90 to 90, 'q' to cancel): ",
        parse_latitude,
    )?
    else {
        return Ok(None);
    };
    let Some(longitude) = ask_axis(
        console,
        "Enter longitude (-180 to 180, 'q' to cancel): ",
        parse_longitude,
    )?
    else {
        return Ok(None);
    };

    Ok(Some(Coordinates {
        latitude,
        longitude,
    }))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;

    use super::*;
    use crate::http::fake::FakeFetcher;

    const GEO: &str = "https://geo.test/json/";

    fn console(input: &str) -> Console<Cursor<String>, Vec<u8>> {
        Console::new(Cursor::new(input.to_owned()), Vec::new())
    }

    #[test]
    fn latitude_range_is_enforced() {
        assert!(matches!(
            parse_latitude("91"),
            Err(LocationError::OutOfRange { axis: "latitude", .. })
        ));
        assert_eq!(parse_latitude("57.69466").unwrap(), 57.69466);
        assert_eq!(parse_latitude("-90").unwrap(), -90.0);
        assert!(matches!(parse_latitude("north"), Err(LocationError::NotANumber(_))));
    }

    #[test]
    fn longitude_range_is_enforced() {
        assert!(parse_longitude("-181").is_err());
        assert_eq!(parse_longitude("11.97973").unwrap(), 11.97973);
        assert_eq!(parse_longitude(" 180 ").unwrap(), 180.0);
    }

    #[test]
    fn point_path_rounds_to_six_decimals() {
        let at = Coordinates {
            latitude: 57.694661234,
            longitude: 11.97973,
        };

        assert_eq!(at.point_path(), "lon/11.97973/lat/57.694661");
    }

    #[test]
    fn manual_entry_reprompts_until_valid() {
        let mut console = console("91\n57.69466\nabc\n-181\n11.97973\n");

        let at = manual_entry(&mut console).unwrap().unwrap();

        assert_eq!(
            at,
            Coordinates {
                latitude: 57.69466,
                longitude: 11.97973
            }
        );
        let output = String::from_utf8(console.into_output()).unwrap();
        assert_eq!(output.matches("Invalid input").count(), 3);
    }

    #[test]
    fn manual_entry_can_be_cancelled() {
        let mut console = console("57.7\nq\n");

        assert!(manual_entry(&mut console).unwrap().is_none());
    }

    #[tokio::test]
    async fn ip_lookup_returns_coordinates() {
        let fetcher = FakeFetcher::new().with_json(
            GEO,
            json!({ "ip": "192.0.2.1", "latitude": 57.7072, "longitude": 11.9668 }),
        );

        let at = locate_by_ip(&fetcher, GEO).await.unwrap();

        assert_eq!(at.latitude, 57.7072);
        assert_eq!(at.longitude, 11.9668);
    }

    #[tokio::test]
    async fn zero_zero_is_undeterminable() {
        let fetcher =
            FakeFetcher::new().with_json(GEO, json!({ "latitude": 0.0, "longitude": 0.0 }));

        assert!(matches!(
            locate_by_ip(&fetcher, GEO).await,
            Err(LocationError::Undeterminable)
        ));
    }

    #[tokio::test]
    async fn resolve_uses_confirmed_automatic_location() {
        let fetcher = FakeFetcher::new()
            .with_json(GEO, json!({ "latitude": 59.3293, "longitude": 18.0686 }));
        let mut console = console("y\ny\n");

        let at = resolve(&fetcher, GEO, &mut console).await.unwrap().unwrap();

        assert_eq!(at.latitude, 59.3293);
    }

    #[tokio::test]
    async fn resolve_falls_back_to_manual_when_lookup_fails() {
        let fetcher = FakeFetcher::new().with_status(GEO, 429);
        let mut console = console("y\n57.69466\n11.97973\n");

        let at = resolve(&fetcher, GEO, &mut console).await.unwrap().unwrap();

        assert_eq!(at.longitude, 11.97973);
        let output = String::from_utf8(console.into_output()).unwrap();
        assert!(output.contains("Could not determine your location"));
    }

    #[tokio::test]
    async fn declining_detected_location_goes_manual() {
        let fetcher = FakeFetcher::new()
            .with_json(GEO, json!({ "latitude": 59.3293, "longitude": 18.0686 }));
        let mut console = console("y\nn\n60\n15\n");

        let at = resolve(&fetcher, GEO, &mut console).await.unwrap().unwrap();

        assert_eq!(
            at,
            Coordinates {
                latitude: 60.0,
                longitude: 15.0
            }
        );
    }
}
