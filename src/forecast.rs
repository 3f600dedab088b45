use crate::{
    catalog::Parameter,
    http::{get_json, Fetch, FetchError},
    location::Coordinates,
    series::{self, PointSeries, SeriesPoint},
};

const CATEGORY: &str = "pmp3g";
const VERSION: u32 = 2;

/// Timesteps shown when the configuration does not say otherwise.
pub const DEFAULT_STEPS: usize = 24;

pub struct ForecastService<F> {
    fetcher: F,
    base_url: String,
}

impl<F: Fetch> ForecastService<F> {
    pub fn new(fetcher: F, base_url: &str) -> Self {
        ForecastService {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn point_url(&self, at: Coordinates) -> String {
        format!(
            "{}/category/{}/version/{}/geotype/point/{}/data.json",
            self.base_url,
            CATEGORY,
            VERSION,
            at.point_path()
        )
    }

    pub async fn get_forecast(&self, at: Coordinates) -> Result<PointSeries, FetchError> {
        get_json(&self.fetcher, &self.point_url(at)).await
    }
}

/// `parameter` over the first `steps` timesteps of a forecast.
pub fn forecast_points(
    series: &PointSeries,
    parameter: &Parameter,
    steps: usize,
) -> Vec<SeriesPoint> {
    series::extract(series, parameter, Some(steps))
}
