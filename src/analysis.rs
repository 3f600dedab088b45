use crate::{
    catalog::Parameter,
    http::{get_json, Fetch, FetchError},
    location::Coordinates,
    series::{self, PointSeries, SeriesPoint},
};

const CATEGORY: &str = "mesan1g";
const VERSION: u32 = 1;

/// Gridded analysis for a point. Only the coordinates are sent; the
/// parameter choice is applied to the response.
pub struct AnalysisService<F> {
    fetcher: F,
    base_url: String,
}

impl<F: Fetch> AnalysisService<F> {
    pub fn new(fetcher: F, base_url: &str) -> Self {
        AnalysisService {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub async fn get_analysis(&self, at: Coordinates) -> Result<PointSeries, FetchError> {
        let url = format!(
            "{}/category/{}/version/{}/geotype/point/{}/data.json",
            self.base_url,
            CATEGORY,
            VERSION,
            at.point_path()
        );
        get_json(&self.fetcher, &url).await
    }
}

pub fn format_analysis(series: &PointSeries, parameter: &Parameter) -> Vec<SeriesPoint> {
    series::extract(series, parameter, None)
}
