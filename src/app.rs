use std::io::{self, BufRead, Write};

use chrono::{DateTime, Local, TimeZone, Utc};
use prettytable::{
    format::{self},
    row, Table,
};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::{
    analysis::{format_analysis, AnalysisService},
    catalog::{
        self, Parameter, ANALYSIS_PARAMETERS, FORECAST_PARAMETERS, OBSERVATION_PARAMETERS,
    },
    config::AppConfig,
    console::Console,
    favorites::{FavoritesStore, Toggle},
    forecast::{forecast_points, ForecastService},
    http::Fetch,
    location::{self, Coordinates},
    observation::{format_observation, ObservationService, Period, Station},
    series::SeriesPoint,
    utils::Spinner,
};

const SERVICES: &[(&str, &str, &str)] = &[
    ("1", "Observations", "Latest measured value at a station"),
    ("2", "Point forecast", "Forecast time series for a location"),
    ("3", "Analysis", "Gridded analysis time series for a location"),
];

/// How a service run ended; only a completed run asks about returning to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServiceOutcome {
    Completed,
    Cancelled,
}

pub struct App<F> {
    fetcher: F,
    observations: ObservationService<F>,
    forecasts: ForecastService<F>,
    analyses: AnalysisService<F>,
    geolocation_url: String,
    forecast_steps: usize,
    favorites: FavoritesStore,
}

impl<F: Fetch + Clone> App<F> {
    pub fn new(config: &AppConfig, fetcher: F, favorites: FavoritesStore) -> Self {
        let endpoints = config.endpoints();

        App {
            observations: ObservationService::new(fetcher.clone(), endpoints.observations()),
            forecasts: ForecastService::new(fetcher.clone(), endpoints.forecast()),
            analyses: AnalysisService::new(fetcher.clone(), endpoints.analysis()),
            fetcher,
            geolocation_url: endpoints.geolocation().clone(),
            forecast_steps: config.forecast_steps(),
            favorites,
        }
    }

    /// Runs the main menu until the user quits or input ends.
    pub async fn run<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> io::Result<()> {
        match self.main_menu(console).await {
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {}
            other => other?,
        }

        console.say("\nThank you for using Sweden Weather Terminal UI!")
    }

    async fn main_menu<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> io::Result<()> {
        console.say("Welcome to Sweden Weather Terminal UI")?;

        loop {
            console.table(&services_table())?;

            let choice = console.ask("Select a service (1-3) or 'q' to quit: ")?;
            let outcome = match choice.to_lowercase().as_str() {
                "q" => return Ok(()),
                "1" => self.observation_service(console).await?,
                "2" => self.forecast_service(console).await?,
                "3" => self.analysis_service(console).await?,
                _ => {
                    console.say("Invalid choice. Please try again.")?;
                    continue;
                }
            };

            if outcome == ServiceOutcome::Completed && !return_to_menu(console)? {
                return Ok(());
            }
        }
    }

    async fn observation_service<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> io::Result<ServiceOutcome> {
        loop {
            let Some(parameter) =
                choose_parameter(console, OBSERVATION_PARAMETERS, "Available Weather Parameters")?
            else {
                return Ok(ServiceOutcome::Cancelled);
            };

            let stations = {
                let _spinner = Spinner::start("Fetching stations...");
                self.observations.list_stations(parameter.id).await
            };
            if stations.is_empty() {
                console.say("No stations available for this parameter.")?;
                continue;
            }

            let Some(station) = self.choose_station(console, parameter, &stations).await? else {
                continue;
            };

            let latest = {
                let _spinner = Spinner::start("Fetching weather data...");
                self.observations
                    .latest_observation(parameter.id, station.key())
                    .await
            };

            match latest {
                Some(observation) => {
                    console.say("\nLatest Weather Data")?;
                    console.say(format!("Station: {}", station.name()))?;
                    console.say(format!("Period: {}", observation.period))?;
                    console.say(format!(
                        "Measurement: {}",
                        format_observation(&observation.value, parameter)
                    ))?;
                }
                None => console.say("No weather data available for this station.")?,
            }

            return Ok(ServiceOutcome::Completed);
        }
    }

    async fn choose_station<'a, R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
        parameter: &Parameter,
        stations: &'a [Station],
    ) -> io::Result<Option<&'a Station>> {
        self.show_stations(console, stations)?;

        loop {
            let input = console.ask(
                "\nEnter station ID (or 'f' to favorite/unfavorite, \
                 'p' to list periods, 'q' to go back): ",
            )?;

            match input.to_lowercase().as_str() {
                "q" => return Ok(None),
                "f" => {
                    let id = console.ask("Enter station ID to toggle favorite status: ")?;
                    let Some(station) = find_station(stations, &id) else {
                        console.say("Invalid station ID.")?;
                        continue;
                    };

                    match self.favorites.toggle(station.key(), station.name()) {
                        Toggle::Added => {
                            console.say(format!("Added {} to favorites", station.name()))?
                        }
                        Toggle::Removed => {
                            console.say(format!("Removed {} from favorites", station.name()))?
                        }
                    }
                    self.show_stations(console, stations)?;
                }
                "p" => {
                    let id = console.ask("Enter station ID to list periods: ")?;
                    let Some(station) = find_station(stations, &id) else {
                        console.say("Invalid station ID.")?;
                        continue;
                    };

                    let periods = {
                        let _spinner = Spinner::start("Fetching periods...");
                        self.observations.list_periods(parameter.id, station.key()).await
                    };
                    if periods.is_empty() {
                        console.say(format!(
                            "No data periods available for station {} with this parameter.",
                            station.key()
                        ))?;
                    } else {
                        console.table(&periods_table(&periods))?;
                    }
                }
                _ => match find_station(stations, &input) {
                    Some(station) => return Ok(Some(station)),
                    None => console.say("Invalid station ID. Please try again.")?,
                },
            }
        }
    }

    fn show_stations<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        stations: &[Station],
    ) -> io::Result<()> {
        console.say("Available Weather Stations")?;
        console.table(&stations_table(stations, &self.favorites))?;

        if !self.favorites.is_empty() {
            console.say("Favorite Stations:")?;
            for (id, name) in self.favorites.iter() {
                console.say(format!("★ {}: {}", id, name))?;
            }
        }

        Ok(())
    }

    async fn forecast_service<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> io::Result<ServiceOutcome> {
        let Some(at) = location::resolve(&self.fetcher, &self.geolocation_url, console).await?
        else {
            return Ok(ServiceOutcome::Cancelled);
        };
        let Some(parameter) =
            choose_parameter(console, FORECAST_PARAMETERS, "Forecast Parameters")?
        else {
            return Ok(ServiceOutcome::Cancelled);
        };

        let forecast = {
            let _spinner = Spinner::start("Fetching forecast...");
            self.forecasts.get_forecast(at).await
        };

        match forecast {
            Ok(series) => {
                let points = forecast_points(&series, parameter, self.forecast_steps);
                show_series(console, "forecast", at, parameter, &points, series.approved_time)?
            }
            Err(e) => {
                warn!("error fetching forecast: {}", e);
                console.say(format!("Could not fetch forecast for {}.", at))?
            }
        }

        Ok(ServiceOutcome::Completed)
    }

    async fn analysis_service<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> io::Result<ServiceOutcome> {
        let Some(at) = location::resolve(&self.fetcher, &self.geolocation_url, console).await?
        else {
            return Ok(ServiceOutcome::Cancelled);
        };
        let Some(parameter) =
            choose_parameter(console, ANALYSIS_PARAMETERS, "Analysis Parameters")?
        else {
            return Ok(ServiceOutcome::Cancelled);
        };

        let analysis = {
            let _spinner = Spinner::start("Fetching analysis...");
            self.analyses.get_analysis(at).await
        };

        match analysis {
            Ok(series) => {
                let points = format_analysis(&series, parameter);
                show_series(console, "analysis", at, parameter, &points, series.approved_time)?
            }
            Err(e) => {
                warn!("error fetching analysis: {}", e);
                console.say(format!("Could not fetch analysis for {}.", at))?
            }
        }

        Ok(ServiceOutcome::Completed)
    }
}

/// `y` goes back to the menu, `n` or `q` ends the program; anything else asks again.
fn return_to_menu<R: BufRead, W: Write>(console: &mut Console<R, W>) -> io::Result<bool> {
    loop {
        match console.ask("\nReturn to main menu? (y/n): ")?.to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" | "q" => return Ok(false),
            _ => console.say("Please answer 'y' or 'n'.")?,
        }
    }
}

fn choose_parameter<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    parameters: &'static [Parameter],
    title: &str,
) -> io::Result<Option<&'static Parameter>> {
    let prompt = format!(
        "\nSelect a parameter (1-{}) or 'q' to go back: ",
        parameters.len()
    );

    loop {
        console.say(title)?;
        console.table(&parameters_table(parameters))?;

        let choice = console.ask(&prompt)?;
        if choice.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        if let Some(parameter) = catalog::find(parameters, &choice) {
            return Ok(Some(parameter));
        }
        console.say("Invalid choice. Please try again.")?;
    }
}

fn find_station<'a>(stations: &'a [Station], id: &str) -> Option<&'a Station> {
    stations.iter().find(|s| s.key() == id)
}

fn show_series<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    kind: &str,
    at: Coordinates,
    parameter: &Parameter,
    points: &[SeriesPoint],
    approved: Option<DateTime<Utc>>,
) -> io::Result<()> {
    if points.is_empty() {
        return console.say(format!(
            "No {} values in the {} for {}.",
            parameter.description, kind, at
        ));
    }

    console.say(format!("\n{} {} for {}", parameter.description, kind, at))?;
    if let Some(approved) = approved {
        console.say(format!("Approved: {}", local_time(approved)))?;
    }
    console.table(&series_table(points))
}

fn local_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn local_date(epoch_ms: Option<i64>) -> String {
    epoch_ms
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|time| time.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table
}

fn services_table() -> Table {
    let mut table = new_table();
    table.set_titles(row!["Option", "Service", "Description"]);

    for (key, name, description) in SERVICES {
        table.add_row(row![r->key, name, description]);
    }

    table
}

fn parameters_table(parameters: &[Parameter]) -> Table {
    let gridded = parameters.iter().any(|p| p.level.is_some());

    let mut table = new_table();
    if gridded {
        table.set_titles(row!["Option", "Parameter", "Description", "Unit", "Level"]);
    } else {
        table.set_titles(row!["Option", "Parameter", "Description", "Unit"]);
    }

    for parameter in parameters {
        if gridded {
            table.add_row(row![
                r->parameter.key,
                parameter.name,
                parameter.description,
                parameter.unit,
                parameter.level_label()
            ]);
        } else {
            table.add_row(row![
                r->parameter.key,
                parameter.name,
                parameter.description,
                parameter.unit
            ]);
        }
    }

    table
}

fn stations_table(stations: &[Station], favorites: &FavoritesStore) -> Table {
    let mut table = new_table();
    table.set_titles(row!["ID", "Name", "Active", "Height (m)", "Favorite"]);

    for station in stations {
        table.add_row(row![
            r->station.key(),
            station.name(),
            if station.active() { "Yes" } else { "No" },
            r->format!("{:.1}", station.height()),
            c->if favorites.contains(station.key()) { "★" } else { "" }
        ]);
    }

    table
}

fn periods_table(periods: &[Period]) -> Table {
    let mut table = new_table();
    table.set_titles(row!["Period", "From", "To", "Summary"]);

    for period in periods {
        table.add_row(row![
            period.key(),
            local_date(period.from()),
            local_date(period.to()),
            period.summary().as_deref().unwrap_or("")
        ]);
    }

    table
}

fn series_table(points: &[SeriesPoint]) -> Table {
    let mut table = new_table();
    table.set_titles(row!["Time", "Value"]);

    for point in points {
        table.add_row(row![
            local_time(point.valid_time),
            r->catalog::format_value(point.value, point.unit)
        ]);
    }

    table
}

pub fn init_tracing(level: Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install tracing subscriber: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use serde_json::json;
    use tempfile::tempdir;

    use super::*;
    use crate::{http::fake::FakeFetcher, series::sample};

    const OBS: &str = "https://metobs.test/api/version/latest";
    const FCST: &str = "https://metfcst.test/api";
    const ANALYS: &str = "https://metanalys.test/api";
    const GEO: &str = "https://geo.test/json/";

    fn config() -> AppConfig {
        toml::from_str(&format!(
            r#"
forecast_steps = 2

[endpoints]
observations = "{OBS}"
forecast = "{FCST}"
analysis = "{ANALYS}"
geolocation = "{GEO}"
"#
        ))
        .unwrap()
    }

    async fn run(fetcher: FakeFetcher, favorites: FavoritesStore, input: &str) -> String {
        let mut app = App::new(&config(), fetcher, favorites);
        let mut console = Console::new(Cursor::new(input.to_owned()), Vec::new());

        app.run(&mut console).await.unwrap();

        String::from_utf8(console.into_output()).unwrap()
    }

    fn observation_fetcher() -> FakeFetcher {
        FakeFetcher::new()
            .with_json(
                &format!("{OBS}/parameter/2.json"),
                json!({ "station": [
                    { "key": "71420", "name": "Göteborg A", "active": true, "height": 3.0 },
                    {
                        "key": "98210",
                        "name": "Stockholm-Observatoriekullen A",
                        "active": true,
                        "height": 43.1
                    }
                ]}),
            )
            .with_json(
                &format!("{OBS}/parameter/2/station/71420/period/latest-hour/data.json"),
                json!({ "value": [
                    { "date": 1_700_000_000_000i64, "value": "4.26", "quality": "G" }
                ]}),
            )
            .with_json(
                &format!("{OBS}/parameter/2/station/71420.json"),
                json!({ "period": [{ "key": "latest-day" }, { "key": "latest-months" }] }),
            )
    }

    #[tokio::test]
    async fn observation_flow_shows_latest_value_and_persists_favorite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.json");

        let output = run(
            observation_fetcher(),
            FavoritesStore::load(&path),
            "1\n1\nf\n71420\np\n71420\n71420\nn\n",
        )
        .await;

        assert!(output.contains("Added Göteborg A to favorites"));
        assert!(output.contains("★ 71420: Göteborg A"));
        assert!(output.contains("latest-months"));
        assert!(output.contains("Station: Göteborg A"));
        assert!(output.contains("Period: latest-hour"));
        assert!(output.contains(": 4.3 °C"));
        assert!(output.ends_with("Thank you for using Sweden Weather Terminal UI!\n"));
        assert!(FavoritesStore::load(&path).contains("71420"));
    }

    #[tokio::test]
    async fn missing_data_is_reported_not_fatal() {
        let dir = tempdir().unwrap();

        let output = run(
            observation_fetcher(),
            FavoritesStore::load(dir.path().join("favorites.json")),
            "1\n1\n12345\n98210\ny\nq\n",
        )
        .await;

        assert!(output.contains("Invalid station ID. Please try again."));
        assert!(output.contains("No weather data available for this station."));
        assert!(output.contains("Select a service"));
    }

    #[tokio::test]
    async fn forecast_flow_prints_configured_number_of_steps() {
        let dir = tempdir().unwrap();
        let fetcher = FakeFetcher::new().with_json(
            &format!(
                "{FCST}/category/pmp3g/version/2/geotype/point/lon/11.97973/lat/57.69466/data.json"
            ),
            sample::series(&[&[("t", 7.44)], &[("t", 6.91)], &[("t", 6.0)]]),
        );

        let output = run(
            fetcher,
            FavoritesStore::load(dir.path().join("favorites.json")),
            "2\nn\n57.69466\n11.97973\n1\nn\n",
        )
        .await;

        assert!(output.contains("Air temperature forecast for 57.69466, 11.97973"));
        assert!(output.contains("7.4 °C"));
        assert!(output.contains("6.9 °C"));
        assert!(!output.contains("6.0 °C"));
    }

    #[tokio::test]
    async fn analysis_failure_is_reported() {
        let dir = tempdir().unwrap();
        let fetcher = FakeFetcher::new()
            .with_json(GEO, json!({ "latitude": 59.3293, "longitude": 18.0686 }));

        let output = run(
            fetcher,
            FavoritesStore::load(dir.path().join("favorites.json")),
            "3\ny\ny\n4\nn\n",
        )
        .await;

        assert!(output.contains("Detected location: 59.32930, 18.06860"));
        assert!(output.contains("Could not fetch analysis for 59.32930, 18.06860."));
    }

    #[tokio::test]
    async fn unclear_answer_to_return_prompt_asks_again() {
        let dir = tempdir().unwrap();

        let output = run(
            FakeFetcher::new(),
            FavoritesStore::load(dir.path().join("favorites.json")),
            "3\nn\n57.7\n11.9\n1\nmaybe\nn\n",
        )
        .await;

        assert!(output.contains("Could not fetch analysis for 57.70000, 11.90000."));
        assert_eq!(output.matches("Return to main menu?").count(), 2);
        assert!(output.contains("Please answer 'y' or 'n'."));
    }

    #[tokio::test]
    async fn cancelled_parameter_choice_goes_straight_back_to_services() {
        let dir = tempdir().unwrap();

        let output = run(
            FakeFetcher::new(),
            FavoritesStore::load(dir.path().join("favorites.json")),
            "1\nq\nq\n",
        )
        .await;

        assert_eq!(output.matches("Return to main menu?").count(), 0);
        assert_eq!(output.matches("Select a service").count(), 2);
        assert!(output.ends_with("Thank you for using Sweden Weather Terminal UI!\n"));
    }

    #[tokio::test]
    async fn cancelled_location_entry_goes_straight_back_to_services() {
        let dir = tempdir().unwrap();

        let output = run(
            FakeFetcher::new(),
            FavoritesStore::load(dir.path().join("favorites.json")),
            "2\nn\nq\n3\nn\n57.7\nq\nq\n",
        )
        .await;

        assert_eq!(output.matches("Return to main menu?").count(), 0);
        assert_eq!(output.matches("Select a service").count(), 3);
    }

    #[tokio::test]
    async fn closed_input_ends_the_session() {
        let dir = tempdir().unwrap();

        let output = run(
            FakeFetcher::new(),
            FavoritesStore::load(dir.path().join("favorites.json")),
            "9\n1\n",
        )
        .await;

        assert!(output.contains("Invalid choice. Please try again."));
        assert!(output.ends_with("Thank you for using Sweden Weather Terminal UI!\n"));
    }
}
