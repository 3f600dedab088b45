use std::{io, path::PathBuf};

use clap::Parser;
use tracing::Level;

use smhi_weather::{
    app::{self, App},
    config::AppConfig,
    console::Console,
    favorites::FavoritesStore,
    http::HttpFetcher,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level, overrides the configuration file.
    #[arg(short, long)]
    level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;

    app::init_tracing(match args.level.as_deref() {
        Some(level) => level.parse::<Level>().unwrap_or(Level::WARN),
        None => config.log_level(),
    });

    let fetcher = HttpFetcher::new()?;
    let favorites = FavoritesStore::load(config.favorites());
    let mut app = App::new(&config, fetcher, favorites);

    let mut console = Console::new(io::stdin().lock(), io::stdout());
    app.run(&mut console).await?;

    Ok(())
}
