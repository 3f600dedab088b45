//! Terminal client for the SMHI open-data services: station observations,
//! point forecasts and gridded analyses.

pub mod analysis;
pub mod app;
pub mod catalog;
pub mod config;
pub mod console;
pub mod favorites;
pub mod forecast;
pub mod http;
pub mod location;
pub mod observation;
pub mod series;
mod utils;
