//! Fixed parameter tables for the three SMHI services.
//!
//! Menu keys are what the user types; `id` is what the provider expects.

/// Vertical level a gridded parameter refers to. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub kind: &'static str,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub key: &'static str,
    pub id: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub description: &'static str,
    pub level: Option<Level>,
}

impl Parameter {
    const fn observed(
        key: &'static str,
        id: &'static str,
        name: &'static str,
        unit: &'static str,
        description: &'static str,
    ) -> Self {
        Parameter {
            key,
            id,
            name,
            unit,
            description,
            level: None,
        }
    }

    const fn gridded(
        key: &'static str,
        id: &'static str,
        unit: &'static str,
        description: &'static str,
        kind: &'static str,
        height: i32,
    ) -> Self {
        Parameter {
            key,
            id,
            name: id,
            unit,
            description,
            level: Some(Level { kind, height }),
        }
    }

    pub fn level_label(&self) -> String {
        match self.level {
            Some(level) => format!("{} {}", level.kind, level.height),
            None => String::new(),
        }
    }
}

pub const OBSERVATION_PARAMETERS: &[Parameter] = &[
    Parameter::observed(
        "1",
        "2",
        "Lufttemperatur momentanvärde, 1 gång/tim",
        "°C",
        "Temperature",
    ),
    Parameter::observed(
        "2",
        "9",
        "Lufttryck reducerat havsytans nivå",
        "hPa",
        "Air pressure",
    ),
    Parameter::observed(
        "3",
        "6",
        "Relativ Luftfuktighet momentanvärde, 1 gång/tim",
        "%",
        "Relative humidity",
    ),
    Parameter::observed(
        "4",
        "7",
        "Nederbördsmängd summa 1 timme, 1 gång/tim",
        "mm",
        "Precipitation amount",
    ),
    Parameter::observed(
        "5",
        "4",
        "Vindhastighet medelvärde 10 min, 1 gång/tim",
        "m/s",
        "Wind speed",
    ),
];

pub const FORECAST_PARAMETERS: &[Parameter] = &[
    Parameter::gridded("1", "t", "°C", "Air temperature", "hl", 2),
    Parameter::gridded("2", "msl", "hPa", "Air pressure at sea level", "hmsl", 0),
    Parameter::gridded("3", "r", "%", "Relative humidity", "hl", 2),
    Parameter::gridded("4", "ws", "m/s", "Wind speed", "hl", 10),
    Parameter::gridded("5", "gust", "m/s", "Wind gust speed", "hl", 10),
    Parameter::gridded("6", "pmean", "mm/h", "Mean precipitation intensity", "hl", 0),
    Parameter::gridded("7", "tcc_mean", "octas", "Mean total cloud cover", "hl", 0),
];

pub const ANALYSIS_PARAMETERS: &[Parameter] = &[
    Parameter::gridded("1", "t", "°C", "Temperature", "hl", 2),
    Parameter::gridded("2", "gust", "m/s", "Wind gust", "hl", 10),
    Parameter::gridded("3", "r", "%", "Relative humidity", "hl", 2),
    Parameter::gridded("4", "msl", "hPa", "Mean sea level pressure", "hmsl", 0),
    Parameter::gridded("5", "vis", "km", "Visibility", "hl", 2),
    Parameter::gridded("6", "ws", "m/s", "Wind speed", "hl", 10),
    Parameter::gridded("7", "wd", "degree", "Wind direction", "hl", 10),
];

pub fn find<'a>(catalog: &'a [Parameter], key: &str) -> Option<&'a Parameter> {
    catalog.iter().find(|p| p.key == key)
}

/// Number of decimals shown for `unit`, or `None` to show the value as is.
pub fn decimals(unit: &str) -> Option<usize> {
    match unit {
        "°C" | "m/s" | "mm" => Some(1),
        "hPa" => Some(0),
        _ => None,
    }
}

/// Renders a numeric measurement with the precision its unit calls for.
pub fn format_value(value: f64, unit: &str) -> String {
    match decimals(unit) {
        Some(precision) => format!("{:.*} {}", precision, value, unit),
        None => format!("{} {}", value, unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_keys_are_unique_per_catalog() {
        for catalog in [OBSERVATION_PARAMETERS, FORECAST_PARAMETERS, ANALYSIS_PARAMETERS] {
            let mut keys: Vec<_> = catalog.iter().map(|p| p.key).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), catalog.len());
        }
    }

    #[test]
    fn analysis_catalog_has_seven_gridded_parameters() {
        assert_eq!(ANALYSIS_PARAMETERS.len(), 7);
        assert!(ANALYSIS_PARAMETERS.iter().all(|p| p.level.is_some()));
        assert_eq!(find(ANALYSIS_PARAMETERS, "4").map(|p| p.id), Some("msl"));
        assert_eq!(find(ANALYSIS_PARAMETERS, "4").unwrap().level_label(), "hmsl 0");
    }

    #[test]
    fn observation_catalog_maps_to_provider_ids() {
        assert_eq!(find(OBSERVATION_PARAMETERS, "1").map(|p| p.id), Some("2"));
        assert_eq!(find(OBSERVATION_PARAMETERS, "2").map(|p| p.unit), Some("hPa"));
        assert!(find(OBSERVATION_PARAMETERS, "9").is_none());
    }

    #[test]
    fn formats_by_unit() {
        assert_eq!(format_value(21.456, "°C"), "21.5 °C");
        assert_eq!(format_value(1013.7, "hPa"), "1014 hPa");
        assert_eq!(format_value(3.04, "m/s"), "3.0 m/s");
        assert_eq!(format_value(87.0, "%"), "87 %");
    }
}
