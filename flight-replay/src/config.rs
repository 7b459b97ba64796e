use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use flight_state_engine::FlightConfig;
use log::info;

pub fn load_flight_config(path: Option<&Path>) -> Result<FlightConfig> {
    let Some(path) = path else {
        info!("No flight config given, using defaults");
        return Ok(FlightConfig::default());
    };

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("failed to read flight config {}", path.display()))?;
    parse_flight_config(&config_str)
        .with_context(|| format!("invalid flight config {}", path.display()))
}

/// Keys left out of the toml keep their defaults.
pub fn parse_flight_config(config_str: &str) -> Result<FlightConfig> {
    let config = toml::from_str(config_str)?;
    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = parse_flight_config(
            r#"
            liftoff_acceleration_threshold = 45.0
            landing_time_threshold_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.liftoff_acceleration_threshold, 45.0);
        assert_eq!(config.landing_time_threshold_ms, 500);
        assert_eq!(config.liftoff_time_threshold_ms, 250);
        assert_eq!(config.record_header(), flight_state_engine::STORAGE_RECORD_HEADER);
    }

    #[test]
    fn custom_header_and_bad_types() {
        let config = parse_flight_config(r#"record_header = "t,phase""#).unwrap();
        assert_eq!(config.record_header(), "t,phase");

        assert!(parse_flight_config("gps_timeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_flight_config(Some(Path::new("/nonexistent/flight.toml"))).is_err());
        assert_eq!(load_flight_config(None).unwrap(), FlightConfig::default());
    }
}
