#[cfg(feature = "log")]
use log::LevelFilter;

pub fn init_logger() {
    #[cfg(feature = "log")]
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .filter(Some("flight_state_engine"), LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// Inverse of the ISA troposphere model, good enough to script barometer readings.
pub fn pressure_at_altitude(altitude_m: f32) -> f32 {
    101_325.0 * (1.0 - 2.25577e-5 * altitude_m).powf(5.25588)
}
