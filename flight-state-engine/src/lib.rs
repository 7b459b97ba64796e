// only use std when feature = "std" is enabled or during testing
#![cfg_attr(not(any(test, feature = "std")), no_std)]

mod fmt;

pub mod altitude_history;
pub mod config;
mod engine;
pub mod gps;
pub mod phase;
pub mod readings;
pub mod record;
pub mod sensor;
pub mod sources;
pub mod telemetry;
pub mod time;

pub use altitude_history::{ALTITUDE_HISTORY_LEN, AltitudeHistory};
pub use config::{FlightConfig, SERIAL_RECORD_HEADER, STORAGE_RECORD_HEADER};
pub use engine::FlightStateEngine;
pub use phase::{FlightPhase, PhaseTransition};
pub use readings::{BaroData, BaroReading, GpsFix, HighGReading, ImuReading, OrientationReading};
pub use record::{NO_FIX_SENTINEL, RecordFormatter, RecordLayout, TelemetryFrame};
pub use sensor::{GpsReceiver, Sensor, SensorFailure};
pub use telemetry::{SensorKind, SensorLiveness, TelemetrySnapshot};
pub use time::Clock;

#[cfg(test)]
mod tests;
