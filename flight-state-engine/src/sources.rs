//! Fallback chains for the transition predicates.
//!
//! Each predicate walks an ordered list of sources and uses the first one
//! whose sensors are live. An exhausted chain means the predicate has nothing
//! to go on and must not transition.

use crate::{
    config::FlightConfig,
    telemetry::{SensorKind, TelemetrySnapshot},
};

/// First source in `chain` that can supply a value.
pub fn first_available<S: Copy, T>(
    chain: &[S],
    mut supply: impl FnMut(S) -> Option<T>,
) -> Option<(S, T)> {
    chain
        .iter()
        .find_map(|source| supply(*source).map(|value| (*source, value)))
}

/// Where liftoff detection reads vertical acceleration from.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccelerationSource {
    PrimaryImu,
    HighG,
}

impl AccelerationSource {
    pub const LIFTOFF_CHAIN: [AccelerationSource; 2] =
        [AccelerationSource::PrimaryImu, AccelerationSource::HighG];

    pub const fn sensor(self) -> SensorKind {
        match self {
            AccelerationSource::PrimaryImu => SensorKind::PrimaryImu,
            AccelerationSource::HighG => SensorKind::HighG,
        }
    }

    /// m/s^2 on the vertical axis, `None` when the sensor is down.
    pub fn vertical_acceleration(self, snapshot: &TelemetrySnapshot) -> Option<f32> {
        if !snapshot.is_live(self.sensor()) {
            return None;
        }
        Some(match self {
            AccelerationSource::PrimaryImu => snapshot.primary_imu.acc[2],
            AccelerationSource::HighG => snapshot.high_g.acc[2],
        })
    }
}

/// Evidence used by landing detection.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LandingSource {
    /// High-g vertical acceleration inside the rest band. Gated on the primary
    /// IMU as well as the high-g sensor itself.
    HighGAtRest,
    /// Altitude within the landing margin above the calibration offset.
    BarometricAltitude,
}

impl LandingSource {
    pub const LANDING_CHAIN: [LandingSource; 2] =
        [LandingSource::HighGAtRest, LandingSource::BarometricAltitude];

    /// Whether the vehicle looks landed according to this source, `None` when
    /// its sensors are down.
    pub fn observe(self, snapshot: &TelemetrySnapshot, config: &FlightConfig) -> Option<bool> {
        match self {
            LandingSource::HighGAtRest => {
                if !snapshot.is_live(SensorKind::PrimaryImu) || !snapshot.is_live(SensorKind::HighG)
                {
                    return None;
                }
                let acc_z = snapshot.high_g.acc[2];
                Some(acc_z >= config.landing_rest_band_min && acc_z < config.landing_rest_band_max)
            }
            LandingSource::BarometricAltitude => {
                if !snapshot.is_live(SensorKind::Barometer) {
                    return None;
                }
                // barometer altitude is already relative to the offset once airborne
                Some(snapshot.barometer.altitude <= config.landing_altitude_margin_m)
            }
        }
    }
}
