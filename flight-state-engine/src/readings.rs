use icao_isa::calculate_isa_altitude;
use icao_units::si::Pascals;
use serde::{Deserialize, Serialize};

/// 6 DoF accelerometer / gyroscope (LSM6DSO32 class).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuReading {
    /// m/s^2
    pub acc: [f32; 3],
    /// rad/s
    pub gyro: [f32; 3],
    /// C
    pub temperature: f32,
}

/// High-g accelerometer (ADXL375 class).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct HighGReading {
    /// m/s^2
    pub acc: [f32; 3],
    /// C
    pub temperature: f32,
}

/// Absolute orientation sensor (BNO055 class).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationReading {
    /// w, x, y, z
    pub quaternion: [f32; 4],
    /// rad/s
    pub gyro: [f32; 3],
    /// m/s^2
    pub acc: [f32; 3],
    /// uT
    pub mag: [f32; 3],
    /// C
    pub temperature: f32,
}

/// Pressures a working barometer can report, roughly 48 km up to a deep
/// low-altitude high.
const PLAUSIBLE_PRESSURE_PA: core::ops::RangeInclusive<f32> = 100.0..=120_000.0;

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct BaroReading {
    /// C
    pub temperature: f32,
    /// Pa
    pub pressure: f32,
}

impl BaroReading {
    /// Altitude above the 1013.25 hPa reference, standard atmosphere.
    pub fn altitude(&self) -> f32 {
        calculate_isa_altitude(Pascals(self.pressure as f64)).0 as f32
    }

    /// Altitude, or `None` when the pressure is outside what the sensor can
    /// physically report (including NaN and infinities).
    pub fn checked_altitude(&self) -> Option<f32> {
        if !PLAUSIBLE_PRESSURE_PA.contains(&self.pressure) {
            return None;
        }
        let altitude = self.altitude();
        altitude.is_finite().then_some(altitude)
    }
}

/// Barometer block of the telemetry snapshot, altitude already derived.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct BaroData {
    /// Pa
    pub pressure: f32,
    /// C
    pub temperature: f32,
    /// m, raw before liftoff, relative to the calibration offset after
    pub altitude: f32,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub satellites: u8,
    /// knots
    pub speed: f32,
    /// degrees from true north
    pub heading: f32,
    /// m above mean sea level
    pub altitude: f32,
}
