use heapless::String;
use serde::{Deserialize, Serialize};

pub const RECORD_HEADER_CAPACITY: usize = 512;

pub const STORAGE_RECORD_HEADER: &str = "time_ms,lat,lon,sats,speed,heading,gps_alt,\
ori_w,ori_x,ori_y,ori_z,gyro_x,gyro_y,gyro_z,acc_x,acc_y,acc_z,\
highg_x,highg_y,highg_z,pressure,altitude,temp1,temp2,temp3,temp4,\
live0,live1,live2,live3,live4";

pub const SERIAL_RECORD_HEADER: &str = "time_ms,lat,lon,sats,speed,heading,gps_alt,\
imu_gyro_x,imu_gyro_y,imu_gyro_z,\
ori_w,ori_x,ori_y,ori_z,gyro_x,gyro_y,gyro_z,acc_x,acc_y,acc_z,\
highg_x,highg_y,highg_z,pressure,altitude,temp1,temp2,temp3,temp4,\
live0,live1,live2,live3,live4";

/// Tuning parameters, fixed for the lifetime of an engine.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FlightConfig {
    /// m/s^2 on the vertical axis
    pub liftoff_acceleration_threshold: f32,
    pub liftoff_time_threshold_ms: u32,
    /// 0 declares landing on the first qualifying cycle
    pub landing_time_threshold_ms: u32,
    /// m above the calibration offset
    pub landing_altitude_margin_m: f32,
    /// high-g vertical acceleration band read as "at rest", [min, max)
    pub landing_rest_band_min: f32,
    pub landing_rest_band_max: f32,
    pub apogee_noise_margin_m: f32,
    /// apogee needs strictly more descending pairs than this
    pub apogee_min_descending_pairs: usize,
    /// max - min of a full altitude history for the ground reference to count as stable
    pub calibration_stability_margin_m: f32,
    pub gps_timeout_ms: u32,
    pub record_header: String<RECORD_HEADER_CAPACITY>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            liftoff_acceleration_threshold: 30.0,
            liftoff_time_threshold_ms: 250,
            landing_time_threshold_ms: 0,
            landing_altitude_margin_m: 10.0,
            landing_rest_band_min: 0.0,
            landing_rest_band_max: 2.0,
            apogee_noise_margin_m: 0.5,
            apogee_min_descending_pairs: 7,
            calibration_stability_margin_m: 1.0,
            gps_timeout_ms: 150,
            record_header: String::try_from(STORAGE_RECORD_HEADER).unwrap_or_default(),
        }
    }
}

impl FlightConfig {
    /// Replaces the record header. A header longer than
    /// [`RECORD_HEADER_CAPACITY`] is rejected and the current one kept.
    pub fn with_record_header(mut self, header: &str) -> Self {
        match String::try_from(header) {
            Ok(header) => self.record_header = header,
            Err(_) => log_warn!(
                "record header of {} bytes exceeds capacity, keeping current header",
                header.len()
            ),
        }
        self
    }

    pub fn record_header(&self) -> &str {
        self.record_header.as_str()
    }
}
