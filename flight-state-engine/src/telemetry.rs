use serde::{Deserialize, Serialize};

use crate::readings::{BaroData, HighGReading, ImuReading, OrientationReading};

/// Sensors tracked in the liveness vector. The discriminant is the column
/// position in output records.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SensorKind {
    PrimaryImu = 0,
    Barometer = 1,
    HighG = 2,
    Orientation = 3,
    Gps = 4,
}

impl SensorKind {
    pub const COUNT: usize = 5;

    pub const ALL: [SensorKind; Self::COUNT] = [
        SensorKind::PrimaryImu,
        SensorKind::Barometer,
        SensorKind::HighG,
        SensorKind::Orientation,
        SensorKind::Gps,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SensorKind::PrimaryImu => "primary imu",
            SensorKind::Barometer => "barometer",
            SensorKind::HighG => "high-g accelerometer",
            SensorKind::Orientation => "orientation sensor",
            SensorKind::Gps => "gps",
        }
    }
}

/// Whether the last read of each sensor succeeded.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorLiveness([bool; SensorKind::COUNT]);

impl SensorLiveness {
    pub const fn all_live() -> Self {
        Self([true; SensorKind::COUNT])
    }

    pub const fn is_live(&self, sensor: SensorKind) -> bool {
        self.0[sensor.index()]
    }

    pub fn set(&mut self, sensor: SensorKind, live: bool) {
        self.0[sensor.index()] = live;
    }

    /// 1 for live, 0 for failed, in record column order.
    pub fn flags(&self) -> [u8; SensorKind::COUNT] {
        self.0.map(u8::from)
    }
}

/// Latest reading of every sensor. Starts zeroed with every sensor marked
/// failed until its first successful read.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub primary_imu: ImuReading,
    pub high_g: HighGReading,
    pub orientation: OrientationReading,
    pub barometer: BaroData,
    pub liveness: SensorLiveness,
}

impl TelemetrySnapshot {
    pub fn is_live(&self, sensor: SensorKind) -> bool {
        self.liveness.is_live(sensor)
    }

    /// Temperatures in record column order: primary imu, high-g,
    /// orientation sensor, barometer.
    pub fn temperatures(&self) -> [f32; 4] {
        [
            self.primary_imu.temperature,
            self.high_g.temperature,
            self.orientation.temperature,
            self.barometer.temperature,
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn liveness_flags_follow_sensor_index() {
        let mut liveness = SensorLiveness::default();
        assert_eq!(liveness.flags(), [0, 0, 0, 0, 0]);

        liveness.set(SensorKind::Barometer, true);
        liveness.set(SensorKind::Gps, true);
        assert_eq!(liveness.flags(), [0, 1, 0, 0, 1]);
        assert!(liveness.is_live(SensorKind::Barometer));
        assert!(!liveness.is_live(SensorKind::PrimaryImu));

        liveness.set(SensorKind::Gps, false);
        assert_eq!(liveness.flags(), [0, 1, 0, 0, 0]);
    }

    #[test]
    fn sensor_index_matches_all_order() {
        for (i, sensor) in SensorKind::ALL.iter().enumerate() {
            assert_eq!(sensor.index(), i);
        }
    }
}
