use core::fmt::{self, Write};

use serde::{Deserialize, Serialize};

use crate::{
    phase::FlightPhase,
    readings::GpsFix,
    telemetry::{SensorKind, TelemetrySnapshot},
};

/// Written in place of the six GPS columns when there is no fix.
pub const NO_FIX_SENTINEL: &str = "-1,No fix,-1,No fix,0,-1";

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordLayout {
    /// Layout written to persistent storage.
    #[default]
    Storage,
    /// Storage layout with the primary IMU gyro inserted before the quaternion.
    Serial,
}

/// Everything a record is rendered from, copied out of the engine.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub time_ms: u64,
    pub phase: FlightPhase,
    pub snapshot: TelemetrySnapshot,
    pub gps_fix: Option<GpsFix>,
}

impl TelemetryFrame {
    /// The fix to render, only while the GPS is live.
    pub fn gps(&self) -> Option<&GpsFix> {
        self.gps_fix
            .as_ref()
            .filter(|_| self.snapshot.is_live(SensorKind::Gps))
    }
}

pub struct RecordFormatter<'a> {
    header: &'a str,
    layout: RecordLayout,
}

impl<'a> RecordFormatter<'a> {
    pub const fn new(header: &'a str, layout: RecordLayout) -> Self {
        Self { header, layout }
    }

    pub fn write_header<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str(self.header)?;
        out.write_char('\n')
    }

    /// One CSV line terminated by `\n`.
    pub fn write_record<W: Write>(&self, out: &mut W, frame: &TelemetryFrame) -> fmt::Result {
        let snapshot = &frame.snapshot;
        write!(out, "{},", frame.time_ms)?;

        match frame.gps() {
            Some(fix) => write!(
                out,
                "{:.6},{:.6},{},{:.3},{:.3},{:.3},",
                fix.latitude, fix.longitude, fix.satellites, fix.speed, fix.heading, fix.altitude
            )?,
            None => write!(out, "{},", NO_FIX_SENTINEL)?,
        }

        if self.layout == RecordLayout::Serial {
            let [x, y, z] = snapshot.primary_imu.gyro;
            write!(out, "{:.5},{:.5},{:.5},", x, y, z)?;
        }

        let orientation = &snapshot.orientation;
        let [w, x, y, z] = orientation.quaternion;
        write!(out, "{:.5},{:.5},{:.5},{:.5},", w, x, y, z)?;
        let [x, y, z] = orientation.gyro;
        write!(out, "{:.5},{:.5},{:.5},", x, y, z)?;
        let [x, y, z] = orientation.acc;
        write!(out, "{:.4},{:.4},{:.4},", x, y, z)?;

        let [x, y, z] = snapshot.high_g.acc;
        write!(out, "{:.2},{:.2},{:.2},", x, y, z)?;

        write!(
            out,
            "{:.6},{:.4},",
            snapshot.barometer.pressure, snapshot.barometer.altitude
        )?;

        for temperature in snapshot.temperatures() {
            write!(out, "{:.2},", temperature)?;
        }

        for (i, flag) in snapshot.liveness.flags().iter().enumerate() {
            if i > 0 {
                out.write_char(',')?;
            }
            write!(out, "{}", flag)?;
        }
        out.write_char('\n')
    }

    /// Human readable dump of a frame, for bench debugging.
    pub fn write_debug<W: Write>(&self, out: &mut W, frame: &TelemetryFrame) -> fmt::Result {
        let snapshot = &frame.snapshot;
        writeln!(out, "uptime: {} ms", frame.time_ms)?;
        writeln!(out, "phase: {}", frame.phase)?;

        match frame.gps() {
            Some(fix) => {
                writeln!(
                    out,
                    "gps: lat {:.6}, lon {:.6}, sats {}",
                    fix.latitude, fix.longitude, fix.satellites
                )?;
                writeln!(
                    out,
                    "gps: speed {:.3} kn, heading {:.3} deg, alt {:.3} m",
                    fix.speed, fix.heading, fix.altitude
                )?;
            }
            None => writeln!(out, "gps: no fix")?,
        }

        let imu = &snapshot.primary_imu;
        writeln!(
            out,
            "primary imu: acc [{:.4}, {:.4}, {:.4}] m/s^2, gyro [{:.5}, {:.5}, {:.5}] rad/s",
            imu.acc[0], imu.acc[1], imu.acc[2], imu.gyro[0], imu.gyro[1], imu.gyro[2]
        )?;
        let high_g = &snapshot.high_g;
        writeln!(
            out,
            "high-g: acc [{:.2}, {:.2}, {:.2}] m/s^2",
            high_g.acc[0], high_g.acc[1], high_g.acc[2]
        )?;

        let orientation = &snapshot.orientation;
        let q = orientation.quaternion;
        writeln!(
            out,
            "orientation: quat [{:.5}, {:.5}, {:.5}, {:.5}]",
            q[0], q[1], q[2], q[3]
        )?;
        writeln!(
            out,
            "orientation: gyro [{:.5}, {:.5}, {:.5}] rad/s, acc [{:.4}, {:.4}, {:.4}] m/s^2",
            orientation.gyro[0],
            orientation.gyro[1],
            orientation.gyro[2],
            orientation.acc[0],
            orientation.acc[1],
            orientation.acc[2]
        )?;
        writeln!(
            out,
            "orientation: mag [{:.2}, {:.2}, {:.2}] uT",
            orientation.mag[0], orientation.mag[1], orientation.mag[2]
        )?;

        writeln!(
            out,
            "barometer: pressure {:.6} Pa, altitude {:.4} m",
            snapshot.barometer.pressure, snapshot.barometer.altitude
        )?;

        let [imu_t, high_g_t, orientation_t, baro_t] = snapshot.temperatures();
        writeln!(
            out,
            "temperatures: imu {:.2} C, high-g {:.2} C, orientation {:.2} C, barometer {:.2} C",
            imu_t, high_g_t, orientation_t, baro_t
        )?;

        out.write_str("liveness:")?;
        for sensor in SensorKind::ALL {
            write!(
                out,
                " {}={}",
                sensor.as_str(),
                u8::from(snapshot.is_live(sensor))
            )?;
        }
        out.write_char('\n')
    }

    /// Cycle time and the loop rate it implies.
    pub fn write_cycle_rate<W: Write>(&self, out: &mut W, delta_time_ms: u32) -> fmt::Result {
        if delta_time_ms == 0 {
            return writeln!(out, "cycle time: 0 ms, rate: n/a");
        }
        writeln!(
            out,
            "cycle time: {} ms, rate: {:.1} Hz",
            delta_time_ms,
            1000.0 / delta_time_ms as f32
        )
    }
}
