use std::cell::Cell;
use std::io::Read;

use anyhow::{Context, Result};
use csv::Reader;
use flight_state_engine::{
    BaroReading, Clock, FlightConfig, FlightStateEngine, GpsReceiver, HighGReading, ImuReading,
    OrientationReading, PhaseTransition, RecordLayout, SERIAL_RECORD_HEADER,
    STORAGE_RECORD_HEADER, Sensor, SensorFailure, TelemetryFrame,
};
use serde::Deserialize;

/// One control cycle worth of recorded sensor data. Columns missing from the
/// csv read as zero and a missing `*_ok` column marks that sensor as failed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SensorFrame {
    pub time_ms: u64,

    pub imu_ok: bool,
    pub imu_acc_x: f32,
    pub imu_acc_y: f32,
    pub imu_acc_z: f32,
    pub imu_gyro_x: f32,
    pub imu_gyro_y: f32,
    pub imu_gyro_z: f32,
    pub imu_temp: f32,

    pub high_g_ok: bool,
    pub high_g_acc_x: f32,
    pub high_g_acc_y: f32,
    pub high_g_acc_z: f32,
    pub high_g_temp: f32,

    pub orientation_ok: bool,
    pub ori_w: f32,
    pub ori_x: f32,
    pub ori_y: f32,
    pub ori_z: f32,
    pub ori_gyro_x: f32,
    pub ori_gyro_y: f32,
    pub ori_gyro_z: f32,
    pub ori_acc_x: f32,
    pub ori_acc_y: f32,
    pub ori_acc_z: f32,
    pub ori_mag_x: f32,
    pub ori_mag_y: f32,
    pub ori_mag_z: f32,
    pub ori_temp: f32,

    pub baro_ok: bool,
    pub pressure: f32,
    pub baro_temp: f32,

    /// raw NMEA received during this cycle, empty when the receiver was quiet
    pub gps_sentence: Option<String>,
}

fn reading<R>(ok: bool, reading: R) -> Result<R, SensorFailure> {
    if ok { Ok(reading) } else { Err(SensorFailure) }
}

impl SensorFrame {
    pub fn primary_imu(&self) -> Result<ImuReading, SensorFailure> {
        reading(
            self.imu_ok,
            ImuReading {
                acc: [self.imu_acc_x, self.imu_acc_y, self.imu_acc_z],
                gyro: [self.imu_gyro_x, self.imu_gyro_y, self.imu_gyro_z],
                temperature: self.imu_temp,
            },
        )
    }

    pub fn high_g(&self) -> Result<HighGReading, SensorFailure> {
        reading(
            self.high_g_ok,
            HighGReading {
                acc: [self.high_g_acc_x, self.high_g_acc_y, self.high_g_acc_z],
                temperature: self.high_g_temp,
            },
        )
    }

    pub fn orientation(&self) -> Result<OrientationReading, SensorFailure> {
        reading(
            self.orientation_ok,
            OrientationReading {
                quaternion: [self.ori_w, self.ori_x, self.ori_y, self.ori_z],
                gyro: [self.ori_gyro_x, self.ori_gyro_y, self.ori_gyro_z],
                acc: [self.ori_acc_x, self.ori_acc_y, self.ori_acc_z],
                mag: [self.ori_mag_x, self.ori_mag_y, self.ori_mag_z],
                temperature: self.ori_temp,
            },
        )
    }

    pub fn barometer(&self) -> Result<BaroReading, SensorFailure> {
        reading(
            self.baro_ok,
            BaroReading {
                temperature: self.baro_temp,
                pressure: self.pressure,
            },
        )
    }
}

pub fn read_frames(source: impl Read) -> Result<Vec<SensorFrame>> {
    let mut reader = Reader::from_reader(source);
    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| row.with_context(|| format!("bad sensor frame on row {}", i + 1)))
        .collect()
}

/// Hands back the recorded result of one sensor.
pub struct ReplaySensor<R>(pub Result<R, SensorFailure>);

impl<R: Copy> Sensor for ReplaySensor<R> {
    type Reading = R;

    fn read(&mut self) -> Result<R, SensorFailure> {
        self.0
    }
}

/// Feeds a recorded sentence byte by byte, then goes quiet.
pub struct SentenceReceiver<'a> {
    bytes: &'a [u8],
}

impl<'a> SentenceReceiver<'a> {
    pub fn new(sentence: Option<&'a str>) -> Self {
        Self {
            bytes: sentence.map(str::as_bytes).unwrap_or_default(),
        }
    }
}

impl GpsReceiver for SentenceReceiver<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        let (first, rest) = self.bytes.split_first()?;
        self.bytes = rest;
        Some(*first)
    }
}

/// Stands in for wall time while waiting on the GPS: every read moves it
/// forward by a millisecond.
pub struct ReplayClock {
    now_ms: Cell<u64>,
}

impl ReplayClock {
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }
}

impl Clock for ReplayClock {
    fn now_ms(&self) -> u64 {
        let now_ms = self.now_ms.get();
        self.now_ms.set(now_ms + 1);
        now_ms
    }
}

pub struct ReplayOutput {
    pub records: String,
    pub transitions: Vec<PhaseTransition>,
    pub final_frame: TelemetryFrame,
    pub final_delta_ms: u32,
}

pub fn replay_flight(
    config: FlightConfig,
    layout: RecordLayout,
    frames: &[SensorFrame],
) -> Result<ReplayOutput> {
    let config = if layout == RecordLayout::Serial && config.record_header() == STORAGE_RECORD_HEADER
    {
        config.with_record_header(SERIAL_RECORD_HEADER)
    } else {
        config
    };
    let mut engine = FlightStateEngine::new(config);

    let mut records = String::new();
    engine
        .record_formatter(layout)
        .write_header(&mut records)
        .context("failed to format header")?;

    let mut transitions = Vec::new();
    for frame in frames {
        // a failed read only shows up in the liveness columns
        let _ = engine.read_primary_imu(&mut ReplaySensor(frame.primary_imu()));
        let _ = engine.read_high_g(&mut ReplaySensor(frame.high_g()));
        let _ = engine.read_orientation(&mut ReplaySensor(frame.orientation()));
        let _ = engine.read_barometer(&mut ReplaySensor(frame.barometer()));
        let _ = engine.read_gps(
            &mut SentenceReceiver::new(frame.gps_sentence.as_deref()),
            &ReplayClock::starting_at(frame.time_ms),
        );

        engine.advance_time_to(frame.time_ms);
        if let Some(transition) = engine.advance() {
            transitions.push(transition);
        }

        engine
            .record_formatter(layout)
            .write_record(&mut records, &engine.frame())
            .with_context(|| format!("failed to format record at {} ms", frame.time_ms))?;
    }

    Ok(ReplayOutput {
        records,
        transitions,
        final_frame: engine.frame(),
        final_delta_ms: engine.delta_time_ms(),
    })
}

#[cfg(test)]
mod test {
    use flight_state_engine::FlightPhase;

    use super::*;

    const PAD_ALTITUDE_M: f32 = 300.0;

    fn pressure_at(altitude_m: f32) -> f32 {
        101_325.0 * (1.0 - 2.25577e-5 * altitude_m).powf(5.25588)
    }

    fn frame(time_ms: u64, acc_z: f32, high_g_z: f32, altitude_m: f32) -> SensorFrame {
        SensorFrame {
            time_ms,
            imu_ok: true,
            imu_acc_z: acc_z,
            high_g_ok: true,
            high_g_acc_z: high_g_z,
            orientation_ok: true,
            ori_w: 1.0,
            baro_ok: true,
            pressure: pressure_at(altitude_m),
            baro_temp: 20.0,
            ..Default::default()
        }
    }

    fn synthetic_flight() -> Vec<SensorFrame> {
        let mut altitude = PAD_ALTITUDE_M;
        (0..400u64)
            .map(|cycle| {
                let time_ms = (cycle + 1) * 50;
                let (acc_z, high_g_z) = match cycle {
                    0..20 => (9.81, 9.81),
                    20..40 => {
                        altitude += 4.0;
                        (60.0, 60.0)
                    }
                    40..100 => {
                        altitude += 8.0;
                        (-9.81, -9.81)
                    }
                    _ => {
                        altitude = (altitude - 6.0).max(PAD_ALTITUDE_M);
                        let on_ground = altitude <= PAD_ALTITUDE_M;
                        (9.81, if on_ground { 1.0 } else { 9.81 })
                    }
                };
                frame(time_ms, acc_z, high_g_z, altitude)
            })
            .collect()
    }

    #[test]
    fn reads_sparse_frames() {
        let csv = "time_ms,imu_ok,imu_acc_z,baro_ok,pressure,gps_sentence\n\
                   50,true,9.81,true,97773.6,\n\
                   100,false,0,true,97773.5,$GPGGA\n";
        let frames = read_frames(csv.as_bytes()).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].time_ms, 50);
        assert!(frames[0].imu_ok);
        assert_eq!(frames[0].imu_acc_z, 9.81);
        assert!(!frames[0].high_g_ok);
        assert_eq!(frames[0].gps_sentence, None);
        assert!(frames[1].primary_imu().is_err());
        assert_eq!(frames[1].gps_sentence.as_deref(), Some("$GPGGA"));
    }

    #[test]
    fn rejects_malformed_rows() {
        let csv = "time_ms,imu_ok\nsoon,true\n";
        assert!(read_frames(csv.as_bytes()).is_err());
    }

    #[test]
    fn replays_a_whole_flight() {
        let frames = synthetic_flight();
        let output = replay_flight(FlightConfig::default(), RecordLayout::Storage, &frames).unwrap();

        let phases: Vec<_> = output.transitions.iter().map(|t| t.to).collect();
        assert_eq!(
            phases,
            [
                FlightPhase::CalibratedIdle,
                FlightPhase::Ascent,
                FlightPhase::Descent,
                FlightPhase::Landed
            ]
        );
        assert_eq!(output.final_frame.phase, FlightPhase::Landed);
        assert_eq!(output.final_delta_ms, 50);

        let mut lines = output.records.lines();
        assert_eq!(lines.next(), Some(STORAGE_RECORD_HEADER));
        assert_eq!(lines.clone().count(), frames.len());
        for line in lines {
            assert_eq!(line.split(',').count(), 31);
            // no gps in this recording
            assert!(line.contains(",-1,No fix,-1,No fix,0,-1,"));
            assert!(line.ends_with(",1,1,1,1,0"));
        }
    }

    #[test]
    fn serial_layout_switches_default_header() {
        let frames = synthetic_flight();
        let output = replay_flight(FlightConfig::default(), RecordLayout::Serial, &frames[..3]).unwrap();

        let mut lines = output.records.lines();
        assert_eq!(lines.next(), Some(SERIAL_RECORD_HEADER));
        assert_eq!(lines.next().unwrap().split(',').count(), 34);
    }

    #[test]
    fn recorded_gps_sentence_reaches_the_record() {
        let mut frames = synthetic_flight();
        frames.truncate(2);
        frames[1].gps_sentence =
            Some("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n".into());

        let output = replay_flight(FlightConfig::default(), RecordLayout::Storage, &frames).unwrap();
        let records: Vec<_> = output.records.lines().collect();
        assert!(records[1].starts_with("50,-1,No fix,"));
        assert!(records[2].starts_with("100,48.117300,11.516667,8,"));
        assert!(records[2].ends_with(",1,1,1,1,1"));
        assert!(output.final_frame.gps_fix.is_some());
    }
}
