use crate::{
    altitude_history::AltitudeHistory,
    config::FlightConfig,
    gps::NmeaAssembler,
    phase::{FlightPhase, PhaseTransition},
    readings::{BaroData, BaroReading, GpsFix, HighGReading, ImuReading, OrientationReading},
    record::{RecordFormatter, RecordLayout, TelemetryFrame},
    sensor::{GpsReceiver, Sensor, SensorFailure},
    sources::{AccelerationSource, LandingSource, first_available},
    telemetry::{SensorKind, TelemetrySnapshot},
    time::Clock,
};


/// Receiver polls allowed per millisecond of GPS timeout.
const GPS_POLLS_PER_MS: u64 = 10_000;

/// Flight phase decision core.
///
/// One control cycle is: the sensor read steps, `increment_time`, then
/// `advance`. The engine owns the snapshot and only hands out copies.
pub struct FlightStateEngine {
    config: FlightConfig,
    phase: FlightPhase,
    snapshot: TelemetrySnapshot,
    altitude_history: AltitudeHistory,
    /// raw altitude of the pad, frozen at liftoff
    altitude_offset: f32,

    liftoff_timer_ms: u32,
    landing_timer_ms: u32,

    running_time_ms: u64,
    delta_time_ms: u32,
    /// elapsed time not yet fed to the phase timers
    unconsumed_delta_ms: u32,
    transitioned_this_cycle: bool,

    gps: NmeaAssembler,
    last_gps_fix: Option<GpsFix>,

    /// the current predicate has run out of live sources
    source_lost: bool,
}

impl FlightStateEngine {
    pub fn new(config: FlightConfig) -> Self {
        Self {
            config,
            phase: FlightPhase::Uncalibrated,
            snapshot: TelemetrySnapshot::default(),
            altitude_history: AltitudeHistory::new(),
            altitude_offset: 0.0,
            liftoff_timer_ms: 0,
            landing_timer_ms: 0,
            running_time_ms: 0,
            delta_time_ms: 0,
            unconsumed_delta_ms: 0,
            transitioned_this_cycle: false,
            gps: NmeaAssembler::new(),
            last_gps_fix: None,
            source_lost: false,
        }
    }

    pub fn increment_time(&mut self, clock: &impl Clock) {
        self.advance_time_to(clock.now_ms());
    }

    /// Moves running time forward to `now_ms`. A time source that goes
    /// backwards yields a zero delta.
    pub fn advance_time_to(&mut self, now_ms: u64) {
        let delta = now_ms.saturating_sub(self.running_time_ms);
        let delta = u32::try_from(delta).unwrap_or(u32::MAX);
        self.running_time_ms = self.running_time_ms.max(now_ms);
        self.delta_time_ms = delta;

        if delta > 0 {
            self.unconsumed_delta_ms = self.unconsumed_delta_ms.saturating_add(delta);
            self.transitioned_this_cycle = false;
        }
    }

    /// Evaluates the predicate of the current phase and moves to the next
    /// phase when it holds. At most one transition per control cycle.
    pub fn advance(&mut self) -> Option<PhaseTransition> {
        let delta = core::mem::take(&mut self.unconsumed_delta_ms);

        if self.phase.is_pre_ascent() {
            self.capture_altitude_offset();
        }
        if self.transitioned_this_cycle || self.phase.is_terminal() {
            return None;
        }

        let fire = match self.phase {
            FlightPhase::Uncalibrated => self.calibration_complete(),
            FlightPhase::CalibratedIdle => self.liftoff_detected(delta),
            FlightPhase::Ascent => self.apogee_detected(),
            FlightPhase::Descent => self.landing_detected(delta),
            FlightPhase::Landed => false,
        };
        if !fire {
            return None;
        }

        let to = self.phase.next()?;
        Some(self.enter(to))
    }

    /// Operator override for a pad where the barometer never settles.
    pub fn complete_calibration(&mut self) -> Option<PhaseTransition> {
        if self.phase != FlightPhase::Uncalibrated {
            log_warn!(
                "calibration override ignored in phase {}",
                self.phase.as_str()
            );
            return None;
        }
        self.capture_altitude_offset();
        Some(self.enter(FlightPhase::CalibratedIdle))
    }

    fn enter(&mut self, to: FlightPhase) -> PhaseTransition {
        let transition = PhaseTransition {
            from: self.phase,
            to,
            time_ms: self.running_time_ms,
        };

        if to == FlightPhase::Ascent {
            // keep the trend window in the frame the barometer writes from now on
            self.altitude_history.rebase(self.altitude_offset);
        }

        self.phase = to;
        self.liftoff_timer_ms = 0;
        self.landing_timer_ms = 0;
        self.source_lost = false;
        self.transitioned_this_cycle = true;

        log_info!(
            "{} -> {} at {} ms",
            transition.from.as_str(),
            transition.to.as_str(),
            transition.time_ms
        );
        transition
    }

    fn capture_altitude_offset(&mut self) {
        let altitude = self.snapshot.barometer.altitude;
        if self.snapshot.is_live(SensorKind::Barometer) && altitude.is_finite() {
            self.altitude_offset = altitude;
        }
    }

    fn note_source(&mut self, available: bool, what: &'static str) {
        if available {
            self.source_lost = false;
        } else if !self.source_lost {
            self.source_lost = true;
            log_warn!(
                "no live source for {} in phase {}, holding",
                what,
                self.phase.as_str()
            );
        }
    }

    fn calibration_complete(&mut self) -> bool {
        let barometer_live = self.snapshot.is_live(SensorKind::Barometer);
        self.note_source(barometer_live, "calibration");
        if !barometer_live || !self.altitude_history.is_full() {
            return false;
        }
        self.altitude_history
            .spread()
            .is_some_and(|spread| spread <= self.config.calibration_stability_margin_m)
    }

    fn liftoff_detected(&mut self, delta_ms: u32) -> bool {
        let snapshot = self.snapshot;
        let found = first_available(&AccelerationSource::LIFTOFF_CHAIN, |source| {
            source.vertical_acceleration(&snapshot)
        });
        self.note_source(found.is_some(), "liftoff");

        let Some((source, acc_z)) = found else {
            return false;
        };
        if acc_z > self.config.liftoff_acceleration_threshold {
            self.liftoff_timer_ms = self.liftoff_timer_ms.saturating_add(delta_ms);
            log_trace!(
                "liftoff timer {} ms ({:?}, {} m/s^2)",
                self.liftoff_timer_ms,
                source,
                acc_z
            );
        } else {
            self.liftoff_timer_ms = 0;
        }
        self.liftoff_timer_ms > self.config.liftoff_time_threshold_ms
    }

    fn apogee_detected(&mut self) -> bool {
        let barometer_live = self.snapshot.is_live(SensorKind::Barometer);
        self.note_source(barometer_live, "apogee");
        if !barometer_live || !self.altitude_history.is_full() {
            return false;
        }
        let descending = self
            .altitude_history
            .descending_pairs(self.config.apogee_noise_margin_m);
        descending > self.config.apogee_min_descending_pairs
    }

    fn landing_detected(&mut self, delta_ms: u32) -> bool {
        let found = first_available(&LandingSource::LANDING_CHAIN, |source| {
            source.observe(&self.snapshot, &self.config)
        });
        self.note_source(found.is_some(), "landing");

        let Some((source, at_rest)) = found else {
            return false;
        };
        if !at_rest {
            self.landing_timer_ms = 0;
            return false;
        }
        self.landing_timer_ms = self.landing_timer_ms.saturating_add(delta_ms);
        log_trace!("landing timer {} ms ({:?})", self.landing_timer_ms, source);
        self.landing_timer_ms >= self.config.landing_time_threshold_ms
    }

    fn ingest<R>(
        &mut self,
        sensor: SensorKind,
        result: Result<R, SensorFailure>,
    ) -> Result<R, SensorFailure> {
        self.snapshot.liveness.set(sensor, result.is_ok());
        if result.is_err() {
            log_trace!("{} read failed", sensor.as_str());
        }
        result
    }

    pub fn read_primary_imu(
        &mut self,
        sensor: &mut impl Sensor<Reading = ImuReading>,
    ) -> Result<(), SensorFailure> {
        self.snapshot.primary_imu = self.ingest(SensorKind::PrimaryImu, sensor.read())?;
        Ok(())
    }

    pub fn read_high_g(
        &mut self,
        sensor: &mut impl Sensor<Reading = HighGReading>,
    ) -> Result<(), SensorFailure> {
        self.snapshot.high_g = self.ingest(SensorKind::HighG, sensor.read())?;
        Ok(())
    }

    pub fn read_orientation(
        &mut self,
        sensor: &mut impl Sensor<Reading = OrientationReading>,
    ) -> Result<(), SensorFailure> {
        self.snapshot.orientation = self.ingest(SensorKind::Orientation, sensor.read())?;
        Ok(())
    }

    /// Altitude is raw on the pad and relative to the frozen offset after
    /// liftoff. Every successful read lands in the altitude history. A pressure
    /// the sensor cannot physically report counts as a failed read.
    pub fn read_barometer(
        &mut self,
        sensor: &mut impl Sensor<Reading = BaroReading>,
    ) -> Result<(), SensorFailure> {
        let result = sensor.read().and_then(|reading| {
            let altitude = reading.checked_altitude().ok_or(SensorFailure)?;
            Ok((reading, altitude))
        });
        let (reading, mut altitude) = self.ingest(SensorKind::Barometer, result)?;

        if self.phase.is_post_liftoff() {
            altitude -= self.altitude_offset;
        }
        self.snapshot.barometer = BaroData {
            pressure: reading.pressure,
            temperature: reading.temperature,
            altitude,
        };
        self.altitude_history.push(altitude);
        Ok(())
    }

    /// Drains the receiver until a sentence yields a fix or
    /// `gps_timeout_ms` passes on `clock`. The number of receiver polls is
    /// capped as well, so a stalled clock cannot hold the control loop.
    pub fn read_gps(
        &mut self,
        receiver: &mut impl GpsReceiver,
        clock: &impl Clock,
    ) -> Result<(), SensorFailure> {
        let start_ms = clock.now_ms();
        let timeout_ms = u64::from(self.config.gps_timeout_ms);
        // ends the wait even if the clock never moves
        let mut polls_left = timeout_ms.saturating_mul(GPS_POLLS_PER_MS);

        let result = loop {
            if polls_left == 0 || clock.now_ms().saturating_sub(start_ms) >= timeout_ms {
                break Err(SensorFailure);
            }
            polls_left -= 1;
            match receiver.read_byte() {
                Some(byte) => {
                    if let Some(fix) = self.gps.feed(byte) {
                        break Ok(fix);
                    }
                }
                None => core::hint::spin_loop(),
            }
        };

        self.last_gps_fix = Some(self.ingest(SensorKind::Gps, result)?);
        Ok(())
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot
    }

    /// Copy of everything a record is rendered from. The GPS fix is only
    /// included while the GPS is live.
    pub fn frame(&self) -> TelemetryFrame {
        TelemetryFrame {
            time_ms: self.running_time_ms,
            phase: self.phase,
            snapshot: self.snapshot,
            gps_fix: self
                .last_gps_fix
                .filter(|_| self.snapshot.is_live(SensorKind::Gps)),
        }
    }

    pub fn record_formatter(&self, layout: RecordLayout) -> RecordFormatter<'_> {
        RecordFormatter::new(self.config.record_header(), layout)
    }

    pub fn altitude_offset(&self) -> f32 {
        self.altitude_offset
    }

    pub fn altitude_history(&self) -> &AltitudeHistory {
        &self.altitude_history
    }

    pub fn running_time_ms(&self) -> u64 {
        self.running_time_ms
    }

    pub fn delta_time_ms(&self) -> u32 {
        self.delta_time_ms
    }

    pub fn last_gps_fix(&self) -> Option<GpsFix> {
        self.last_gps_fix
    }
}
