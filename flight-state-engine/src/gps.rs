use heapless::String;
use nmea::Nmea;

use crate::readings::GpsFix;

/// Longest NMEA 0183 sentence including `$` and `\r\n`.
pub const NMEA_SENTENCE_MAX_LEN: usize = 84;

impl GpsFix {
    /// A fix needs a position and at least one satellite.
    pub fn from_nmea(nmea: &Nmea) -> Option<Self> {
        let (Some(latitude), Some(longitude)) = (nmea.latitude, nmea.longitude) else {
            return None;
        };
        let satellites = nmea.num_of_fix_satellites.unwrap_or(0).min(u8::MAX as u32) as u8;
        if satellites == 0 {
            return None;
        }

        Some(Self {
            latitude,
            longitude,
            satellites,
            speed: nmea.speed_over_ground.unwrap_or(0.0),
            heading: nmea.true_course.unwrap_or(0.0),
            altitude: nmea.altitude.unwrap_or(0.0),
        })
    }
}

/// Assembles NMEA sentences from a byte stream and keeps the merged receiver
/// state across sentences.
pub struct NmeaAssembler {
    sentence: String<NMEA_SENTENCE_MAX_LEN>,
    nmea: Nmea,
}

impl NmeaAssembler {
    pub fn new() -> Self {
        Self {
            sentence: String::new(),
            nmea: Nmea::default(),
        }
    }

    /// Feeds one byte. Returns the current fix when this byte completed a
    /// sentence that parsed and the receiver reports a usable fix.
    pub fn feed(&mut self, byte: u8) -> Option<GpsFix> {
        if byte == b'$' {
            self.sentence.clear();
        }
        self.sentence.push(byte as char).ok();

        if byte != b'\n' && self.sentence.len() < NMEA_SENTENCE_MAX_LEN {
            return None;
        }

        let parsed = self.nmea.parse(self.sentence.as_str().trim_end()).is_ok();
        if !parsed {
            log_trace!("GPS: dropping unparseable sentence");
        }
        self.sentence.clear();

        if parsed { GpsFix::from_nmea(&self.nmea) } else { None }
    }
}

impl Default for NmeaAssembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    const GGA_WITH_FIX: &str =
        "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
    const RMC_WITH_FIX: &str =
        "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";

    fn feed_all(assembler: &mut NmeaAssembler, sentence: &str) -> Option<GpsFix> {
        let mut fix = None;
        for byte in sentence.bytes() {
            if let Some(f) = assembler.feed(byte) {
                fix = Some(f);
            }
        }
        fix
    }

    #[test]
    fn parses_fix_from_gga() {
        let mut assembler = NmeaAssembler::new();
        let fix = feed_all(&mut assembler, GGA_WITH_FIX).unwrap();
        assert_relative_eq!(fix.latitude, 48.1173, epsilon = 1e-4);
        assert_relative_eq!(fix.longitude, 11.516_667, epsilon = 1e-4);
        assert_eq!(fix.satellites, 8);
        assert_relative_eq!(fix.altitude, 545.4, epsilon = 1e-3);
    }

    #[test]
    fn rmc_adds_speed_and_heading() {
        let mut assembler = NmeaAssembler::new();
        feed_all(&mut assembler, GGA_WITH_FIX).unwrap();
        let fix = feed_all(&mut assembler, RMC_WITH_FIX).unwrap();
        assert_relative_eq!(fix.speed, 22.4, epsilon = 1e-3);
        assert_relative_eq!(fix.heading, 84.4, epsilon = 1e-3);
    }

    #[test]
    fn garbage_and_no_fix_yield_nothing() {
        let mut assembler = NmeaAssembler::new();
        assert_eq!(feed_all(&mut assembler, "$GPGGA,this is not nmea*00\r\n"), None);
        assert_eq!(
            feed_all(&mut assembler, "$GPGGA,123519,,,,,0,00,,,M,,M,,*6B\r\n"),
            None
        );
    }

    #[test]
    fn overlong_line_is_flushed() {
        let mut assembler = NmeaAssembler::new();
        for _ in 0..(NMEA_SENTENCE_MAX_LEN * 3) {
            assert_eq!(assembler.feed(b'x'), None);
        }
        assert!(feed_all(&mut assembler, GGA_WITH_FIX).is_some());
    }
}
