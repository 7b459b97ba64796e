use serde::{Deserialize, Serialize};

/// Flight phases in the order the vehicle goes through them.
///
/// The derived ordering is the flight order. Phase never moves backwards and
/// `Landed` is terminal.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlightPhase {
    Uncalibrated = 0,
    CalibratedIdle = 1,
    Ascent = 2,
    Descent = 3,
    Landed = 4,
}

impl FlightPhase {
    pub const ALL: [FlightPhase; 5] = [
        FlightPhase::Uncalibrated,
        FlightPhase::CalibratedIdle,
        FlightPhase::Ascent,
        FlightPhase::Descent,
        FlightPhase::Landed,
    ];

    /// On the pad: the altitude offset is still tracking ground level.
    pub const fn is_pre_ascent(self) -> bool {
        matches!(self, FlightPhase::Uncalibrated | FlightPhase::CalibratedIdle)
    }

    /// Liftoff has happened: the altitude offset is frozen and applied.
    pub const fn is_post_liftoff(self) -> bool {
        matches!(
            self,
            FlightPhase::Ascent | FlightPhase::Descent | FlightPhase::Landed
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, FlightPhase::Landed)
    }

    pub const fn next(self) -> Option<FlightPhase> {
        match self {
            FlightPhase::Uncalibrated => Some(FlightPhase::CalibratedIdle),
            FlightPhase::CalibratedIdle => Some(FlightPhase::Ascent),
            FlightPhase::Ascent => Some(FlightPhase::Descent),
            FlightPhase::Descent => Some(FlightPhase::Landed),
            FlightPhase::Landed => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            FlightPhase::Uncalibrated => "uncalibrated",
            FlightPhase::CalibratedIdle => "calibrated-idle",
            FlightPhase::Ascent => "ascent",
            FlightPhase::Descent => "descent",
            FlightPhase::Landed => "landed",
        }
    }
}

impl core::fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: FlightPhase,
    pub to: FlightPhase,
    /// running time of the cycle the transition fired in
    pub time_ms: u64,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn next_follows_flight_order() {
        for pair in FlightPhase::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(FlightPhase::Landed.next(), None);
    }

    #[test]
    fn phase_sets_partition_the_flight() {
        for phase in FlightPhase::ALL {
            assert_ne!(phase.is_pre_ascent(), phase.is_post_liftoff());
        }
        assert!(FlightPhase::Landed.is_terminal());
        assert!(!FlightPhase::Descent.is_terminal());
    }
}
