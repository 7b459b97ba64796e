use core::ops::DerefMut;

/// A read that produced no usable data. Carries nothing: the engine only
/// records it in the liveness vector.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorFailure;

impl core::fmt::Display for SensorFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("sensor read failed")
    }
}

/// One physical sensor, polled once per control cycle.
///
/// `read` must be a single short transaction: the control loop derives its
/// timers from cycle time, so a read that blocks longer than a cycle skews
/// liftoff and landing detection.
pub trait Sensor {
    type Reading;

    fn read(&mut self) -> Result<Self::Reading, SensorFailure>;
}

impl<S: Sensor + ?Sized> Sensor for &mut S {
    type Reading = S::Reading;

    fn read(&mut self) -> Result<Self::Reading, SensorFailure> {
        self.deref_mut().read()
    }
}

/// Non-blocking byte source of a GPS receiver's NMEA stream.
pub trait GpsReceiver {
    /// Next buffered byte, `None` when nothing is available right now.
    fn read_byte(&mut self) -> Option<u8>;
}

impl<G: GpsReceiver + ?Sized> GpsReceiver for &mut G {
    fn read_byte(&mut self) -> Option<u8> {
        self.deref_mut().read_byte()
    }
}
