//! Peripherals a [`Communicator`](crate::Communicator) is built from.

use crate::Bitrate;

/// A CAN controller that can be started at a given bitrate.
///
/// Frames go through [`embedded_can::nb::Can`].
pub trait Transceiver: embedded_can::nb::Can {
    fn start(&mut self, bitrate: Bitrate) -> Result<(), Self::Error>;
}

/// Status LED or similar on/off indicator.
pub trait Indicator {
    /// Called once at the start of `begin`.
    fn init(&mut self) {}

    fn on(&mut self);

    fn off(&mut self);
}

pub trait Delay {
    fn delay_ms(&mut self, ms: u32);
}
