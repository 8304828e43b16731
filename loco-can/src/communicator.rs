use embedded_can::Frame;

use crate::address::AddressProvider;
use crate::filter::{self, Filter, FilterError, FilterTable};
use crate::hal::{Delay, Indicator, Transceiver};
use crate::id::{self, IdError};
use crate::message::MAX_PAYLOAD;
use crate::timeout::Countdown;
use crate::{Address, Bitrate, Config, Id, Message};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Error<E> {
    /// The transceiver did not start within the configured attempts.
    Init { attempts: u32 },
    InvalidId(IdError),
    InvalidFrame,
    Filter(FilterError),
    Can(E),
}

impl<E> From<IdError> for Error<E> {
    fn from(error: IdError) -> Self {
        Error::InvalidId(error)
    }
}

impl<E> From<FilterError> for Error<E> {
    fn from(error: FilterError) -> Self {
        Error::Filter(error)
    }
}

pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Outcome of a single [`Communicator::read`] poll.
#[derive(Clone, Debug, PartialEq)]
pub enum Received {
    /// Nothing was queued.
    NoFrame,
    /// A frame was accepted. `value` is the value of the first matching
    /// filter, or the group id itself when no filters are registered.
    Matched { value: u16, message: Message },
    /// A frame arrived but no registered filter accepted it.
    Unmatched(Message),
}

impl Received {
    pub fn matched(&self) -> Option<u16> {
        match self {
            Received::Matched { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            Received::NoFrame => None,
            Received::Matched { message, .. } | Received::Unmatched(message) => Some(message),
        }
    }
}

/// One node on a shared bus.
///
/// Frames are sent with a 29-bit identifier carrying an 11-bit group id and
/// this node's address. Incoming frames are decoded, run through the filter
/// table and feed the liveness countdown. Everything runs on the caller's
/// poll loop, only `begin` may block for long.
pub struct Communicator<T, L, C, D> {
    can: T,
    indicator: L,
    alive_timeout: C,
    delay: D,
    config: Config,
    address: Address,
    filters: FilterTable,
    alive: bool,
}

impl<T, L, C, D> Communicator<T, L, C, D> {
    pub fn new<A: AddressProvider>(
        can: T,
        indicator: L,
        alive_timeout: C,
        delay: D,
        provider: &A,
    ) -> Self {
        Self::with_config(
            can,
            indicator,
            alive_timeout,
            delay,
            provider,
            Config::default(),
        )
    }

    pub fn with_config<A: AddressProvider>(
        can: T,
        indicator: L,
        alive_timeout: C,
        delay: D,
        provider: &A,
        config: Config,
    ) -> Self {
        Communicator {
            can,
            indicator,
            alive_timeout,
            delay,
            config,
            address: provider.address(),
            filters: FilterTable::new(),
            alive: false,
        }
    }

    /// This node's address, fixed for the lifetime of the communicator.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Liveness as of the last [`read`](Self::read).
    pub fn alive(&self) -> bool {
        self.alive
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn filters(&self) -> &FilterTable {
        &self.filters
    }

    /// Appends a filter. Fails with [`FilterError::TableFull`] once
    /// [`MAX_FILTERS`](crate::MAX_FILTERS) are registered.
    pub fn register_filter(&mut self, mask: u16, value: u16) -> filter::Result<()> {
        let result = self.filters.register(Filter::new(mask, value));
        match result {
            Ok(()) => log::debug!("registered filter mask {:03x} value {:03x}", mask, value),
            Err(_) => log::warn!(
                "filter table full, dropped mask {:03x} value {:03x}",
                mask,
                value
            ),
        }
        result
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Gives back the peripherals.
    pub fn release(self) -> (T, L, C, D) {
        (self.can, self.indicator, self.alive_timeout, self.delay)
    }
}

impl<T, L, C, D> Communicator<T, L, C, D>
where
    C: Countdown,
{
    /// Re-arms the liveness countdown with a new window and reports alive
    /// until it runs out.
    pub fn set_alive(&mut self, timeout_ms: u32) {
        self.alive_timeout.start(timeout_ms);
        self.alive = true;
    }
}

impl<T, L, C, D> Communicator<T, L, C, D>
where
    T: Transceiver,
    L: Indicator,
    C: Countdown,
    D: Delay,
{
    /// Starts the bus, blinking the indicator while the transceiver refuses
    /// to start.
    ///
    /// Retries forever unless the config limits the number of attempts. On
    /// success the filter table is cleared and the liveness countdown is
    /// armed.
    pub fn begin(&mut self, bitrate: Bitrate) -> Result<(), T::Error> {
        let retry = self.config.retry;

        self.indicator.init();
        self.indicator.on();

        log::info!("starting CAN at {} bps", bitrate.bits_per_second());

        let mut attempts: u32 = 0;
        while let Err(e) = self.can.start(bitrate) {
            attempts = attempts.saturating_add(1);
            log::warn!("starting CAN failed (attempt {}): {:?}", attempts, e);

            self.indicator.on();
            self.delay.delay_ms(retry.on_ms);
            self.indicator.off();
            self.delay.delay_ms(retry.off_ms);

            if let Some(max) = retry.max_attempts {
                if attempts >= max.get() {
                    log::error!("giving up on CAN after {} attempts", attempts);
                    return Err(Error::Init { attempts });
                }
            }
        }

        log::info!("CAN started, node address {}", self.address);

        self.clear_filters();
        self.set_alive(self.config.alive_timeout_ms);

        self.delay.delay_ms(retry.settle_ms);
        self.indicator.off();

        Ok(())
    }

    /// Sends `data` to `group` in a single frame.
    ///
    /// Only the first 8 bytes are sent. Group ids wider than 11 bits are
    /// truncated, see [`Id::new`].
    pub fn send(&mut self, group: u16, data: &[u8]) -> Result<(), T::Error> {
        self.send_id(Id::new(group, self.address), data)
    }

    /// Like [`send`](Self::send) but rejects group ids wider than 11 bits.
    pub fn try_send(&mut self, group: u16, data: &[u8]) -> Result<(), T::Error> {
        let id = Id::try_new(group, self.address)?;
        self.send_id(id, data)
    }

    fn send_id(&mut self, id: Id, data: &[u8]) -> Result<(), T::Error> {
        let data = &data[..data.len().min(MAX_PAYLOAD)];
        let frame = T::Frame::new(id, data).ok_or(Error::InvalidFrame)?;

        log::trace!("sending {:?} with {} bytes", id, data.len());
        self.transmit(&frame)
    }

    fn transmit(&mut self, frame: &T::Frame) -> Result<(), T::Error> {
        let mut pending = nb::block!(self.can.transmit(frame)).map_err(Error::Can)?;

        // A lower priority frame was replaced with ours, put it back in the
        // transmit queue.
        while let Some(displaced) = pending {
            pending = nb::block!(self.can.transmit(&displaced)).map_err(Error::Can)?;
        }

        Ok(())
    }

    /// Polls for one frame without blocking.
    ///
    /// Liveness is updated first, so [`alive`](Self::alive) turns false on
    /// the first poll after the window ran out without traffic.
    pub fn read(&mut self) -> Result<Received, T::Error> {
        self.alive = !self.alive_timeout.expired();

        let frame = match self.can.receive() {
            Ok(frame) => frame,
            Err(nb::Error::WouldBlock) => return Ok(Received::NoFrame),
            Err(nb::Error::Other(e)) => return Err(Error::Can(e)),
        };

        self.indicator.on();
        self.alive_timeout.retrigger();

        let (group, source) = id::decode(frame.id());
        let message = Message::new(group, source, frame.data());

        log::trace!(
            "received group {:03x} from {} with {} bytes",
            group,
            source,
            message.len()
        );

        if self.filters.is_empty() {
            return Ok(Received::Matched {
                value: group,
                message,
            });
        }

        match self.filters.find(group) {
            Some(value) => Ok(Received::Matched { value, message }),
            None => {
                log::debug!("no filter for group {:03x}", group);
                self.indicator.off();
                Ok(Received::Unmatched(message))
            }
        }
    }
}
