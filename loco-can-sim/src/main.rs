use std::{
    cell::RefCell, collections::VecDeque, convert::TryFrom, rc::Rc, str::FromStr, thread,
    time::Duration, time::Instant,
};

use loco_can::{
    hal::{Delay, Indicator, Transceiver},
    Bitrate, CanFrame, Clock, Communicator, Config, HashedUid, Received, Timeout,
};
use structopt::StructOpt;

/// Receive queues of every node on the virtual bus.
type Wire = Rc<RefCell<Vec<VecDeque<CanFrame>>>>;

#[derive(Copy, Clone, Debug, PartialEq)]
struct SimError;

impl embedded_can::Error for SimError {
    fn kind(&self) -> embedded_can::ErrorKind {
        embedded_can::ErrorKind::Other
    }
}

/// One node's view of the virtual bus. A transmitted frame lands in the
/// queue of every other node.
struct VirtualCan {
    wire: Wire,
    node: usize,
    start_failures: u32,
}

impl embedded_can::nb::Can for VirtualCan {
    type Frame = CanFrame;
    type Error = SimError;

    fn transmit(&mut self, frame: &CanFrame) -> nb::Result<Option<CanFrame>, SimError> {
        let mut wire = self.wire.borrow_mut();
        for (node, queue) in wire.iter_mut().enumerate() {
            if node != self.node {
                queue.push_back(frame.clone());
            }
        }
        Ok(None)
    }

    fn receive(&mut self) -> nb::Result<CanFrame, SimError> {
        self.wire.borrow_mut()[self.node]
            .pop_front()
            .ok_or(nb::Error::WouldBlock)
    }
}

impl Transceiver for VirtualCan {
    fn start(&mut self, bitrate: Bitrate) -> Result<(), SimError> {
        if self.start_failures > 0 {
            self.start_failures -= 1;
            return Err(SimError);
        }
        log::debug!("node {} joined at {} bps", self.node, bitrate.bits_per_second());
        Ok(())
    }
}

struct LogLed(usize);

impl Indicator for LogLed {
    fn on(&mut self) {
        log::trace!("node {} led on", self.0);
    }

    fn off(&mut self) {
        log::trace!("node {} led off", self.0);
    }
}

#[derive(Clone)]
struct StdClock(Instant);

impl Clock for StdClock {
    fn now_ms(&self) -> u32 {
        self.0.elapsed().as_millis() as u32
    }
}

struct StdDelay;

impl Delay for StdDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

type Node = Communicator<VirtualCan, LogLed, Timeout<StdClock>, StdDelay>;

#[derive(Debug)]
struct FilterArg {
    mask: u16,
    value: u16,
}

impl FromStr for FilterArg {
    type Err = String;

    /// Parses `mask:value`, both in hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mask, value) = s
            .split_once(':')
            .ok_or_else(|| format!("expected mask:value, got {}", s))?;
        let parse = |v: &str| u16::from_str_radix(v.trim_start_matches("0x"), 16);
        Ok(FilterArg {
            mask: parse(mask).map_err(|e| e.to_string())?,
            value: parse(value).map_err(|e| e.to_string())?,
        })
    }
}

#[derive(StructOpt)]
struct Opts {
    /// Number of nodes on the bus
    #[structopt(short, long, default_value = "3")]
    pub nodes: usize,
    /// Number of send/poll rounds
    #[structopt(short, long, default_value = "5")]
    pub rounds: usize,
    /// Bus speed in bits per second
    #[structopt(long, default_value = "500000")]
    pub bitrate: u32,
    #[structopt(long, default_value = "500")]
    pub alive_timeout: u32,
    /// Pause between rounds in milliseconds
    #[structopt(long, default_value = "100")]
    pub round_ms: u64,
    /// Failed starts before the first node comes up
    #[structopt(long, default_value = "0")]
    pub start_failures: u32,
    /// Filters registered on every node, as hex `mask:value`
    #[structopt(short = "f", long = "filter")]
    pub filters: Vec<FilterArg>,
}

fn uid(node: usize) -> [u8; 8] {
    let mut uid = *b"LOCO\0\0\0\0";
    uid[4..].copy_from_slice(&(node as u32).to_le_bytes());
    uid
}

fn main() {
    env_logger::init();
    let opts = Opts::from_args();

    let bitrate = match Bitrate::try_from(opts.bitrate) {
        Ok(bitrate) => bitrate,
        Err(e) => {
            log::error!("{:?}", e);
            std::process::exit(2);
        }
    };

    let wire: Wire = Rc::new(RefCell::new(vec![VecDeque::new(); opts.nodes]));
    let clock = StdClock(Instant::now());
    let config = Config::default()
        .alive_timeout_ms(opts.alive_timeout)
        .max_attempts(opts.start_failures.saturating_add(1));

    let mut nodes: Vec<Node> = Vec::with_capacity(opts.nodes);
    for i in 0..opts.nodes {
        let can = VirtualCan {
            wire: Rc::clone(&wire),
            node: i,
            start_failures: if i == 0 { opts.start_failures } else { 0 },
        };
        let mut node = Communicator::with_config(
            can,
            LogLed(i),
            Timeout::new(clock.clone()),
            StdDelay,
            &HashedUid::new(uid(i)),
            config,
        );
        if let Err(e) = node.begin(bitrate) {
            log::error!("node {} did not start: {:?}", i, e);
            std::process::exit(1);
        }
        for filter in &opts.filters {
            if let Err(e) = node.register_filter(filter.mask, filter.value) {
                log::warn!("node {}: {:?}", i, e);
            }
        }
        log::info!("node {} has address {}", i, node.address());
        nodes.push(node);
    }

    for round in 0..opts.rounds {
        // the last node stops sending halfway through
        let quiet = opts.nodes > 1 && round >= opts.rounds / 2;
        for (i, node) in nodes.iter_mut().enumerate() {
            if quiet && i + 1 == opts.nodes {
                continue;
            }
            let group = (i + 1) as u16;
            if let Err(e) = node.send(group, &[round as u8, i as u8]) {
                log::error!("node {} send failed: {:?}", i, e);
            }
        }

        thread::sleep(Duration::from_millis(opts.round_ms));

        for (i, node) in nodes.iter_mut().enumerate() {
            loop {
                match node.read() {
                    Ok(Received::NoFrame) => break,
                    Ok(Received::Matched { value, message }) => log::info!(
                        "round {} node {}: matched {:03x} from {} {:?}",
                        round,
                        i,
                        value,
                        message.source(),
                        message.data()
                    ),
                    Ok(Received::Unmatched(message)) => log::info!(
                        "round {} node {}: dropped group {:03x} from {}",
                        round,
                        i,
                        message.id(),
                        message.source()
                    ),
                    Err(e) => {
                        log::error!("node {} read failed: {:?}", i, e);
                        break;
                    }
                }
            }
            log::info!("round {} node {} alive: {}", round, i, node.alive());
        }
    }
}
