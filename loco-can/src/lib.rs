//! Node addressing and framing on a shared CAN bus.
//!
//! Every node derives an address from its hardware unique id and sends
//! frames with a 29-bit identifier `group << 18 | address`, where `group` is
//! an 11-bit channel chosen by the sender. Receivers decode the identifier,
//! match the group id against a small filter table and track whether any
//! traffic arrived within a liveness window.

#![no_std]

pub mod address;
pub use address::{AddressProvider, FixedAddress, HashedUid, SuperFastHash, UidHash};

mod communicator;
pub use communicator::{Communicator, Error, Received, Result};

mod config;
pub use config::{Bitrate, Config, RetryPolicy, UnsupportedBitrate, DEFAULT_ALIVE_TIMEOUT_MS};

mod filter;
pub use filter::{Filter, FilterError, FilterTable, MAX_FILTERS};

mod frame;
pub use frame::CanFrame;

pub mod hal;

pub mod id;
pub use id::{Address, Id, IdError};

mod message;
pub use message::{Message, MAX_PAYLOAD};

pub mod timeout;
pub use timeout::{Clock, Countdown, Timeout};
