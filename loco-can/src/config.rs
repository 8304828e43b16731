use core::convert::TryFrom;
use core::num::NonZeroU32;

/// Liveness window armed by `begin`.
pub const DEFAULT_ALIVE_TIMEOUT_MS: u32 = 500;

/// Supported bus speeds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Bitrate {
    Kbps1000,
    Kbps500,
    Kbps250,
    Kbps200,
    Kbps125,
    Kbps100,
    Kbps80,
    Kbps50,
    Kbps40,
    Kbps20,
    Kbps10,
    Kbps5,
}

impl Bitrate {
    pub fn bits_per_second(&self) -> u32 {
        match self {
            Bitrate::Kbps1000 => 1_000_000,
            Bitrate::Kbps500 => 500_000,
            Bitrate::Kbps250 => 250_000,
            Bitrate::Kbps200 => 200_000,
            Bitrate::Kbps125 => 125_000,
            Bitrate::Kbps100 => 100_000,
            Bitrate::Kbps80 => 80_000,
            Bitrate::Kbps50 => 50_000,
            Bitrate::Kbps40 => 40_000,
            Bitrate::Kbps20 => 20_000,
            Bitrate::Kbps10 => 10_000,
            Bitrate::Kbps5 => 5_000,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UnsupportedBitrate(pub u32);

impl TryFrom<u32> for Bitrate {
    type Error = UnsupportedBitrate;

    /// Accepts a speed in bits per second.
    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        let bitrate = match bps {
            1_000_000 => Bitrate::Kbps1000,
            500_000 => Bitrate::Kbps500,
            250_000 => Bitrate::Kbps250,
            200_000 => Bitrate::Kbps200,
            125_000 => Bitrate::Kbps125,
            100_000 => Bitrate::Kbps100,
            80_000 => Bitrate::Kbps80,
            50_000 => Bitrate::Kbps50,
            40_000 => Bitrate::Kbps40,
            20_000 => Bitrate::Kbps20,
            10_000 => Bitrate::Kbps10,
            5_000 => Bitrate::Kbps5,
            _ => return Err(UnsupportedBitrate(bps)),
        };
        Ok(bitrate)
    }
}

/// How `begin` retries a transceiver that will not start.
///
/// Each failed attempt blinks the indicator: on for `on_ms`, then off for
/// `off_ms`. After a successful start the indicator stays on for
/// `settle_ms` before it is turned off.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub on_ms: u32,
    pub off_ms: u32,
    pub settle_ms: u32,
    /// `None` retries until the transceiver starts.
    pub max_attempts: Option<NonZeroU32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            on_ms: 250,
            off_ms: 1000,
            settle_ms: 150,
            max_attempts: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    pub alive_timeout_ms: u32,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            alive_timeout_ms: DEFAULT_ALIVE_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn alive_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.alive_timeout_ms = timeout_ms;
        self
    }

    /// Gives up after `attempts` failed starts. Zero keeps retrying.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = NonZeroU32::new(attempts);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Bitrate, Config, UnsupportedBitrate};
    use core::convert::TryFrom;

    #[test]
    fn bitrate_try_from() {
        struct TestCase {
            bps: u32,
            bitrate: Result<Bitrate, UnsupportedBitrate>,
        }
        let test_cases = [
            TestCase {
                bps: 500_000,
                bitrate: Ok(Bitrate::Kbps500),
            },
            TestCase {
                bps: 5_000,
                bitrate: Ok(Bitrate::Kbps5),
            },
            TestCase {
                bps: 1_000_000,
                bitrate: Ok(Bitrate::Kbps1000),
            },
            TestCase {
                bps: 33_333,
                bitrate: Err(UnsupportedBitrate(33_333)),
            },
        ];
        for i in &test_cases {
            let bitrate = Bitrate::try_from(i.bps);
            assert_eq!(bitrate, i.bitrate);
            if let Ok(bitrate) = bitrate {
                assert_eq!(bitrate.bits_per_second(), i.bps);
            }
        }
    }

    #[test]
    fn config_defaults() {
        let config = Config::default();
        assert_eq!(config.alive_timeout_ms, 500);
        assert_eq!(config.retry.on_ms, 250);
        assert_eq!(config.retry.off_ms, 1000);
        assert_eq!(config.retry.settle_ms, 150);
        assert_eq!(config.retry.max_attempts, None);

        assert_eq!(Config::default().max_attempts(0).retry.max_attempts, None);
        assert_eq!(
            Config::default().max_attempts(3).retry.max_attempts.map(|n| n.get()),
            Some(3)
        );
    }
}
