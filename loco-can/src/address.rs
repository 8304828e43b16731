//! Node address derivation.
//!
//! Every node derives its bus address once at construction from an
//! [`AddressProvider`]. On hardware this is [`HashedUid`], which compresses
//! the board's 8-byte unique id with a 32-bit hash and keeps the low 16
//! bits. Collisions are possible but unlikely on a small bus.

use core::marker::PhantomData;

use crate::Address;

/// Length of a hardware unique id.
pub const UID_LEN: usize = 8;

pub trait AddressProvider {
    fn address(&self) -> Address;
}

/// A hand-assigned address, mostly useful in tests.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedAddress(pub Address);

impl AddressProvider for FixedAddress {
    fn address(&self) -> Address {
        self.0
    }
}

/// Non-cryptographic hash used to compress a hardware unique id.
pub trait UidHash {
    fn hash(data: &[u8]) -> u32;
}

/// Address derived from a board's hardware unique id.
pub struct HashedUid<H = SuperFastHash> {
    uid: [u8; UID_LEN],
    _hash: PhantomData<H>,
}

impl HashedUid<SuperFastHash> {
    pub fn new(uid: [u8; UID_LEN]) -> Self {
        Self::with_hash(uid)
    }
}

impl<H: UidHash> HashedUid<H> {
    pub fn with_hash(uid: [u8; UID_LEN]) -> Self {
        HashedUid {
            uid,
            _hash: PhantomData,
        }
    }

    pub fn uid(&self) -> &[u8; UID_LEN] {
        &self.uid
    }
}

impl<H: UidHash> AddressProvider for HashedUid<H> {
    fn address(&self) -> Address {
        Address::from_hash(H::hash(&self.uid))
    }
}

/// Paul Hsieh's SuperFastHash.
pub struct SuperFastHash;

fn get16(data: &[u8]) -> u32 {
    ((data[1] as u32) << 8) | data[0] as u32
}

impl UidHash for SuperFastHash {
    fn hash(data: &[u8]) -> u32 {
        if data.is_empty() {
            return 0;
        }

        let mut hash = data.len() as u32;

        let mut chunks = data.chunks_exact(4);
        for chunk in &mut chunks {
            hash = hash.wrapping_add(get16(&chunk[0..2]));
            let tmp = (get16(&chunk[2..4]) << 11) ^ hash;
            hash = (hash << 16) ^ tmp;
            hash = hash.wrapping_add(hash >> 11);
        }

        // trailing bytes are read as signed chars
        let tail = chunks.remainder();
        match tail.len() {
            3 => {
                hash = hash.wrapping_add(get16(tail));
                hash ^= hash << 16;
                hash ^= ((tail[2] as i8 as i32) << 18) as u32;
                hash = hash.wrapping_add(hash >> 11);
            }
            2 => {
                hash = hash.wrapping_add(get16(tail));
                hash ^= hash << 11;
                hash = hash.wrapping_add(hash >> 17);
            }
            1 => {
                hash = hash.wrapping_add(tail[0] as i8 as u32);
                hash ^= hash << 10;
                hash = hash.wrapping_add(hash >> 1);
            }
            _ => {}
        }

        // avalanche
        hash ^= hash << 3;
        hash = hash.wrapping_add(hash >> 5);
        hash ^= hash << 4;
        hash = hash.wrapping_add(hash >> 17);
        hash ^= hash << 25;
        hash = hash.wrapping_add(hash >> 6);

        hash
    }
}
