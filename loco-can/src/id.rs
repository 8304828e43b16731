use core::convert::TryFrom;
use embedded_can::ExtendedId;

/// Number of bits carrying the node address in an extended identifier.
pub const ADDRESS_BITS: u32 = 18;

pub const ADDRESS_MASK: u32 = 0x3ffff;
pub const GROUP_MASK: u16 = 0x07ff;

/// Max 29-bit CAN identifier value.
pub const EXT_ID_MAX: u32 = 0x1fff_ffff;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IdError {
    AddressOutOfRange,
    GroupIdOutOfRange,
    InvalidId,
}

pub type Result<T> = core::result::Result<T, IdError>;

/// 18-bit node address. Addresses derived from a hardware id only ever use
/// the low 16 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(u32);

impl Address {
    /// Source address reported for standard (11-bit) frames.
    pub const NONE: Address = Address(0);

    pub fn new(address: u32) -> Result<Self> {
        if address & !ADDRESS_MASK != 0 {
            return Err(IdError::AddressOutOfRange);
        }
        Ok(Address(address))
    }

    /// Keeps the low 16 bits of a hash, so the top two address bits are
    /// always zero.
    pub fn from_hash(hash: u32) -> Self {
        Address(hash & 0xffff)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:05x}", self.0)
    }
}

/// 29-bit extended identifier: `group << 18 | address`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Id(u32);

impl Id {
    /// Packs a group id and a node address.
    ///
    /// Group ids wider than 11 bits are not rejected: the shifted value is
    /// cut to 29 bits, so only the low 11 bits of `group` reach the wire.
    /// Use [`Id::try_new`] to reject them instead.
    pub fn new(group: u16, address: Address) -> Self {
        Id((((group as u32) << ADDRESS_BITS) | address.value()) & EXT_ID_MAX)
    }

    pub fn try_new(group: u16, address: Address) -> Result<Self> {
        if group & !GROUP_MASK != 0 {
            return Err(IdError::GroupIdOutOfRange);
        }
        Ok(Self::new(group, address))
    }

    pub fn group(&self) -> u16 {
        (self.0 >> ADDRESS_BITS) as u16
    }

    pub fn source(&self) -> Address {
        Address(self.0 & ADDRESS_MASK)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl core::fmt::Debug for Id {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Id")
            .field("group", &self.group())
            .field("source", &self.source())
            .finish()
    }
}

impl TryFrom<u32> for Id {
    type Error = IdError;

    fn try_from(val: u32) -> Result<Id> {
        validate_id(&val)?;

        Ok(Id(val))
    }
}

fn validate_id(id: &u32) -> Result<()> {
    if id & !EXT_ID_MAX > 0 {
        return Err(IdError::InvalidId);
    }
    Ok(())
}

impl From<Id> for ExtendedId {
    fn from(id: Id) -> Self {
        // Id is masked to 29 bits on every construction path
        ExtendedId::new(id.value()).unwrap_or(ExtendedId::MAX)
    }
}

impl From<Id> for embedded_can::Id {
    fn from(id: Id) -> Self {
        embedded_can::Id::Extended(id.into())
    }
}

impl From<ExtendedId> for Id {
    fn from(id: ExtendedId) -> Self {
        Id(id.as_raw())
    }
}

/// Splits a received identifier into group id and source address.
///
/// Standard frames carry no address: the whole identifier is the group id
/// and the source is [`Address::NONE`].
pub fn decode(id: embedded_can::Id) -> (u16, Address) {
    match id {
        embedded_can::Id::Extended(ext) => {
            let id = Id::from(ext);
            (id.group(), id.source())
        }
        embedded_can::Id::Standard(base) => (base.as_raw(), Address::NONE),
    }
}

#[cfg(test)]
mod tests {
    use crate::id::{decode, EXT_ID_MAX};
    use crate::{Address, Id, IdError};
    use core::convert::TryFrom;
    use embedded_can::{ExtendedId, StandardId};

    #[test]
    fn id_new() {
        struct TestCase {
            id: u32,
            group: u16,
            address: u32,
        }
        let test_cases = [
            TestCase {
                id: 0x0000_0000,
                group: 0,
                address: 0,
            },
            TestCase {
                id: 0x0004_0000,
                group: 1,
                address: 0,
            },
            TestCase {
                id: 0x0128_beef,
                group: 0x4a,
                address: 0xbeef,
            },
            TestCase {
                id: 0x1fff_ffff,
                group: 0x7ff,
                address: 0x3ffff,
            },
            TestCase {
                id: 0x1ffc_0001,
                group: 0x7ff,
                address: 1,
            },
        ];
        for i in &test_cases {
            let address = Address::new(i.address).expect("Invalid address");
            let id = Id::new(i.group, address);
            assert_eq!(id.value(), i.id);
            assert_eq!(id.group(), i.group);
            assert_eq!(id.source(), address);
        }
    }

    #[test]
    fn id_round_trip_edges() {
        for &group in &[0u16, 1, 0x155, 0x2aa, 0x400, 0x7fe, 0x7ff] {
            for &address in &[0u32, 1, 0xffff, 0x10000, 0x2aaaa, 0x3ffff] {
                let address = Address::new(address).unwrap();
                let raw = Id::new(group, address).value();
                let ext = ExtendedId::new(raw).expect("not a 29-bit id");
                assert_eq!(decode(ext.into()), (group, address));
            }
        }
    }

    #[test]
    fn id_oversized_group_truncates() {
        let address = Address::new(0x1234).unwrap();
        let id = Id::new(0x0fff, address);
        assert!(id.value() <= EXT_ID_MAX);
        assert_eq!(id.group(), 0x7ff);
        assert_eq!(id.source(), address);

        assert_eq!(
            Id::try_new(0x0800, address),
            Err(IdError::GroupIdOutOfRange)
        );
        assert!(Id::try_new(0x07ff, address).is_ok());
    }

    #[test]
    fn id_try_from() {
        assert!(Id::try_from(0x1fff_ffff).is_ok());
        assert_eq!(Id::try_from(0x2000_0000), Err(IdError::InvalidId));

        let id = Id::try_from(0x0128_beef).unwrap();
        assert_eq!(id.group(), 0x4a);
        assert_eq!(id.source().value(), 0xbeef);
    }

    #[test]
    fn address_bounds() {
        assert!(Address::new(0x3ffff).is_ok());
        assert_eq!(Address::new(0x40000), Err(IdError::AddressOutOfRange));
        assert_eq!(Address::from_hash(0xdead_beef).value(), 0xbeef);
    }

    #[test]
    fn decode_standard_frame() {
        let base = StandardId::new(0x123).unwrap();
        assert_eq!(decode(base.into()), (0x123, Address::NONE));
    }
}
