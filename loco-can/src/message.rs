use crate::Address;

/// Max payload carried by a single frame.
pub const MAX_PAYLOAD: usize = 8;

/// A received frame, split into group id, sender address and payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    id: u16,
    source: Address,
    data: [u8; MAX_PAYLOAD],
    len: usize,
}

impl Message {
    /// Builds a message, keeping at most [`MAX_PAYLOAD`] bytes of `data`.
    pub fn new(id: u16, source: Address, data: &[u8]) -> Self {
        let len = data.len().min(MAX_PAYLOAD);
        let mut message = Message {
            id,
            source,
            data: [0; MAX_PAYLOAD],
            len,
        };
        message.data[..len].copy_from_slice(&data[..len]);
        message
    }

    /// Group id the sender assigned.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Sender address, [`Address::NONE`] for standard frames.
    pub fn source(&self) -> Address {
        self.source
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
