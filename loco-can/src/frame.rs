use embedded_can::Id;

use crate::message::MAX_PAYLOAD;

/// A CAN data or remote frame.
#[derive(Clone, Debug, PartialEq)]
pub struct CanFrame {
    id: Id,
    remote: bool,
    dlc: usize,
    data: [u8; MAX_PAYLOAD],
}

impl embedded_can::Frame for CanFrame {
    /// Creates a new data frame, `None` if `data` exceeds 8 bytes.
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_PAYLOAD {
            return None;
        }
        let mut frame = Self {
            id: id.into(),
            remote: false,
            dlc: data.len(),
            data: [0; MAX_PAYLOAD],
        };
        frame.data[0..data.len()].copy_from_slice(data);
        Some(frame)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_PAYLOAD {
            return None;
        }
        Some(Self {
            id: id.into(),
            remote: true,
            dlc,
            data: [0; MAX_PAYLOAD],
        })
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    /// Returns the frame data, empty for remote frames.
    fn data(&self) -> &[u8] {
        if self.remote {
            &[]
        } else {
            &self.data[0..self.dlc]
        }
    }
}
