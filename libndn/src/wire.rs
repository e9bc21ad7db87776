//! Encoding of interests and data for the transport.
//!
//! The face only needs "packet in, bytes out" and back again. [`JsonWireFormat`] is the format used by default;
//! other encoders plug in through [`WireFormat`].

use crate::data::Data;
use crate::error::WireError;
use crate::interest::Interest;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packet {
    Interest(Interest),
    Data(Data),
}

pub trait WireFormat: Send {
    fn encode(&self, packet: &Packet) -> Result<Vec<u8>, WireError>;
    fn decode(&self, element: &[u8]) -> Result<Packet, WireError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct JsonWireFormat;

impl WireFormat for JsonWireFormat {
    fn encode(&self, packet: &Packet) -> Result<Vec<u8>, WireError> {
        serde_json::to_vec(packet).map_err(WireError::Encode)
    }

    fn decode(&self, element: &[u8]) -> Result<Packet, WireError> {
        serde_json::from_slice(element).map_err(WireError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn interest_survives_encoding() {
        let interest = Interest::new("/a/b".parse().unwrap())
            .with_exclude("x")
            .with_interest_lifetime(Duration::from_millis(1500))
            .with_nonce(42);
        let format = JsonWireFormat;
        let bytes = format.encode(&Packet::Interest(interest.clone())).unwrap();
        assert_eq!(format.decode(&bytes).unwrap(), Packet::Interest(interest));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(JsonWireFormat.decode(b"\x05\x01garbage"), Err(WireError::Decode(_))));
    }
}
