use crate::errors::TransportError;
use futures::channel::mpsc::{self, TryRecvError};
use libndn::Name;
use log::*;

/// Flags sent along with a prefix registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistrationOptions {
    /// Interests for longer names under the prefix are also forwarded to this face.
    pub child_inherit: bool,
    /// Interests under the prefix are not forwarded to faces registered for shorter prefixes.
    pub capture: bool,
}

impl Default for RegistrationOptions {
    fn default() -> Self {
        Self { child_inherit: true, capture: false }
    }
}

/// The link between a [`crate::Node`] and its forwarder.
///
/// All methods are called from the thread that owns the node and must not block.
pub trait Transport: Send {
    /// Send one encoded element.
    fn send(&mut self, element: &[u8]) -> Result<(), TransportError>;

    /// Return the next complete element that has arrived, or `None` if nothing is waiting.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Ask the forwarder to route interests for `prefix` to this face. The default accepts every prefix.
    fn register_prefix(&mut self, prefix: &Name, options: RegistrationOptions) -> Result<(), TransportError> {
        trace!("Registering {prefix} (child_inherit: {}, capture: {})", options.child_inherit, options.capture);
        Ok(())
    }

    fn close(&mut self) {}
}

/// An in-process transport. Each half of a [`LoopbackTransport::pair`] receives what the other half sends.
pub struct LoopbackTransport {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    closed: bool,
}

impl LoopbackTransport {
    pub fn pair() -> (LoopbackTransport, LoopbackTransport) {
        let (a_tx, a_rx) = mpsc::unbounded();
        let (b_tx, b_rx) = mpsc::unbounded();
        (
            LoopbackTransport { outbound: a_tx, inbound: b_rx, closed: false },
            LoopbackTransport { outbound: b_tx, inbound: a_rx, closed: false },
        )
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, element: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.outbound.unbounded_send(element.to_vec()).map_err(|_| TransportError::Closed)
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.closed {
            return Ok(None);
        }
        match self.inbound.try_recv() {
            Ok(element) => Ok(Some(element)),
            Err(TryRecvError::Empty) => Ok(None),
            // The other half has gone away. Report it once.
            Err(TryRecvError::Closed) => {
                self.closed = true;
                Err(TransportError::Closed)
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.outbound.close_channel();
        self.inbound.close();
    }
}
