//! A named-data networking face whose operations can be called from any thread.
//!
//! - [`Node`] is the base client. It owns the pending-interest table and the other protocol tables and talks to a
//!   [`Transport`]. It is not thread safe.
//! - [`ThreadsafeFace`] is a cheap, cloneable handle that hands every operation off to the [`EventLoop`] that owns
//!   the node. All callbacks run on the thread driving the event loop.
mod config;
mod errors;
mod event_loop;
mod node;
mod scheduler;
mod threadsafe_face;
mod transport;

pub use config::FaceConfig;
pub use errors::{ConfigError, FaceError, TransportError};
pub use event_loop::{EventLoop, LoopExit};
pub use node::{Node, OnInterest, OnRegisterFailed};
pub use scheduler::{NodeCallback, Scheduler};
pub use threadsafe_face::{FaceCommand, LoopCallback, StopPredicate, ThreadsafeFace};
pub use transport::{LoopbackTransport, RegistrationOptions, Transport};
