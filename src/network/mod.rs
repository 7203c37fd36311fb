//! Network Module
//!
//! Connection to the E-LIP controller.
//!
//! ## Architecture
//! - `Transport`: one TCP connection, no retry policy
//! - `Session`: dedicated worker thread driving the transport through
//!   connect → serve → reconnect, fed by a FIFO of outbound messages

mod transport;
mod session;

pub use transport::{TcpTransport, Transport};
pub use session::{ConnectionState, InboundHandler, Session};
