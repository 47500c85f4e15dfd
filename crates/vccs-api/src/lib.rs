// vccs-api: Wire protocol and websocket link to a voice-console backend

pub mod error;
pub mod protocol;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use protocol::{ChannelStatusEvent, Dbl, Inbound, Outbound, WireMessage};
pub use websocket::{ConnectionManager, ConnectionState, ReconnectConfig};
