//! Transport Layer for the Chatbox
//!
//! Everything below the controller: the OSC wire format, the send primitive
//! abstraction and its implementations.
//! - `UdpSender`: fire-and-forget OSC over UDP to a live client
//! - `InMemorySender`: records messages for tests and headless hosts
//!
//! Delivery is best effort. There are no acknowledgements, retries or
//! backpressure; a failed send is logged by the caller and the message is lost.

pub mod config;
pub mod factory;
pub mod in_memory;
pub mod osc;
pub mod traits;
pub mod udp;

// Re-exports for convenience
pub use config::{ChatboxUiConfig, MarqueeMode, TransportConfig};
pub use factory::create_sender;
pub use in_memory::InMemorySender;
pub use osc::{OscArg, OscMessage, MAX_PACKET_SIZE};
pub use traits::{SendPrimitive, TransportError};
pub use udp::UdpSender;
