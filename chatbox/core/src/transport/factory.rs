//! Transport Factory
//!
//! Creates the send primitive a [`TransportConfig`] describes.

use std::sync::Arc;

use super::{
    config::TransportConfig,
    traits::{SendPrimitive, TransportError},
    udp::UdpSender,
};

/// Create the UDP send primitive for the configured target
///
/// # Errors
///
/// Returns whatever [`UdpSender::connect`] returns: `InvalidTarget` for an
/// empty host or port 0, `Resolve` for an unknown host, `Io` if no local
/// socket can be bound.
///
/// # Example
///
/// ```ignore
/// use chatbox_core::transport::{create_sender, TransportConfig};
///
/// let sender = create_sender(&TransportConfig::default())?;
/// tracing::info!(target = %sender.describe(), "ready");
/// ```
pub fn create_sender(config: &TransportConfig) -> Result<Arc<dyn SendPrimitive>, TransportError> {
    let sender = UdpSender::connect(&config.host, config.port)?;
    Ok(Arc::new(sender))
}
