//! Capability traits for the network stack and the broker client, plus the
//! event types their shells feed back into the orchestrator.
//!
//! The core never implements either protocol; it issues commands through
//! these traits and reacts to the events. Command failures are logged and
//! degraded by the callers (retry later / ignore and continue), never
//! propagated as faults.

/// Station-mode network attachment.
///
/// `join`, `configure_static`, `set_provisioning_ap` and `start_scan` are the
/// command surface the provisioning operations and the orchestrator's
/// AP+station dual-mode policy require.
pub trait NetworkLink {
    type Error: core::fmt::Debug;

    /// Begin association using the stored credentials. Fire-and-forget: the
    /// outcome arrives as a [`NetworkEvent`].
    fn associate(&mut self) -> Result<(), Self::Error>;

    fn is_associated(&self) -> bool;

    /// Begin association with fresh credentials (provisioning).
    fn join(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// Apply a static addressing configuration.
    fn configure_static(
        &mut self,
        local_ip: core::net::Ipv4Addr,
        gateway: core::net::Ipv4Addr,
        subnet_mask: core::net::Ipv4Addr,
    ) -> Result<(), Self::Error>;

    /// Host (or stop hosting) the local provisioning access point while
    /// remaining a station.
    fn set_provisioning_ap(&mut self, enabled: bool) -> Result<(), Self::Error>;

    /// Kick off an asynchronous network scan; results flow back through the
    /// provisioning transport.
    fn start_scan(&mut self) -> Result<(), Self::Error>;
}

/// Message-broker session client.
pub trait BrokerLink {
    type Error: core::fmt::Debug;

    /// Fire-and-forget connection attempt; the outcome arrives as a
    /// [`BrokerEvent::Connected`].
    fn connect(&mut self) -> Result<(), Self::Error>;

    fn disconnect(&mut self) -> Result<(), Self::Error>;

    fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), Self::Error>;

    fn publish(
        &mut self,
        topic: &str,
        qos: u8,
        retain: bool,
        payload: &[u8],
    ) -> Result<(), Self::Error>;
}

/// Network stack events, marshalled onto the orchestrator's thread of
/// control by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    Associated,
    /// Association lost; `reason` is the stack's disconnect reason code.
    Disassociated { reason: u8 },
}

/// Broker client events.
#[derive(Debug, Clone, Copy)]
pub enum BrokerEvent<'a> {
    Connected { session_present: bool },
    Message { topic: &'a str, payload: &'a [u8] },
}
