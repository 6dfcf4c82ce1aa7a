//! Decoded provisioning transport requests.
//!
//! The web/DNS captive-portal layer is an external collaborator; it decodes
//! its JSON frames into these requests and relays the per-request status
//! back to the configuring client. The orchestrator handles each request
//! synchronously.

use core::net::Ipv4Addr;

/// A request arriving from the provisioning transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningRequest<'a> {
    /// Kick off an asynchronous scan for nearby networks; results flow back
    /// through the transport.
    ScanNetworks,
    /// Join a network with fresh credentials (switches to automatic
    /// addressing).
    SetCredentials { ssid: &'a str, password: &'a str },
    /// Rename the device.
    SetDeviceName { name: &'a str },
    /// Switch to a static addressing configuration.
    SetStaticNetwork {
        local_ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet_mask: Ipv4Addr,
    },
    /// Operator-requested reboot; the only terminal action the device knows.
    Reboot,
}

/// Per-request status reported back through the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Success,
    Fail,
}
