//! Desktop simulator for the hearth-rs device runtime.
//!
//! Wires the hardware-independent orchestrator to mock network, broker and
//! settings capabilities and replays a scripted day-in-the-life scenario:
//! boot, association, broker session, a remote action, a short press, a
//! network outage (watch the red "network lost" blink appear after the
//! retry interval), a long press into provisioning (blue blink), a couple
//! of provisioning requests, and the long press back out.
//!
//! Time is virtual: the loop advances 10 ms per iteration instead of
//! sleeping, so the whole ~80 s scenario replays in well under a second.
//! Pixel changes and capability calls are printed through `env_logger`
//! (`RUST_LOG=info` recommended, `debug` for the full picture).

use std::cell::Cell;
use std::rc::Rc;

use embassy_time::Instant;
use log::info;
use rgb::RGB8;

use hearth_core::link::{BrokerEvent, BrokerLink, NetworkEvent, NetworkLink};
use hearth_core::orchestrator::Orchestrator;
use hearth_core::provisioning::ProvisioningRequest;
use hearth_core::settings::{self, DeviceSettings, SettingsStore};

/// Virtual milliseconds per loop iteration.
const TICK_MS: u64 = 10;

/// End of the scripted scenario.
const SCENARIO_END_MS: u64 = 80_000;

// ---------------------------------------------------------------------------
// Mock capabilities
// ---------------------------------------------------------------------------

/// Station mock: logs every command; association state is flipped by the
/// scenario script, the way the real stack's events race ahead of the
/// orchestrator's view.
struct SimNetwork {
    associated: Rc<Cell<bool>>,
}

impl NetworkLink for SimNetwork {
    type Error = std::convert::Infallible;

    fn associate(&mut self) -> Result<(), Self::Error> {
        info!("network: association requested");
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.associated.get()
    }

    fn join(&mut self, ssid: &str, _password: &str) -> Result<(), Self::Error> {
        info!("network: joining '{ssid}'");
        Ok(())
    }

    fn configure_static(
        &mut self,
        local_ip: core::net::Ipv4Addr,
        gateway: core::net::Ipv4Addr,
        subnet_mask: core::net::Ipv4Addr,
    ) -> Result<(), Self::Error> {
        info!("network: static config {local_ip}/{subnet_mask} via {gateway}");
        Ok(())
    }

    fn set_provisioning_ap(&mut self, enabled: bool) -> Result<(), Self::Error> {
        info!(
            "network: provisioning AP {}",
            if enabled { "up" } else { "down" }
        );
        Ok(())
    }

    fn start_scan(&mut self) -> Result<(), Self::Error> {
        info!("network: scan started");
        Ok(())
    }
}

/// Broker mock: logs commands and payloads.
struct SimBroker;

impl BrokerLink for SimBroker {
    type Error = std::convert::Infallible;

    fn connect(&mut self) -> Result<(), Self::Error> {
        info!("broker: connect requested");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        info!("broker: disconnect requested");
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), Self::Error> {
        info!("broker: subscribed to {topic} (qos {qos})");
        Ok(())
    }

    fn publish(
        &mut self,
        topic: &str,
        qos: u8,
        _retain: bool,
        payload: &[u8],
    ) -> Result<(), Self::Error> {
        info!(
            "broker: publish {topic} (qos {qos}): {}",
            String::from_utf8_lossy(payload)
        );
        Ok(())
    }
}

/// Settings store holding the encoded blob in memory, exercising the same
/// postcard codec the firmware's flash store uses.
#[derive(Default)]
struct BlobStore {
    blob: Option<Vec<u8>>,
}

#[derive(Debug)]
enum BlobStoreError {
    Empty,
    Codec(settings::SettingsError),
}

impl SettingsStore for BlobStore {
    type Error = BlobStoreError;

    fn load(&mut self) -> Result<DeviceSettings, Self::Error> {
        let blob = self.blob.as_deref().ok_or(BlobStoreError::Empty)?;
        settings::decode(blob).map_err(BlobStoreError::Codec)
    }

    fn save(&mut self, settings: &DeviceSettings) -> Result<(), Self::Error> {
        let mut buf = [0u8; settings::SETTINGS_BLOB_MAX];
        let used = settings::encode(settings, &mut buf).map_err(BlobStoreError::Codec)?;
        self.blob = Some(used.to_vec());
        info!("store: saved {} byte settings blob", used.len());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scenario script
// ---------------------------------------------------------------------------

enum ScenarioEvent {
    NetworkUp,
    NetworkDown { reason: u8 },
    BrokerUp,
    Inbound {
        topic: &'static str,
        payload: &'static [u8],
    },
    Provision(ProvisioningRequest<'static>),
    SensorReport { name: &'static str, value: f32 },
}

fn script() -> Vec<(u64, ScenarioEvent)> {
    use ScenarioEvent::*;
    vec![
        (1_000, NetworkUp),
        (1_500, BrokerUp),
        (2_000, Inbound {
            topic: "device/SIM-0001/action",
            payload: br#"{"name": "blink", "parameters": [3]}"#,
        }),
        (2_500, Inbound {
            topic: "device/SIM-0001/schedule_update",
            payload: br#"{"name": "blink", "cron": "0 7 * * *", "parameters": []}"#,
        }),
        (3_000, SensorReport {
            name: "temperature",
            value: 21.87,
        }),
        // An unknown action and a malformed payload: both dropped silently.
        (4_000, Inbound {
            topic: "device/SIM-0001/action",
            payload: br#"{"name": "frobnicate"}"#,
        }),
        (4_100, Inbound {
            topic: "device/SIM-0001/action",
            payload: b"{ not json",
        }),
        // Outage: the red blink shows up 20 s later, until the network is back.
        (8_000, NetworkDown { reason: 8 }),
        (34_000, NetworkUp),
        (34_500, BrokerUp),
        // Provisioning requests while the AP is up (long press at 40 s).
        (47_000, Provision(ProvisioningRequest::ScanNetworks)),
        (48_000, Provision(ProvisioningRequest::SetCredentials {
            ssid: "HomeNet",
            password: "hunter2",
        })),
        (49_000, Provision(ProvisioningRequest::SetDeviceName {
            name: "Hallway Sensor",
        })),
        // Back to normal duty (long press at 60 s).
        (67_000, BrokerUp),
        (70_000, SensorReport {
            name: "temperature",
            value: 22.14,
        }),
    ]
}

/// Scripted button level: one short press, then a long press into
/// provisioning at 40 s and another back out at 60 s.
fn button_level(ms: u64) -> bool {
    const PRESSES: [(u64, u64); 3] = [(5_000, 5_200), (40_000, 45_500), (60_000, 65_500)];
    PRESSES.iter().any(|&(from, to)| (from..to).contains(&ms))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting hearth-rs simulator");

    let associated = Rc::new(Cell::new(false));
    let network = SimNetwork {
        associated: Rc::clone(&associated),
    };
    let mut orchestrator =
        Orchestrator::new(network, SimBroker, BlobStore::default(), "SIM-0001");

    orchestrator.set_on_button_press(|| info!("app: button pressed"));
    orchestrator.add_action_handler("blink", |params| {
        info!("app: blink action, parameters {params:?}");
    });
    orchestrator.add_scheduled_action_handler("blink", |cron, _| {
        info!("app: blink rescheduled to '{cron}'");
    });

    orchestrator.start();

    let script = script();
    let mut next_event = 0;
    let mut pixel: Option<RGB8> = None;

    let mut virtual_ms: u64 = 0;
    while virtual_ms <= SCENARIO_END_MS {
        let now = Instant::from_millis(virtual_ms);

        while next_event < script.len() && script[next_event].0 <= virtual_ms {
            match &script[next_event].1 {
                ScenarioEvent::NetworkUp => {
                    associated.set(true);
                    orchestrator.handle_network_event(NetworkEvent::Associated, now);
                }
                ScenarioEvent::NetworkDown { reason } => {
                    associated.set(false);
                    orchestrator.handle_network_event(
                        NetworkEvent::Disassociated { reason: *reason },
                        now,
                    );
                }
                ScenarioEvent::BrokerUp => {
                    orchestrator.handle_broker_event(
                        BrokerEvent::Connected {
                            session_present: false,
                        },
                        now,
                    );
                }
                ScenarioEvent::Inbound { topic, payload } => {
                    orchestrator.handle_broker_event(
                        BrokerEvent::Message { topic, payload },
                        now,
                    );
                }
                ScenarioEvent::Provision(request) => {
                    let status = orchestrator.handle_provisioning_request(*request);
                    info!("provisioning: {request:?} -> {status:?}");
                }
                ScenarioEvent::SensorReport { name, value } => {
                    if !orchestrator.publish_sensor_reading(name, *value) {
                        info!("app: sensor report '{name}' dropped (no broker session)");
                    }
                }
            }
            next_event += 1;
        }

        if let Some(color) = orchestrator.poll(now, button_level(virtual_ms)) {
            if pixel != Some(color) {
                info!(
                    "[{:>6} ms] pixel -> #{:02X}{:02X}{:02X}",
                    virtual_ms, color.r, color.g, color.b
                );
            }
            pixel = Some(color);
        }

        if orchestrator.reboot_pending() {
            info!("shell: reboot requested, ending scenario");
            break;
        }

        virtual_ms += TICK_MS;
    }

    info!(
        "Scenario complete: device '{}', mode {:?}, connectivity {:?}",
        orchestrator.device_name(),
        orchestrator.mode(),
        orchestrator.connectivity_state()
    );
}
