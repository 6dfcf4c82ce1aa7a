//! Broker session adapter: rust-mqtt over an embassy-net TCP socket.
//!
//! Mirrors the network adapter's shape: the core's [`BrokerLink`] handle
//! queues commands, [`broker_task`] owns the socket and the MQTT client and
//! pushes session events and inbound messages back through
//! [`BROKER_UPDATES`].

use embassy_futures::select::{Either, select};
use embassy_net::Stack;
use embassy_net::tcp::TcpSocket;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use heapless::{String, Vec};
use log::{info, warn};
use rust_mqtt::client::client::MqttClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::utils::rng_generator::CountingRng;

use hearth_core::link::BrokerLink;
use hearth_core::topics::TOPIC_MAX;

pub const BROKER_HOST: (u8, u8, u8, u8) = (192, 168, 1, 2);
pub const BROKER_PORT: u16 = 1883;

pub const PAYLOAD_MAX: usize = 512;
const MQTT_BUFFER_SIZE: usize = 1024;

/// Commands queued by the core's [`BrokerLink`] handle.
pub enum BrokerCommand {
    Connect,
    Disconnect,
    Subscribe {
        topic: String<TOPIC_MAX>,
        qos: u8,
    },
    Publish {
        topic: String<TOPIC_MAX>,
        qos: u8,
        retain: bool,
        payload: Vec<u8, PAYLOAD_MAX>,
    },
}

/// Session events and inbound messages for the orchestrator loop.
pub enum BrokerUpdate {
    Connected {
        session_present: bool,
    },
    Message {
        topic: String<TOPIC_MAX>,
        payload: Vec<u8, PAYLOAD_MAX>,
    },
}

pub static BROKER_COMMANDS: Channel<CriticalSectionRawMutex, BrokerCommand, 8> = Channel::new();
pub static BROKER_UPDATES: Channel<CriticalSectionRawMutex, BrokerUpdate, 8> = Channel::new();

#[derive(Debug)]
pub struct CommandQueueFull;

/// The core-facing handle.
pub struct BrokerHandle;

fn enqueue(command: BrokerCommand) -> Result<(), CommandQueueFull> {
    BROKER_COMMANDS.try_send(command).map_err(|_| CommandQueueFull)
}

fn bounded_topic(topic: &str) -> String<TOPIC_MAX> {
    let mut out = String::new();
    let _ = out.push_str(topic);
    out
}

impl BrokerLink for BrokerHandle {
    type Error = CommandQueueFull;

    fn connect(&mut self) -> Result<(), Self::Error> {
        enqueue(BrokerCommand::Connect)
    }

    fn disconnect(&mut self) -> Result<(), Self::Error> {
        enqueue(BrokerCommand::Disconnect)
    }

    fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), Self::Error> {
        enqueue(BrokerCommand::Subscribe {
            topic: bounded_topic(topic),
            qos,
        })
    }

    fn publish(
        &mut self,
        topic: &str,
        qos: u8,
        retain: bool,
        payload: &[u8],
    ) -> Result<(), Self::Error> {
        let mut bounded = Vec::new();
        bounded
            .extend_from_slice(payload)
            .map_err(|_| CommandQueueFull)?;
        enqueue(BrokerCommand::Publish {
            topic: bounded_topic(topic),
            qos,
            retain,
            payload: bounded,
        })
    }
}

/// rust-mqtt supports QoS 0/1; the device's exactly-once intent degrades to
/// at-least-once on the wire.
fn qos_for(qos: u8) -> QualityOfService {
    if qos == 0 {
        QualityOfService::QoS0
    } else {
        QualityOfService::QoS1
    }
}

/// Broker task: waits for a connect command, runs one MQTT session until it
/// drops or a disconnect command arrives, then waits again. Reconnect policy
/// lives in the core, not here.
#[embassy_executor::task]
pub async fn broker_task(stack: Stack<'static>, client_id: String<64>) {
    let mut rx_buffer = [0u8; MQTT_BUFFER_SIZE];
    let mut tx_buffer = [0u8; MQTT_BUFFER_SIZE];
    let mut mqtt_recv = [0u8; MQTT_BUFFER_SIZE];
    let mut mqtt_write = [0u8; MQTT_BUFFER_SIZE];

    loop {
        // Idle until the core asks for a session.
        loop {
            match BROKER_COMMANDS.receive().await {
                BrokerCommand::Connect => break,
                BrokerCommand::Disconnect => {}
                _ => warn!("broker command before session, dropped"),
            }
        }

        let endpoint = (
            embassy_net::Ipv4Address::new(
                BROKER_HOST.0,
                BROKER_HOST.1,
                BROKER_HOST.2,
                BROKER_HOST.3,
            ),
            BROKER_PORT,
        );

        let mut socket = TcpSocket::new(stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(60)));
        if let Err(e) = socket.connect(endpoint).await {
            warn!("broker TCP connect failed: {e:?}");
            Timer::after(Duration::from_secs(1)).await;
            continue;
        }

        let mut config: ClientConfig<'_, 5, CountingRng> =
            ClientConfig::new(MqttVersion::MQTTv5, CountingRng(20000));
        config.add_client_id(client_id.as_str());
        config.add_max_subscribe_qos(QualityOfService::QoS1);
        config.keep_alive = 60;

        let mut client = MqttClient::<_, 5, _>::new(
            socket,
            &mut mqtt_write,
            MQTT_BUFFER_SIZE,
            &mut mqtt_recv,
            MQTT_BUFFER_SIZE,
            config,
        );

        if let Err(e) = client.connect_to_broker().await {
            warn!("broker session setup failed: {e:?}");
            Timer::after(Duration::from_secs(1)).await;
            continue;
        }
        info!("broker session up");
        BROKER_UPDATES
            .send(BrokerUpdate::Connected {
                session_present: false,
            })
            .await;

        // Session loop: inbound packets and queued commands, until either
        // side ends the session.
        'session: loop {
            match select(BROKER_COMMANDS.receive(), client.receive_message()).await {
                Either::First(BrokerCommand::Connect) => {}
                Either::First(BrokerCommand::Disconnect) => {
                    let _ = client.disconnect().await;
                    info!("broker session closed");
                    break 'session;
                }
                Either::First(BrokerCommand::Subscribe { topic, qos: _ }) => {
                    if let Err(e) = client.subscribe_to_topic(topic.as_str()).await {
                        warn!("subscribe {topic} failed: {e:?}");
                    }
                }
                Either::First(BrokerCommand::Publish {
                    topic,
                    qos,
                    retain,
                    payload,
                }) => {
                    if let Err(e) = client
                        .send_message(topic.as_str(), &payload, qos_for(qos), retain)
                        .await
                    {
                        warn!("publish {topic} failed: {e:?}");
                    }
                }
                Either::Second(Ok((topic, payload))) => {
                    let mut bounded_payload = Vec::new();
                    if bounded_payload.extend_from_slice(payload).is_err() {
                        warn!("inbound payload over {PAYLOAD_MAX} bytes, dropped");
                        continue;
                    }
                    BROKER_UPDATES
                        .send(BrokerUpdate::Message {
                            topic: bounded_topic(topic),
                            payload: bounded_payload,
                        })
                        .await;
                }
                Either::Second(Err(e)) => {
                    warn!("broker session lost: {e:?}");
                    break 'session;
                }
            }
        }
    }
}
