//! Connectivity session: network association and broker session tracking.
//!
//! Owns the two link capabilities and all reconnection timing. Connection
//! attempts are fire-and-forget and retried forever on a fixed interval;
//! a lost network is never a fault, just a state the device waits out.

use embassy_time::{Duration, Instant};
use log::{debug, info, warn};

use crate::link::{BrokerLink, NetworkLink};
use crate::timer::PollTimer;
use crate::topics::{
    self, ACTION_SUFFIX, PING_SUFFIX, QOS_EXACTLY_ONCE, SCHEDULE_UPDATE_SUFFIX, Topic,
};

/// Fixed interval between "still disconnected" reports while the network is
/// down.
pub const NETWORK_RETRY_INTERVAL: Duration = Duration::from_secs(20);

/// Broker keepalive ping cadence while the session is up.
pub const BROKER_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Connectivity progress. Exactly one holder (this session); transitions
/// only through the documented event entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Disconnected,
    NetworkAssociated,
    BrokerConnected,
}

/// Tracks network-association and broker-session state and owns the retry
/// and keepalive timers.
pub struct ConnectivitySession<N: NetworkLink, B: BrokerLink> {
    network: N,
    broker: B,
    state: ConnectivityState,
    /// Set while the device is in provisioning mode: the broker session is
    /// torn down and must not be (re)established until resumed.
    suspended: bool,
    retry: PollTimer,
    ping: PollTimer,
    action_topic: Topic,
    schedule_topic: Topic,
    ping_topic: Topic,
}

impl<N: NetworkLink, B: BrokerLink> ConnectivitySession<N, B> {
    pub fn new(network: N, broker: B, serial: &str) -> Self {
        Self {
            network,
            broker,
            state: ConnectivityState::Disconnected,
            suspended: false,
            retry: PollTimer::new(NETWORK_RETRY_INTERVAL),
            ping: PollTimer::new(BROKER_PING_INTERVAL),
            action_topic: topics::device_topic(serial, ACTION_SUFFIX),
            schedule_topic: topics::device_topic(serial, SCHEDULE_UPDATE_SUFFIX),
            ping_topic: topics::device_topic(serial, PING_SUFFIX),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn is_broker_connected(&self) -> bool {
        self.state == ConnectivityState::BrokerConnected
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Begin station association at startup. Fire-and-forget.
    pub fn start(&mut self) {
        if let Err(e) = self.network.associate() {
            warn!("network association request failed: {e:?}");
        }
    }

    /// Network-associated event: connect the broker (unless suspended) and
    /// cancel the retry timer.
    pub fn on_network_associated(&mut self, _now: Instant) {
        info!("network associated");
        self.state = ConnectivityState::NetworkAssociated;
        self.retry.disarm();
        if self.suspended {
            debug!("provisioning active, not establishing broker session");
            return;
        }
        if let Err(e) = self.broker.connect() {
            warn!("broker connect request failed: {e:?}");
        }
    }

    /// Network-disassociated event: tear the broker session down and arm the
    /// fixed-interval retry timer.
    pub fn on_network_lost(&mut self, reason: u8, now: Instant) {
        warn!("network disassociated (reason {reason})");
        self.state = ConnectivityState::Disconnected;
        self.ping.disarm();
        if let Err(e) = self.broker.disconnect() {
            warn!("broker disconnect request failed: {e:?}");
        }
        if !self.suspended {
            self.retry.arm(now);
        }
    }

    /// Broker-connected event: subscribe to the device's inbound topics and
    /// start the keepalive.
    pub fn on_broker_connected(&mut self, session_present: bool, now: Instant) {
        if self.suspended {
            debug!("broker connected while suspended, ignoring");
            return;
        }
        info!("broker session established (session_present: {session_present})");
        self.state = ConnectivityState::BrokerConnected;
        for topic in [&self.action_topic, &self.schedule_topic] {
            if let Err(e) = self.broker.subscribe(topic.as_str(), QOS_EXACTLY_ONCE) {
                warn!("subscribe to {topic} failed: {e:?}");
            }
        }
        self.ping.arm(now);
    }

    /// Suspend for provisioning: tear the broker session down and disarm all
    /// timers. The network is left as-is (the orchestrator switches it into
    /// dual AP+station mode separately).
    pub fn suspend(&mut self) {
        self.suspended = true;
        self.retry.disarm();
        self.ping.disarm();
        if let Err(e) = self.broker.disconnect() {
            warn!("broker disconnect request failed: {e:?}");
        }
        if self.state == ConnectivityState::BrokerConnected {
            self.state = ConnectivityState::NetworkAssociated;
        }
    }

    /// Resume normal operation after provisioning: reconnect the broker if
    /// the network held, otherwise fall back into the retry cycle.
    pub fn resume(&mut self, now: Instant) {
        self.suspended = false;
        if self.network.is_associated() {
            self.state = ConnectivityState::NetworkAssociated;
            if let Err(e) = self.broker.connect() {
                warn!("broker connect request failed: {e:?}");
            }
        } else {
            self.state = ConnectivityState::Disconnected;
            self.retry.arm(now);
        }
    }

    /// Service the retry and keepalive timers.
    ///
    /// Returns `true` when the retry interval elapsed while still
    /// disconnected, the cue for the orchestrator to show the
    /// "network lost" signal pattern.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.state == ConnectivityState::BrokerConnected && self.ping.poll(now) {
            debug!("broker keepalive ping");
            if let Err(e) = self.broker.publish(
                self.ping_topic.as_str(),
                QOS_EXACTLY_ONCE,
                false,
                b"ping",
            ) {
                warn!("keepalive publish failed: {e:?}");
            }
        }

        self.state == ConnectivityState::Disconnected && self.retry.poll(now)
    }

    /// Publish through the broker session; refused (returning `false`) while
    /// the session is down.
    pub fn publish(&mut self, topic: &str, qos: u8, retain: bool, payload: &[u8]) -> bool {
        if self.state != ConnectivityState::BrokerConnected {
            return false;
        }
        match self.broker.publish(topic, qos, retain, payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("publish to {topic} failed: {e:?}");
                false
            }
        }
    }

    // Provisioning-driven network commands, delegated so the capability
    // stays private to the session.

    pub fn join_network(&mut self, ssid: &str, password: &str) -> bool {
        match self.network.join(ssid, password) {
            Ok(()) => true,
            Err(e) => {
                warn!("join '{ssid}' failed: {e:?}");
                false
            }
        }
    }

    pub fn apply_static_config(
        &mut self,
        local_ip: core::net::Ipv4Addr,
        gateway: core::net::Ipv4Addr,
        subnet_mask: core::net::Ipv4Addr,
    ) -> bool {
        match self.network.configure_static(local_ip, gateway, subnet_mask) {
            Ok(()) => true,
            Err(e) => {
                warn!("static network configuration failed: {e:?}");
                false
            }
        }
    }

    pub fn set_provisioning_ap(&mut self, enabled: bool) -> bool {
        match self.network.set_provisioning_ap(enabled) {
            Ok(()) => true,
            Err(e) => {
                warn!("provisioning AP toggle failed: {e:?}");
                false
            }
        }
    }

    pub fn start_network_scan(&mut self) -> bool {
        match self.network.start_scan() {
            Ok(()) => true,
            Err(e) => {
                warn!("network scan request failed: {e:?}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{Call, MockBroker, MockNetwork, new_log};

    fn session() -> (
        ConnectivitySession<MockNetwork, MockBroker>,
        crate::testutil::CallLog,
        alloc::rc::Rc<core::cell::Cell<bool>>,
    ) {
        let log = new_log();
        let network = MockNetwork::new(&log);
        let associated = alloc::rc::Rc::clone(&network.associated);
        let broker = MockBroker::new(&log);
        (
            ConnectivitySession::new(network, broker, "SER-1"),
            log,
            associated,
        )
    }

    fn at(secs: u64) -> Instant {
        Instant::from_secs(secs)
    }

    #[test]
    fn association_connects_broker_and_cancels_retry() {
        let (mut session, log, _) = session();
        session.on_network_lost(2, at(0));
        log.borrow_mut().clear();

        session.on_network_associated(at(1));
        assert_eq!(session.state(), ConnectivityState::NetworkAssociated);
        assert_eq!(*log.borrow(), [Call::Connect]);
        // Retry timer cancelled: no "network lost" cue ever fires.
        assert!(!session.poll(at(100)));
    }

    #[test]
    fn broker_connect_subscribes_inbound_topics() {
        let (mut session, log, _) = session();
        session.on_network_associated(at(0));
        log.borrow_mut().clear();

        session.on_broker_connected(false, at(1));
        assert_eq!(session.state(), ConnectivityState::BrokerConnected);
        assert_eq!(
            *log.borrow(),
            [
                Call::subscribe("device/SER-1/action", 2),
                Call::subscribe("device/SER-1/schedule_update", 2),
            ]
        );
    }

    #[test]
    fn network_loss_tears_down_broker_and_arms_retry() {
        let (mut session, log, _) = session();
        session.on_network_associated(at(0));
        session.on_broker_connected(false, at(0));
        log.borrow_mut().clear();

        session.on_network_lost(8, at(10));
        assert_eq!(session.state(), ConnectivityState::Disconnected);
        assert_eq!(*log.borrow(), [Call::Disconnect]);

        // The cue fires after the fixed interval, then keeps firing.
        assert!(!session.poll(at(10)));
        assert!(!session.poll(at(29)));
        assert!(session.poll(at(30)));
        assert!(!session.poll(at(31)));
        assert!(session.poll(at(50)));
    }

    #[test]
    fn reassociation_before_the_interval_suppresses_the_cue() {
        let (mut session, _, _) = session();
        session.on_network_lost(8, at(0));
        session.on_network_associated(at(5));
        assert!(!session.poll(at(60)));
    }

    #[test]
    fn suspend_blocks_broker_establishment() {
        let (mut session, log, _) = session();
        session.suspend();
        log.borrow_mut().clear();

        // Association while provisioning: no broker connect.
        session.on_network_associated(at(0));
        assert!(log.borrow().is_empty());

        // A stale broker-connected event is ignored too.
        session.on_broker_connected(true, at(1));
        assert_eq!(session.state(), ConnectivityState::NetworkAssociated);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn suspend_disarms_the_retry_cue() {
        let (mut session, _, _) = session();
        session.on_network_lost(8, at(0));
        session.suspend();
        assert!(!session.poll(at(120)));
        // Loss events while suspended do not re-arm it either.
        session.on_network_lost(8, at(130));
        assert!(!session.poll(at(300)));
    }

    #[test]
    fn resume_reconnects_when_the_network_held() {
        let (mut session, log, associated) = session();
        session.on_network_associated(at(0));
        session.on_broker_connected(false, at(0));
        session.suspend();
        associated.set(true);
        log.borrow_mut().clear();

        session.resume(at(10));
        assert_eq!(session.state(), ConnectivityState::NetworkAssociated);
        assert_eq!(*log.borrow(), [Call::Connect]);
    }

    #[test]
    fn resume_without_network_falls_back_to_retry() {
        let (mut session, log, associated) = session();
        session.suspend();
        associated.set(false);
        log.borrow_mut().clear();

        session.resume(at(0));
        assert_eq!(session.state(), ConnectivityState::Disconnected);
        assert!(log.borrow().is_empty());
        assert!(session.poll(at(20)));
    }

    #[test]
    fn keepalive_pings_while_the_session_is_up() {
        let (mut session, log, _) = session();
        session.on_network_associated(at(0));
        session.on_broker_connected(false, at(0));
        log.borrow_mut().clear();

        assert!(!session.poll(at(29)));
        session.poll(at(30));
        assert_eq!(
            *log.borrow(),
            [Call::publish("device/SER-1/ping", 2, false, b"ping")]
        );

        // Loss disarms the keepalive.
        session.on_network_lost(8, at(31));
        log.borrow_mut().clear();
        session.poll(at(90));
        assert!(!log.borrow().contains(&Call::publish(
            "device/SER-1/ping",
            2,
            false,
            b"ping"
        )));
    }

    #[test]
    fn publish_is_refused_while_the_session_is_down() {
        let (mut session, log, _) = session();
        assert!(!session.publish("device/SER-1/status/power", 2, false, b"1"));
        assert!(log.borrow().is_empty());

        session.on_network_associated(at(0));
        session.on_broker_connected(false, at(0));
        log.borrow_mut().clear();
        assert!(session.publish("device/SER-1/status/power", 2, false, b"1"));
        assert_eq!(
            *log.borrow(),
            [Call::publish("device/SER-1/status/power", 2, false, b"1")]
        );
    }
}
