//! Shared test doubles for the session and orchestrator tests.
//!
//! The mocks record every capability call into an `Rc`-shared log so tests
//! keep a handle while the session/orchestrator owns the link.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::net::Ipv4Addr;

use crate::link::{BrokerLink, NetworkLink};
use crate::settings::{DeviceSettings, SettingsStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Associate,
    Join(String, String),
    ConfigureStatic(Ipv4Addr, Ipv4Addr, Ipv4Addr),
    ProvisioningAp(bool),
    StartScan,
    Connect,
    Disconnect,
    Subscribe(String, u8),
    Publish(String, u8, bool, Vec<u8>),
}

impl Call {
    pub fn subscribe(topic: &str, qos: u8) -> Self {
        Self::Subscribe(String::from(topic), qos)
    }

    pub fn publish(topic: &str, qos: u8, retain: bool, payload: &[u8]) -> Self {
        Self::Publish(String::from(topic), qos, retain, Vec::from(payload))
    }
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn new_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct MockNetwork {
    log: CallLog,
    pub associated: Rc<Cell<bool>>,
}

impl MockNetwork {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
            associated: Rc::new(Cell::new(false)),
        }
    }
}

impl NetworkLink for MockNetwork {
    type Error = Infallible;

    fn associate(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Call::Associate);
        Ok(())
    }

    fn is_associated(&self) -> bool {
        self.associated.get()
    }

    fn join(&mut self, ssid: &str, password: &str) -> Result<(), Infallible> {
        self.log
            .borrow_mut()
            .push(Call::Join(String::from(ssid), String::from(password)));
        Ok(())
    }

    fn configure_static(
        &mut self,
        local_ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet_mask: Ipv4Addr,
    ) -> Result<(), Infallible> {
        self.log
            .borrow_mut()
            .push(Call::ConfigureStatic(local_ip, gateway, subnet_mask));
        Ok(())
    }

    fn set_provisioning_ap(&mut self, enabled: bool) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Call::ProvisioningAp(enabled));
        Ok(())
    }

    fn start_scan(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Call::StartScan);
        Ok(())
    }
}

pub struct MockBroker {
    log: CallLog,
}

impl MockBroker {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Rc::clone(log),
        }
    }
}

impl BrokerLink for MockBroker {
    type Error = Infallible;

    fn connect(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Call::Connect);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Call::Disconnect);
        Ok(())
    }

    fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), Infallible> {
        self.log.borrow_mut().push(Call::subscribe(topic, qos));
        Ok(())
    }

    fn publish(
        &mut self,
        topic: &str,
        qos: u8,
        retain: bool,
        payload: &[u8],
    ) -> Result<(), Infallible> {
        self.log
            .borrow_mut()
            .push(Call::publish(topic, qos, retain, payload));
        Ok(())
    }
}

/// Settings store backed by shared memory; an empty store fails to load the
/// way an unformatted flash partition would.
pub struct MemoryStore {
    pub contents: Rc<RefCell<Option<DeviceSettings>>>,
}

#[derive(Debug)]
pub struct StoreUnavailable;

impl MemoryStore {
    pub fn empty() -> Self {
        Self {
            contents: Rc::new(RefCell::new(None)),
        }
    }

    pub fn with(settings: DeviceSettings) -> Self {
        Self {
            contents: Rc::new(RefCell::new(Some(settings))),
        }
    }
}

impl SettingsStore for MemoryStore {
    type Error = StoreUnavailable;

    fn load(&mut self) -> Result<DeviceSettings, StoreUnavailable> {
        self.contents.borrow().clone().ok_or(StoreUnavailable)
    }

    fn save(&mut self, settings: &DeviceSettings) -> Result<(), StoreUnavailable> {
        *self.contents.borrow_mut() = Some(settings.clone());
        Ok(())
    }
}
