#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use core::fmt::Write as _;

use embassy_executor::Spawner;
use embassy_time::{Duration, Instant, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::rmt::Rmt;
use esp_hal::time::Rate;
use esp_hal::timer::timg::TimerGroup;
use log::info;
use static_cell::StaticCell;

use hearth_core::link::BrokerEvent;
use hearth_core::orchestrator::Orchestrator;
use hearth_firmware::broker::{self, BrokerHandle, BrokerUpdate};
use hearth_firmware::net::{self, NetworkHandle};
use hearth_firmware::pixel::StatusPixel;
use hearth_firmware::store::FlashStore;

/// Cooperative loop cadence; the gesture detector only needs the input to be
/// stable within one of these.
const LOOP_TICK: Duration = Duration::from_millis(10);

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

#[embassy_executor::task]
async fn net_stack_task(mut runner: embassy_net::Runner<'static, esp_radio::wifi::WifiDevice<'static>>) {
    runner.run().await
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let radio_init = esp_radio::init().expect("Failed to initialize Wi-Fi controller");
    let (controller, interfaces) =
        esp_radio::wifi::new(&radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi interfaces");

    // embassy-net stack on the station interface; addressing follows the
    // persisted settings (automatic unless provisioned static).
    static RESOURCES: StaticCell<embassy_net::StackResources<4>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        RESOURCES.init(embassy_net::StackResources::new()),
        1234,
    );
    spawner.spawn(net_stack_task(runner)).ok();
    spawner.spawn(net::wifi_task(controller)).ok();

    // Factory serial derived from the station MAC; a provisioned serial in
    // the settings blob takes precedence inside the orchestrator.
    let mac = esp_hal::efuse::Efuse::mac_address();
    let mut serial: heapless::String<64> = heapless::String::new();
    let _ = write!(
        serial,
        "HRT-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    );

    let mut orchestrator =
        Orchestrator::new(NetworkHandle, BrokerHandle, FlashStore::new(), serial.as_str());

    // Broker client id is the resolved serial (a provisioned serial from the
    // settings blob wins over the factory one).
    let mut client_id: heapless::String<64> = heapless::String::new();
    let _ = client_id.push_str(orchestrator.serial());
    spawner.spawn(broker::broker_task(stack, client_id)).ok();

    // Boot button and the WS2812 status pixel.
    let button = Input::new(
        peripherals.GPIO0,
        InputConfig::default().with_pull(Pull::Up),
    );
    let rmt = Rmt::new(peripherals.RMT, Rate::from_mhz(80)).expect("Failed to initialize RMT");
    let mut pixel = StatusPixel::new(rmt.channel0, peripherals.GPIO48);

    orchestrator.set_on_button_press(|| info!("button pressed"));
    orchestrator.add_action_handler("identify", |_| {
        info!("identify action received");
    });
    orchestrator.start();

    info!(
        "hearth '{}' up, serial {}",
        orchestrator.device_name(),
        orchestrator.serial()
    );

    loop {
        let now = Instant::now();

        while let Ok(event) = net::NET_EVENTS.try_receive() {
            orchestrator.handle_network_event(event, now);
        }
        while let Ok(update) = broker::BROKER_UPDATES.try_receive() {
            match update {
                BrokerUpdate::Connected { session_present } => orchestrator
                    .handle_broker_event(BrokerEvent::Connected { session_present }, now),
                BrokerUpdate::Message { topic, payload } => orchestrator.handle_broker_event(
                    BrokerEvent::Message {
                        topic: topic.as_str(),
                        payload: &payload,
                    },
                    now,
                ),
            }
        }

        // Active-low boot button.
        if let Some(color) = orchestrator.poll(now, button.is_low()) {
            pixel.set(color);
        }

        if orchestrator.reboot_pending() {
            info!("rebooting on provisioning request");
            esp_hal::system::software_reset();
        }

        Timer::after(LOOP_TICK).await;
    }
}
