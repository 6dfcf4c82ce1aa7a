//! WS2812 status pixel on the RMT peripheral.

use esp_hal::Blocking;
use esp_hal::gpio::interconnect::PeripheralOutput;
use esp_hal::rmt::ChannelCreator;
use esp_hal_smartled::{SmartLedsAdapter, smart_led_buffer};
use log::warn;
use rgb::RGB8;
use smart_leds::SmartLedsWrite;

/// Single-pixel WS2812 driver; the orchestrator decides the colors, this
/// only pushes them out.
pub struct StatusPixel {
    adapter: SmartLedsAdapter<esp_hal::rmt::Channel<Blocking, 0>, 25>,
}

impl StatusPixel {
    pub fn new(
        channel: ChannelCreator<Blocking, 0>,
        pin: impl PeripheralOutput<'static>,
    ) -> Self {
        let buffer = smart_led_buffer!(1);
        Self {
            adapter: SmartLedsAdapter::new(channel, pin, buffer),
        }
    }

    pub fn set(&mut self, color: RGB8) {
        let pixel = [smart_leds::RGB8::new(color.r, color.g, color.b)];
        if let Err(e) = self.adapter.write(pixel.into_iter()) {
            warn!("pixel write failed: {e:?}");
        }
    }
}
