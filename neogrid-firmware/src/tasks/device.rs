//! Device task
//!
//! Owns the protocol engine, the host link and the trellis. Host bytes are
//! executed as they arrive; on every refresh tick the task expires stale
//! partial commands, forwards key edges and pushes changed pixels.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::{Duration, Instant, Ticker, Timer};
use embedded_io_async::Read;

use neogrid_core::config::DeviceConfig;
use neogrid_core::outbound::forward_key_edges;
use neogrid_core::render::GridRenderer;
use neogrid_core::{MonomeDevice, PollOutcome};

use crate::board::Trellis;
use crate::channels::{self, BYTES_IGNORED, COMMANDS_ABORTED, COMMANDS_EXECUTED, HOST_ACTIVITY};
use crate::serial::UartLink;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Delay between trellis init attempts
const RETRY_INTERVAL_MS: u32 = 1000;

/// How long the boot pixel stays lit
const BOOT_FLASH_MS: u64 = 100;

/// Trellis plus its bring-up state
struct Surface {
    trellis: Trellis,
    ready: bool,
    last_attempt_ms: Option<u32>,
}

impl Surface {
    /// Try to initialize the boards, at most once per retry interval
    fn ensure_ready(&mut self, now_ms: u32) -> bool {
        if self.ready {
            return true;
        }
        if let Some(last) = self.last_attempt_ms {
            if now_ms.wrapping_sub(last) < RETRY_INTERVAL_MS {
                return false;
            }
        }
        self.last_attempt_ms = Some(now_ms);
        match self.trellis.init() {
            Ok(()) => {
                info!(
                    "Trellis ready: {}x{}",
                    self.trellis.cols(),
                    self.trellis.rows()
                );
                self.ready = true;
            }
            Err(e) => error!("Trellis init failed: {:?}", e),
        }
        self.ready
    }
}

fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

#[embassy_executor::task]
pub async fn device_task(
    config: &'static DeviceConfig,
    mut rx: BufferedUartRx,
    tx: BufferedUartTx,
    trellis: Trellis,
) {
    info!("Device task started");

    let mut device = MonomeDevice::from_config(config);
    let mut link = UartLink::new(tx);
    let mut renderer = GridRenderer::new(config.render.tint);
    let mut surface = Surface {
        trellis,
        ready: false,
        last_attempt_ms: None,
    };

    if surface.ensure_ready(now_ms()) {
        boot_animation(&mut device, &mut renderer, &mut surface).await;
    }

    let refresh = Duration::from_millis(config.render.refresh_ms.max(1) as u64);
    let mut ticker = Ticker::every(refresh);
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let event = select(rx.read(&mut buf), ticker.next()).await;
        match event {
            Either::First(Ok(n)) => {
                if n > 0 {
                    HOST_ACTIVITY.signal(());
                }
                let now = now_ms();
                for &byte in &buf[..n] {
                    handle_byte(&mut device, &mut link, byte, now);
                }
            }
            Either::First(Err(e)) => warn!("UART read error: {:?}", e),
            Either::Second(()) => refresh_tick(&mut device, &mut link, &mut renderer, &mut surface),
        }
    }
}

/// Feed one host byte and account for the outcome
///
/// The UART has no presence line, so there is no connected check; any byte
/// received is treated as coming from the host.
fn handle_byte(device: &mut MonomeDevice, link: &mut UartLink, byte: u8, now: u32) {
    match device.step(byte, now, link) {
        Ok(PollOutcome::Executed(opcode)) => {
            trace!("Executed {:?}", opcode);
            channels::count(&COMMANDS_EXECUTED);
        }
        Ok(PollOutcome::Ignored(byte)) => {
            debug!("Ignored byte {=u8:#x}", byte);
            channels::count(&BYTES_IGNORED);
        }
        Ok(PollOutcome::Aborted(opcode)) => {
            warn!("Dropped partial {:?}", opcode);
            channels::count(&COMMANDS_ABORTED);
        }
        Ok(_) => {}
        Err(e) => warn!("UART write error: {:?}", e),
    }
}

/// Periodic work: timeouts, key scan, LED push
fn refresh_tick(
    device: &mut MonomeDevice,
    link: &mut UartLink,
    renderer: &mut GridRenderer,
    surface: &mut Surface,
) {
    let now = now_ms();
    if let Some(opcode) = device.expire(now) {
        warn!("Command {:?} timed out", opcode);
        channels::count(&COMMANDS_ABORTED);
    }

    // Input echoed back by the host has no local consumer
    while let Some(event) = device.read_grid_event() {
        trace!("Host grid event: {:?}", event);
    }
    while let Some(event) = device.read_arc_event() {
        trace!("Host arc event: {:?}", event);
    }

    if !surface.ensure_ready(now) {
        return;
    }

    if let Err(e) = forward_key_edges(&mut surface.trellis, device, link) {
        warn!("Key scan failed: {:?}", e);
    }

    match renderer.render(device, &mut surface.trellis) {
        Ok(0) => {}
        Ok(n) => trace!("Pushed {} pixels", n),
        Err(e) => {
            error!("Pixel push failed: {:?}", e);
            // Boards may have been reset; reinitialize and redraw everything
            surface.ready = false;
            renderer.invalidate();
        }
    }
}

/// Clear the grid, then blink the top-left key once
async fn boot_animation(
    device: &mut MonomeDevice,
    renderer: &mut GridRenderer,
    surface: &mut Surface,
) {
    let frames: [(u8, u64); 2] = [(15, BOOT_FLASH_MS), (0, 0)];

    device.set_all_grid_leds(0);
    device.refresh_grid();
    if let Err(e) = renderer.render(device, &mut surface.trellis) {
        warn!("Boot clear failed: {:?}", e);
    }

    for (level, hold_ms) in frames {
        device.set_grid_led(0, 0, level);
        device.refresh_grid();
        if let Err(e) = renderer.render(device, &mut surface.trellis) {
            warn!("Boot animation failed: {:?}", e);
            return;
        }
        Timer::after(Duration::from_millis(hold_ms)).await;
    }
}
