//! neogrid - monome-compatible grid firmware
//!
//! Runs on a Raspberry Pi Pico driving a tiled NeoTrellis grid. The host
//! (serialosc or any monome-protocol client) talks to the device over
//! UART0; key presses travel back the same way.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Delay, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use neogrid_core::config::DeviceConfig;
use neogrid_drivers::trellis::MultiTrellis;
use neogrid_hal::SerialConfig;

use crate::board::{I2C_FREQUENCY, TRELLIS_ADDRESSES, TRELLIS_BOARD_COLS};
use crate::channels::{BYTES_IGNORED, COMMANDS_ABORTED, COMMANDS_EXECUTED};

mod board;
mod channels;
mod config;
mod serial;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static DEVICE_CONFIG: StaticCell<DeviceConfig> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("neogrid firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config: &'static DeviceConfig = DEVICE_CONFIG.init(config::load());

    // Host link
    let serial = SerialConfig {
        baudrate: config.link.baudrate,
    };
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = serial.baudrate;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized at {} baud", serial.baudrate);

    // NeoTrellis chain
    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY;
    let bus = i2c::I2c::new_blocking(p.I2C1, p.PIN_27, p.PIN_26, i2c_config);

    let trellis = match MultiTrellis::new(bus, Delay, &TRELLIS_ADDRESSES, TRELLIS_BOARD_COLS) {
        Ok(trellis) => trellis,
        Err(e) => defmt::panic!("Bad trellis layout: {:?}", e),
    };
    if trellis.cols() != config.grid_cols() || trellis.rows() != config.grid_rows() {
        warn!(
            "Configured grid {}x{} differs from trellis {}x{}",
            config.grid_cols(),
            config.grid_rows(),
            trellis.cols(),
            trellis.rows()
        );
    }
    info!("I2C initialized");

    let led = Output::new(p.PIN_25, Level::Low);

    // Spawn tasks
    unwrap!(spawner.spawn(tasks::device_task(config, rx, tx, trellis)));
    unwrap!(spawner.spawn(tasks::status_led_task(led)));

    info!("All tasks spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        debug!(
            "Commands: {} executed, {} aborted, {} bytes ignored",
            channels::read(&COMMANDS_EXECUTED),
            channels::read(&COMMANDS_ABORTED),
            channels::read(&BYTES_IGNORED)
        );
    }
}
