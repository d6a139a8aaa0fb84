//! Status LED task
//!
//! Slow heartbeat while idle; a short flicker whenever the host talks.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::gpio::Output;
use embassy_time::{Duration, Timer};

use crate::channels::HOST_ACTIVITY;

/// Heartbeat period with no host traffic
const HEARTBEAT_MS: u64 = 1000;

/// How long the LED stays off for an activity flicker
const FLICKER_MS: u64 = 30;

#[embassy_executor::task]
pub async fn status_led_task(mut led: Output<'static>) {
    info!("Status LED task started");

    loop {
        match select(
            HOST_ACTIVITY.wait(),
            Timer::after(Duration::from_millis(HEARTBEAT_MS)),
        )
        .await
        {
            Either::First(()) => {
                led.set_low();
                Timer::after(Duration::from_millis(FLICKER_MS)).await;
                led.set_high();
                Timer::after(Duration::from_millis(FLICKER_MS)).await;
            }
            Either::Second(()) => led.toggle(),
        }
    }
}
