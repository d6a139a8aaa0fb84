//! The monome device engine
//!
//! [`MonomeDevice`] owns the device state, LED buffer, event queues and the
//! command parser. Bytes go in through [`MonomeDevice::poll`] (reading from a
//! port) or [`MonomeDevice::step`] (one byte at a time); replies go out on
//! the same port.
//!
//! Neither entry point blocks. A command that is still missing payload
//! bytes leaves the parser mid-frame and is picked up on the next call, or
//! dropped once it is older than the command timeout.

use neogrid_hal::{SerialPort, SerialTx};
use neogrid_protocol::{CommandParser, HostCommand, Opcode, ParseError};

use crate::config::{DeviceConfig, LineAlign, RingFillMode, DEFAULT_COMMAND_TIMEOUT_MS};
use crate::queue::EventQueue;
use crate::state::{DeviceState, LedBuffer};

/// Result of feeding the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No host attached; nothing was read
    Disconnected,
    /// No bytes waiting and no partial command
    Idle,
    /// A command is partially received
    Pending,
    /// A command completed and ran
    Executed(Opcode),
    /// Byte in opcode position is not a known command
    Ignored(u8),
    /// A partial command timed out and was discarded
    Aborted(Opcode),
}

/// A monome grid and/or arc
#[derive(Debug, Clone)]
pub struct MonomeDevice {
    pub(crate) state: DeviceState,
    pub(crate) leds: LedBuffer,
    pub(crate) events: EventQueue,
    parser: CommandParser,
}

impl MonomeDevice {
    /// Create a device with a cleared LED buffer
    ///
    /// Grid dimensions and encoder count are clamped to the buffer capacity.
    pub fn new(
        active: bool,
        is_monome: bool,
        is_grid: bool,
        rows: u8,
        cols: u8,
        encoders: u8,
    ) -> Self {
        let leds = LedBuffer::new(rows, cols, encoders);
        let state = DeviceState::new(
            active,
            is_monome,
            is_grid,
            leds.rows(),
            leds.cols(),
            leds.rings(),
        );
        Self {
            state,
            leds,
            events: EventQueue::new(),
            parser: CommandParser::with_timeout(DEFAULT_COMMAND_TIMEOUT_MS),
        }
    }

    /// Active monome grid, marked dirty so the first render paints it
    pub fn as_grid(rows: u8, cols: u8) -> Self {
        let mut device = Self::new(true, true, true, rows, cols, 0);
        device.state.mark_grid_dirty();
        device
    }

    /// Active monome arc with `encoders` rings
    pub fn as_arc(encoders: u8) -> Self {
        let mut device = Self::new(true, true, false, 0, 0, encoders);
        device.state.mark_arc_dirty();
        device
    }

    /// Build a device from configuration
    pub fn from_config(config: &DeviceConfig) -> Self {
        let mut device = Self::new(
            true,
            config.device.monome,
            config.grid.enabled,
            config.grid_rows(),
            config.grid_cols(),
            config.arc.encoders,
        );
        device.state.set_id(&config.device.id);
        device.state.set_firmware_version(&config.device.firmware_version);
        device.state.set_brightness(config.led.brightness);
        device.state.set_vari_mono_thresh(config.led.vari_mono_thresh);
        device.state.ring_fill = config.led.ring_fill;
        device.state.line_align = config.led.line_align;
        device.set_command_timeout(config.link.command_timeout_ms);
        if device.state.is_grid {
            device.state.mark_grid_dirty();
        }
        if device.state.encoders() > 0 {
            device.state.mark_arc_dirty();
        }
        device
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }

    pub fn leds(&self) -> &LedBuffer {
        &self.leds
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub fn device_id(&self) -> &str {
        self.state.id()
    }

    pub fn set_device_id(&mut self, id: &str) {
        self.state.set_id(id);
    }

    pub fn set_ring_fill(&mut self, mode: RingFillMode) {
        self.state.ring_fill = mode;
    }

    pub fn set_line_align(&mut self, align: LineAlign) {
        self.state.line_align = align;
    }

    /// Change how long a partial command may wait; 0 waits forever
    ///
    /// Any partially received command is discarded.
    pub fn set_command_timeout(&mut self, timeout_ms: u32) {
        self.parser = CommandParser::with_timeout(timeout_ms);
    }

    // LED buffer

    pub fn set_grid_led(&mut self, x: u8, y: u8, level: u8) -> bool {
        self.leds.set_grid_led(x, y, level)
    }

    pub fn clear_grid_led(&mut self, x: u8, y: u8) -> bool {
        self.leds.clear_grid_led(x, y)
    }

    pub fn set_all_grid_leds(&mut self, value: u8) {
        self.leds.set_all_grid_leds(value);
    }

    pub fn set_arc_led(&mut self, ring: u8, pos: u8, level: u8) -> bool {
        self.leds.set_arc_led(ring, pos, level)
    }

    pub fn clear_arc_led(&mut self, ring: u8, pos: u8) -> bool {
        self.leds.clear_arc_led(ring, pos)
    }

    pub fn clear_arc_ring(&mut self, ring: u8) -> bool {
        self.leds.clear_arc_ring(ring)
    }

    /// Ring "all" according to the configured [`RingFillMode`]
    pub fn set_all_arc_leds(&mut self, ring: u8, value: u8) -> bool {
        self.leds.set_all_arc_leds(ring, value, self.state.ring_fill)
    }

    /// Ask the renderer to push the grid
    pub fn refresh_grid(&mut self) {
        self.state.mark_grid_dirty();
    }

    /// Ask the renderer to push the rings
    pub fn refresh_arc(&mut self) {
        self.state.mark_arc_dirty();
    }

    // Event queues

    pub fn add_grid_event(&mut self, x: u8, y: u8, pressed: bool) {
        self.events.add_grid_event(x, y, pressed);
    }

    pub fn grid_event_available(&self) -> bool {
        self.events.grid_event_available()
    }

    pub fn read_grid_event(&mut self) -> Option<neogrid_protocol::GridEvent> {
        self.events.read_grid_event()
    }

    pub fn add_arc_turn_event(&mut self, index: u8, delta: i8) {
        self.events.add_arc_turn_event(index, delta);
    }

    pub fn add_arc_press_event(&mut self, index: u8, pressed: bool) {
        self.events.add_arc_press_event(index, pressed);
    }

    pub fn arc_event_available(&self) -> bool {
        self.events.arc_event_available()
    }

    pub fn read_arc_event(&mut self) -> Option<neogrid_protocol::ArcEvent> {
        self.events.read_arc_event()
    }

    // Serial input

    /// True when no command is partially received
    pub fn is_idle(&self) -> bool {
        self.parser.is_idle()
    }

    /// Drop a partial command older than the timeout
    ///
    /// Returns the abandoned opcode.
    pub fn expire(&mut self, now_ms: u32) -> Option<Opcode> {
        match self.parser.expire(now_ms) {
            Err(ParseError::Timeout(opcode)) => Some(opcode),
            _ => None,
        }
    }

    /// Service the port once
    ///
    /// Reads bytes until one command has run or nothing is waiting.
    pub fn poll<P: SerialPort + ?Sized>(
        &mut self,
        port: &mut P,
        now_ms: u32,
    ) -> Result<PollOutcome, P::Error> {
        if !port.is_connected() {
            return Ok(PollOutcome::Disconnected);
        }
        if let Some(opcode) = self.expire(now_ms) {
            return Ok(PollOutcome::Aborted(opcode));
        }

        while let Some(byte) = port.read_byte()? {
            match self.step(byte, now_ms, port)? {
                PollOutcome::Pending => continue,
                outcome => return Ok(outcome),
            }
        }

        Ok(if self.parser.is_idle() {
            PollOutcome::Idle
        } else {
            PollOutcome::Pending
        })
    }

    /// Feed one received byte, running the command it completes
    pub fn step<T: SerialTx + ?Sized>(
        &mut self,
        byte: u8,
        now_ms: u32,
        tx: &mut T,
    ) -> Result<PollOutcome, T::Error> {
        let packet = match self.parser.feed(byte, now_ms) {
            Ok(Some(packet)) => packet,
            Ok(None) => return Ok(PollOutcome::Pending),
            Err(ParseError::UnknownOpcode(byte)) => return Ok(PollOutcome::Ignored(byte)),
            Err(ParseError::Timeout(opcode)) => return Ok(PollOutcome::Aborted(opcode)),
        };

        // The parser only emits packets whose length matches the table
        let Ok(command) = HostCommand::decode(&packet) else {
            return Ok(PollOutcome::Ignored(packet.opcode.to_byte()));
        };
        self.execute(&command, tx)?;
        Ok(PollOutcome::Executed(packet.opcode))
    }
}
