//! Command execution
//!
//! One handler per [`HostCommand`]. The dispatcher is the only code that
//! writes device state and LED levels in response to the host. Any command
//! that can change LEDs raises the matching dirty flag.

use neogrid_hal::SerialTx;
use neogrid_protocol::opcode::block_origin;
use neogrid_protocol::{DeviceMessage, HostCommand};

use crate::config::LineAlign;
use crate::device::MonomeDevice;
use crate::outbound::write_message;
use crate::state::GridOffset;

/// Level written by row/column bitmask commands
const MASK_ON_LEVEL: u8 = 15;

impl MonomeDevice {
    /// Run one decoded command, writing any reply to `tx`
    pub fn execute<T: SerialTx + ?Sized>(
        &mut self,
        command: &HostCommand,
        tx: &mut T,
    ) -> Result<(), T::Error> {
        let opcode = command.opcode();
        let result = self.apply(command, tx);
        if opcode.touches_grid() {
            self.state.mark_grid_dirty();
        }
        if opcode.touches_arc() {
            self.state.mark_arc_dirty();
        }
        result
    }

    fn apply<T: SerialTx + ?Sized>(
        &mut self,
        command: &HostCommand,
        tx: &mut T,
    ) -> Result<(), T::Error> {
        let brightness = self.state.brightness();

        match *command {
            // System
            HostCommand::Query => {
                let quads = self.state.quads();
                write_message(tx, &DeviceMessage::QueryReply { quads })?;
            }
            HostCommand::GetId => write_message(tx, &DeviceMessage::Id(self.state.id()))?,
            HostCommand::SetId { ref raw } => self.state.set_id_from_wire(raw),
            HostCommand::GetGridOffset => {
                let GridOffset { n, x, y } = self.state.grid_offset;
                write_message(tx, &DeviceMessage::GridOffset { n, x, y })?;
            }
            HostCommand::SetGridOffset { n, x, y } => {
                self.state.grid_offset = GridOffset { n, x, y };
            }
            HostCommand::GetGridSize => {
                let (cols, rows) = (self.state.cols(), self.state.rows());
                write_message(tx, &DeviceMessage::GridSize { cols, rows })?;
            }
            // Size and address are fixed by the hardware
            HostCommand::SetGridSize { .. } | HostCommand::SetAddress { .. } => {}
            HostCommand::GetFirmwareVersion => write_message(
                tx,
                &DeviceMessage::FirmwareVersion(self.state.firmware_version()),
            )?,

            // Grid LEDs
            HostCommand::LedOff { x, y } => {
                self.leds.clear_grid_led(x, y);
            }
            HostCommand::LedOn { x, y } => {
                self.leds.set_grid_led(x, y, brightness);
            }
            HostCommand::LedAllOff => self.leds.set_all_grid_leds(0),
            HostCommand::LedAllOn => self.leds.set_all_grid_leds(brightness),
            HostCommand::LedMap { x, y, ref rows } => {
                let (x0, y0) = (block_origin(x), block_origin(y));
                for (r, &bits) in (0u8..).zip(rows.iter()) {
                    for i in 0..8u8 {
                        let level = if bits & (1 << i) != 0 { brightness } else { 0 };
                        self.leds.set_grid_led(x0 + i, y0 + r, level);
                    }
                }
            }
            HostCommand::LedRow { x, y, mask } => {
                let x0 = block_origin(x);
                for i in 0..8u8 {
                    self.leds.set_grid_led(x0 + i, y, mask_level(mask, i));
                }
            }
            HostCommand::LedCol { x, y, mask } => {
                let y0 = block_origin(y);
                for i in 0..8u8 {
                    self.leds.set_grid_led(x, y0 + i, mask_level(mask, i));
                }
            }
            HostCommand::LedIntensity { level } => self.state.set_brightness(level),
            HostCommand::LedLevelSet { x, y, level } => {
                self.leds.set_grid_led(x, y, level);
            }
            HostCommand::LedLevelAll { level } => self.leds.set_all_grid_leds(level),
            HostCommand::LedLevelMap { x, y, ref levels } => {
                let (x0, y0) = (block_origin(x), block_origin(y));
                for (i, &level) in (0u8..).zip(levels.iter()) {
                    let level = self.state.clamp_level(level);
                    self.leds.set_grid_led(x0 + i % 8, y0 + i / 8, level);
                }
            }
            HostCommand::LedLevelRow { x, y, ref levels } => {
                let x0 = block_origin(x);
                let y = match self.state.line_align {
                    LineAlign::Block => block_origin(y),
                    LineAlign::Axis => y,
                };
                for (i, &level) in (0u8..).zip(levels.iter()) {
                    let level = self.state.clamp_level(level);
                    self.leds.set_grid_led(x0 + i, y, level);
                }
            }
            HostCommand::LedLevelCol { x, y, ref levels } => {
                let y0 = block_origin(y);
                let x = match self.state.line_align {
                    LineAlign::Block => block_origin(x),
                    LineAlign::Axis => x,
                };
                for (i, &level) in (0u8..).zip(levels.iter()) {
                    let level = self.state.clamp_level(level);
                    self.leds.set_grid_led(x, y0 + i, level);
                }
            }

            // Input echoed by the host
            HostCommand::KeyUp { x, y } => self.events.add_grid_event(x, y, false),
            HostCommand::KeyDown { x, y } => self.events.add_grid_event(x, y, true),
            HostCommand::EncDelta { index, delta } => self.events.add_arc_turn_event(index, delta),
            HostCommand::EncKeyUp { index } => self.events.add_arc_press_event(index, false),
            HostCommand::EncKeyDown { index } => self.events.add_arc_press_event(index, true),

            HostCommand::Tilt(_) => {}

            // Rings
            HostCommand::RingSet { ring, pos, level } => {
                self.leds.set_arc_led(ring, pos, level);
            }
            HostCommand::RingAll { ring, level } => {
                self.leds.set_all_arc_leds(ring, level, self.state.ring_fill);
            }
            HostCommand::RingMap { ring, ref levels } => {
                for (pos, &level) in (0u8..).zip(levels.iter()) {
                    let level = self.state.clamp_level(level);
                    self.leds.set_arc_led(ring, pos, level);
                }
            }
            HostCommand::RingRange {
                ring,
                start,
                end,
                level,
            } => {
                self.leds.set_arc_range(ring, start, end, level);
            }
        }

        Ok(())
    }
}

fn mask_level(mask: u8, bit: u8) -> u8 {
    if mask & (1 << bit) != 0 {
        MASK_ON_LEVEL
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RingFillMode;
    use neogrid_hal::ErrorType;
    use neogrid_protocol::{ArcEvent, GridEvent, Opcode, Packet};
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder(Vec<u8>);

    impl ErrorType for Recorder {
        type Error = ();
    }

    impl SerialTx for Recorder {
        fn write_all(&mut self, data: &[u8]) -> Result<(), ()> {
            self.0.extend_from_slice(data);
            Ok(())
        }

        fn flush(&mut self) -> Result<(), ()> {
            Ok(())
        }
    }

    /// Decode and run raw opcode + payload bytes
    fn run(device: &mut MonomeDevice, opcode: Opcode, payload: &[u8]) -> Vec<u8> {
        let packet = Packet::new(opcode, payload).unwrap();
        let command = HostCommand::decode(&packet).unwrap();
        let mut tx = Recorder::default();
        device.execute(&command, &mut tx).unwrap();
        tx.0
    }

    fn grid() -> MonomeDevice {
        MonomeDevice::as_grid(16, 16)
    }

    fn lit(device: &MonomeDevice) -> Vec<(u8, u8, u8)> {
        let mut out = Vec::new();
        for (y, row) in (0u8..).zip(device.leds().grid_rows()) {
            for (x, &level) in (0u8..).zip(row.iter()) {
                if level != 0 {
                    out.push((x, y, level));
                }
            }
        }
        out
    }

    #[test]
    fn test_query_replies() {
        let mut device = MonomeDevice::as_grid(8, 16);
        assert_eq!(run(&mut device, Opcode::Query, &[]), [0x00, 1, 2, 0x00, 2, 2]);
        assert_eq!(run(&mut device, Opcode::GetGridSize, &[]), [0x03, 16, 8]);
        assert_eq!(run(&mut device, Opcode::GetGridOffset, &[]), [0x02, 1, 0, 0]);
        assert_eq!(run(&mut device, Opcode::GetFirmwareVersion, &[]), [0u8; 8]);

        let arc = &mut MonomeDevice::as_arc(4);
        assert_eq!(run(arc, Opcode::Query, &[]), [0x00, 1, 0, 0x00, 2, 0]);
    }

    #[test]
    fn test_grid_offset_is_stored_only() {
        let mut device = grid();
        assert!(run(&mut device, Opcode::SetGridOffset, &[2, 8, 0]).is_empty());
        assert_eq!(run(&mut device, Opcode::GetGridOffset, &[]), [0x02, 2, 8, 0]);

        run(&mut device, Opcode::LedOn, &[0, 0]);
        assert_eq!(lit(&device), [(0, 0, 15)]);
    }

    #[test]
    fn test_size_and_address_are_discarded() {
        let mut device = MonomeDevice::as_grid(8, 8);
        assert!(run(&mut device, Opcode::SetGridSize, &[16, 16]).is_empty());
        assert!(run(&mut device, Opcode::SetAddress, &[1, 2]).is_empty());
        assert_eq!(run(&mut device, Opcode::GetGridSize, &[]), [0x03, 8, 8]);
    }

    #[test]
    fn test_led_on_off_use_brightness() {
        let mut device = grid();
        run(&mut device, Opcode::LedIntensity, &[0x19]);
        assert_eq!(device.state().brightness(), 9);

        run(&mut device, Opcode::LedOn, &[3, 4]);
        assert_eq!(lit(&device), [(3, 4, 9)]);
        run(&mut device, Opcode::LedOff, &[3, 4]);
        assert!(lit(&device).is_empty());

        run(&mut device, Opcode::LedAllOn, &[]);
        assert_eq!(lit(&device).len(), 256);
        assert!(lit(&device).iter().all(|&(_, _, v)| v == 9));
        run(&mut device, Opcode::LedAllOff, &[]);
        run(&mut device, Opcode::LedAllOff, &[]);
        assert!(lit(&device).is_empty());
    }

    #[test]
    fn test_led_map_masks_origin() {
        let mut device = grid();
        run(&mut device, Opcode::LedIntensity, &[7]);
        // x=10,y=5 addresses the block at (8,0)
        run(&mut device, Opcode::LedMap, &[10, 5, 0x81, 0, 0, 0, 0, 0, 0, 0x01]);
        assert_eq!(lit(&device), [(8, 0, 7), (15, 0, 7), (8, 7, 7)]);
    }

    #[test]
    fn test_led_map_clears_unset_bits() {
        let mut device = grid();
        run(&mut device, Opcode::LedAllOn, &[]);
        run(&mut device, Opcode::LedMap, &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let leds = device.leds();
        assert_eq!(leds.grid_led(7, 7), Some(0));
        assert_eq!(leds.grid_led(8, 0), Some(15));
    }

    #[test]
    fn test_led_row_and_col() {
        let mut device = grid();
        run(&mut device, Opcode::LedIntensity, &[3]);
        run(&mut device, Opcode::LedRow, &[13, 2, 0b0000_0101]);
        assert_eq!(lit(&device), [(8, 2, 15), (10, 2, 15)]);

        run(&mut device, Opcode::LedAllOff, &[]);
        run(&mut device, Opcode::LedCol, &[1, 9, 0b1000_0000]);
        assert_eq!(lit(&device), [(1, 15, 15)]);
    }

    #[test]
    fn test_level_commands() {
        let mut device = grid();
        run(&mut device, Opcode::LedLevelSet, &[2, 3, 0x1C]);
        assert_eq!(lit(&device), [(2, 3, 12)]);

        run(&mut device, Opcode::LedLevelAll, &[4]);
        assert!(lit(&device).iter().all(|&(_, _, v)| v == 4));
        assert_eq!(lit(&device).len(), 256);
    }

    #[test]
    fn test_level_map_with_threshold() {
        let mut device = grid();
        device.state_mut().set_vari_mono_thresh(3);
        let mut payload = [0u8; 34];
        payload[0] = 9; // masks to 8
        payload[1] = 9; // masks to 8
        payload[2] = 0xF3; // (8,8)=15, (9,8)=3 → clamped to 0
        payload[33] = 0x4A; // (14,15)=4, (15,15)=10
        run(&mut device, Opcode::LedLevelMap, &payload);
        assert_eq!(lit(&device), [(8, 8, 15), (14, 15, 4), (15, 15, 10)]);
    }

    #[test]
    fn test_level_row_and_col() {
        let mut device = grid();
        // Both coordinates snap to the block: row 9 → row 8
        run(&mut device, Opcode::LedLevelRow, &[5, 9, 0x12, 0x00, 0x00, 0xF0]);
        assert_eq!(lit(&device), [(0, 8, 1), (1, 8, 2), (6, 8, 15)]);

        run(&mut device, Opcode::LedAllOff, &[]);
        run(&mut device, Opcode::LedLevelRow, &[0, 5, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(device.leds().grid_led(0, 0), Some(15));
        assert_eq!(device.leds().grid_led(0, 5), Some(0));

        run(&mut device, Opcode::LedAllOff, &[]);
        run(&mut device, Opcode::LedLevelCol, &[13, 10, 0x00, 0x00, 0x00, 0x0F]);
        assert_eq!(lit(&device), [(8, 15, 15)]);
    }

    #[test]
    fn test_level_row_and_col_axis_align() {
        let mut device = grid();
        device.set_line_align(LineAlign::Axis);
        run(&mut device, Opcode::LedLevelRow, &[5, 9, 0x12, 0x00, 0x00, 0xF0]);
        assert_eq!(lit(&device), [(0, 9, 1), (1, 9, 2), (6, 9, 15)]);

        run(&mut device, Opcode::LedAllOff, &[]);
        run(&mut device, Opcode::LedLevelCol, &[13, 10, 0x00, 0x00, 0x00, 0x0F]);
        assert_eq!(lit(&device), [(13, 15, 15)]);
    }

    #[test]
    fn test_out_of_range_writes_are_dropped() {
        let mut device = MonomeDevice::as_grid(8, 8);
        run(&mut device, Opcode::LedOn, &[8, 0]);
        run(&mut device, Opcode::LedLevelRow, &[8, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(lit(&device).is_empty());
    }

    #[test]
    fn test_input_echo_is_queued() {
        let mut device = grid();
        run(&mut device, Opcode::KeyDown, &[1, 2]);
        run(&mut device, Opcode::KeyUp, &[1, 2]);
        run(&mut device, Opcode::EncDelta, &[0, 0xFE]);
        run(&mut device, Opcode::EncKeyDown, &[3]);
        run(&mut device, Opcode::EncKeyUp, &[3]);

        assert_eq!(device.read_grid_event(), Some(GridEvent::new(1, 2, true)));
        assert_eq!(device.read_grid_event(), Some(GridEvent::new(1, 2, false)));
        assert_eq!(device.read_grid_event(), None);

        assert_eq!(
            device.read_arc_event(),
            Some(ArcEvent::Turn { index: 0, delta: -2 })
        );
        assert_eq!(
            device.read_arc_event(),
            Some(ArcEvent::Press {
                index: 3,
                pressed: true
            })
        );
        assert_eq!(
            device.read_arc_event(),
            Some(ArcEvent::Press {
                index: 3,
                pressed: false
            })
        );
        assert_eq!(device.read_arc_event(), None);
    }

    #[test]
    fn test_tilt_is_noop() {
        let mut device = grid();
        let before = device.leds().clone();
        assert!(run(&mut device, Opcode::TiltActive, &[]).is_empty());
        assert!(run(&mut device, Opcode::Tilt, &[]).is_empty());
        assert_eq!(device.leds(), &before);
    }

    #[test]
    fn test_ring_commands() {
        let mut device = MonomeDevice::as_arc(2);
        run(&mut device, Opcode::RingSet, &[1, 63, 0x2A]);
        assert_eq!(device.leds().arc_led(1, 63), Some(10));

        run(&mut device, Opcode::RingAll, &[0, 6]);
        assert!(device.leds().ring(0).unwrap().iter().all(|&v| v == 6));

        device.set_ring_fill(RingFillMode::ZeroRing);
        run(&mut device, Opcode::RingAll, &[0, 6]);
        assert!(device.leds().ring(0).unwrap().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_ring_map_and_range() {
        let mut device = MonomeDevice::as_arc(1);
        device.state_mut().set_vari_mono_thresh(1);
        let mut payload = [0u8; 33];
        payload[1] = 0x51; // pos 0 = 5, pos 1 = 1 → clamped
        payload[32] = 0x0C; // pos 63 = 12
        run(&mut device, Opcode::RingMap, &payload);
        let ring = device.leds().ring(0).unwrap();
        assert_eq!((ring[0], ring[1], ring[63]), (5, 0, 12));

        run(&mut device, Opcode::RingRange, &[0, 60, 4, 3]);
        let ring = device.leds().ring(0).unwrap();
        assert_eq!(&ring[60..], &[3, 3, 3, 3]);
        assert_eq!(&ring[..5], &[3, 3, 3, 3, 0]);
    }

    #[test]
    fn test_dirty_flags() {
        let mut device = MonomeDevice::new(true, true, true, 8, 8, 1);
        run(&mut device, Opcode::Query, &[]);
        assert!(!device.state().grid_dirty());

        run(&mut device, Opcode::LedOn, &[0, 0]);
        assert!(device.state_mut().take_grid_dirty());
        assert!(!device.state().arc_dirty());

        run(&mut device, Opcode::RingSet, &[0, 0, 1]);
        assert!(device.state().arc_dirty());
        assert!(!device.state().grid_dirty());
    }

    #[test]
    fn test_set_id_then_get_id() {
        let mut device = grid();
        let mut raw = [0u8; 32];
        raw[..8].copy_from_slice(b"mydevice");
        assert!(run(&mut device, Opcode::SetId, &raw).is_empty());

        let reply = run(&mut device, Opcode::GetId, &[]);
        assert_eq!(reply.len(), 33);
        assert_eq!(reply[0], 0x01);
        assert_eq!(&reply[1..9], b"mydevice");
        assert!(reply[9..].iter().all(|&b| b == 0));
    }
}
