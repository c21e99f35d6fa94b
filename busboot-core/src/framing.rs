// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Per-transfer framing: size and CRC validation, dispatch, reply layout.
//!
//! Both bus variants share the dispatcher and differ only in frame layout
//! and in how CRC failures are reported: the two-wire bus answers with a
//! status byte, the multi-drop bus stays silent because a corrupt frame
//! may have been addressed to another device.
//!
//! Replies are written into the same buffer the request arrived in, so
//! the argument bytes are staged into a fixed-capacity copy before the
//! dispatcher runs.

use heapless::Vec;

use crate::board::Board;
use crate::bootloader::Bootloader;
use crate::bus::{BusControl, BusDriver, BusHandler};
#[cfg(feature = "rs485")]
use crate::crc::{crc16, crc16_with_address};
#[cfg(feature = "two-wire")]
use crate::crc::crc8;
use crate::flash::FlashDevice;
use crate::protocol::{CmdResult, MAX_TRANSFER, Status};

#[cfg(feature = "two-wire")]
impl<F: FlashDevice, B: Board> Bootloader<F, B> {
    /// Handle one two-wire transfer.
    ///
    /// `buf[..len]` is the received frame `[cmd, args…, crc8]`; the CRC-8
    /// residue over the whole frame must be zero. The reply `[status,
    /// len, payload…, crc8]` is written back into `buf`; the return value
    /// is its length, 0 for nothing to send.
    pub fn two_wire_transfer(
        &mut self,
        bus: &mut dyn BusControl,
        address: u8,
        buf: &mut [u8],
        len: usize,
    ) -> usize {
        if address == 0 {
            // Broadcast. Single-byte payloads are raw general calls;
            // anything longer must carry its own valid CRC.
            match len {
                1 => self.general_call(bus, &buf[..1]),
                _ if len >= 2 && crc8(&buf[..len]) == 0 => {
                    self.general_call(bus, &buf[..len - 1])
                }
                _ => {}
            }
            return 0;
        }

        let max_len = buf.len();
        // Need room for at least status, length and CRC.
        if max_len < 3 {
            return 0;
        }

        let res = if len < 2 {
            CmdResult::error(Status::InvalidTransfer)
        } else if crc8(&buf[..len]) != 0 {
            CmdResult::error(Status::InvalidCrc)
        } else {
            match Vec::<u8, MAX_TRANSFER>::from_slice(&buf[1..len - 1]) {
                Ok(args) => self.process_command(bus, buf[0], &args, &mut buf[2..max_len - 1]),
                Err(()) => CmdResult::error(Status::InvalidTransfer),
            }
        };

        if res.status == Status::NoReply {
            return 0;
        }

        buf[0] = res.status as u8;
        buf[1] = res.len;
        let reply_len = res.len as usize + 2;
        buf[reply_len] = crc8(&buf[..reply_len]);
        reply_len + 1
    }

    /// Poll the two-wire driver until a command requests exit.
    pub fn run_two_wire<D: BusDriver>(&mut self, bus: &mut D) {
        bus.init(false, B::INITIAL_ADDRESS, B::ADDRESS_MASK);
        while !self.exit_requested() {
            bus.poll(&mut TwoWireHandler(self));
        }
        bus.deinit();
    }
}

/// [`BusHandler`] adapter routing transfers into
/// [`Bootloader::two_wire_transfer`].
#[cfg(feature = "two-wire")]
pub struct TwoWireHandler<'a, F: FlashDevice, B: Board>(pub &'a mut Bootloader<F, B>);

#[cfg(feature = "two-wire")]
impl<F: FlashDevice, B: Board> BusHandler for TwoWireHandler<'_, F, B> {
    fn on_transfer(
        &mut self,
        bus: &mut dyn BusControl,
        address: u8,
        buf: &mut [u8],
        len: usize,
    ) -> usize {
        self.0.two_wire_transfer(bus, address, buf, len)
    }
}

#[cfg(feature = "rs485")]
impl<F: FlashDevice, B: Board> Bootloader<F, B> {
    /// Handle one multi-drop transfer.
    ///
    /// The driver strips the address byte: `buf[..len]` is `[cmd, args…,
    /// crc16_lo, crc16_hi]` with the CRC-16 computed over the address
    /// followed by everything before the CRC. A mismatch is answered with
    /// silence. The reply `[address, status, len, payload…, crc16_lo,
    /// crc16_hi]` is written back into `buf`.
    pub fn rs485_transfer(
        &mut self,
        bus: &mut dyn BusControl,
        address: u8,
        buf: &mut [u8],
        len: usize,
    ) -> usize {
        let max_len = buf.len();
        // Need room for at least address, status, length and CRC.
        if max_len < 5 {
            return 0;
        }

        let res = if len < 3 {
            CmdResult::error(Status::InvalidTransfer)
        } else {
            let received = u16::from_le_bytes([buf[len - 2], buf[len - 1]]);
            if crc16_with_address(address, &buf[..len - 2]) != received {
                // Cannot be sure the frame was for us; someone else might
                // also reply.
                return 0;
            }
            if address == 0 {
                self.general_call(bus, &buf[..len - 2]);
                return 0;
            }
            match Vec::<u8, MAX_TRANSFER>::from_slice(&buf[1..len - 2]) {
                Ok(args) => self.process_command(bus, buf[0], &args, &mut buf[3..max_len - 2]),
                Err(()) => CmdResult::error(Status::InvalidTransfer),
            }
        };

        if res.status == Status::NoReply {
            return 0;
        }

        buf[0] = address;
        buf[1] = res.status as u8;
        buf[2] = res.len;
        let frame_len = res.len as usize + 3;
        let crc = crc16(&buf[..frame_len]);
        buf[frame_len] = crc as u8;
        buf[frame_len + 1] = (crc >> 8) as u8;
        frame_len + 2
    }

    /// Poll the multi-drop driver until a command requests exit.
    pub fn run_rs485<D: BusDriver>(&mut self, bus: &mut D) {
        bus.init(false, B::INITIAL_ADDRESS, B::ADDRESS_MASK);
        while !self.exit_requested() {
            bus.poll(&mut Rs485Handler(self));
        }
        bus.deinit();
    }
}

/// [`BusHandler`] adapter routing transfers into
/// [`Bootloader::rs485_transfer`].
#[cfg(feature = "rs485")]
pub struct Rs485Handler<'a, F: FlashDevice, B: Board>(pub &'a mut Bootloader<F, B>);

#[cfg(feature = "rs485")]
impl<F: FlashDevice, B: Board> BusHandler for Rs485Handler<'_, F, B> {
    fn on_transfer(
        &mut self,
        bus: &mut dyn BusControl,
        address: u8,
        buf: &mut [u8],
        len: usize,
    ) -> usize {
        self.0.rs485_transfer(bus, address, buf, len)
    }
}
