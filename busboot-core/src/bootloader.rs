// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command dispatch: one validated request in, one `CmdResult` out.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::board::Board;
use crate::bus::BusControl;
use crate::flash::FlashDevice;
use crate::programmer::Programmer;
use crate::protocol::{CmdResult, Command, GeneralCall, MAX_TRANSFER, PROTOCOL_VERSION, Status};
use crate::session::{SessionError, WriteSession};

/// Offsets into the device signature imprint table holding the serial
/// number parts (lot number, wafer number, x/y coordinates).
const SERIAL_OFFSETS: [u8; 9] = [0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x15, 0x16, 0x17];

/// Minimum reply room the dispatcher insists on before answering at all.
const MIN_REPLY_ROOM: usize = 5;

/// The bootloader's long-lived state: programmer, upload session, board
/// hooks and the exit flag the main loop watches.
pub struct Bootloader<F: FlashDevice, B: Board> {
    programmer: Programmer<F>,
    session: WriteSession,
    board: B,
    exit: AtomicBool,
}

impl<F: FlashDevice, B: Board> Bootloader<F, B> {
    pub fn new(flash: F, board: B) -> Self {
        Self {
            programmer: Programmer::new(flash),
            session: WriteSession::new(),
            board,
            exit: AtomicBool::new(false),
        }
    }

    pub fn programmer(&self) -> &Programmer<F> {
        &self.programmer
    }

    pub fn programmer_mut(&mut self) -> &mut Programmer<F> {
        &mut self.programmer
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Set by `START_APPLICATION`; observed by the run loop.
    pub fn exit_requested(&self) -> bool {
        self.exit.load(Ordering::Relaxed)
    }

    /// Execute one command.
    ///
    /// `argin` holds the argument bytes, `argout` the reply payload area;
    /// the returned [`CmdResult`] says how many payload bytes were
    /// written. A reply area smaller than 5 bytes yields `NoReply`
    /// unconditionally.
    pub fn process_command(
        &mut self,
        bus: &mut dyn BusControl,
        cmd: u8,
        argin: &[u8],
        argout: &mut [u8],
    ) -> CmdResult {
        if argout.len() < MIN_REPLY_ROOM {
            return CmdResult::error(Status::NoReply);
        }

        let Some(command) = Command::from_wire(cmd) else {
            return CmdResult::error(Status::CommandNotSupported);
        };

        match command {
            Command::GetProtocolVersion => {
                if !argin.is_empty() {
                    return CmdResult::error(Status::InvalidArguments);
                }
                argout[..2].copy_from_slice(&PROTOCOL_VERSION);
                CmdResult::ok(2)
            }

            Command::SetAddress => {
                if argin.len() != 2 {
                    return CmdResult::error(Status::InvalidArguments);
                }
                // Only respond when the requested hardware type is the
                // wildcard or matches ours; other devices on the bus may
                // answer instead.
                if argin[1] != 0 && argin[1] != B::HW_TYPE {
                    return CmdResult::error(Status::NoReply);
                }
                bus.set_device_address(argin[0]);
                CmdResult::ok(0)
            }

            Command::PowerUpDisplay => match B::DISPLAY_TYPE {
                Some(display) => {
                    if !argin.is_empty() {
                        return CmdResult::error(Status::InvalidArguments);
                    }
                    self.board.power_up_display();
                    argout[0] = display;
                    CmdResult::ok(1)
                }
                None => CmdResult::error(Status::CommandNotSupported),
            },

            Command::GetHardwareInfo => {
                if !argin.is_empty() {
                    return CmdResult::error(Status::InvalidArguments);
                }
                argout[0] = B::HW_TYPE;
                argout[1] = B::HW_REVISION;
                argout[2] = B::BL_VERSION;
                argout[3] = (F::APPLICATION_SIZE >> 8) as u8;
                argout[4] = F::APPLICATION_SIZE as u8;
                CmdResult::ok(5)
            }

            Command::GetSerialNumber => {
                if !argin.is_empty() {
                    return CmdResult::error(Status::InvalidArguments);
                }
                if argout.len() < SERIAL_OFFSETS.len() {
                    return CmdResult::error(Status::NoReply);
                }
                for (out, &offset) in argout.iter_mut().zip(SERIAL_OFFSETS.iter()) {
                    *out = self.programmer.flash().signature_byte(offset);
                }
                CmdResult::ok(SERIAL_OFFSETS.len() as u8)
            }

            Command::StartApplication => {
                if !argin.is_empty() {
                    return CmdResult::error(Status::InvalidArguments);
                }
                self.exit.store(true, Ordering::Relaxed);
                CmdResult::ok(0)
            }

            Command::WriteFlash => {
                if argin.len() < 2 {
                    return CmdResult::error(Status::InvalidArguments);
                }
                let address = u16::from_be_bytes([argin[0], argin[1]]);
                match self.session.write(&mut self.programmer, address, &argin[2..]) {
                    Ok(()) => CmdResult::ok(0),
                    Err(err) => Self::session_error(err, argout),
                }
            }

            Command::FinalizeFlash => {
                if !argin.is_empty() {
                    return CmdResult::error(Status::InvalidArguments);
                }
                match self.session.finalize(&mut self.programmer) {
                    Ok(()) => {
                        argout[0] = self.programmer.take_erase_count();
                        CmdResult::ok(1)
                    }
                    Err(err) => Self::session_error(err, argout),
                }
            }

            Command::ReadFlash => {
                if argin.len() != 3 {
                    return CmdResult::error(Status::InvalidArguments);
                }
                let address = u16::from_be_bytes([argin[0], argin[1]]);
                let len = argin[2] as usize;
                if len > argout.len() {
                    return CmdResult::error(Status::InvalidArguments);
                }
                self.programmer.read_flash(address, &mut argout[..len]);
                CmdResult::ok(len as u8)
            }
        }
    }

    /// Handle a broadcast payload. Never produces a reply: several devices
    /// would answer at once.
    ///
    /// A payload longer than one byte is a full command frame; the
    /// dispatcher runs it with the reply thrown away, which is what lets a
    /// host assign addresses by hardware type before any device has one.
    /// Single bytes other than the general-call codes are ignored; on the
    /// two-wire bus they arrive without any checksum.
    pub fn general_call(&mut self, bus: &mut dyn BusControl, payload: &[u8]) {
        match payload {
            [raw] if *raw == GeneralCall::Reset as u8 => self.board.system_reset(),
            [raw] if *raw == GeneralCall::ResetAddress as u8 => bus.reset_device_address(),
            [cmd, args @ ..] if !args.is_empty() => {
                let mut discard = [0u8; MAX_TRANSFER];
                let _ = self.process_command(bus, *cmd, args, &mut discard);
            }
            _ => {}
        }
    }

    fn session_error(err: SessionError, argout: &mut [u8]) -> CmdResult {
        match err {
            SessionError::OutOfSequence => CmdResult::error(Status::InvalidArguments),
            SessionError::Flash(err) => {
                argout[0] = err.code();
                CmdResult {
                    status: Status::CommandFailed,
                    len: 1,
                }
            }
        }
    }
}
