// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Wire-stable protocol types shared by the device core and host tools.

/// Protocol version reported by `GET_PROTOCOL_VERSION`: major, minor.
pub const PROTOCOL_VERSION: [u8; 2] = [1, 0];

/// Largest transfer the framers are prepared to stage.
///
/// Bus drivers may hand the framers any buffer up to this size; a frame
/// whose argument bytes exceed it is answered as an invalid transfer.
pub const MAX_TRANSFER: usize = 128;

/// Status byte of a reply frame.
///
/// The values are fixed by deployed host software and must not change.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    /// The flash subsystem rejected the operation; the payload carries the
    /// one-byte error code.
    CommandFailed = 0x01,
    CommandNotSupported = 0x02,
    /// The transfer was too short to contain a command and checksum.
    InvalidTransfer = 0x03,
    InvalidCrc = 0x04,
    InvalidArguments = 0x05,
    /// Sentinel: the framer must emit nothing on the wire.
    NoReply = 0xff,
}

impl Status {
    pub fn from_wire(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::CommandFailed),
            0x02 => Some(Status::CommandNotSupported),
            0x03 => Some(Status::InvalidTransfer),
            0x04 => Some(Status::InvalidCrc),
            0x05 => Some(Status::InvalidArguments),
            0xff => Some(Status::NoReply),
            _ => None,
        }
    }
}

/// Outcome of dispatching one command: the reply status plus the number of
/// payload bytes the dispatcher wrote into the caller's reply buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CmdResult {
    pub status: Status,
    pub len: u8,
}

impl CmdResult {
    pub fn ok(len: u8) -> Self {
        Self {
            status: Status::Ok,
            len,
        }
    }

    pub fn error(status: Status) -> Self {
        Self { status, len: 0 }
    }
}

/// Command opcodes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    GetProtocolVersion = 0x00,
    SetAddress = 0x01,
    PowerUpDisplay = 0x02,
    GetHardwareInfo = 0x03,
    GetSerialNumber = 0x04,
    StartApplication = 0x05,
    WriteFlash = 0x06,
    FinalizeFlash = 0x07,
    ReadFlash = 0x08,
}

impl Command {
    pub fn from_wire(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(Command::GetProtocolVersion),
            0x01 => Some(Command::SetAddress),
            0x02 => Some(Command::PowerUpDisplay),
            0x03 => Some(Command::GetHardwareInfo),
            0x04 => Some(Command::GetSerialNumber),
            0x05 => Some(Command::StartApplication),
            0x06 => Some(Command::WriteFlash),
            0x07 => Some(Command::FinalizeFlash),
            0x08 => Some(Command::ReadFlash),
            _ => None,
        }
    }
}

/// Single-byte broadcast payloads understood on the general-call address.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GeneralCall {
    /// Reset the device immediately.
    Reset = 0x00,
    /// Return the bus driver to its initial address and mask.
    ResetAddress = 0x01,
}
