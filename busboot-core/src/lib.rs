// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Protocol core for the busboot slave-device bootloader.
//!
//! A host on a shared bus (two-wire with addressing, or multi-drop serial
//! with addressing) asks each device to identify itself, accept a firmware
//! image and hand control to it. This crate holds everything between the
//! byte-level bus driver and the flash hardware:
//!
//! - CRC-8 / CRC-16 frame checking ([`crc`])
//! - wire-stable status and command codes ([`protocol`])
//! - the flash self-programmer with its reset-vector trampoline
//!   ([`programmer`])
//! - the sequential image staging session ([`session`])
//! - command dispatch and the per-transfer framers ([`bootloader`],
//!   [`framing`])
//!
//! Hardware enters only through the [`FlashDevice`], [`Board`] and
//! [`BusDriver`] traits, so the whole crate runs (and is tested) on the
//! host. The `two-wire` and `rs485` features select which framer a build
//! links; both are enabled by default so tests cover both.

#![cfg_attr(not(test), no_std)]

pub mod board;
pub mod bootloader;
pub mod bus;
pub mod crc;
pub mod flash;
#[cfg(any(feature = "two-wire", feature = "rs485"))]
pub mod framing;
pub mod programmer;
pub mod protocol;
pub mod session;

// Re-export the types an integration needs to wire a device together.
pub use board::Board;
pub use bootloader::Bootloader;
pub use bus::{BusControl, BusDriver, BusHandler};
pub use flash::FlashDevice;
pub use programmer::{Programmer, WriteError, offset_relative_jump};
pub use protocol::{CmdResult, Command, GeneralCall, MAX_TRANSFER, PROTOCOL_VERSION, Status};
pub use session::WriteSession;
