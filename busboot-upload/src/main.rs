// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Firmware upload tool for busboot devices on a multi-drop serial bus.
//!
//! Usage:
//!   busboot-upload --port /dev/ttyUSB0 info
//!   busboot-upload --port /dev/ttyUSB0 --address 0x11 upload firmware.bin
//!   busboot-upload --port /dev/ttyUSB0 set-address 0x11 --broadcast
//!   busboot-upload --port /dev/ttyUSB0 start

mod cli;
mod commands;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}
