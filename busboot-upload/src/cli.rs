// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use crate::transport::Transport;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "busboot-upload")]
#[command(about = "Firmware upload tool for busboot devices")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyUSB0)
    #[arg(short, long)]
    pub port: String,

    /// Device bus address (decimal or 0x-prefixed hex)
    #[arg(short, long, default_value = "0x08", value_parser = parse_byte)]
    pub address: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show device identity and flash geometry
    Info,

    /// Upload a firmware image
    Upload {
        /// Firmware binary file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Compare flash contents against a firmware image
    Verify {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Hex-dump flash contents
    Read {
        /// Start address
        #[arg(value_parser = parse_u16)]
        address: u16,

        /// Number of bytes
        #[arg(value_parser = parse_u16)]
        length: u16,
    },

    /// Leave the bootloader and start the application
    Start,

    /// Assign a new bus address
    SetAddress {
        /// The address to assign
        #[arg(value_parser = parse_byte)]
        new_address: u8,

        /// Only devices of this hardware type take the address (0 = any)
        #[arg(long, default_value = "0", value_parser = parse_byte)]
        hw_type: u8,

        /// Send as a general call so unaddressed devices listen too
        #[arg(long)]
        broadcast: bool,
    },

    /// Broadcast a reset to every device on the bus
    Reset,
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("invalid number: {s}"))
}

fn parse_byte(s: &str) -> Result<u8, String> {
    parse_u16(s)?
        .try_into()
        .map_err(|_| format!("value out of range: {s}"))
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    let mut transport = Transport::new(&cli.port, cli.address)?;

    match cli.command {
        Commands::Info => commands::info(&mut transport),
        Commands::Upload { file } => commands::upload(&mut transport, &file),
        Commands::Verify { file } => commands::verify(&mut transport, &file),
        Commands::Read { address, length } => commands::read(&mut transport, address, length),
        Commands::Start => commands::start(&mut transport),
        Commands::SetAddress {
            new_address,
            hw_type,
            broadcast,
        } => commands::set_address(&mut transport, new_address, hw_type, broadcast),
        Commands::Reset => commands::reset(&mut transport),
    }
}
