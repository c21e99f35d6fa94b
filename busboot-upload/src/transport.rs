// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport: multi-drop frame encoding and reply parsing.
//!
//! Requests go out as `[addr, cmd, args…, crc16_lo, crc16_hi]`; replies
//! come back as `[addr, status, len, payload…, crc16_lo, crc16_hi]`. A
//! device that saw a corrupt frame (or one addressed elsewhere) stays
//! silent, which surfaces here as a read timeout.

use std::io::{Read, Write};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serialport::SerialPort;

use busboot_core::crc::crc16;
use busboot_core::protocol::{Command, Status};

/// Default timeout for serial operations in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// The general-call (broadcast) bus address.
pub const GENERAL_CALL: u8 = 0x00;

/// A parsed device reply.
pub struct Reply {
    pub status: Status,
    pub payload: Vec<u8>,
}

/// Connection to one device on the bus.
pub struct Transport {
    port: Box<dyn SerialPort>,
    address: u8,
}

impl Transport {
    pub fn new(port_name: &str, address: u8) -> Result<Self> {
        let port = serialport::new(port_name, 115_200)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()
            .with_context(|| format!("Failed to open serial port {port_name}"))?;

        Ok(Self { port, address })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_else(|| "?".to_string())
    }

    /// Send a command to the device and wait for its reply.
    pub fn send_recv(&mut self, cmd: Command, args: &[u8]) -> Result<Reply> {
        self.drain_rx();
        self.send_frame(self.address, cmd as u8, args)?;
        self.receive()
    }

    /// Send a payload to the general-call address. Broadcasts are never
    /// answered, so there is nothing to wait for.
    pub fn broadcast(&mut self, payload: &[u8]) -> Result<()> {
        self.drain_rx();
        let (first, rest) = payload.split_first().context("Empty broadcast payload")?;
        self.send_frame(GENERAL_CALL, *first, rest)
    }

    fn send_frame(&mut self, address: u8, cmd: u8, args: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(args.len() + 4);
        frame.push(address);
        frame.push(cmd);
        frame.extend_from_slice(args);
        let crc = crc16(&frame);
        frame.extend_from_slice(&crc.to_le_bytes());

        self.port
            .write_all(&frame)
            .context("Failed to write to serial port")?;
        self.port.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Reply> {
        let mut header = [0u8; 3];
        self.port
            .read_exact(&mut header)
            .context("No reply from device (wrong address, or frame rejected)")?;
        let [address, status, len] = header;

        if address != self.address {
            bail!(
                "Reply address mismatch: expected {:#04x}, got {:#04x}",
                self.address,
                address
            );
        }

        let mut rest = vec![0u8; len as usize + 2];
        self.port.read_exact(&mut rest).context("Truncated reply")?;

        let payload = rest[..len as usize].to_vec();
        let received = u16::from_le_bytes([rest[len as usize], rest[len as usize + 1]]);
        let mut whole = header.to_vec();
        whole.extend_from_slice(&payload);
        if crc16(&whole) != received {
            bail!("Reply CRC mismatch");
        }

        let status = Status::from_wire(status)
            .with_context(|| format!("Unknown status byte {status:#04x}"))?;
        Ok(Reply { status, payload })
    }

    fn drain_rx(&mut self) {
        let mut buf = [0u8; 64];
        let old_timeout = self.port.timeout();
        let _ = self.port.set_timeout(Duration::from_millis(10));
        while self.port.read(&mut buf).unwrap_or(0) > 0 {}
        let _ = self.port.set_timeout(old_timeout);
    }
}
