// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations for bootloader operations.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};

use busboot_core::protocol::{Command, GeneralCall, Status};

use crate::transport::{Reply, Transport};

/// Payload bytes per WRITE_FLASH request.
const WRITE_CHUNK: usize = 64;
/// Payload bytes per READ_FLASH request.
const READ_CHUNK: usize = 32;

struct HardwareInfo {
    hw_type: u8,
    hw_revision: u8,
    bl_version: u8,
    app_size: u16,
}

fn expect_ok(reply: Reply, what: &str) -> Result<Vec<u8>> {
    match reply.status {
        Status::Ok => Ok(reply.payload),
        Status::CommandFailed => bail!(
            "{what} failed with device error code {}",
            reply.payload.first().copied().unwrap_or(0)
        ),
        status => bail!("{what} failed: {status:?}"),
    }
}

fn hardware_info(transport: &mut Transport) -> Result<HardwareInfo> {
    let payload = expect_ok(
        transport.send_recv(Command::GetHardwareInfo, &[])?,
        "GET_HARDWARE_INFO",
    )?;
    if payload.len() != 5 {
        bail!("Malformed hardware info reply ({} bytes)", payload.len());
    }
    Ok(HardwareInfo {
        hw_type: payload[0],
        hw_revision: payload[1],
        bl_version: payload[2],
        app_size: u16::from_be_bytes([payload[3], payload[4]]),
    })
}

/// Query and display device identity.
pub fn info(transport: &mut Transport) -> Result<()> {
    let version = expect_ok(
        transport.send_recv(Command::GetProtocolVersion, &[])?,
        "GET_PROTOCOL_VERSION",
    )?;
    let info = hardware_info(transport)?;
    let serial = expect_ok(
        transport.send_recv(Command::GetSerialNumber, &[])?,
        "GET_SERIAL_NUMBER",
    )?;

    let serial_hex: String = serial.iter().map(|b| format!("{b:02x}")).collect();

    println!("Device at {:#04x}:", transport.address());
    println!(
        "  Protocol:   {}.{}",
        version.first().copied().unwrap_or(0),
        version.get(1).copied().unwrap_or(0)
    );
    println!("  Hardware:   type {:#04x}, revision {}", info.hw_type, info.hw_revision);
    println!("  Bootloader: version {}", info.bl_version);
    println!("  App flash:  {} bytes", info.app_size);
    println!("  Serial:     {serial_hex}");

    Ok(())
}

/// Upload a firmware image, sequentially from address 0.
pub fn upload(transport: &mut Transport, file: &Path) -> Result<()> {
    let firmware =
        fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let info = hardware_info(transport)?;

    if firmware.len() > info.app_size as usize {
        bail!(
            "Image is {} bytes but the device only has {} bytes of application flash",
            firmware.len(),
            info.app_size
        );
    }

    println!(
        "Firmware: {} ({} bytes)",
        file.display(),
        firmware.len()
    );
    println!(
        "Device:   type {:#04x} rev {} at {:#04x}",
        info.hw_type,
        info.hw_revision,
        transport.address()
    );
    println!();

    let pb = ProgressBar::new(firmware.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let mut offset: u16 = 0;
    for chunk in firmware.chunks(WRITE_CHUNK) {
        let mut args = offset.to_be_bytes().to_vec();
        args.extend_from_slice(chunk);

        let reply = transport.send_recv(Command::WriteFlash, &args)?;
        if reply.status != Status::Ok {
            pb.abandon();
        }
        expect_ok(reply, &format!("WRITE_FLASH at {offset:#06x}"))?;

        offset += chunk.len() as u16;
        pb.set_position(offset as u64);
    }
    pb.finish_with_message("Upload complete");
    println!();

    let payload = expect_ok(
        transport.send_recv(Command::FinalizeFlash, &[])?,
        "FINALIZE_FLASH",
    )?;
    println!(
        "Upload complete, {} flash block(s) rewritten.",
        payload.first().copied().unwrap_or(0)
    );
    println!(
        "Use 'busboot-upload --port {} start' to run the application.",
        transport.port_name()
    );

    Ok(())
}

/// Compare flash contents against a local image.
pub fn verify(transport: &mut Transport, file: &Path) -> Result<()> {
    let firmware =
        fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let mut offset: u16 = 0;
    for chunk in firmware.chunks(READ_CHUNK) {
        let mut args = offset.to_be_bytes().to_vec();
        args.push(chunk.len() as u8);
        let payload = expect_ok(
            transport.send_recv(Command::ReadFlash, &args)?,
            &format!("READ_FLASH at {offset:#06x}"),
        )?;

        if payload != chunk {
            let mismatch = payload
                .iter()
                .zip(chunk.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(0);
            bail!(
                "Verification failed at {:#06x}: device has {:#04x}, image has {:#04x}",
                offset + mismatch as u16,
                payload.get(mismatch).copied().unwrap_or(0),
                chunk[mismatch]
            );
        }
        offset += chunk.len() as u16;
    }

    println!("Verify OK ({} bytes match).", firmware.len());
    Ok(())
}

/// Hex-dump `length` bytes of flash starting at `address`.
pub fn read(transport: &mut Transport, address: u16, length: u16) -> Result<()> {
    let mut data = Vec::with_capacity(length as usize);
    let mut offset = address;
    let mut remaining = length as usize;

    while remaining > 0 {
        let chunk = remaining.min(READ_CHUNK);
        let mut args = offset.to_be_bytes().to_vec();
        args.push(chunk as u8);
        let payload = expect_ok(
            transport.send_recv(Command::ReadFlash, &args)?,
            &format!("READ_FLASH at {offset:#06x}"),
        )?;
        data.extend_from_slice(&payload);
        offset += chunk as u16;
        remaining -= chunk;
    }

    for (i, line) in data.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{b:02x}")).collect();
        println!("{:04x}  {}", address as usize + i * 16, hex.join(" "));
    }

    Ok(())
}

/// Leave the bootloader and start the application.
pub fn start(transport: &mut Transport) -> Result<()> {
    expect_ok(
        transport.send_recv(Command::StartApplication, &[])?,
        "START_APPLICATION",
    )?;
    println!("Application started.");
    Ok(())
}

/// Assign a new bus address, optionally as a broadcast so devices still on
/// the shared initial address take it too.
pub fn set_address(
    transport: &mut Transport,
    new_address: u8,
    hw_type: u8,
    broadcast: bool,
) -> Result<()> {
    if broadcast {
        transport.broadcast(&[Command::SetAddress as u8, new_address, hw_type])?;
        println!(
            "Broadcast address assignment to {new_address:#04x} (no acknowledgement on broadcast)."
        );
        return Ok(());
    }

    expect_ok(
        transport.send_recv(Command::SetAddress, &[new_address, hw_type])?,
        "SET_ADDRESS",
    )?;
    println!("Device now listens on {new_address:#04x}.");
    Ok(())
}

/// Broadcast a reset to every device on the bus.
pub fn reset(transport: &mut Transport) -> Result<()> {
    transport.broadcast(&[GeneralCall::Reset as u8])?;
    println!("Reset broadcast sent.");
    Ok(())
}
