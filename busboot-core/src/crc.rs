// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Frame checksums for the two bus framings.
//!
//! Two-wire frames carry a CRC-8 (poly 0x07, init 0x00, unreflected)
//! computed over the frame bytes; a received frame is valid iff the
//! residue over the whole frame including the trailing CRC is zero.
//! Multi-drop frames carry a CRC-16 (poly 0x8005 reflected, init 0x0000)
//! over the address byte followed by the frame payload, little-endian on
//! the wire.

use ::crc::{CRC_8_SMBUS, CRC_16_ARC, Crc};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);
const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);

/// CRC-8 over `data`.
pub fn crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// CRC-16 over `data`.
pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// CRC-16 over the bus address byte followed by `data`.
///
/// The multi-drop framing folds the address into the checksum even though
/// the address is not part of the delivered frame buffer.
pub fn crc16_with_address(address: u8, data: &[u8]) -> u16 {
    let mut digest = CRC16.digest();
    digest.update(&[address]);
    digest.update(data);
    digest.finalize()
}
