// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Sequential staging of a firmware image into erase-block-sized commits.
//!
//! `WRITE_FLASH` payloads arrive in bus-transfer-sized pieces; the session
//! accumulates them into an erase block, flushes each completed block and
//! leaves the trailing partial block for `FINALIZE_FLASH`. Whole-image
//! uploads are enforced to be strictly sequential: a write either starts a
//! new session at address 0 or continues exactly where the previous one
//! stopped.

use heapless::Vec;

use crate::flash::FlashDevice;
use crate::programmer::{Programmer, WriteError};

/// Capacity of the staging buffer; [`FlashDevice::ERASE_SIZE`] must fit.
pub const MAX_STAGING: usize = 256;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// The write does not continue at the next expected address.
    OutOfSequence,
    /// The flash subsystem rejected a page; the code goes on the wire.
    Flash(WriteError),
}

impl From<WriteError> for SessionError {
    fn from(err: WriteError) -> Self {
        SessionError::Flash(err)
    }
}

/// Image staging state. Lives for the whole bootloader run; one upload at
/// a time.
pub struct WriteSession {
    buffer: Vec<u8, MAX_STAGING>,
    next_write_address: u16,
}

impl WriteSession {
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            next_write_address: 0,
        }
    }

    /// First flash byte not yet accepted from the host.
    pub fn next_write_address(&self) -> u16 {
        self.next_write_address
    }

    /// Accept `data` for flash `address`.
    ///
    /// Address 0 restarts the session; any other address must equal
    /// [`next_write_address`](Self::next_write_address). Completed erase
    /// blocks are committed as they fill up.
    pub fn write<F: FlashDevice>(
        &mut self,
        programmer: &mut Programmer<F>,
        address: u16,
        data: &[u8],
    ) -> Result<(), SessionError> {
        assert!(F::ERASE_SIZE as usize <= MAX_STAGING);

        if address == 0 {
            self.next_write_address = 0;
            self.buffer.clear();
        }
        if address != self.next_write_address {
            return Err(SessionError::OutOfSequence);
        }

        for &byte in data {
            let _ = self.buffer.push(byte);
            self.next_write_address = self.next_write_address.wrapping_add(1);

            if self.buffer.len() == F::ERASE_SIZE as usize {
                let base = self.next_write_address.wrapping_sub(F::ERASE_SIZE);
                // Drop the staged block even on error: the buffer must
                // stay in phase with next_write_address.
                let committed = self.commit(programmer, base);
                self.buffer.clear();
                committed?;
            }
        }

        Ok(())
    }

    /// Commit the trailing partial block.
    ///
    /// The staged tail is kept so an upload may continue afterwards;
    /// repeating the finalize is harmless because an unchanged block is
    /// skipped by the compare step.
    pub fn finalize<F: FlashDevice>(
        &mut self,
        programmer: &mut Programmer<F>,
    ) -> Result<(), SessionError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let base = self.next_write_address - self.buffer.len() as u16;
        self.commit(programmer, base)
    }

    /// Write the staged bytes at `base`, page by page, unless flash
    /// already holds them. The skip keeps re-uploads idempotent and spares
    /// erase cycles; the first page of a block-aligned region triggers the
    /// block erase inside the programmer.
    fn commit<F: FlashDevice>(
        &mut self,
        programmer: &mut Programmer<F>,
        base: u16,
    ) -> Result<(), SessionError> {
        if self.matches_flash(programmer, base) {
            return Ok(());
        }

        let mut offset = 0;
        while offset < self.buffer.len() {
            let end = usize::min(offset + F::PAGE_SIZE as usize, self.buffer.len());
            programmer.write_page(base + offset as u16, &mut self.buffer[offset..end])?;
            offset = end;
        }

        // Writing page 0 patches the staged vector with the word-0 bytes;
        // undo that from the virtualised view so the staged tail equals
        // the host image again.
        if base == 0 {
            self.buffer[0] = programmer.read_byte(0);
            if self.buffer.len() > 1 {
                self.buffer[1] = programmer.read_byte(1);
            }
        }
        Ok(())
    }

    fn matches_flash<F: FlashDevice>(&self, programmer: &Programmer<F>, base: u16) -> bool {
        self.buffer
            .iter()
            .enumerate()
            .all(|(i, &byte)| programmer.read_byte(base + i as u16) == byte)
    }
}

impl Default for WriteSession {
    fn default() -> Self {
        Self::new()
    }
}
