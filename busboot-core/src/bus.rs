// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Capability traits for the byte-level bus driver.
//!
//! The driver owns the transfer buffers and the address-match hardware;
//! the core sees completed transfers through [`BusHandler::on_transfer`]
//! and writes the reply back into the same buffer.

/// Runtime address control, available to the core while it handles a
/// transfer.
pub trait BusControl {
    /// Respond to `address` from now on (two-wire address assignment).
    fn set_device_address(&mut self, address: u8);

    /// Return to the initial address and mask configured at init.
    fn reset_device_address(&mut self);
}

/// Per-transfer callback invoked by the driver.
pub trait BusHandler {
    /// Handle one completed transfer addressed to `address`.
    ///
    /// `buf[..len]` holds the received frame; the reply is written back
    /// into `buf`. Returns the reply length, 0 to suppress transmission.
    fn on_transfer(
        &mut self,
        bus: &mut dyn BusControl,
        address: u8,
        buf: &mut [u8],
        len: usize,
    ) -> usize;
}

/// The bus peripheral in slave mode.
pub trait BusDriver {
    /// Configure slave mode with the given address and address mask.
    /// The bootloader always passes `use_interrupts = false`: polled mode
    /// keeps transfers synchronous with the busy-waiting flash writes.
    fn init(&mut self, use_interrupts: bool, address: u8, mask: u8);

    /// Process at most one in-flight transfer, invoking `handler` if a
    /// frame completed. A transfer the driver timed out is dropped without
    /// a callback.
    fn poll(&mut self, handler: &mut dyn BusHandler);

    /// Release the peripheral.
    fn deinit(&mut self);
}
