// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Board-specific constants and hooks consumed by the dispatcher.

/// Identity constants and the few hardware actions the protocol exposes.
pub trait Board {
    /// Hardware type byte reported by `GET_HARDWARE_INFO` and matched by
    /// the wildcard filter of `SET_ADDRESS`.
    const HW_TYPE: u8;
    const HW_REVISION: u8;
    const BL_VERSION: u8;

    /// Bus address and address mask the driver starts out with.
    const INITIAL_ADDRESS: u8;
    const ADDRESS_MASK: u8;

    /// Display controller type, for boards that carry one. `None` makes
    /// `POWER_UP_DISPLAY` report unsupported.
    const DISPLAY_TYPE: Option<u8> = None;

    /// Run the board's display power-up sequence. Only invoked when
    /// [`DISPLAY_TYPE`](Board::DISPLAY_TYPE) is `Some`.
    fn power_up_display(&mut self) {}

    /// Unconditional hardware reset (watchdog or system control block).
    /// Does not return on real hardware.
    fn system_reset(&mut self);

    /// Jump to the application through the trampoline. Called by the
    /// embedding firmware after the bootloader loop returns; does not
    /// return on real hardware.
    fn start_application(&mut self);
}
