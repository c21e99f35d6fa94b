// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Shared test fixtures: in-memory flash, scripted bus driver and
//! recording boards.

#![allow(dead_code)]

use std::collections::VecDeque;

use busboot_core::Bootloader;
use busboot_core::board::Board;
use busboot_core::bus::{BusControl, BusDriver, BusHandler};
use busboot_core::crc::{crc8, crc16_with_address};
use busboot_core::flash::FlashDevice;
use busboot_core::protocol::MAX_TRANSFER;

pub const PAGE_SIZE: u16 = 16;
pub const ERASE_SIZE: u16 = 64;
pub const APP_SIZE: u16 = 0x1C00;
pub const FLASH_SIZE: usize = 0x2000;

/// Relative jump to the bootloader, parked at flash word 0 by the factory
/// image.
pub const BOOT_VECTOR: u16 = 0xC0FF;

/// Relative jump used as the reset vector of uploaded test images.
pub const APP_VECTOR: u16 = 0xC012;

/// In-memory flash model following the latch-then-commit programming
/// scheme. Erase and program events are recorded for assertions; programs
/// AND into memory the way real flash cells only clear bits.
///
/// `APP` sets `APPLICATION_SIZE`/`TRAMPOLINE_START`, so a single type
/// covers both the aligned and the tail-sharing trampoline geometries.
pub struct SimFlash<const APP: u16 = 0x1C00> {
    pub mem: Vec<u8>,
    latches: [u8; PAGE_SIZE as usize],
    pub erases: Vec<u16>,
    pub programs: Vec<u16>,
    pub eeprom: [u8; 64],
    pub signature: [u8; 0x20],
}

impl<const APP: u16> SimFlash<APP> {
    pub fn new() -> Self {
        let mut mem = vec![0xFF; FLASH_SIZE];
        mem[0..2].copy_from_slice(&BOOT_VECTOR.to_le_bytes());
        let mut signature = [0u8; 0x20];
        for (i, byte) in signature.iter_mut().enumerate() {
            *byte = 0xA0 ^ i as u8;
        }
        Self {
            mem,
            latches: [0xFF; PAGE_SIZE as usize],
            erases: Vec::new(),
            programs: Vec::new(),
            eeprom: [0xFF; 64],
            signature,
        }
    }

    pub fn word(&self, address: u16) -> u16 {
        u16::from_le_bytes([
            self.mem[address as usize],
            self.mem[address as usize + 1],
        ])
    }
}

impl<const APP: u16> FlashDevice for SimFlash<APP> {
    const PAGE_SIZE: u16 = PAGE_SIZE;
    const ERASE_SIZE: u16 = ERASE_SIZE;
    const APPLICATION_SIZE: u16 = APP;
    const TRAMPOLINE_START: u16 = APP;

    fn read_byte(&self, address: u16) -> u8 {
        self.mem.get(address as usize).copied().unwrap_or(0xFF)
    }

    fn erase_block(&mut self, address: u16) {
        assert_eq!(address % ERASE_SIZE, 0, "unaligned erase at {address:#06x}");
        let start = address as usize;
        self.mem[start..start + ERASE_SIZE as usize].fill(0xFF);
        self.erases.push(address);
    }

    fn fill_word(&mut self, address: u16, word: u16) {
        assert_eq!(address % 2, 0, "unaligned fill at {address:#06x}");
        let offset = (address % PAGE_SIZE) as usize;
        self.latches[offset..offset + 2].copy_from_slice(&word.to_le_bytes());
    }

    fn write_page(&mut self, address: u16) {
        assert_eq!(address % PAGE_SIZE, 0, "unaligned program at {address:#06x}");
        let start = address as usize;
        for (i, &latch) in self.latches.iter().enumerate() {
            self.mem[start + i] &= latch;
        }
        self.latches = [0xFF; PAGE_SIZE as usize];
        self.programs.push(address);
    }

    fn signature_byte(&self, offset: u8) -> u8 {
        self.signature.get(offset as usize).copied().unwrap_or(0)
    }

    fn read_eeprom(&self, address: u16, data: &mut [u8]) {
        let start = address as usize;
        data.copy_from_slice(&self.eeprom[start..start + data.len()]);
    }

    fn update_eeprom(&mut self, address: u16, data: &[u8]) {
        let start = address as usize;
        self.eeprom[start..start + data.len()].copy_from_slice(data);
    }
}

impl<const APP: u16> Default for SimFlash<APP> {
    fn default() -> Self {
        Self::new()
    }
}

/// Board with a display, recording every hook invocation.
#[derive(Default)]
pub struct SimBoard {
    pub display_power_ups: usize,
    pub resets: usize,
    pub app_starts: usize,
}

impl Board for SimBoard {
    const HW_TYPE: u8 = 0x2A;
    const HW_REVISION: u8 = 0x01;
    const BL_VERSION: u8 = 0x03;
    const INITIAL_ADDRESS: u8 = 0x08;
    const ADDRESS_MASK: u8 = 0x00;
    const DISPLAY_TYPE: Option<u8> = Some(0x0D);

    fn power_up_display(&mut self) {
        self.display_power_ups += 1;
    }

    fn system_reset(&mut self) {
        self.resets += 1;
    }

    fn start_application(&mut self) {
        self.app_starts += 1;
    }
}

/// Board without a display.
#[derive(Default)]
pub struct HeadlessBoard {
    pub resets: usize,
}

impl Board for HeadlessBoard {
    const HW_TYPE: u8 = 0x55;
    const HW_REVISION: u8 = 0x02;
    const BL_VERSION: u8 = 0x01;
    const INITIAL_ADDRESS: u8 = 0x10;
    const ADDRESS_MASK: u8 = 0x00;

    fn system_reset(&mut self) {
        self.resets += 1;
    }

    fn start_application(&mut self) {}
}

/// Address-match state of the scripted bus, handed to the core as its
/// [`BusControl`] view.
pub struct BusState {
    pub address: u8,
    pub mask: u8,
    pub initial: (u8, u8),
    pub address_changes: Vec<u8>,
    pub address_resets: usize,
}

impl BusState {
    pub fn new() -> Self {
        Self {
            address: 0,
            mask: 0,
            initial: (0, 0),
            address_changes: Vec::new(),
            address_resets: 0,
        }
    }
}

impl Default for BusState {
    fn default() -> Self {
        Self::new()
    }
}

impl BusControl for BusState {
    fn set_device_address(&mut self, address: u8) {
        self.address = address;
        self.address_changes.push(address);
    }

    fn reset_device_address(&mut self) {
        self.address = self.initial.0;
        self.mask = self.initial.1;
        self.address_resets += 1;
    }
}

/// Scripted bus driver: transfers queued into `inbox` are delivered one
/// per poll; non-empty replies are captured in `replies`.
#[derive(Default)]
pub struct SimBus {
    pub state: BusState,
    pub inbox: VecDeque<(u8, Vec<u8>)>,
    pub replies: Vec<Vec<u8>>,
    pub initialized: bool,
    pub deinitialized: bool,
    pub polls: usize,
}

impl SimBus {
    pub fn queue(&mut self, address: u8, frame: Vec<u8>) {
        self.inbox.push_back((address, frame));
    }
}

impl BusDriver for SimBus {
    fn init(&mut self, _use_interrupts: bool, address: u8, mask: u8) {
        self.state.initial = (address, mask);
        self.state.address = address;
        self.state.mask = mask;
        self.initialized = true;
    }

    fn poll(&mut self, handler: &mut dyn BusHandler) {
        self.polls += 1;
        assert!(self.polls < 10_000, "bootloader loop never exited");
        if let Some((address, frame)) = self.inbox.pop_front() {
            let mut buf = [0u8; MAX_TRANSFER];
            buf[..frame.len()].copy_from_slice(&frame);
            let n = handler.on_transfer(&mut self.state, address, &mut buf, frame.len());
            if n > 0 {
                self.replies.push(buf[..n].to_vec());
            }
        }
    }

    fn deinit(&mut self) {
        self.deinitialized = true;
    }
}

/// `[payload…, crc8]`
pub fn twi_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = payload.to_vec();
    frame.push(crc8(payload));
    frame
}

/// `[payload…, crc16_lo, crc16_hi]`; the address byte itself is carried
/// separately but folded into the checksum.
pub fn rs485_frame(address: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = payload.to_vec();
    frame.extend_from_slice(&crc16_with_address(address, payload).to_le_bytes());
    frame
}

/// Run one two-wire transfer and return the reply bytes.
pub fn twi_exchange<F: FlashDevice, B: Board>(
    boot: &mut Bootloader<F, B>,
    bus: &mut BusState,
    address: u8,
    frame: &[u8],
) -> Vec<u8> {
    let mut buf = [0u8; MAX_TRANSFER];
    buf[..frame.len()].copy_from_slice(frame);
    let n = boot.two_wire_transfer(bus, address, &mut buf, frame.len());
    buf[..n].to_vec()
}

/// Run one multi-drop transfer and return the reply bytes.
pub fn rs485_exchange<F: FlashDevice, B: Board>(
    boot: &mut Bootloader<F, B>,
    bus: &mut BusState,
    address: u8,
    frame: &[u8],
) -> Vec<u8> {
    let mut buf = [0u8; MAX_TRANSFER];
    buf[..frame.len()].copy_from_slice(frame);
    let n = boot.rs485_transfer(bus, address, &mut buf, frame.len());
    buf[..n].to_vec()
}

/// Deterministic image bytes with a valid relative-jump reset vector at
/// offset 0.
pub fn image(len: usize) -> Vec<u8> {
    let mut data: Vec<u8> = (0..len)
        .map(|i| (i as u8).wrapping_mul(7).wrapping_add(3))
        .collect();
    data[0..2].copy_from_slice(&APP_VECTOR.to_le_bytes());
    data
}
