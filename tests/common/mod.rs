#![allow(dead_code)]

use ghostfat::device::{BankStore, Flash, StackControl, SystemControl, Timer};
use ghostfat::{VolumeConfig, SECTOR_SIZE};

/// In-memory stand-in for the platform behind the volume: flash as a byte
/// vector plus call counters for every collaborator.
pub struct MemDevice {
    pub flash: Vec<u8>,
    pub page_size: u32,
    pub erases: u32,
    pub programs: u32,
    pub stack_disables: u32,
    pub softdevice: bool,
    pub bank_resets: u32,
    pub image_size: u32,
    pub bank_valid: bool,
    pub persists: u32,
    pub scheduled: Vec<u32>,
    pub resets: u32,
}

impl MemDevice {
    pub fn new(flash_size: u32, page_size: u32) -> Self {
        Self {
            flash: vec![0xFF; flash_size as usize],
            page_size,
            erases: 0,
            programs: 0,
            stack_disables: 0,
            softdevice: false,
            bank_resets: 0,
            image_size: 0,
            bank_valid: false,
            persists: 0,
            scheduled: Vec::new(),
            resets: 0,
        }
    }
}

impl Flash for MemDevice {
    fn read(&self, addr: u32, buf: &mut [u8]) {
        let addr = addr as usize;
        buf.copy_from_slice(&self.flash[addr..addr + buf.len()]);
    }

    fn erase_page(&mut self, addr: u32) {
        assert_eq!(addr % self.page_size, 0);
        self.erases += 1;
        let addr = addr as usize;
        self.flash[addr..addr + self.page_size as usize].fill(0xFF);
    }

    fn program_page(&mut self, addr: u32, words: &[u32]) {
        assert_eq!(addr % self.page_size, 0);
        assert_eq!(words.len() * 4, self.page_size as usize);
        self.programs += 1;
        let mut addr = addr as usize;
        for word in words {
            self.flash[addr..addr + 4].copy_from_slice(&word.to_le_bytes());
            addr += 4;
        }
    }
}

impl StackControl for MemDevice {
    fn disable(&mut self) {
        self.stack_disables += 1;
    }

    fn softdevice_present(&self) -> bool {
        self.softdevice
    }
}

impl BankStore for MemDevice {
    fn reset_to_clean_dual_bank(&mut self) {
        self.bank_resets += 1;
        self.image_size = 0;
        self.bank_valid = false;
    }

    fn image_size(&self) -> u32 {
        self.image_size
    }

    fn set_image_size(&mut self, size: u32) {
        self.image_size = size;
    }

    fn mark_bank_valid(&mut self) {
        self.bank_valid = true;
    }

    fn persist(&mut self) {
        self.persists += 1;
    }
}

impl Timer for MemDevice {
    fn schedule_once(&mut self, delay_ms: u32) {
        self.scheduled.push(delay_ms);
    }
}

impl SystemControl for MemDevice {
    fn request_reset(&mut self) {
        self.resets += 1;
    }
}

pub const FLASH_SIZE: u32 = 64 * 1024;
pub const PAGE_SIZE: u32 = 4096;
pub const USER_FLASH_START: u32 = 0x1000;
pub const USER_FLASH_END: u32 = 0x10000;

/// A small volume over 64 KiB of flash, quick to sweep in tests.
pub fn test_config() -> VolumeConfig {
    VolumeConfig {
        flash_size: FLASH_SIZE,
        flash_page_size: PAGE_SIZE,
        user_flash_start: USER_FLASH_START,
        user_flash_end: USER_FLASH_END,
        mbr_size: 0x1000,
        application_start: 0x2000,
        ..VolumeConfig::default()
    }
}

pub fn test_device() -> MemDevice {
    MemDevice::new(FLASH_SIZE, PAGE_SIZE)
}

/// Assemble a raw UF2 sector the way a host-side flashing tool would.
pub fn uf2_sector(block_no: u32, num_blocks: u32, target_addr: u32, payload: &[u8]) -> [u8; SECTOR_SIZE] {
    uf2_sector_with(block_no, num_blocks, target_addr, payload, 0, payload.len() as u32)
}

pub fn uf2_sector_with(
    block_no: u32,
    num_blocks: u32,
    target_addr: u32,
    payload: &[u8],
    flags: u32,
    payload_size: u32,
) -> [u8; SECTOR_SIZE] {
    let mut sector = [0u8; SECTOR_SIZE];
    sector[0..4].copy_from_slice(&ghostfat::uf2::UF2_MAGIC_START0.to_le_bytes());
    sector[4..8].copy_from_slice(&ghostfat::uf2::UF2_MAGIC_START1.to_le_bytes());
    sector[8..12].copy_from_slice(&flags.to_le_bytes());
    sector[12..16].copy_from_slice(&target_addr.to_le_bytes());
    sector[16..20].copy_from_slice(&payload_size.to_le_bytes());
    sector[20..24].copy_from_slice(&block_no.to_le_bytes());
    sector[24..28].copy_from_slice(&num_blocks.to_le_bytes());
    sector[32..32 + payload.len()].copy_from_slice(payload);
    sector[508..512].copy_from_slice(&ghostfat::uf2::UF2_MAGIC_END.to_le_bytes());
    sector
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
