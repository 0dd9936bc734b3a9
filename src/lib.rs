//! A virtual FAT16 volume that turns UF2 drag-and-drop into in-place flash
//! programming.
//!
//! No filesystem exists anywhere: every sector a host reads is synthesized
//! on demand from the static layout and current flash contents, and every
//! sector it writes is decoded as a UF2 block and applied through a
//! page-granular write cache. Plug the core into a USB mass-storage
//! transport by forwarding sector reads and writes:
//!
//! ```ignore
//! let mut disk = GhostFat::new(VolumeConfig::default(), device)?;
//! // transport read callback
//! let sector = disk.read_sector(lba);
//! // transport write callback
//! disk.write_sector(lba, &sector, false);
//! // platform one-shot timer callback
//! disk.finalize();
//! ```
//!
//! The platform behind the volume is reached through the narrow traits in
//! [`device`]; see [`VolumeConfig`] for the tunable layout parameters.

use crate::cache::FlashCache;
use crate::device::{BankStore, Flash, StackControl, SystemControl, Timer};
use crate::transfer::WriteState;

pub mod cache;
pub mod device;
pub mod fat;
pub mod files;
pub mod geometry;
pub mod transfer;
pub mod uf2;

mod reader;
mod writer;

pub use crate::fat::SECTOR_SIZE;
pub use crate::geometry::{ConfigError, Geometry, VolumeConfig};
pub use crate::writer::FINALIZE_DELAY_MS;

/// The virtual volume: sector synthesis on the read side, UF2 decode and
/// flash programming on the write side.
///
/// Owns the platform device and all mutable session state. One sector
/// operation runs at a time; the deferred [`finalize`](Self::finalize) is
/// expected to be invoked from the platform's timer callback on the same
/// logical thread, never concurrently with a sector operation.
pub struct GhostFat<D> {
    config: VolumeConfig,
    geometry: Geometry,
    cache: FlashCache,
    state: WriteState,
    device: D,
}

impl<D> GhostFat<D>
where
    D: Flash + StackControl + BankStore + Timer + SystemControl,
{
    /// Build the volume, validating the layout invariants of `config`.
    pub fn new(config: VolumeConfig, device: D) -> Result<Self, ConfigError> {
        let geometry = Geometry::new(&config)?;
        let cache = FlashCache::new(config.flash_page_size);

        Ok(Self {
            config,
            geometry,
            cache,
            state: WriteState::new(),
            device,
        })
    }

    /// Synthesize the sector at `lba`. Reads live flash, mutates nothing.
    pub fn read_sector(&self, lba: u32) -> [u8; SECTOR_SIZE] {
        let mut data = [0; SECTOR_SIZE];
        reader::read_sector(&self.config, &self.geometry, &self.device, lba, &mut data);
        data
    }

    /// Accept one host-written sector.
    ///
    /// Protocol blocks are applied to flash and counted toward transfer
    /// completion; anything else is ignored without error. With `quiet`
    /// set, completion never arms the finalize timer.
    pub fn write_sector(&mut self, _lba: u32, data: &[u8; SECTOR_SIZE], quiet: bool) {
        writer::write_sector(
            &self.config,
            &mut self.cache,
            &mut self.state,
            &mut self.device,
            data,
            quiet,
        );
    }

    /// Finish the session: flush, seal the bank metadata, and reset.
    ///
    /// Invoked by the one-shot timer armed when a transfer completes. If
    /// nothing was written this session the device just resets.
    pub fn finalize(&mut self) {
        if self.cache.had_write() {
            self.cache.flush(&mut self.device);

            self.device.mark_bank_valid();
            let application_start = if self.device.softdevice_present() {
                self.config.application_start
            } else {
                self.config.mbr_size
            };
            let image_size = self.device.image_size();
            if image_size > application_start {
                self.device.set_image_size(image_size - application_start);
            }
            self.device.persist();
        }

        self.device.request_reset();
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }
}
