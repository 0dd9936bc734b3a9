use crate::cache::FlashCache;
use crate::device::{BankStore, Flash, StackControl, Timer};
use crate::fat::SECTOR_SIZE;
use crate::geometry::VolumeConfig;
use crate::transfer::WriteState;
use crate::uf2::{Uf2Block, UF2_FLAG_NOT_MAIN_FLASH, UF2_PAYLOAD_SIZE};
use log::{debug, warn};
use zerocopy::FromBytes;

/// Delay between transfer completion and the finalize/reset callback, long
/// enough for in-flight USB traffic to drain before the device disappears.
pub const FINALIZE_DELAY_MS: u32 = 30;

/// Decode one host-written sector and apply it.
///
/// Non-protocol sectors are ignored without error; a host filesystem driver
/// routinely rewrites FAT and directory sectors through the same path.
pub(crate) fn write_sector<D>(
    config: &VolumeConfig,
    cache: &mut FlashCache,
    state: &mut WriteState,
    device: &mut D,
    data: &[u8; SECTOR_SIZE],
    quiet: bool,
) where
    D: Flash + StackControl + BankStore + Timer,
{
    let block = match Uf2Block::read_from(&data[..]) {
        Some(block) => block,
        None => return,
    };

    if !block.has_valid_magic() {
        return;
    }

    let payload_end = u64::from(block.target_addr) + u64::from(block.payload_size);
    let flashable = block.flags & UF2_FLAG_NOT_MAIN_FLASH == 0
        && block.payload_size == UF2_PAYLOAD_SIZE
        && block.target_addr & (UF2_PAYLOAD_SIZE - 1) == 0
        && block.target_addr >= config.user_flash_start
        && payload_end <= u64::from(config.user_flash_end);

    if flashable {
        debug!("write block at {:#x}", { block.target_addr });
        cache.write(
            device,
            block.target_addr,
            &block.data[..UF2_PAYLOAD_SIZE as usize],
        );
    } else {
        // Usually the readback of an image previously copied off this
        // device being written straight back; it must still count toward
        // completion or the transfer would stall.
        warn!("skip block at {:#x}", { block.target_addr });
    }

    if state.record(block.block_no, block.num_blocks) && !quiet {
        device.schedule_once(FINALIZE_DELAY_MS);
    }
}
