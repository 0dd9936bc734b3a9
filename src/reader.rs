use crate::device::Flash;
use crate::fat::{
    padded_short_name, BootSector, DirEntry, ATTR_VOLUME_LABEL, DIR_ENTRIES_PER_SECTOR,
    DIR_ENTRY_DATE, FAT_END_OF_CHAIN, FIRST_FILE_CLUSTER, SECTOR_SIZE,
};
use crate::files::FileContent;
use crate::geometry::{Geometry, SectorRegion, VolumeConfig};
use crate::uf2::{Uf2Block, UF2_MAGIC_END, UF2_MAGIC_START0, UF2_MAGIC_START1, UF2_PAYLOAD_SIZE};
use assert_into::AssertInto;
use zerocopy::{AsBytes, FromBytes};

const FAT_ENTRIES_PER_SECTOR: u32 = (SECTOR_SIZE / 2) as u32;

/// Synthesize one 512-byte sector of the virtual volume.
///
/// Pure with respect to device state; reads current flash, mutates nothing.
/// Regions the layout does not define come back all zero.
pub(crate) fn read_sector<D: Flash>(
    config: &VolumeConfig,
    geometry: &Geometry,
    device: &D,
    lba: u32,
    data: &mut [u8; SECTOR_SIZE],
) {
    data.fill(0);

    match geometry.region_for(lba) {
        SectorRegion::Boot => {
            let boot = boot_sector(config, geometry);
            data[..boot.as_bytes().len()].copy_from_slice(boot.as_bytes());
            data[510] = 0x55;
            data[511] = 0xAA;
        }
        SectorRegion::Fat(index) => fat_sector(config, geometry, index, data),
        SectorRegion::RootDir(index) => {
            // Directory entries all fit in the first sector; the rest of the
            // root directory region stays empty.
            if index == 0 {
                root_dir_sector(config, geometry, data);
            }
        }
        SectorRegion::Data(index) => data_sector(config, geometry, device, index, data),
        SectorRegion::Unmapped => {}
    }
}

fn boot_sector(config: &VolumeConfig, geometry: &Geometry) -> BootSector {
    BootSector {
        jump_instruction: [0xEB, 0x3C, 0x90],
        oem_info: *b"UF2 UF2 ",
        sector_size: SECTOR_SIZE.assert_into(),
        sectors_per_cluster: 1,
        reserved_sectors: config.reserved_sectors.assert_into(),
        fat_copies: 2,
        root_directory_entries: (config.root_dir_sectors as usize * DIR_ENTRIES_PER_SECTOR)
            .assert_into(),
        total_sectors16: (geometry.num_blocks() - 2).assert_into(),
        media_descriptor: 0xF8,
        sectors_per_fat: geometry.sectors_per_fat().assert_into(),
        sectors_per_track: 1,
        heads: 1,
        hidden_sectors: 0,
        total_sectors32: 0,
        physical_drive_num: 0x80,
        reserved: 0,
        extended_boot_sig: 0x29,
        volume_serial_number: 0x00420042,
        volume_label: padded_short_name(config.volume_label),
        filesystem_identifier: *b"FAT16   ",
    }
}

fn fat_sector(config: &VolumeConfig, geometry: &Geometry, index: u32, data: &mut [u8; SECTOR_SIZE]) {
    if index == 0 {
        // Terminal chain markers: entries 0 and 1 are reserved by the
        // format, then one end-of-chain entry per single-sector file.
        data[0] = 0xF0;
        for byte in &mut data[1..config.files.len() * 2 + 4] {
            *byte = 0xFF;
        }
    }

    // The live image file is one linear chain across its whole sector
    // range; the entries below overwrite its seeded terminal marker.
    for slot in 0..FAT_ENTRIES_PER_SECTOR {
        let cluster = index * FAT_ENTRIES_PER_SECTOR + slot;
        if cluster >= geometry.image_first_cluster() && cluster <= geometry.image_last_cluster() {
            let link: u16 = if cluster == geometry.image_last_cluster() {
                FAT_END_OF_CHAIN
            } else {
                (cluster + 1).assert_into()
            };
            let at = slot as usize * 2;
            data[at..at + 2].copy_from_slice(&link.to_le_bytes());
        }
    }
}

fn root_dir_sector(config: &VolumeConfig, geometry: &Geometry, data: &mut [u8; SECTOR_SIZE]) {
    let mut label = DirEntry::new_zeroed();
    label.set_short_name(config.volume_label);
    label.attrs = ATTR_VOLUME_LABEL;
    data[..32].copy_from_slice(label.as_bytes());

    for (index, file) in config.files.iter().enumerate() {
        let mut entry = DirEntry::new_zeroed();
        entry.set_short_name(file.name);
        entry.size = match file.content {
            FileContent::Static(content) => content.len().assert_into(),
            FileContent::LiveImage => geometry.image_size(),
        };
        entry.start_cluster = (FIRST_FILE_CLUSTER + index as u32).assert_into();
        entry.create_date = DIR_ENTRY_DATE;
        entry.update_date = DIR_ENTRY_DATE;

        let at = 32 * (index + 1);
        data[at..at + 32].copy_from_slice(entry.as_bytes());
    }
}

fn data_sector<D: Flash>(
    config: &VolumeConfig,
    geometry: &Geometry,
    device: &D,
    index: u32,
    data: &mut [u8; SECTOR_SIZE],
) {
    let static_count = geometry.image_first_data_index();
    if index < static_count {
        if let FileContent::Static(content) = config.files[index as usize].content {
            data[..content.len()].copy_from_slice(content);
        }
    } else {
        let block_no = index - static_count;
        let addr = block_no * UF2_PAYLOAD_SIZE;
        // Past the addressable flash the sector stays zero, signalling the
        // end of the readable image to a host re-reading the drive.
        if addr < config.flash_size {
            let mut block = Uf2Block::new_zeroed();
            block.magic_start0 = UF2_MAGIC_START0;
            block.magic_start1 = UF2_MAGIC_START1;
            block.magic_end = UF2_MAGIC_END;
            block.block_no = block_no;
            block.num_blocks = config.flash_size / UF2_PAYLOAD_SIZE;
            block.target_addr = addr;
            block.payload_size = UF2_PAYLOAD_SIZE;
            device.read(addr, &mut block.data[..UF2_PAYLOAD_SIZE as usize]);
            data.copy_from_slice(block.as_bytes());
        }
    }
}
