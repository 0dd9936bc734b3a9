use crate::fat::{DIR_ENTRIES_PER_SECTOR, SECTOR_SIZE};
use crate::files::{FileContent, StaticFile, DEFAULT_FILES};
use crate::uf2::UF2_PAYLOAD_SIZE;
use thiserror::Error;

/// Tunable parameters of the virtual volume and of the flash part behind it.
pub struct VolumeConfig {
    /// Total sectors the volume claims to have.
    pub num_blocks: u32,
    pub reserved_sectors: u32,
    pub root_dir_sectors: u32,
    /// Volume label, at most 11 bytes.
    pub volume_label: &'static str,
    /// Root directory contents. The live firmware image must be last.
    pub files: &'static [StaticFile],

    /// Addressable flash size exposed through the live image file.
    pub flash_size: u32,
    /// Erase/program granularity of the flash part.
    pub flash_page_size: u32,
    /// Writable window accepted from incoming blocks.
    pub user_flash_start: u32,
    pub user_flash_end: u32,
    /// Application start when no softdevice is installed.
    pub mbr_size: u32,
    /// Application start when a softdevice sits below the application.
    pub application_start: u32,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            num_blocks: 8000,
            reserved_sectors: 1,
            root_dir_sectors: 4,
            volume_label: "GHOSTFAT",
            files: DEFAULT_FILES,
            flash_size: 1024 * 1024,
            flash_page_size: 4096,
            user_flash_start: 0x1000,
            user_flash_end: 0xF4000,
            mbr_size: 0x1000,
            application_start: 0x26000,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("file name '{0}' does not fit the 11-byte short name form")]
    FileNameTooLong(&'static str),
    #[error("static content of '{0}' does not fit in a single sector")]
    StaticFileTooLarge(&'static str),
    #[error("the file table must end with exactly one live image entry")]
    LiveImageNotLast,
    #[error("volume label '{0}' is longer than 11 bytes")]
    VolumeLabelTooLong(&'static str),
    #[error("{0} root directory entries do not fit in a single sector")]
    TooManyRootEntries(usize),
    #[error("flash page size {0:#x} is not a power of two")]
    BadPageSize(u32),
    #[error("flash size {0:#x} is not a multiple of the block payload size")]
    BadFlashSize(u32),
    #[error("volume of {num_blocks} sectors cannot hold a {image_sectors}-sector image")]
    VolumeTooSmall { num_blocks: u32, image_sectors: u32 },
}

/// Sector layout derived once from a [`VolumeConfig`].
#[derive(Debug, Clone)]
pub struct Geometry {
    num_blocks: u32,
    sectors_per_fat: u32,
    start_fat0: u32,
    start_fat1: u32,
    start_rootdir: u32,
    start_clusters: u32,
    file_count: u32,
    image_first_cluster: u32,
    image_last_cluster: u32,
    image_size: u32,
}

/// Where a logical sector falls in the derived layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorRegion {
    Boot,
    /// Offset within one FAT copy; both copies fold onto the same index.
    Fat(u32),
    RootDir(u32),
    /// Offset within the data region.
    Data(u32),
    Unmapped,
}

impl Geometry {
    pub fn new(config: &VolumeConfig) -> Result<Self, ConfigError> {
        if config.volume_label.len() > 11 {
            return Err(ConfigError::VolumeLabelTooLong(config.volume_label));
        }
        match config.files.last() {
            Some(StaticFile {
                content: FileContent::LiveImage,
                ..
            }) => {}
            _ => return Err(ConfigError::LiveImageNotLast),
        }
        for (index, file) in config.files.iter().enumerate() {
            if file.name.len() > 11 {
                return Err(ConfigError::FileNameTooLong(file.name));
            }
            match file.content {
                FileContent::Static(content) => {
                    if content.len() > SECTOR_SIZE {
                        return Err(ConfigError::StaticFileTooLarge(file.name));
                    }
                }
                FileContent::LiveImage => {
                    if index + 1 != config.files.len() {
                        return Err(ConfigError::LiveImageNotLast);
                    }
                }
            }
        }
        // The volume label occupies one entry on top of the file table.
        if config.files.len() + 1 > DIR_ENTRIES_PER_SECTOR {
            return Err(ConfigError::TooManyRootEntries(config.files.len() + 1));
        }
        if !config.flash_page_size.is_power_of_two() {
            return Err(ConfigError::BadPageSize(config.flash_page_size));
        }
        if config.flash_size % UF2_PAYLOAD_SIZE != 0 {
            return Err(ConfigError::BadFlashSize(config.flash_size));
        }

        let sector_size = SECTOR_SIZE as u32;
        let sectors_per_fat = (config.num_blocks * 2 + sector_size - 1) / sector_size;
        let start_fat0 = config.reserved_sectors;
        let start_fat1 = start_fat0 + sectors_per_fat;
        let start_rootdir = start_fat1 + sectors_per_fat;
        let start_clusters = start_rootdir + config.root_dir_sectors;

        let file_count = config.files.len() as u32;
        // Reported as a full flash-to-UF2 rendering: every 256-byte payload
        // is wrapped in a 512-byte block, doubling the size.
        let image_size = config.flash_size * 2;
        let image_sectors = image_size / sector_size;
        let image_first_cluster = file_count + 1;
        let image_last_cluster = image_first_cluster + image_sectors - 1;

        if image_last_cluster >= config.num_blocks {
            return Err(ConfigError::VolumeTooSmall {
                num_blocks: config.num_blocks,
                image_sectors,
            });
        }

        Ok(Self {
            num_blocks: config.num_blocks,
            sectors_per_fat,
            start_fat0,
            start_fat1,
            start_rootdir,
            start_clusters,
            file_count,
            image_first_cluster,
            image_last_cluster,
            image_size,
        })
    }

    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    pub fn sectors_per_fat(&self) -> u32 {
        self.sectors_per_fat
    }

    pub fn start_fat0(&self) -> u32 {
        self.start_fat0
    }

    pub fn start_fat1(&self) -> u32 {
        self.start_fat1
    }

    pub fn start_rootdir(&self) -> u32 {
        self.start_rootdir
    }

    pub fn start_clusters(&self) -> u32 {
        self.start_clusters
    }

    /// First FAT cluster of the live image file.
    pub fn image_first_cluster(&self) -> u32 {
        self.image_first_cluster
    }

    /// Last FAT cluster of the live image file.
    pub fn image_last_cluster(&self) -> u32 {
        self.image_last_cluster
    }

    /// Size the live image file reports in the root directory.
    pub fn image_size(&self) -> u32 {
        self.image_size
    }

    /// Classify a logical sector against the derived layout.
    pub fn region_for(&self, lba: u32) -> SectorRegion {
        if lba == 0 {
            SectorRegion::Boot
        } else if lba < self.start_fat0 {
            // Reserved sectors past the boot sector have no content.
            SectorRegion::Unmapped
        } else if lba < self.start_rootdir {
            let mut index = lba - self.start_fat0;
            if index >= self.sectors_per_fat {
                index -= self.sectors_per_fat;
            }
            SectorRegion::Fat(index)
        } else if lba < self.start_clusters {
            SectorRegion::RootDir(lba - self.start_rootdir)
        } else if lba < self.num_blocks {
            SectorRegion::Data(lba - self.start_clusters)
        } else {
            SectorRegion::Unmapped
        }
    }

    /// Data-region offset of the first live image sector.
    pub fn image_first_data_index(&self) -> u32 {
        self.file_count - 1
    }
}
