//! The static file table exposed by the virtual volume.
//!
//! Every entry except the live firmware image must fit in a single sector,
//! and the live image must be the last entry; both are checked when the
//! volume is built.

/// What backs a file's data-region sectors.
pub enum FileContent {
    /// Fixed bytes, served verbatim from a single sector.
    Static(&'static [u8]),
    /// The UF2 rendering of current flash, one block per sector.
    LiveImage,
}

pub struct StaticFile {
    /// Short name in the padded 11-byte 8.3 form, e.g. `"INDEX   HTM"`.
    pub name: &'static str,
    pub content: FileContent,
}

pub const INFO_UF2_TXT: &str = concat!(
    "UF2 Bootloader ",
    env!("CARGO_PKG_VERSION"),
    "\r\n",
    "Model: Generic nRF52 board\r\n",
    "Board-ID: NRF52-Generic-v0\r\n",
);

pub const INDEX_HTM: &str = concat!(
    "<!doctype html>\n",
    "<html>",
    "<body>",
    "<script>\n",
    "location.replace(\"https://ghostfat-rs.github.io/start\");\n",
    "</script>",
    "</body>",
    "</html>\n",
);

pub const DEFAULT_FILES: &[StaticFile] = &[
    StaticFile {
        name: "INFO_UF2TXT",
        content: FileContent::Static(INFO_UF2_TXT.as_bytes()),
    },
    StaticFile {
        name: "INDEX   HTM",
        content: FileContent::Static(INDEX_HTM.as_bytes()),
    },
    StaticFile {
        name: "CURRENT UF2",
        content: FileContent::LiveImage,
    },
];
