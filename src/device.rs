//! Collaborator seams between the volume core and the platform.
//!
//! Everything here is synchronous; erase/program primitives may busy-wait
//! internally but never suspend. The core touches flash only through
//! [`Flash`], and only the write cache ever mutates it.

/// Physical flash access at page granularity.
pub trait Flash {
    /// Copy `buf.len()` bytes out of flash starting at `addr`.
    fn read(&self, addr: u32, buf: &mut [u8]);

    /// Erase the page beginning at `addr`.
    fn erase_page(&mut self, addr: u32);

    /// Program one erased page with word-aligned data.
    fn program_page(&mut self, addr: u32, words: &[u32]);
}

/// Radio/softdevice lifecycle control.
pub trait StackControl {
    /// Shut the wireless stack down so flash can be accessed synchronously.
    /// Called once, lazily, before the first physical write of a session.
    fn disable(&mut self);

    /// Whether a softdevice occupies the region below the application.
    fn softdevice_present(&self) -> bool;
}

/// Persistent bank/settings metadata describing the incoming image.
pub trait BankStore {
    /// Drop back to an empty dual-bank layout with no valid images.
    fn reset_to_clean_dual_bank(&mut self);

    fn image_size(&self) -> u32;

    fn set_image_size(&mut self, size: u32);

    /// Mark the bank as holding a complete, bootable application.
    fn mark_bank_valid(&mut self);

    /// Commit the metadata to persistent storage.
    fn persist(&mut self);
}

/// One-shot timer used for the deferred finalize/reset.
pub trait Timer {
    /// Arm a callback `delay_ms` from now. Re-arming restarts the delay;
    /// cancellation is not supported.
    fn schedule_once(&mut self, delay_ms: u32);
}

/// Terminal system operations.
pub trait SystemControl {
    /// Request a device reset. Never returns control to the update flow.
    fn request_reset(&mut self);
}
