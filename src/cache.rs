use crate::device::{BankStore, Flash, StackControl};
use log::debug;

/// Page-granular write coalescing between incoming blocks and physical flash.
///
/// At most one page is buffered at a time; the buffer always holds the full
/// current contents of its page, so partial writes never corrupt the bytes
/// around them.
pub struct FlashCache {
    page_size: u32,
    page_addr: Option<u32>,
    page_buf: Vec<u8>,
    first_flush_done: bool,
    had_write: bool,
}

impl FlashCache {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            page_addr: None,
            page_buf: vec![0; page_size as usize],
            first_flush_done: false,
            had_write: false,
        }
    }

    /// Whether any write went through this cache since the session began.
    pub fn had_write(&self) -> bool {
        self.had_write
    }

    /// Buffer `src` at `dst`, flushing first if `dst` falls outside the
    /// currently cached page.
    pub fn write<D>(&mut self, device: &mut D, dst: u32, src: &[u8])
    where
        D: Flash + StackControl + BankStore,
    {
        let page = dst & !(self.page_size - 1);

        self.had_write = true;

        if self.page_addr != Some(page) {
            self.flush(device);
            self.page_addr = Some(page);
            device.read(page, &mut self.page_buf);
        }

        let offset = (dst & (self.page_size - 1)) as usize;
        self.page_buf[offset..offset + src.len()].copy_from_slice(src);
    }

    /// Commit the buffered page, if any, to physical flash.
    pub fn flush<D>(&mut self, device: &mut D)
    where
        D: Flash + StackControl + BankStore,
    {
        let page = match self.page_addr {
            Some(page) => page,
            None => return,
        };

        if !self.first_flush_done {
            // We need synchronous flash access from here on, and we might be
            // about to overwrite the softdevice itself.
            device.disable();
            self.first_flush_done = true;

            device.reset_to_clean_dual_bank();
            device.persist();
        }

        let end = page + self.page_size;
        if device.image_size() < end {
            device.set_image_size(end);
        }

        debug!("flush at {:#x}", page);
        let mut current = vec![0u8; self.page_size as usize];
        device.read(page, &mut current);
        if current != self.page_buf {
            debug!("write flush at {:#x}", page);
            device.erase_page(page);
            let words: Vec<u32> = self
                .page_buf
                .chunks_exact(4)
                .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            device.program_page(page, &words);
        }

        self.page_addr = None;
    }
}
