use std::alloc::{self, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use std::slice;

use crate::util::constants::DIRECT_IO_ALIGNMENT;
use crate::util::error::PlotError;

/// Zeroed, page aligned memory holding one stagger batch.
///
/// The alignment satisfies `O_DIRECT`, so the same buffer works for buffered
/// and direct I/O.
pub struct StaggerBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The buffer owns its allocation exclusively, like a `Box<[u8]>`.
unsafe impl Send for StaggerBuffer {}
unsafe impl Sync for StaggerBuffer {}

impl StaggerBuffer {
    pub fn new(len: usize) -> Result<Self, PlotError> {
        let exhausted = || PlotError::ResourceExhaustion(format!(
            "unable to allocate {} bytes of stagger memory, try a lower stagger size or fewer threads", len));
        if len == 0 {
            return Err(PlotError::config("stagger buffer must not be empty"));
        }
        let layout = Layout::from_size_align(len, DIRECT_IO_ALIGNMENT).map_err(|_| exhausted())?;
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        NonNull::new(ptr)
            .map(|ptr| Self { ptr, layout })
            .ok_or_else(exhausted)
    }
}

impl Deref for StaggerBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl DerefMut for StaggerBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

impl Drop for StaggerBuffer {
    fn drop(&mut self) {
        unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn buffer_is_zeroed_and_aligned() {
        let mut buffer = StaggerBuffer::new(3 * DIRECT_IO_ALIGNMENT).unwrap();
        assert_eq!(buffer.len(), 3 * DIRECT_IO_ALIGNMENT);
        assert_eq!(buffer.as_ptr() as usize % DIRECT_IO_ALIGNMENT, 0);
        assert!(buffer.iter().all(|&b| b == 0));
        buffer[5] = 9;
        assert_eq!(buffer[5], 9);
    }

    #[test]
    fn empty_buffer_is_rejected() {
        assert!(StaggerBuffer::new(0).is_err());
    }
}
