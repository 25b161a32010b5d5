//! The trailer at the end of a plot file: a format tag followed by the number
//! of nonces already written. It is the only thing that makes a partly
//! written plot resumable.

use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::plot::file::PlotFile;
use crate::plot::layout::CacheLayout;
use crate::util::constants::{RESUME_TAG, TRAILER_SIZE};
use crate::util::error::PlotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeMarker {
    pub tag: u32,
    pub progress: u64,
}

pub struct ResumeState {
    layout: CacheLayout,
}

impl ResumeState {
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    fn tag_offset(&self) -> u64 {
        self.layout.data_len()
    }

    fn progress_offset(&self) -> u64 {
        self.layout.data_len() + 4
    }

    /// Opens the plot at `path`, continuing where a previous run stopped if
    /// `resume` is set and the file carries a usable trailer. Anything else
    /// starts a fresh file. Returns the file and the nonces already written.
    pub fn open_or_create(&self, path: &Path, resume: bool, direct_io: bool) -> Result<(PlotFile, u64), PlotError> {
        if resume && path.exists() {
            let file = PlotFile::open(path, direct_io)?;
            match self.read(&file) {
                Ok(progress) => {
                    info!("Resuming {} at nonce offset {} with stagger size {}",
                          path.display(), progress, self.layout.stagger_size());
                    return Ok((file, progress));
                }
                Err(PlotError::ResumeFormatMismatch(reason)) => {
                    warn!("{} does not support resuming ({}), starting over", path.display(), reason);
                }
                Err(e) => return Err(e),
            }
        }

        let file = PlotFile::create(path, direct_io)?;
        self.initialize(&file)?;
        Ok((file, 0))
    }

    /// Reads and checks the trailer of an existing file.
    pub fn read(&self, file: &PlotFile) -> Result<u64, PlotError> {
        let expected_len = self.layout.data_len() + TRAILER_SIZE;
        let len = file.len()?;
        if len != expected_len {
            return Err(PlotError::ResumeFormatMismatch(format!(
                "file is {} bytes, expected {}", len, expected_len)));
        }

        let marker = self.read_marker(file)?;
        if marker.tag != RESUME_TAG {
            return Err(PlotError::ResumeFormatMismatch(format!("unknown tag {:#010x}", marker.tag)));
        }
        if marker.progress > self.layout.total_nonces() {
            return Err(PlotError::ResumeFormatMismatch(format!(
                "progress {} beyond {} nonces", marker.progress, self.layout.total_nonces())));
        }
        if marker.progress % self.layout.stagger_size() as u64 != 0 {
            return Err(PlotError::config(format!(
                "plot was written with another stagger size: progress {} is not a multiple of {}",
                marker.progress, self.layout.stagger_size())));
        }
        Ok(marker.progress)
    }

    pub fn read_marker(&self, file: &PlotFile) -> Result<ResumeMarker, PlotError> {
        let mut trailer = [0u8; TRAILER_SIZE as usize];
        file.read_at(self.tag_offset(), &mut trailer)?;
        Ok(ResumeMarker {
            tag: LittleEndian::read_u32(&trailer[0..4]),
            progress: LittleEndian::read_u64(&trailer[4..12]),
        })
    }

    /// Pre-allocates the full file and writes a trailer with zero progress.
    pub fn initialize(&self, file: &PlotFile) -> Result<(), PlotError> {
        let len = self.layout.data_len() + TRAILER_SIZE;
        info!("Pre-allocating space for file ({} bytes)...", len);
        file.preallocate(len)?;
        debug!("Done pre-allocating space");

        let mut tag = [0u8; 4];
        LittleEndian::write_u32(&mut tag, RESUME_TAG);
        file.write_meta_at(self.tag_offset(), &tag)?;
        self.record(file, 0)
    }

    /// Persists the number of nonces whose scoops are completely on disk.
    pub fn record(&self, file: &PlotFile, progress: u64) -> Result<(), PlotError> {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, progress);
        file.write_meta_at(self.progress_offset(), &buf)
    }
}
