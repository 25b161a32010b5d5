use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use crate::util::error::PlotError;

/// A plot file opened for positioned reads and writes.
///
/// Scoop data goes through `data`, which is opened with `O_DIRECT` when
/// direct I/O is requested. The trailer is small and unaligned, so it always
/// goes through the buffered `meta` handle.
pub struct PlotFile {
    data: File,
    meta: File,
}

impl PlotFile {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, direct_io: bool) -> Result<Self, PlotError> {
        Self::open_with(path.as_ref(), direct_io, true)
    }

    /// Opens an existing file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, direct_io: bool) -> Result<Self, PlotError> {
        Self::open_with(path.as_ref(), direct_io, false)
    }

    fn open_with(path: &Path, direct_io: bool, truncate: bool) -> Result<Self, PlotError> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(truncate).truncate(truncate);
        let meta = options.open(path).map_err(|e| PlotError::io("open", 0, e))?;

        let data = if direct_io {
            let mut options = OpenOptions::new();
            options.read(true).write(true);
            enable_direct_io(&mut options);
            options.open(path).map_err(|e| PlotError::io("open for direct I/O", 0, e))?
        } else {
            meta.try_clone().map_err(|e| PlotError::io("open", 0, e))?
        };

        Ok(Self { data, meta })
    }

    /// Pairs a data handle with a separate trailer handle.
    #[cfg(test)]
    pub(crate) fn from_handles(data: File, meta: File) -> Self {
        Self { data, meta }
    }

    pub fn len(&self) -> Result<u64, PlotError> {
        self.meta.metadata()
            .map(|metadata| metadata.len())
            .map_err(|e| PlotError::io("stat", 0, e))
    }

    /// Reserves `len` bytes on disk so the plot is not fragmented.
    pub fn preallocate(&self, len: u64) -> Result<(), PlotError> {
        allocate(&self.meta, len).map_err(|e| PlotError::io("pre-allocate", len, e))
    }

    pub fn write_at(&self, offset: u64, buf: &[u8]) -> Result<(), PlotError> {
        write_all_at(&self.data, offset, buf).map_err(|e| PlotError::io("write", offset, e))
    }

    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<(), PlotError> {
        read_exact_at(&self.meta, offset, buf).map_err(|e| PlotError::io("read", offset, e))
    }

    pub fn write_meta_at(&self, offset: u64, buf: &[u8]) -> Result<(), PlotError> {
        write_all_at(&self.meta, offset, buf).map_err(|e| PlotError::io("write", offset, e))
    }

    pub fn sync(&self) -> Result<(), PlotError> {
        self.data.sync_data().map_err(|e| PlotError::io("sync", 0, e))
    }
}

#[cfg(target_os = "linux")]
fn enable_direct_io(options: &mut OpenOptions) {
    use std::os::unix::fs::OpenOptionsExt;
    options.custom_flags(libc::O_DIRECT);
}

#[cfg(not(target_os = "linux"))]
fn enable_direct_io(_options: &mut OpenOptions) {
    warn!("Direct I/O is only supported on Linux, falling back to buffered writes");
}

#[cfg(target_os = "linux")]
fn allocate(file: &File, len: u64) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    match unsafe { libc::posix_fallocate(file.as_raw_fd(), 0, len as libc::off_t) } {
        0 => Ok(()),
        errno => Err(io::Error::from_raw_os_error(errno)),
    }
}

#[cfg(not(target_os = "linux"))]
fn allocate(file: &File, len: u64) -> io::Result<()> {
    file.set_len(len)
}

#[cfg(unix)]
fn write_all_at(file: &File, offset: u64, buf: &[u8]) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.write_all_at(buf, offset)
}

#[cfg(unix)]
fn read_exact_at(file: &File, offset: u64, buf: &mut [u8]) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn write_all_at(file: &File, mut offset: u64, mut buf: &[u8]) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_write(buf, offset)? {
            0 => return Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole buffer")),
            n => {
                buf = &buf[n..];
                offset += n as u64;
            }
        }
    }
    Ok(())
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset)? {
            0 => return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "failed to fill whole buffer")),
            n => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
        }
    }
    Ok(())
}
