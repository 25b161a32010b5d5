pub const HASH_SIZE: usize = 32;
pub const HASH_CAP: usize = 4096;
pub const HASHES_PER_SCOOP: usize = 2;
pub const SCOOP_SIZE: usize = HASHES_PER_SCOOP * HASH_SIZE;
pub const SCOOPS_PER_PLOT: usize = 4096;
pub const PLOT_SIZE: usize = SCOOPS_PER_PLOT * SCOOP_SIZE;
pub const HEADER_SIZE: usize = 16;
pub const GEN_SIZE: usize = PLOT_SIZE + HEADER_SIZE;

/// Tag stored in front of the progress counter at the end of a resumable plot file.
pub const RESUME_TAG: u32 = 0xaffe_affe;
pub const TRAILER_SIZE: u64 = 4 + 8;

pub const DIRECT_IO_ALIGNMENT: usize = 4096;
pub const MAX_THREADS: usize = 128;
