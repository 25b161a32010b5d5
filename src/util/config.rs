use config::{Config, File};

use crate::plot::hasher::LaneWidth;
use crate::util::constants::{MAX_THREADS, PLOT_SIZE, SCOOP_SIZE, DIRECT_IO_ALIGNMENT};
use crate::util::deserialization::{from_str, lane_width_from_selector};
use crate::util::error::PlotError;

lazy_static! {
    pub static ref CONFIG: Config = {
        let mut config = Config::default();
        config.merge(File::with_name("Settings-default").required(false)).ok();
        config.merge(File::with_name("Settings").required(false)).ok();
        config
    };
}

fn default_threads() -> usize {
    1
}

fn default_output_dir() -> String {
    String::from("plots")
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlotConfig {
    #[serde(deserialize_with = "from_str")]
    account_id: u64,
    #[serde(deserialize_with = "from_str")]
    start_nonce: u64,
    nonces: u64,
    #[serde(default)]
    stagger_size: u64,
    #[serde(default = "default_threads")]
    threads: usize,
    #[serde(default, deserialize_with = "lane_width_from_selector")]
    core: LaneWidth,
    #[serde(default)]
    async_mode: bool,
    #[serde(default)]
    direct_io: bool,
    #[serde(default)]
    resume: bool,
    #[serde(default = "default_output_dir")]
    output_dir: String,
    #[serde(default)]
    max_memory: u64,
}

impl PlotConfig {
    pub fn new(account_id: u64, start_nonce: u64, nonces: u64, stagger_size: u64) -> Self {
        Self {
            account_id,
            start_nonce,
            nonces,
            stagger_size,
            threads: default_threads(),
            core: LaneWidth::default(),
            async_mode: false,
            direct_io: false,
            resume: false,
            output_dir: default_output_dir(),
            max_memory: 0,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
    pub fn with_core(mut self, core: LaneWidth) -> Self {
        self.core = core;
        self
    }
    pub fn with_async_mode(mut self, async_mode: bool) -> Self {
        self.async_mode = async_mode;
        self
    }
    pub fn with_direct_io(mut self, direct_io: bool) -> Self {
        self.direct_io = direct_io;
        self
    }
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }
    pub fn with_output_dir<S: Into<String>>(mut self, output_dir: S) -> Self {
        self.output_dir = output_dir.into();
        self
    }
    pub fn with_max_memory(mut self, max_memory: u64) -> Self {
        self.max_memory = max_memory;
        self
    }

    pub fn account_id(&self) -> u64 {
        self.account_id
    }
    pub fn start_nonce(&self) -> u64 {
        self.start_nonce
    }
    pub fn nonces(&self) -> u64 {
        self.nonces
    }
    pub fn stagger_size(&self) -> u64 {
        self.stagger_size
    }
    pub fn threads(&self) -> usize {
        self.threads
    }
    pub fn core(&self) -> LaneWidth {
        self.core
    }
    pub fn async_mode(&self) -> bool {
        self.async_mode
    }
    pub fn direct_io(&self) -> bool {
        self.direct_io
    }
    pub fn resume(&self) -> bool {
        self.resume
    }
    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }
    pub fn max_memory(&self) -> u64 {
        self.max_memory
    }

    /// Fills in the stagger size from `max_memory` when none was configured.
    pub fn resolve_stagger_size(mut self) -> Result<Self, PlotError> {
        if self.stagger_size == 0 {
            if self.max_memory == 0 {
                return Err(PlotError::config("either stagger_size or max_memory must be set"));
            }
            let buffers = if self.async_mode { 2 } else { 1 };
            self.stagger_size = suggest_stagger_size(
                self.nonces,
                self.max_memory / buffers,
                self.threads as u64 * self.core.lanes() as u64,
            ).ok_or_else(|| PlotError::config(format!(
                "no stagger size fits {} nonces into {} bytes of memory with {} thread(s) and the {} core",
                self.nonces, self.max_memory, self.threads, self.core)))?;
            info!("Stagger size was set to {}, based on available memory and selected hashing core", self.stagger_size);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), PlotError> {
        if self.account_id == 0 {
            return Err(PlotError::config("account_id must be set"));
        }
        if self.nonces == 0 || self.stagger_size == 0 {
            return Err(PlotError::config(format!(
                "ended up with {} nonces and a stagger size of {}", self.nonces, self.stagger_size)));
        }
        if self.threads == 0 || self.threads > MAX_THREADS {
            return Err(PlotError::config(format!(
                "thread count {} outside of 1..={}", self.threads, MAX_THREADS)));
        }
        if self.nonces % self.stagger_size != 0 {
            return Err(PlotError::config(format!(
                "nonce count {} is not a multiple of stagger size {}", self.nonces, self.stagger_size)));
        }
        let batch = self.threads as u64 * self.core.lanes() as u64;
        if self.stagger_size % batch != 0 {
            return Err(PlotError::config(format!(
                "stagger size {} is not divisible by threads * {} ({}), unable to use the {} core",
                self.stagger_size, self.core.lanes(), batch, self.core)));
        }
        if self.direct_io && (self.stagger_size as usize * SCOOP_SIZE) % DIRECT_IO_ALIGNMENT != 0 {
            return Err(PlotError::config(format!(
                "direct I/O needs a stagger size that is a multiple of {}, got {}",
                DIRECT_IO_ALIGNMENT / SCOOP_SIZE, self.stagger_size)));
        }
        if self.start_nonce.checked_add(self.nonces).is_none() {
            return Err(PlotError::config("nonce range overflows u64"));
        }
        Ok(())
    }
}

/// Largest stagger size that fits into `memory` bytes, divides `nonces` and
/// is a multiple of `granularity` (threads times lane width).
pub fn suggest_stagger_size(nonces: u64, memory: u64, granularity: u64) -> Option<u64> {
    if granularity == 0 || nonces % granularity != 0 {
        return None;
    }
    let fits = (memory / PLOT_SIZE as u64).min(nonces);
    let mut stagger = fits - fits % granularity;
    while stagger > 0 {
        if nonces % stagger == 0 {
            return Some(stagger);
        }
        stagger -= granularity;
    }
    None
}
