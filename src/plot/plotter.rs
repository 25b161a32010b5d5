use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use failure::Error;

use crate::plot::buffer::StaggerBuffer;
use crate::plot::layout::CacheLayout;
use crate::plot::progress::ProgressReporter;
use crate::plot::resume::ResumeState;
use crate::plot::scheduler::WorkScheduler;
use crate::plot::writer::PlotWriter;
use crate::util::config::PlotConfig;
use crate::util::error::PlotError;

const WORKING_SUFFIX: &str = ".plotting";

/// `{account}_{start}_{nonces}`, the name a finished plot is stored under.
pub fn plot_file_name(account_id: u64, start_nonce: u64, nonces: u64) -> String {
    format!("{}_{}_{}", account_id, start_nonce, nonces)
}

/// Working and final location of a plot inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotPaths {
    pub working: PathBuf,
    pub finished: PathBuf,
}

impl PlotPaths {
    pub fn new<P: AsRef<Path>>(dir: P, config: &PlotConfig) -> Self {
        let name = plot_file_name(config.account_id(), config.start_nonce(), config.nonces());
        Self {
            working: dir.as_ref().join(format!("{}{}", name, WORKING_SUFFIX)),
            finished: dir.as_ref().join(name),
        }
    }

    /// Moves the completed working file to its final name, replacing any
    /// existing plot there.
    pub fn finalize(&self) -> Result<(), PlotError> {
        if self.finished.exists() {
            fs::remove_file(&self.finished).map_err(|e| PlotError::io("remove", 0, e))?;
        }
        fs::rename(&self.working, &self.finished).map_err(|e| PlotError::io("rename", 0, e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotSummary {
    pub resumed_at: u64,
    pub nonces_written: u64,
    pub hashing_time: Duration,
}

/// Drives stagger batches from hashing to disk for one plot file.
pub struct Plotter {
    config: PlotConfig,
    scheduler: WorkScheduler,
    writer: PlotWriter,
    idle: Vec<StaggerBuffer>,
    resumed_at: u64,
    run: u64,
    hashing_time: Duration,
}

impl Plotter {
    pub fn open<P: AsRef<Path>>(config: PlotConfig, path: P) -> Result<Self, Error> {
        config.validate()?;
        let stagger_size = config.stagger_size() as usize;
        let layout = CacheLayout::new(stagger_size, config.nonces());

        let (file, progress) = ResumeState::new(layout)
            .open_or_create(path.as_ref(), config.resume(), config.direct_io())?;

        let buffers = if config.async_mode() { 2 } else { 1 };
        let idle = (0..buffers)
            .map(|_| StaggerBuffer::new(layout.buffer_len()))
            .collect::<Result<Vec<_>, _>>()?;

        let scheduler = WorkScheduler::new(config.account_id(), config.threads(), config.core(), layout)?;
        let reporter = ProgressReporter::new(config.nonces(), config.stagger_size(), config.async_mode());
        let writer = PlotWriter::new(file, layout, reporter, config.async_mode());

        info!("Creating plots for {} nonces ({} to {}, {:.2} GB) with stagger size {}, using {:.2} MB memory and {} threads, {} core",
              config.nonces(), config.start_nonce(), config.start_nonce() + config.nonces(),
              layout.data_len() as f64 / 1024.0 / 1024.0 / 1024.0, stagger_size,
              (buffers * layout.buffer_len()) as f64 / 1024.0 / 1024.0, config.threads(), config.core());

        Ok(Self {
            config,
            scheduler,
            writer,
            idle,
            resumed_at: progress,
            run: progress,
            hashing_time: Duration::from_secs(0),
        })
    }

    /// Nonces handed to the writer so far, counted from the start of the plot.
    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn is_complete(&self) -> bool {
        self.run >= self.config.nonces()
    }

    /// Hashes the next stagger batch and hands it to the writer. Returns
    /// `false` once every nonce has been submitted.
    pub fn plot_batch(&mut self) -> Result<bool, Error> {
        if self.is_complete() {
            return Ok(false);
        }

        let started = Instant::now();
        let mut buffer = match self.idle.pop() {
            Some(buffer) => buffer,
            None => self.writer.join()?
                .ok_or_else(|| format_err!("no stagger buffer available"))?,
        };
        self.scheduler.fill(&mut buffer, self.config.start_nonce() + self.run);
        self.hashing_time += started.elapsed();

        if let Some(released) = self.writer.submit(buffer, self.run, started)? {
            self.idle.push(released);
        }
        self.run += self.config.stagger_size();
        Ok(true)
    }

    /// Waits for outstanding writes.
    pub fn finish(self) -> Result<PlotSummary, Error> {
        self.writer.finish()?;
        Ok(PlotSummary {
            resumed_at: self.resumed_at,
            nonces_written: self.run - self.resumed_at,
            hashing_time: self.hashing_time,
        })
    }

    /// Plots every remaining batch.
    pub fn plot(mut self) -> Result<PlotSummary, Error> {
        while self.plot_batch()? {}
        self.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plot::hasher::LaneWidth;

    #[test]
    fn paths_follow_naming_convention() {
        let config = PlotConfig::new(123, 456, 8, 4);
        let paths = PlotPaths::new("/plots", &config);
        assert_eq!(paths.working, Path::new("/plots/123_456_8.plotting"));
        assert_eq!(paths.finished, Path::new("/plots/123_456_8"));
    }

    #[test]
    fn finalize_replaces_existing_plot() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PlotPaths::new(dir.path(), &PlotConfig::new(1, 0, 4, 4));
        fs::write(&paths.working, b"new").unwrap();
        fs::write(&paths.finished, b"old").unwrap();
        paths.finalize().unwrap();
        assert_eq!(fs::read(&paths.finished).unwrap(), b"new");
        assert!(!paths.working.exists());
    }

    #[test]
    fn invalid_configuration_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot");
        let config = PlotConfig::new(1, 0, 10, 4).with_core(LaneWidth::X4);
        assert!(Plotter::open(config, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn batches_advance_by_stagger_size() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlotConfig::new(5, 0, 4, 2).with_threads(2);
        let mut plotter = Plotter::open(config, dir.path().join("plot")).unwrap();
        assert!(plotter.plot_batch().unwrap());
        assert_eq!(plotter.run(), 2);
        assert!(plotter.plot_batch().unwrap());
        assert!(!plotter.plot_batch().unwrap());
        let summary = plotter.finish().unwrap();
        assert_eq!(summary.nonces_written, 4);
        assert_eq!(summary.resumed_at, 0);
    }
}
