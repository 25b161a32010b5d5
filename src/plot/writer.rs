use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use failure::Error;

use crate::plot::buffer::StaggerBuffer;
use crate::plot::file::PlotFile;
use crate::plot::layout::CacheLayout;
use crate::plot::progress::ProgressReporter;
use crate::plot::resume::ResumeState;
use crate::util::constants::SCOOPS_PER_PLOT;
use crate::util::error::PlotError;

/// Everything a flush needs besides the buffer.
struct FlushTarget {
    file: PlotFile,
    layout: CacheLayout,
    resume: ResumeState,
    reporter: ProgressReporter,
}

impl FlushTarget {
    /// Writes one scoop row per scoop, then advances the trailer's progress
    /// counter past this batch.
    fn flush(&self, cache: &[u8], run: u64, started: Instant) -> Result<u64, PlotError> {
        self.reporter.writing(run);
        for scoop in 0..SCOOPS_PER_PLOT {
            self.file.write_at(self.layout.file_offset(scoop, run), &cache[self.layout.scoop_row(scoop)])?;
        }

        let completed = run + self.layout.stagger_size() as u64;
        self.resume.record(&self.file, completed)?;
        self.reporter.flushed(completed, started);
        Ok(completed)
    }
}

type Flush = JoinHandle<Result<StaggerBuffer, PlotError>>;

/// Writes filled stagger buffers to the plot file.
///
/// In async mode each buffer is handed to a background thread and handed back
/// once the next buffer is submitted, so hashing and writing overlap with at
/// most one flush in flight.
pub struct PlotWriter {
    target: Arc<FlushTarget>,
    async_mode: bool,
    in_flight: Option<Flush>,
}

impl PlotWriter {
    pub fn new(file: PlotFile, layout: CacheLayout, reporter: ProgressReporter, async_mode: bool) -> Self {
        let target = FlushTarget { file, layout, resume: ResumeState::new(layout), reporter };
        Self { target: Arc::new(target), async_mode, in_flight: None }
    }

    pub fn file(&self) -> &PlotFile {
        &self.target.file
    }

    /// Flushes `buffer`, which holds the batch starting `run` nonces into the
    /// plot. Returns a buffer that is free to be filled again: the same one in
    /// sync mode, the previously submitted one (if any) in async mode.
    pub fn submit(&mut self, buffer: StaggerBuffer, run: u64, started: Instant) -> Result<Option<StaggerBuffer>, Error> {
        if !self.async_mode {
            self.target.flush(&buffer, run, started)?;
            return Ok(Some(buffer));
        }

        let released = self.join()?;
        let target = Arc::clone(&self.target);
        let handle = thread::Builder::new()
            .name(String::from("plot-writer"))
            .spawn(move || target.flush(&buffer, run, started).map(|_| buffer))
            .map_err(|e| PlotError::ResourceExhaustion(format!(
                "unable to start writer thread ({}), try disabling async mode", e)))?;
        self.in_flight = Some(handle);
        Ok(released)
    }

    /// Waits for the flush in flight, if any, and returns its buffer.
    pub fn join(&mut self) -> Result<Option<StaggerBuffer>, Error> {
        match self.in_flight.take() {
            Some(handle) => {
                let buffer = handle.join().map_err(|_| format_err!("plot writer thread panicked"))??;
                Ok(Some(buffer))
            }
            None => Ok(None),
        }
    }

    /// Completes all outstanding writes.
    pub fn finish(mut self) -> Result<(), Error> {
        self.join()?;
        self.target.file.sync()?;
        Ok(())
    }
}

impl Drop for PlotWriter {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.join().ok();
        }
    }
}
