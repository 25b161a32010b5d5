use std::ops::Range;

use num_iter::range_step;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::plot::hasher::{LaneHasher, LaneWidth, MShabal4, MShabal8, Shabal1};
use crate::plot::layout::{CacheLayout, Column};
use crate::plot::nonce::NonceGenerator;
use crate::util::error::PlotError;

/// Static split of one stagger batch into contiguous worker ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    stagger_size: usize,
    workers: usize,
    per_worker: usize,
}

impl Partition {
    pub fn new(stagger_size: usize, threads: usize, lanes: usize) -> Self {
        let workers = threads.min(stagger_size / lanes);
        let per_worker = if workers == 0 { 0 } else { stagger_size / workers / lanes * lanes };
        Self { stagger_size, workers, per_worker }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn per_worker(&self) -> usize {
        self.per_worker
    }

    pub fn worker_range(&self, worker: usize) -> Range<usize> {
        worker * self.per_worker..(worker + 1) * self.per_worker
    }

    /// Positions left over after the workers' share, hashed serially.
    pub fn leftover(&self) -> Range<usize> {
        self.workers * self.per_worker..self.stagger_size
    }

    /// Column bounds: one column per worker, then the leftover column.
    pub fn bounds(&self) -> Vec<usize> {
        let mut bounds: Vec<usize> = (0..=self.workers).map(|worker| worker * self.per_worker).collect();
        bounds.push(self.stagger_size);
        bounds
    }
}

/// Hashes stagger batches on a fixed pool of worker threads.
pub struct WorkScheduler {
    pool: ThreadPool,
    account_id: u64,
    lane_width: LaneWidth,
    layout: CacheLayout,
    partition: Partition,
}

impl WorkScheduler {
    pub fn new(account_id: u64, threads: usize, lane_width: LaneWidth, layout: CacheLayout) -> Result<Self, PlotError> {
        let partition = Partition::new(layout.stagger_size(), threads, lane_width.lanes());
        let pool = ThreadPoolBuilder::new()
            .num_threads(partition.workers().max(1))
            .thread_name(|index| format!("plotter-{}", index))
            .build()
            .map_err(|e| PlotError::ResourceExhaustion(format!(
                "unable to start {} worker threads ({}), try fewer threads", threads, e)))?;

        debug!("Using {} worker(s) with {} nonces each, {} leftover, {} core",
               partition.workers(), partition.per_worker(), partition.leftover().len(), lane_width);
        Ok(Self { pool, account_id, lane_width, layout, partition })
    }

    /// Fills `cache` with the nonces `first_nonce..first_nonce + stagger_size`.
    /// Returns once every worker has finished.
    pub fn fill(&self, cache: &mut [u8], first_nonce: u64) {
        let mut columns = self.layout.split_columns(cache, &self.partition.bounds());
        let mut leftover = columns.pop();

        let account_id = self.account_id;
        let lane_width = self.lane_width;
        self.pool.scope(|scope| {
            for column in columns.iter_mut() {
                scope.spawn(move |_| match lane_width {
                    LaneWidth::Scalar => hash_column(Shabal1, account_id, column, first_nonce),
                    LaneWidth::X4 => hash_column(MShabal4::new(), account_id, column, first_nonce),
                    LaneWidth::X8 => hash_column(MShabal8::new(), account_id, column, first_nonce),
                });
            }
        });

        if let Some(column) = leftover.as_mut() {
            hash_column(Shabal1, account_id, column, first_nonce);
        }
    }
}

fn hash_column<H: LaneHasher>(hasher: H, account_id: u64, column: &mut Column, first_nonce: u64) {
    let positions = column.positions();
    if positions.start == positions.end {
        return;
    }

    let mut generator = NonceGenerator::new(hasher);
    for position in range_step(positions.start, positions.end, H::LANES) {
        generator.generate(account_id, first_nonce + position as u64, column, position);
    }
    trace!("Hashed nonces {}..{}", first_nonce + positions.start as u64, first_nonce + positions.end as u64);
}
