//! Byte placement of scoops in the stagger buffer and in the plot file.
//!
//! The stagger buffer is scoop-major: the `stagger_size` scoops with index `s`
//! form one contiguous row, so flushing a batch takes one write per scoop. The
//! plot file uses the same shape over the whole nonce range.

use std::ops::Range;

use crate::util::constants::{HASH_SIZE, PLOT_SIZE, SCOOPS_PER_PLOT, SCOOP_SIZE};

/// Which 32-byte half of a destination scoop is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Low,
    High,
}

impl Half {
    pub fn offset(self) -> usize {
        match self {
            Half::Low => 0,
            Half::High => HASH_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheLayout {
    stagger_size: usize,
    total_nonces: u64,
}

impl CacheLayout {
    pub fn new(stagger_size: usize, total_nonces: u64) -> Self {
        Self { stagger_size, total_nonces }
    }

    /// Layout of a single nonce in PoC2 order.
    pub fn single() -> Self {
        Self::new(1, 1)
    }

    pub fn stagger_size(&self) -> usize {
        self.stagger_size
    }

    pub fn total_nonces(&self) -> u64 {
        self.total_nonces
    }

    pub fn buffer_len(&self) -> usize {
        self.stagger_size * PLOT_SIZE
    }

    pub fn row_len(&self) -> usize {
        self.stagger_size * SCOOP_SIZE
    }

    /// Size of the scoop data in the plot file, trailer excluded.
    pub fn data_len(&self) -> u64 {
        self.total_nonces * PLOT_SIZE as u64
    }

    /// PoC2: the low half of source scoop `k` stays at `k`, the high half
    /// moves to `4095 - k`.
    pub fn destination_scoop(source: usize, half: Half) -> usize {
        match half {
            Half::Low => source,
            Half::High => SCOOPS_PER_PLOT - 1 - source,
        }
    }

    /// Offset of a nonce position inside a scoop row.
    pub fn position_offset(position: usize, half: Half) -> usize {
        position * SCOOP_SIZE + half.offset()
    }

    pub fn cache_offset(&self, scoop: usize, position: usize, half: Half) -> usize {
        scoop * self.row_len() + Self::position_offset(position, half)
    }

    pub fn scoop_row(&self, scoop: usize) -> Range<usize> {
        self.cache_offset(scoop, 0, Half::Low)..self.cache_offset(scoop, self.stagger_size, Half::Low)
    }

    pub fn file_offset(&self, scoop: usize, global_position: u64) -> u64 {
        scoop as u64 * self.total_nonces * SCOOP_SIZE as u64 + global_position * SCOOP_SIZE as u64
    }

    /// Splits `cache` into disjoint columns of nonce positions.
    ///
    /// `bounds` are ascending positions starting at 0 and ending at the
    /// stagger size; column `i` covers `bounds[i]..bounds[i + 1]` in every
    /// scoop row.
    pub fn split_columns<'a>(&self, cache: &'a mut [u8], bounds: &[usize]) -> Vec<Column<'a>> {
        assert_eq!(cache.len(), self.buffer_len(), "cache does not match layout");
        assert!(bounds.len() >= 2 && bounds[0] == 0 && bounds[bounds.len() - 1] == self.stagger_size);

        let mut columns: Vec<Column<'a>> = bounds.windows(2)
            .map(|window| Column { positions: window[0]..window[1], rows: Vec::with_capacity(SCOOPS_PER_PLOT) })
            .collect();

        for row in cache.chunks_exact_mut(self.row_len()) {
            let mut rest = row;
            for column in columns.iter_mut() {
                let width = (column.positions.end - column.positions.start) * SCOOP_SIZE;
                let (head, tail) = std::mem::take(&mut rest).split_at_mut(width);
                column.rows.push(head);
                rest = tail;
            }
        }
        columns
    }
}

/// A worker's exclusive share of a stagger buffer: the same range of nonce
/// positions in each of the 4096 scoop rows.
pub struct Column<'a> {
    positions: Range<usize>,
    rows: Vec<&'a mut [u8]>,
}

impl<'a> Column<'a> {
    pub fn positions(&self) -> Range<usize> {
        self.positions.clone()
    }

    pub fn write(&mut self, scoop: usize, position: usize, half: Half, hash: &[u8]) {
        debug_assert!(self.positions.contains(&position));
        let offset = CacheLayout::position_offset(position - self.positions.start, half);
        self.rows[scoop][offset..offset + HASH_SIZE].copy_from_slice(hash);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn file_offset_matches_scoop_regions() {
        let layout = CacheLayout::new(2000, 10000);
        assert_eq!(layout.file_offset(0, 0), 0);
        assert_eq!(layout.file_offset(0, 1), 64);
        assert_eq!(layout.file_offset(3, 2000), 3 * 10000 * 64 + 2000 * 64);
        assert_eq!(layout.data_len(), 10000 * PLOT_SIZE as u64);
    }

    #[test]
    fn cache_rows_are_scoop_major() {
        let layout = CacheLayout::new(8, 8);
        assert_eq!(layout.cache_offset(0, 1, Half::Low), 64);
        assert_eq!(layout.cache_offset(1, 0, Half::High), 8 * 64 + 32);
        assert_eq!(layout.scoop_row(4095), 4095 * 512..4096 * 512);
        assert_eq!(layout.scoop_row(4095).end, layout.buffer_len());
    }

    #[test]
    fn single_nonce_layout_is_poc2_order() {
        let layout = CacheLayout::single();
        assert_eq!(layout.cache_offset(7, 0, Half::High), 7 * SCOOP_SIZE + 32);
        assert_eq!(CacheLayout::destination_scoop(0, Half::High), 4095);
        assert_eq!(CacheLayout::destination_scoop(4095, Half::High), 0);
        assert_eq!(CacheLayout::destination_scoop(17, Half::Low), 17);
    }

    #[test]
    fn columns_write_through_cache_offsets() {
        let layout = CacheLayout::new(6, 6);
        let mut cache = vec![0u8; layout.buffer_len()];
        {
            let mut columns = layout.split_columns(&mut cache, &[0, 2, 4, 6]);
            assert_eq!(columns.len(), 3);
            for (i, column) in columns.iter_mut().enumerate() {
                for position in column.positions() {
                    column.write(4095, position, Half::High, &[i as u8 + 1; HASH_SIZE]);
                    column.write(0, position, Half::Low, &[position as u8 + 10; HASH_SIZE]);
                }
            }
        }
        for position in 0..6 {
            let high = layout.cache_offset(4095, position, Half::High);
            assert!(cache[high..high + HASH_SIZE].iter().all(|&b| b == position as u8 / 2 + 1));
            let low = layout.cache_offset(0, position, Half::Low);
            assert!(cache[low..low + HASH_SIZE].iter().all(|&b| b == position as u8 + 10));
        }
    }

    #[test]
    fn empty_trailing_column_is_allowed() {
        let layout = CacheLayout::new(4, 4);
        let mut cache = vec![0u8; layout.buffer_len()];
        let columns = layout.split_columns(&mut cache, &[0, 4, 4]);
        assert_eq!(columns[1].positions(), 4..4);
    }
}
