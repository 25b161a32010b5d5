use crate::plot::layout::Half;
use crate::util::constants::{HASH_SIZE, SCOOPS_PER_PLOT, SCOOP_SIZE, PLOT_SIZE};

pub mod buffer;
pub mod file;
pub mod hasher;
pub mod layout;
pub mod mshabal;
pub mod nonce;
pub mod plotter;
pub mod progress;
pub mod resume;
pub mod scheduler;
pub mod writer;

pub struct ScoopData<'a> {
    data: &'a [u8; SCOOP_SIZE],
}

impl<'a> ScoopData<'a> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self { data: array_ref!(data, 0, SCOOP_SIZE) }
    }
    pub fn half(&self, half: Half) -> &'a [u8; HASH_SIZE] {
        let data: &'a [u8; SCOOP_SIZE] = self.data;
        array_ref!(data, half.offset(), HASH_SIZE)
    }
    pub fn bytes(&self) -> &'a [u8; SCOOP_SIZE] {
        self.data
    }
}

/// A nonce's block in PoC2 order, as returned by `nonce::compute_nonce`.
pub struct Nonce<'a> {
    data: &'a [u8; PLOT_SIZE]
}

impl<'a> Nonce<'a> {
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self { data: array_ref!(data, 0, PLOT_SIZE) }
    }
    pub fn scoop_data(&self, scoop_number: usize) -> ScoopData<'a> {
        assert!(scoop_number < SCOOPS_PER_PLOT);
        let data: &'a [u8; PLOT_SIZE] = self.data;
        let offset = scoop_number * SCOOP_SIZE;
        ScoopData::from_slice(&data[offset..offset + SCOOP_SIZE])
    }
    pub fn scoops(&self) -> impl Iterator<Item=ScoopData<'a>> {
        let data: &'a [u8; PLOT_SIZE] = self.data;
        data.chunks(SCOOP_SIZE).map(ScoopData::from_slice)
    }
}
