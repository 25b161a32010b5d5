use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::plot::mshabal::MShabal;
use crate::util::constants::HASH_SIZE;
use crate::util::sph_shabal;

/// Number of nonces hashed side by side by one generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneWidth {
    Scalar,
    X4,
    X8,
}

impl LaneWidth {
    pub fn from_selector(selector: u64) -> Option<Self> {
        match selector {
            0 => Some(LaneWidth::Scalar),
            1 => Some(LaneWidth::X4),
            2 => Some(LaneWidth::X8),
            _ => None,
        }
    }

    pub fn lanes(self) -> usize {
        match self {
            LaneWidth::Scalar => 1,
            LaneWidth::X4 => 4,
            LaneWidth::X8 => 8,
        }
    }
}

impl Default for LaneWidth {
    fn default() -> Self {
        LaneWidth::Scalar
    }
}

impl fmt::Display for LaneWidth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LaneWidth::Scalar => write!(f, "ORIG"),
            LaneWidth::X4 => write!(f, "SSE4"),
            LaneWidth::X8 => write!(f, "AVX2"),
        }
    }
}

impl FromStr for LaneWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "orig" | "scalar" => Ok(LaneWidth::Scalar),
            "1" | "sse4" | "x4" => Ok(LaneWidth::X4),
            "2" | "avx2" | "x8" => Ok(LaneWidth::X8),
            other => Err(format!("unknown hashing core '{}'", other)),
        }
    }
}

/// Shabal-256 over several equally long inputs at once.
///
/// Every call starts from a fresh hash context. `buffers` holds one buffer per
/// lane; lane `l` hashes `buffers[l][range]` and receives its digest in
/// `out[l]`.
pub trait LaneHasher: Send {
    const LANES: usize;

    fn digest_lanes(&mut self, buffers: &[Vec<u8>], range: Range<usize>, out: &mut [[u8; HASH_SIZE]]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Shabal1;

impl LaneHasher for Shabal1 {
    const LANES: usize = 1;

    fn digest_lanes(&mut self, buffers: &[Vec<u8>], range: Range<usize>, out: &mut [[u8; HASH_SIZE]]) {
        out[0] = sph_shabal::shabal256(&buffers[0][range]);
    }
}

impl<const N: usize> LaneHasher for MShabal<N> {
    const LANES: usize = N;

    fn digest_lanes(&mut self, buffers: &[Vec<u8>], range: Range<usize>, out: &mut [[u8; HASH_SIZE]]) {
        let mut inputs: [&[u8]; N] = [&[]; N];
        for (input, buffer) in inputs.iter_mut().zip(buffers) {
            *input = &buffer[range.clone()];
        }
        let digests = self.digest(&inputs);
        out[..N].copy_from_slice(&digests);
    }
}

pub type MShabal4 = MShabal<4>;
pub type MShabal8 = MShabal<8>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn selectors_and_names_agree() {
        for selector in 0..3 {
            let width = LaneWidth::from_selector(selector).unwrap();
            assert_eq!(selector.to_string().parse::<LaneWidth>().unwrap(), width);
        }
        assert_eq!(LaneWidth::from_selector(3), None);
        assert_eq!("AVX2".parse::<LaneWidth>().unwrap(), LaneWidth::X8);
        assert_eq!(LaneWidth::X4.lanes(), 4);
        assert!("neon".parse::<LaneWidth>().is_err());
    }

    #[test]
    fn wide_hashers_match_scalar() {
        let buffers: Vec<Vec<u8>> = (0..8u8)
            .map(|lane| (0..5000u32).map(|i| (i as u8).wrapping_mul(31) ^ lane).collect())
            .collect();
        let mut scalar = [[0u8; HASH_SIZE]; 8];
        for lane in 0..8 {
            Shabal1.digest_lanes(&buffers[lane..], 10..4106, &mut scalar[lane..]);
        }

        let mut wide = [[0u8; HASH_SIZE]; 8];
        MShabal8::new().digest_lanes(&buffers, 10..4106, &mut wide);
        assert_eq!(wide, scalar);

        let mut wide = [[0u8; HASH_SIZE]; 4];
        MShabal4::new().digest_lanes(&buffers[4..], 10..4106, &mut wide);
        assert_eq!(&wide[..], &scalar[4..]);
    }
}
