use byteorder::{BigEndian, ByteOrder};

use crate::plot::hasher::{LaneHasher, Shabal1};
use crate::plot::layout::{CacheLayout, Column, Half};
use crate::util::constants::{GEN_SIZE, HASH_CAP, HASH_SIZE, HEADER_SIZE, PLOT_SIZE, SCOOPS_PER_PLOT, SCOOP_SIZE};

/// The 16 bytes seeding a nonce's hash chain: the account id followed by the
/// nonce number, each in big-endian byte order.
pub fn serialize_header(account_id: u64, nonce: u64) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    BigEndian::write_u64(&mut header[0..8], account_id);
    BigEndian::write_u64(&mut header[8..16], nonce);
    header
}

/// Computes nonces `H::LANES` at a time and scatters their scoops into a
/// stagger buffer column.
///
/// Each lane owns a `GEN_SIZE` buffer: the chain fills `[0, PLOT_SIZE)` from
/// the back, the header sits at `[PLOT_SIZE, GEN_SIZE)`.
pub struct NonceGenerator<H: LaneHasher> {
    hasher: H,
    gendata: Vec<Vec<u8>>,
    digests: Vec<[u8; HASH_SIZE]>,
}

impl<H: LaneHasher> NonceGenerator<H> {
    pub fn new(hasher: H) -> Self {
        Self {
            hasher,
            gendata: vec![vec![0u8; GEN_SIZE]; H::LANES],
            digests: vec![[0u8; HASH_SIZE]; H::LANES],
        }
    }

    pub fn lanes(&self) -> usize {
        H::LANES
    }

    /// Generates nonces `first_nonce..first_nonce + LANES` into consecutive
    /// positions of `column`, starting at `position`.
    pub fn generate(&mut self, account_id: u64, first_nonce: u64, column: &mut Column, position: usize) {
        self.hash_chain(account_id, first_nonce);

        for (lane, gendata) in self.gendata.iter().enumerate() {
            for (source, scoop) in gendata[..PLOT_SIZE].chunks_exact(SCOOP_SIZE).enumerate() {
                let (low, high) = scoop.split_at(HASH_SIZE);
                column.write(CacheLayout::destination_scoop(source, Half::Low), position + lane, Half::Low, low);
                column.write(CacheLayout::destination_scoop(source, Half::High), position + lane, Half::High, high);
            }
        }
    }

    /// Fills every lane's `gendata` with the whitened, not yet scrambled block.
    fn hash_chain(&mut self, account_id: u64, first_nonce: u64) {
        for (lane, gendata) in self.gendata.iter_mut().enumerate() {
            gendata[PLOT_SIZE..].copy_from_slice(&serialize_header(account_id, first_nonce + lane as u64));
        }

        let mut i = PLOT_SIZE;
        while i > 0 {
            let len = (GEN_SIZE - i).min(HASH_CAP);
            self.hasher.digest_lanes(&self.gendata, i..i + len, &mut self.digests);
            for (gendata, digest) in self.gendata.iter_mut().zip(&self.digests) {
                gendata[i - HASH_SIZE..i].copy_from_slice(digest);
            }
            i -= HASH_SIZE;
        }

        self.hasher.digest_lanes(&self.gendata, 0..GEN_SIZE, &mut self.digests);
        for (gendata, final_hash) in self.gendata.iter_mut().zip(&self.digests) {
            for word in gendata[..PLOT_SIZE].chunks_exact_mut(HASH_SIZE) {
                for (byte, key) in word.iter_mut().zip(final_hash) {
                    *byte ^= key;
                }
            }
        }
    }
}

/// One nonce's 262144-byte block in PoC2 scoop order, computed with the
/// scalar hasher.
pub fn compute_nonce(account_id: u64, nonce: u64) -> Vec<u8> {
    let layout = CacheLayout::single();
    let mut block = vec![0u8; layout.buffer_len()];
    {
        let mut columns = layout.split_columns(&mut block, &[0, 1]);
        NonceGenerator::new(Shabal1).generate(account_id, nonce, &mut columns[0], 0);
    }
    debug_assert_eq!(block.len(), SCOOPS_PER_PLOT * SCOOP_SIZE);
    block
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plot::hasher::{MShabal4, MShabal8};
    use crate::util::sph_shabal::shabal256;

    const ACCOUNT_ID: u64 = 1234567890123456;

    /// Straight-line rendition of the plotting algorithm, returning the
    /// whitened block before the PoC2 shuffle.
    fn reference_unshuffled(account_id: u64, nonce: u64) -> Vec<u8> {
        let mut gendata = vec![0u8; GEN_SIZE];
        gendata[PLOT_SIZE..PLOT_SIZE + 8].copy_from_slice(&account_id.to_be_bytes());
        gendata[PLOT_SIZE + 8..].copy_from_slice(&nonce.to_be_bytes());
        let mut i = PLOT_SIZE;
        while i > 0 {
            let end = (i + HASH_CAP).min(GEN_SIZE);
            let digest = shabal256(&gendata[i..end]);
            gendata[i - 32..i].copy_from_slice(&digest);
            i -= 32;
        }
        let final_hash = shabal256(&gendata);
        for (j, byte) in gendata[..PLOT_SIZE].iter_mut().enumerate() {
            *byte ^= final_hash[j % 32];
        }
        gendata.truncate(PLOT_SIZE);
        gendata
    }

    fn generate_with<H: LaneHasher>(hasher: H, first_nonce: u64, count: usize) -> Vec<u8> {
        let layout = CacheLayout::new(count, count as u64);
        let mut cache = vec![0u8; layout.buffer_len()];
        {
            let mut columns = layout.split_columns(&mut cache, &[0, count]);
            let mut generator = NonceGenerator::new(hasher);
            for position in (0..count).step_by(generator.lanes()) {
                generator.generate(ACCOUNT_ID, first_nonce + position as u64, &mut columns[0], position);
            }
        }
        cache
    }

    #[test]
    fn header_is_big_endian_account_then_nonce() {
        let header = serialize_header(0x0102030405060708, 0x1112131415161718);
        assert_eq!(header, [1, 2, 3, 4, 5, 6, 7, 8, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18]);
    }

    #[test]
    fn known_answer_block_follows_poc2_shuffle() {
        let raw = reference_unshuffled(ACCOUNT_ID, 0);
        let block = compute_nonce(ACCOUNT_ID, 0);
        assert_eq!(block.len(), PLOT_SIZE);
        for d in 0..SCOOPS_PER_PLOT {
            let mirrored = SCOOPS_PER_PLOT - 1 - d;
            assert_eq!(&block[d * 64..d * 64 + 32], &raw[d * 64..d * 64 + 32], "low half of scoop {}", d);
            assert_eq!(&block[d * 64 + 32..d * 64 + 64], &raw[mirrored * 64 + 32..mirrored * 64 + 64], "high half of scoop {}", d);
        }
    }

    const BLOCK_DIGEST: &str = "1aa91d499424c8ff3074be0c022a87ceff6cd2c0bed340df05307a82265338f0";
    const FIRST_SCOOP: &str = "c26e9aa09b3556987a228af79e51fb97e9c673c017876c78fd166c6832b2edeb\
                               bb45dc80a25fb89c45052788fc40cebce3a5235d1fcd2f7d1cffdadfb24a55c9";
    const LAST_SCOOP: &str = "743432ae1ce880d468f883b02f12ca17430a6eec8b176d5d31c284a4d6569e6e\
                              26e962a7848e3e78aec144ca9399a9b09b998a4adbf405840de440b5fe88efb3";

    fn assert_reference_block(block: &[u8], core: &str) {
        assert_eq!(&block[..SCOOP_SIZE], &hex::decode(FIRST_SCOOP).unwrap()[..], "{} core, scoop 0", core);
        assert_eq!(&block[PLOT_SIZE - SCOOP_SIZE..], &hex::decode(LAST_SCOOP).unwrap()[..], "{} core, scoop 4095", core);
        assert_eq!(&shabal256(block)[..], &hex::decode(BLOCK_DIGEST).unwrap()[..], "{} core, whole block", core);
    }

    /// Position 0 of a stagger cache, gathered back into block order.
    fn first_block(cache: &[u8], layout: &CacheLayout) -> Vec<u8> {
        (0..SCOOPS_PER_PLOT)
            .flat_map(|scoop| {
                let offset = layout.cache_offset(scoop, 0, Half::Low);
                cache[offset..offset + SCOOP_SIZE].to_vec()
            })
            .collect()
    }

    #[test]
    fn reference_block_matches_in_every_lane_width() {
        assert_reference_block(&compute_nonce(ACCOUNT_ID, 0), "scalar");

        let layout = CacheLayout::new(8, 8);
        assert_reference_block(&first_block(&generate_with(MShabal4::new(), 0, 8), &layout), "4-wide");
        assert_reference_block(&first_block(&generate_with(MShabal8::new(), 0, 8), &layout), "8-wide");
    }

    #[test]
    fn shuffle_preserves_the_multiset_of_halves() {
        let raw = reference_unshuffled(ACCOUNT_ID, 3);
        let block = compute_nonce(ACCOUNT_ID, 3);
        let mut raw_halves: Vec<&[u8]> = raw.chunks(HASH_SIZE).collect();
        let mut block_halves: Vec<&[u8]> = block.chunks(HASH_SIZE).collect();
        raw_halves.sort();
        block_halves.sort();
        assert_eq!(raw_halves, block_halves);
    }

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(compute_nonce(ACCOUNT_ID, 7), compute_nonce(ACCOUNT_ID, 7));
        assert_ne!(compute_nonce(ACCOUNT_ID, 7), compute_nonce(ACCOUNT_ID, 8));
        assert_ne!(compute_nonce(ACCOUNT_ID, 7), compute_nonce(ACCOUNT_ID + 1, 7));
    }

    #[test]
    fn lane_widths_produce_identical_caches() {
        let scalar = generate_with(Shabal1, 0, 8);
        assert_eq!(generate_with(MShabal4::new(), 0, 8), scalar);
        assert_eq!(generate_with(MShabal8::new(), 0, 8), scalar);

        let layout = CacheLayout::new(8, 8);
        let block = compute_nonce(ACCOUNT_ID, 5);
        for scoop in 0..SCOOPS_PER_PLOT {
            let offset = layout.cache_offset(scoop, 5, Half::Low);
            assert_eq!(&scalar[offset..offset + SCOOP_SIZE], &block[scoop * SCOOP_SIZE..(scoop + 1) * SCOOP_SIZE]);
        }
    }
}
