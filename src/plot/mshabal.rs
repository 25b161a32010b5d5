//! Lane-parallel Shabal-256.
//!
//! Every state word holds one `u32` per lane, so each step of the compression
//! function runs the same operation over all lanes and the inner loops compile
//! down to vector instructions. Digests are bit-identical to the scalar
//! Shabal-256 for every lane.

use byteorder::{ByteOrder, LittleEndian};

use crate::util::constants::HASH_SIZE;

const BLOCK_SIZE: usize = 64;
const OUTPUT_BITS: u32 = 256;

#[derive(Clone, Copy)]
struct State<const N: usize> {
    a: [[u32; N]; 12],
    b: [[u32; N]; 16],
    c: [[u32; N]; 16],
    w: u64,
}

impl<const N: usize> State<N> {
    /// The Shabal-256 IV: an all-zero state after absorbing the two prefix
    /// blocks, with the block counter starting at -1.
    fn initial() -> Self {
        let mut state = State {
            a: [[0; N]; 12],
            b: [[0; N]; 16],
            c: [[0; N]; 16],
            w: u64::MAX,
        };
        let mut m = [[0u32; N]; 16];
        for (u, word) in m.iter_mut().enumerate() {
            *word = [OUTPUT_BITS + u as u32; N];
        }
        state.compress(&m);
        for (u, word) in m.iter_mut().enumerate() {
            *word = [OUTPUT_BITS + 16 + u as u32; N];
        }
        state.compress(&m);
        state
    }

    fn add_message(&mut self, m: &[[u32; N]; 16]) {
        for (b, m) in self.b.iter_mut().zip(m) {
            for l in 0..N {
                b[l] = b[l].wrapping_add(m[l]);
            }
        }
    }

    fn sub_message(&mut self, m: &[[u32; N]; 16]) {
        for (c, m) in self.c.iter_mut().zip(m) {
            for l in 0..N {
                c[l] = c[l].wrapping_sub(m[l]);
            }
        }
    }

    fn xor_counter(&mut self) {
        let low = self.w as u32;
        let high = (self.w >> 32) as u32;
        for l in 0..N {
            self.a[0][l] ^= low;
            self.a[1][l] ^= high;
        }
    }

    fn permute(&mut self, m: &[[u32; N]; 16]) {
        for b in self.b.iter_mut() {
            for x in b.iter_mut() {
                *x = x.rotate_left(17);
            }
        }

        for j in 0..48 {
            let i = j % 16;
            let (a0, a1) = (j % 12, (j + 11) % 12);
            let (b1, b2, b3) = ((i + 13) % 16, (i + 9) % 16, (i + 6) % 16);
            let c = (24 - i) % 16;
            for l in 0..N {
                let a = (self.a[a0][l] ^ self.a[a1][l].rotate_left(15).wrapping_mul(5) ^ self.c[c][l])
                    .wrapping_mul(3)
                    ^ self.b[b1][l]
                    ^ (self.b[b2][l] & !self.b[b3][l])
                    ^ m[i][l];
                self.a[a0][l] = a;
                self.b[i][l] = !(self.b[i][l].rotate_left(1) ^ a);
            }
        }

        for j in 0..36 {
            let (a, c) = (j % 12, (j + 3) % 16);
            for l in 0..N {
                self.a[a][l] = self.a[a][l].wrapping_add(self.c[c][l]);
            }
        }
    }

    fn compress(&mut self, m: &[[u32; N]; 16]) {
        self.add_message(m);
        self.xor_counter();
        self.permute(m);
        self.sub_message(m);
        std::mem::swap(&mut self.b, &mut self.c);
        self.w = self.w.wrapping_add(1);
    }

    fn finish(mut self, m: &[[u32; N]; 16]) -> [[u8; HASH_SIZE]; N] {
        self.add_message(m);
        self.xor_counter();
        self.permute(m);
        for _ in 0..3 {
            std::mem::swap(&mut self.b, &mut self.c);
            self.xor_counter();
            self.permute(m);
        }

        let mut out = [[0u8; HASH_SIZE]; N];
        for (l, digest) in out.iter_mut().enumerate() {
            for (chunk, word) in digest.chunks_exact_mut(4).zip(&self.b[8..]) {
                LittleEndian::write_u32(chunk, word[l]);
            }
        }
        out
    }
}

fn decode_block<const N: usize>(block: &[u8], lane: usize, m: &mut [[u32; N]; 16]) {
    for (word, chunk) in m.iter_mut().zip(block.chunks_exact(4)) {
        word[lane] = LittleEndian::read_u32(chunk);
    }
}

/// Shabal-256 over `N` messages of equal length.
#[derive(Clone)]
pub struct MShabal<const N: usize> {
    initial: State<N>,
}

impl<const N: usize> MShabal<N> {
    pub fn new() -> Self {
        Self { initial: State::initial() }
    }

    pub fn digest(&self, inputs: &[&[u8]; N]) -> [[u8; HASH_SIZE]; N] {
        let len = inputs.first().map_or(0, |input| input.len());
        debug_assert!(inputs.iter().all(|input| input.len() == len), "lanes must hash equal lengths");

        let mut state = self.initial;
        let mut m = [[0u32; N]; 16];
        let full = len - len % BLOCK_SIZE;
        for offset in (0..full).step_by(BLOCK_SIZE) {
            for (lane, input) in inputs.iter().enumerate() {
                decode_block(&input[offset..offset + BLOCK_SIZE], lane, &mut m);
            }
            state.compress(&m);
        }

        for (lane, input) in inputs.iter().enumerate() {
            let tail = &input[full..];
            let mut block = [0u8; BLOCK_SIZE];
            block[..tail.len()].copy_from_slice(tail);
            block[tail.len()] = 0x80;
            decode_block(&block, lane, &mut m);
        }
        state.finish(&m)
    }
}

impl<const N: usize> Default for MShabal<N> {
    fn default() -> Self {
        Self::new()
    }
}
