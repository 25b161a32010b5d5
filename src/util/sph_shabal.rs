use shabal::{Digest, Shabal256};

use crate::util::constants::HASH_SIZE;

pub fn shabal256(data: &[u8]) -> [u8; HASH_SIZE] {
    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&Shabal256::digest(data));
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn digest_depends_on_every_byte() {
        let mut data = vec![0u8; 100];
        let reference = shabal256(&data);
        data[99] = 1;
        assert_ne!(shabal256(&data), reference);
        assert_eq!(shabal256(&[]), shabal256(&[]));
    }
}
