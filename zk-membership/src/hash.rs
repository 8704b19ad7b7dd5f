//! Native Poseidon helpers.
//!
//! Every hash here has an in-circuit twin in `circuit.rs` built from the same
//! `poseidon_config()`. The two MUST stay in sync: a fresh sponge per hash,
//! absorb the inputs in order, squeeze one element.

use crate::constants::poseidon_config;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_ff::PrimeField;

/// Poseidon hash of a single field element.
pub fn hash_one(x: Fr) -> Fr {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSponge::<Fr>::new(&cfg);
    sponge.absorb(&[x].as_slice());
    sponge.squeeze_field_elements(1)[0]
}

/// Poseidon hash of a pair of field elements.
pub fn hash_two(left: Fr, right: Fr) -> Fr {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSponge::<Fr>::new(&cfg);
    sponge.absorb(&[left, right].as_slice());
    sponge.squeeze_field_elements(1)[0]
}

/// Map an arbitrary byte string to a field element.
///
/// Bytes are packed into 31-byte little-endian limbs (31 bytes always fit below
/// the BN254 modulus), and the byte length is absorbed last so "ab" + "c" and
/// "a" + "bc" cannot collide.
pub fn hash_bytes(bytes: &[u8]) -> Fr {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSponge::<Fr>::new(&cfg);

    for chunk in bytes.chunks(31) {
        sponge.absorb(&[Fr::from_le_bytes_mod_order(chunk)].as_slice());
    }
    sponge.absorb(&[Fr::from(bytes.len() as u64)].as_slice());

    sponge.squeeze_field_elements(1)[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_two_is_order_sensitive() {
        let a = Fr::from(1u64);
        let b = Fr::from(2u64);
        assert_ne!(hash_two(a, b), hash_two(b, a));
    }

    #[test]
    fn hash_bytes_is_length_separated() {
        // Same limb content, different lengths.
        assert_ne!(hash_bytes(b"a"), hash_bytes(b"a\0"));
        assert_ne!(hash_bytes(b""), hash_bytes(b"\0"));
    }

    #[test]
    fn hash_bytes_deterministic() {
        assert_eq!(hash_bytes(b"Hello World"), hash_bytes(b"Hello World"));
        assert_ne!(hash_bytes(b"Hello World"), hash_bytes(b"Hello Worle"));
    }
}
