//! Shared fixtures for unit tests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use num_bigint::BigUint;

use crate::config::BlockKey;

/// Key pair over the Mersenne primes 2^521-1 and 2^607-1.
///
/// Returns `(decryption, encryption)`.
pub(crate) fn key_pair() -> (BlockKey, BlockKey) {
    let one = BigUint::from(1u32);
    let p = (&one << 521usize) - &one;
    let q = (&one << 607usize) - &one;
    let modulus = &p * &q;
    let totient = (&p - &one) * (&q - &one);

    let public = BigUint::from(65537u32);
    let private = public
        .modinv(&totient)
        .expect("65537 is coprime with the totient");

    (
        BlockKey::new(modulus.clone(), private).unwrap(),
        BlockKey::new(modulus, public).unwrap(),
    )
}

/// Encrypt an already-framed block value.
pub(crate) fn encrypt_raw(value: &BigUint, key: &BlockKey) -> String {
    STANDARD.encode(value.modpow(key.exponent(), key.modulus()).to_bytes_be())
}
