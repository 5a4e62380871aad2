//! Block encryption for telemetry bodies.
//!
//! An encrypted body is a sequence of newline-terminated base64 blocks. Each
//! block is the big-endian encoding of `m^e mod n` where `m` follows
//! [`BlockLayout`]. Decryption verifies every block before any plaintext is
//! released.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;
use rand::RngCore;
use tracing::debug;

use crate::config::{BlockKey, BlockLayout};
use crate::error::{ConfigError, Rejection, Result};

/// Decrypt and verify every newline-terminated block of `body`.
///
/// A trailing fragment with no newline is ignored. Any failing block rejects
/// the whole body.
pub fn decrypt_body(body: &[u8], key: &BlockKey, layout: &BlockLayout) -> Result<Vec<u8>> {
    let mut plaintext = Vec::new();
    let mut rest = body;
    let mut blocks = 0usize;
    while let Some(end) = rest.iter().position(|&b| b == b'\n') {
        let chunk = decrypt_block(&rest[..end], key, layout).inspect_err(|reason| {
            debug!(block = blocks, %reason, "block failed verification");
        })?;
        plaintext.extend_from_slice(&chunk);
        rest = &rest[end + 1..];
        blocks += 1;
    }
    if !rest.is_empty() {
        debug!(len = rest.len(), "dropping unterminated trailing block");
    }
    debug!(blocks, len = plaintext.len(), "decrypted body");
    Ok(plaintext)
}

/// Decrypt and verify a single base64 block.
pub fn decrypt_block(block: &[u8], key: &BlockKey, layout: &BlockLayout) -> Result<Vec<u8>> {
    let raw = STANDARD
        .decode(block.trim_ascii())
        .map_err(|_| Rejection::InvalidBlock)?;
    let value = BigUint::from_bytes_be(&raw).modpow(key.exponent(), key.modulus());

    let checksum_modulus = BigUint::from(layout.checksum_modulus.get());
    let (quotient, checksum) = value.div_rem(&checksum_modulus);
    if checksum != &quotient % &checksum_modulus {
        return Err(Rejection::ChecksumMismatch);
    }

    Ok(canonical_bytes(&(quotient >> layout.random_bit_count)))
}

/// Largest payload, in bytes, one block can carry under `key`.
pub fn max_chunk_len(key: &BlockKey, layout: &BlockLayout) -> usize {
    let checksum_bits = u64::from(u32::BITS - layout.checksum_modulus.get().leading_zeros());
    let available = key
        .modulus()
        .bits()
        .saturating_sub(1 + layout.random_bit_count as u64 + checksum_bits);
    (available / 8) as usize
}

/// Encrypt one payload chunk with the given padding value.
///
/// Leading zero bytes of `chunk` do not survive a round trip; text payloads
/// never start with NUL.
pub fn encrypt_block(chunk: &[u8], random: u64, key: &BlockKey, layout: &BlockLayout) -> String {
    let random = if layout.random_bit_count < 64 {
        random & ((1u64 << layout.random_bit_count) - 1)
    } else {
        random
    };
    let padded = (BigUint::from_bytes_be(chunk) << layout.random_bit_count) | BigUint::from(random);
    let checksum_modulus = BigUint::from(layout.checksum_modulus.get());
    let framed = &padded * &checksum_modulus + (&padded % &checksum_modulus);
    STANDARD.encode(framed.modpow(key.exponent(), key.modulus()).to_bytes_be())
}

/// Encrypt a whole plaintext body into newline-terminated blocks.
pub fn encrypt_body<R: RngCore + ?Sized>(
    plaintext: &[u8],
    key: &BlockKey,
    layout: &BlockLayout,
    rng: &mut R,
) -> std::result::Result<String, ConfigError> {
    let chunk_len = max_chunk_len(key, layout);
    if chunk_len == 0 {
        return Err(ConfigError::KeyTooSmall {
            bits: key.modulus().bits(),
        });
    }
    let mut body = String::new();
    for chunk in plaintext.chunks(chunk_len) {
        body.push_str(&encrypt_block(chunk, rng.next_u64(), key, layout));
        body.push('\n');
    }
    Ok(body)
}

fn canonical_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::testing::{encrypt_raw, key_pair};

    #[test]
    fn block_round_trip() {
        let (decrypt, encrypt) = key_pair();
        let layout = BlockLayout::default();

        let block = encrypt_block(b"sensor-7\n", 0xdead_beef, &encrypt, &layout);
        let plain = decrypt_block(block.as_bytes(), &decrypt, &layout).unwrap();
        assert_eq!(plain, b"sensor-7\n");
    }

    #[test]
    fn body_round_trip_across_many_blocks() {
        let (decrypt, encrypt) = key_pair();
        let layout = BlockLayout::default();
        let plaintext: Vec<u8> = b"line of telemetry\n".repeat(40);
        assert!(plaintext.len() > max_chunk_len(&encrypt, &layout) * 3);

        let mut rng = StdRng::seed_from_u64(7);
        let body = encrypt_body(&plaintext, &encrypt, &layout, &mut rng).unwrap();
        assert!(body.lines().count() > 3);

        let decrypted = decrypt_body(body.as_bytes(), &decrypt, &layout).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn wrong_checksum_is_rejected() {
        let (decrypt, encrypt) = key_pair();
        let layout = BlockLayout::default();

        let padded = BigUint::from_bytes_be(b"dev\n") << layout.random_bit_count;
        let modulus = BigUint::from(layout.checksum_modulus.get());
        let bad = &padded * &modulus + ((&padded % &modulus) + 1u32) % &modulus;
        let block = encrypt_raw(&bad, &encrypt);

        assert_eq!(
            decrypt_block(block.as_bytes(), &decrypt, &layout),
            Err(Rejection::ChecksumMismatch)
        );
    }

    #[test]
    fn one_bad_block_rejects_whole_body() {
        let (decrypt, encrypt) = key_pair();
        let layout = BlockLayout::default();

        let good = encrypt_block(b"dev\n", 1, &encrypt, &layout);
        let bad = encrypt_raw(&BigUint::from(8192u32 * 3 + 5), &encrypt);
        let body = format!("{good}\n{bad}\n{good}\n");

        assert_eq!(
            decrypt_body(body.as_bytes(), &decrypt, &layout),
            Err(Rejection::ChecksumMismatch)
        );
    }

    #[test]
    fn unterminated_trailing_block_is_dropped() {
        let (decrypt, encrypt) = key_pair();
        let layout = BlockLayout::default();

        let first = encrypt_block(b"dev\n", 2, &encrypt, &layout);
        let second = encrypt_block(b"ignored", 3, &encrypt, &layout);
        let body = format!("{first}\n{second}");

        let plain = decrypt_body(body.as_bytes(), &decrypt, &layout).unwrap();
        assert_eq!(plain, b"dev\n");
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let (decrypt, _) = key_pair();
        assert_eq!(
            decrypt_body(b"not base64!!\n", &decrypt, &BlockLayout::default()),
            Err(Rejection::InvalidBlock)
        );
    }

    #[test]
    fn tiny_modulus_cannot_carry_payload() {
        let key = BlockKey::new(BigUint::from(0xffffu32), BigUint::from(3u32)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            encrypt_body(b"x", &key, &BlockLayout::default(), &mut rng),
            Err(ConfigError::KeyTooSmall { bits: 16 })
        ));
    }
}
