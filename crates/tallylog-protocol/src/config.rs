//! Startup configuration.
//!
//! Built once before the accept loop starts and shared read-only by every
//! request afterwards.

use std::num::NonZeroU32;
use std::path::Path;

use num_bigint::BigUint;
use num_traits::Zero;
use tracing::info;

use crate::error::ConfigError;

/// Low-order bits of each decrypted block reserved for random padding.
pub const DEFAULT_RANDOM_BIT_COUNT: usize = 64;

/// Divisor used to embed the verification remainder in each block.
pub const DEFAULT_CHECKSUM_MODULUS: NonZeroU32 = match NonZeroU32::new(8191) {
    Some(modulus) => modulus,
    None => unreachable!(),
};

/// Modulus and exponent for modular exponentiation of blocks.
///
/// The same shape serves both directions: the server holds the decryption
/// exponent, devices hold the matching encryption exponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockKey {
    modulus: BigUint,
    exponent: BigUint,
}

impl BlockKey {
    /// Create a key. The modulus must be non-zero.
    pub fn new(modulus: BigUint, exponent: BigUint) -> Result<Self, ConfigError> {
        if modulus.is_zero() {
            return Err(ConfigError::ZeroModulus);
        }
        Ok(Self { modulus, exponent })
    }

    /// Parse a key from a modulus and exponent given as hex byte strings.
    pub fn from_hex(modulus: &str, exponent: &str) -> Result<Self, ConfigError> {
        let modulus = parse_hex_byte_string("modulus", modulus)?;
        let exponent = parse_hex_byte_string("exponent", exponent)?;
        Self::new(modulus, exponent)
    }

    /// Load a key file holding `<modulus-hex> <exponent-hex>`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut fields = text.split_whitespace();
        let modulus = fields.next().ok_or(ConfigError::MissingKeyField("modulus"))?;
        let exponent = fields.next().ok_or(ConfigError::MissingKeyField("exponent"))?;
        let key = Self::from_hex(modulus, exponent)?;
        info!(?path, bits = key.modulus.bits(), "loaded key");
        Ok(key)
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    pub fn exponent(&self) -> &BigUint {
        &self.exponent
    }
}

/// Layout of a plaintext block before exponentiation.
///
/// ```text
/// p = (payload << random_bit_count) | random
/// m = p * checksum_modulus + (p mod checksum_modulus)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub random_bit_count: usize,
    pub checksum_modulus: NonZeroU32,
}

impl Default for BlockLayout {
    fn default() -> Self {
        Self {
            random_bit_count: DEFAULT_RANDOM_BIT_COUNT,
            checksum_modulus: DEFAULT_CHECKSUM_MODULUS,
        }
    }
}

/// Immutable handler configuration.
#[derive(Debug, Clone, Default)]
pub struct ProtocolConfig {
    /// Decryption key. When present, plaintext requests are refused.
    pub key: Option<BlockKey>,
    pub layout: BlockLayout,
    /// Emit an `Info : <device> : syncing` line for accepted requests.
    pub info_messages: bool,
}

impl ProtocolConfig {
    /// Configuration with a decryption key and the default layout.
    pub fn with_key(key: BlockKey) -> Self {
        Self {
            key: Some(key),
            ..Self::default()
        }
    }
}

/// Parse a big-endian hex byte string (two digits per byte).
pub fn parse_hex_byte_string(field: &'static str, text: &str) -> Result<BigUint, ConfigError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ConfigError::InvalidHex {
            field,
            reason: "empty",
        });
    }
    if text.len() % 2 != 0 {
        return Err(ConfigError::InvalidHex {
            field,
            reason: "odd number of digits",
        });
    }
    if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidHex {
            field,
            reason: "non-hex character",
        });
    }
    BigUint::parse_bytes(text.as_bytes(), 16).ok_or(ConfigError::InvalidHex {
        field,
        reason: "unparseable",
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parse_hex_byte_string_accepts_even_digits() {
        let value = parse_hex_byte_string("modulus", "00ff10").unwrap();
        assert_eq!(value, BigUint::from(0xff10u32));
    }

    #[test]
    fn parse_hex_byte_string_rejects_malformed_input() {
        assert!(matches!(
            parse_hex_byte_string("modulus", "abc"),
            Err(ConfigError::InvalidHex { reason: "odd number of digits", .. })
        ));
        assert!(matches!(
            parse_hex_byte_string("exponent", "zz"),
            Err(ConfigError::InvalidHex { reason: "non-hex character", .. })
        ));
        assert!(matches!(
            parse_hex_byte_string("exponent", "  "),
            Err(ConfigError::InvalidHex { reason: "empty", .. })
        ));
    }

    #[test]
    fn zero_modulus_is_rejected() {
        assert!(matches!(
            BlockKey::from_hex("0000", "03"),
            Err(ConfigError::ZeroModulus)
        ));
    }

    #[test]
    fn load_reads_modulus_then_exponent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0d05\n010001").unwrap();

        let key = BlockKey::load(file.path()).unwrap();
        assert_eq!(key.modulus(), &BigUint::from(0x0d05u32));
        assert_eq!(key.exponent(), &BigUint::from(0x010001u32));
    }

    #[test]
    fn load_reports_missing_fields_and_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0d05").unwrap();
        assert!(matches!(
            BlockKey::load(file.path()),
            Err(ConfigError::MissingKeyField("exponent"))
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            BlockKey::load(dir.path().join("dec-key.txt")),
            Err(ConfigError::KeyFile { .. })
        ));
    }

    #[test]
    fn default_layout_matches_wire_constants() {
        let config = ProtocolConfig::default();
        assert!(config.key.is_none());
        assert_eq!(config.layout.random_bit_count, 64);
        assert_eq!(config.layout.checksum_modulus.get(), 8191);
        assert!(!config.info_messages);
    }
}
