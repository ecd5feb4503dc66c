//! Standard account addresses: a signed workchain id and a 256-bit hash part.
//!
//! Two textual forms are supported. The raw form is `<workchain>:<hex>`. The
//! user-friendly form is 36 bytes `[tag, workchain, hash_part, crc16]`
//! rendered as base64, where the tag encodes the bounceable and test-only
//! flags and the CRC16-XMODEM covers the first 34 bytes.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use crc::{Crc, CRC_16_XMODEM};

use crate::error::{CellError, Result};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

const BOUNCEABLE_TAG: u8 = 0x11;
const NON_BOUNCEABLE_TAG: u8 = 0x51;
const TEST_ONLY_FLAG: u8 = 0x80;
const FRIENDLY_LEN: usize = 36;

/// Rendering options for the user-friendly address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyFormat {
    pub url_safe: bool,
    pub bounceable: bool,
    pub test_only: bool,
}

impl Default for FriendlyFormat {
    fn default() -> Self {
        Self {
            url_safe: true,
            bounceable: true,
            test_only: false,
        }
    }
}

/// A standard (non-anycast) internal address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    workchain: i8,
    hash_part: [u8; 32],
}

impl Address {
    /// Bits occupied by a standard address record: tag, anycast flag,
    /// workchain and hash part.
    pub const BIT_LEN: usize = 2 + 1 + 8 + 256;

    pub const fn new(workchain: i8, hash_part: [u8; 32]) -> Self {
        Self {
            workchain,
            hash_part,
        }
    }

    pub fn workchain(&self) -> i8 {
        self.workchain
    }

    pub fn hash_part(&self) -> &[u8; 32] {
        &self.hash_part
    }

    /// `<workchain>:<lowercase hex hash part>`
    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Base64 user-friendly form with an embedded checksum.
    pub fn to_friendly_string(&self, format: FriendlyFormat) -> String {
        let mut tag = if format.bounceable {
            BOUNCEABLE_TAG
        } else {
            NON_BOUNCEABLE_TAG
        };
        if format.test_only {
            tag |= TEST_ONLY_FLAG;
        }

        let mut bytes = Vec::with_capacity(FRIENDLY_LEN);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash_part);
        bytes.extend_from_slice(&CRC16.checksum(&bytes).to_be_bytes());

        if format.url_safe {
            URL_SAFE.encode(bytes)
        } else {
            STANDARD.encode(bytes)
        }
    }

    /// Parse either the raw or the user-friendly form.
    pub fn parse(input: &str) -> Result<Self> {
        if input.contains(':') {
            Self::parse_raw(input)
        } else {
            Self::parse_friendly(input)
        }
    }

    fn parse_raw(input: &str) -> Result<Self> {
        let (workchain, hash) = input
            .split_once(':')
            .ok_or_else(|| CellError::InvalidAddress(input.to_string()))?;
        let workchain: i8 = workchain
            .parse()
            .map_err(|_| CellError::InvalidAddress(format!("bad workchain in {input}")))?;
        let hash_part: [u8; 32] = hex::decode(hash)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| CellError::InvalidAddress(format!("bad hash part in {input}")))?;
        Ok(Self::new(workchain, hash_part))
    }

    fn parse_friendly(input: &str) -> Result<Self> {
        let normalized: String = input
            .chars()
            .map(|c| match c {
                '-' => '+',
                '_' => '/',
                c => c,
            })
            .collect();
        let bytes = STANDARD
            .decode(normalized)
            .map_err(|e| CellError::InvalidAddress(format!("{input}: {e}")))?;
        if bytes.len() != FRIENDLY_LEN {
            return Err(CellError::InvalidAddress(format!(
                "{input}: expected {FRIENDLY_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let (body, crc) = bytes.split_at(34);
        if CRC16.checksum(body).to_be_bytes() != crc {
            return Err(CellError::InvalidAddress(format!("{input}: checksum mismatch")));
        }
        let tag = body[0] & !TEST_ONLY_FLAG;
        if tag != BOUNCEABLE_TAG && tag != NON_BOUNCEABLE_TAG {
            return Err(CellError::InvalidAddress(format!("{input}: unknown tag {tag:#04x}")));
        }

        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&body[2..]);
        Ok(Self::new(body[1] as i8, hash_part))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw_string())
    }
}

impl FromStr for Address {
    type Err = CellError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRIENDLY: &str = "EQDxxpeLM0R2HH3nmtDoQsRL959eYb4pRW1tNL257U30KBOX";
    const HASH_HEX: &str = "f1c6978b3344761c7de79ad0e842c44bf79f5e61be29456d6d34bdb9ed4df428";

    fn sample() -> Address {
        let hash: [u8; 32] = hex::decode(HASH_HEX).unwrap().try_into().unwrap();
        Address::new(0, hash)
    }

    #[test]
    fn friendly_bounceable_url_safe() {
        assert_eq!(sample().to_friendly_string(FriendlyFormat::default()), FRIENDLY);
    }

    #[test]
    fn friendly_variants() {
        let addr = sample();
        let non_bounceable = FriendlyFormat {
            bounceable: false,
            ..FriendlyFormat::default()
        };
        assert_eq!(
            addr.to_friendly_string(non_bounceable),
            "UQDxxpeLM0R2HH3nmtDoQsRL959eYb4pRW1tNL257U30KE5S"
        );

        let test_only = FriendlyFormat {
            url_safe: false,
            bounceable: true,
            test_only: true,
        };
        assert_eq!(
            addr.to_friendly_string(test_only),
            "kQDxxpeLM0R2HH3nmtDoQsRL959eYb4pRW1tNL257U30KKgd"
        );
    }

    #[test]
    fn raw_form() {
        assert_eq!(sample().to_string(), format!("0:{HASH_HEX}"));
        let masterchain = Address::new(-1, [0; 32]);
        assert_eq!(masterchain.to_raw_string(), format!("-1:{}", "0".repeat(64)));
    }

    #[test]
    fn parse_both_forms() {
        assert_eq!(Address::parse(FRIENDLY).unwrap(), sample());
        assert_eq!(format!("0:{HASH_HEX}").parse::<Address>().unwrap(), sample());
        assert_eq!(
            Address::parse("kQDxxpeLM0R2HH3nmtDoQsRL959eYb4pRW1tNL257U30KKgd").unwrap(),
            sample()
        );
    }

    #[test]
    fn parse_rejects_bad_checksum() {
        let tampered = FRIENDLY.replace("EQDx", "EQDy");
        assert!(matches!(
            Address::parse(&tampered),
            Err(CellError::InvalidAddress(_))
        ));
    }

    #[test]
    fn parse_rejects_bad_raw() {
        assert!(Address::parse("0:abcd").is_err());
        assert!(Address::parse(&format!("300:{HASH_HEX}")).is_err());
    }
}
