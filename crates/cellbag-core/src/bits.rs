//! Fixed-capacity, append-only bit buffer.
//!
//! Bits are packed most-significant-bit first: bit `n` lives in byte `n / 8`
//! under the mask `0x80 >> (n % 8)`. Writes append at the cursor and fail once
//! the cursor reaches the capacity; the only place the capacity ever grows is
//! the padding applied when a bit string is persisted as whole bytes.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::address::Address;
use crate::error::{CellError, Result};

/// Width in bits of the length prefix used by [`BitString::write_coins`].
pub const COINS_LEN_BITS: usize = 4;

/// A bit buffer with a fixed capacity and a monotonically advancing cursor.
#[derive(Debug, Clone)]
pub struct BitString {
    capacity: usize,
    cursor: usize,
    data: Vec<u8>,
}

impl BitString {
    /// Create an empty bit string able to hold `capacity` bits.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            cursor: 0,
            data: vec![0; capacity.div_ceil(8)],
        }
    }

    /// Build a bit string from a top-upped byte array.
    ///
    /// See [`BitString::set_top_upped_bytes`] for the meaning of `fulfilled`.
    pub fn from_top_upped(bytes: &[u8], fulfilled: bool) -> Result<Self> {
        let mut bits = Self::new(0);
        bits.set_top_upped_bytes(bytes, fulfilled)?;
        Ok(bits)
    }

    /// Total number of bits this string can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bits that can still be written.
    pub fn free_bits(&self) -> usize {
        self.capacity - self.cursor
    }

    /// Number of bits written so far.
    pub fn used_bits(&self) -> usize {
        self.cursor
    }

    /// Number of bytes touched by the written bits.
    pub fn used_bytes(&self) -> usize {
        self.cursor.div_ceil(8)
    }

    /// The bytes covering the written bits, without padding.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.used_bytes()]
    }

    fn check_range(&self, n: usize) -> Result<()> {
        if n >= self.capacity {
            return Err(CellError::OutOfRange {
                index: n,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Unchecked read; callers guarantee `n < capacity`.
    pub(crate) fn bit(&self, n: usize) -> bool {
        self.data[n / 8] & (0x80 >> (n % 8)) != 0
    }

    fn set_bit(&mut self, n: usize, value: bool) {
        let mask = 0x80 >> (n % 8);
        if value {
            self.data[n / 8] |= mask;
        } else {
            self.data[n / 8] &= !mask;
        }
    }

    /// Read the bit at position `n`.
    pub fn get(&self, n: usize) -> Result<bool> {
        self.check_range(n)?;
        Ok(self.bit(n))
    }

    /// Set the bit at position `n` to 1.
    pub fn on(&mut self, n: usize) -> Result<()> {
        self.check_range(n)?;
        self.set_bit(n, true);
        Ok(())
    }

    /// Set the bit at position `n` to 0.
    pub fn off(&mut self, n: usize) -> Result<()> {
        self.check_range(n)?;
        self.set_bit(n, false);
        Ok(())
    }

    /// Flip the bit at position `n`.
    pub fn toggle(&mut self, n: usize) -> Result<()> {
        self.check_range(n)?;
        self.data[n / 8] ^= 0x80 >> (n % 8);
        Ok(())
    }

    /// Iterate over the written bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.cursor).map(move |n| self.bit(n))
    }

    fn ensure_free(&self, bits: usize) -> Result<()> {
        if bits > self.free_bits() {
            return Err(CellError::Overflow);
        }
        Ok(())
    }

    /// Reallocate to hold at least `capacity` bits. Only padding uses this.
    fn grow_to(&mut self, capacity: usize) {
        if capacity > self.capacity {
            self.capacity = capacity;
            self.data.resize(capacity.div_ceil(8), 0);
        }
    }

    fn push_bit(&mut self, bit: bool) {
        self.set_bit(self.cursor, bit);
        self.cursor += 1;
    }

    /// Write one bit at the cursor.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        if self.cursor == self.capacity {
            return Err(CellError::Overflow);
        }
        self.push_bit(bit);
        Ok(())
    }

    /// Write a sequence of bits.
    pub fn write_bits(&mut self, bits: &[bool]) -> Result<()> {
        self.ensure_free(bits.len())?;
        bits.iter().for_each(|&b| self.push_bit(b));
        Ok(())
    }

    /// Write a non-negative integer in exactly `bit_len` bits, MSB first.
    ///
    /// Zero is always representable, including with `bit_len == 0` where
    /// nothing is written.
    pub fn write_uint(&mut self, value: impl Into<BigInt>, bit_len: usize) -> Result<()> {
        let value = value.into();
        if value.is_negative() {
            return Err(CellError::NegativeUnsigned(value));
        }
        if value.bits() > bit_len as u64 {
            return Err(CellError::BitLengthTooSmall { value, bit_len });
        }
        self.ensure_free(bit_len)?;

        let magnitude = value.magnitude();
        for i in (0..bit_len as u64).rev() {
            self.push_bit(magnitude.bit(i));
        }
        Ok(())
    }

    /// Write a two's-complement signed integer in exactly `bit_len` bits.
    pub fn write_int(&mut self, value: impl Into<BigInt>, bit_len: usize) -> Result<()> {
        let value = value.into();
        match bit_len {
            0 if value.is_zero() => Ok(()),
            1 if value == -BigInt::one() => self.write_bit(true),
            1 if value.is_zero() => self.write_bit(false),
            0 | 1 => Err(CellError::BitLengthTooSmall { value, bit_len }),
            _ => {
                let half = BigInt::one() << (bit_len - 1);
                let in_range = if value.is_negative() {
                    -&value <= half
                } else {
                    value < half
                };
                if !in_range {
                    return Err(CellError::BitLengthTooSmall { value, bit_len });
                }
                self.ensure_free(bit_len)?;

                if value.is_negative() {
                    self.push_bit(true);
                    self.write_uint(half + value, bit_len - 1)
                } else {
                    self.push_bit(false);
                    self.write_uint(value, bit_len - 1)
                }
            }
        }
    }

    /// Write one byte.
    pub fn write_uint8(&mut self, value: u8) -> Result<()> {
        self.write_uint(value, 8)
    }

    /// Write bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_free(bytes.len() * 8)?;
        for &byte in bytes {
            for shift in (0..8).rev() {
                self.push_bit((byte >> shift) & 1 == 1);
            }
        }
        Ok(())
    }

    /// Write the UTF-8 bytes of `value`.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write an unsigned amount prefixed by its byte length in `len_bits` bits.
    pub fn write_var_uint(&mut self, value: impl Into<BigInt>, len_bits: usize) -> Result<()> {
        let value = value.into();
        if value.is_negative() {
            return Err(CellError::NegativeUnsigned(value));
        }
        let byte_len = BigInt::from(value.bits().div_ceil(8));
        if byte_len.bits() > len_bits as u64 {
            return Err(CellError::BitLengthTooSmall {
                value: byte_len,
                bit_len: len_bits,
            });
        }
        let payload_bits = value.bits().div_ceil(8) as usize * 8;
        self.ensure_free(len_bits + payload_bits)?;

        self.write_uint(byte_len, len_bits)?;
        self.write_uint(value, payload_bits)
    }

    /// Write a coin amount in its smallest denomination.
    pub fn write_coins(&mut self, amount: impl Into<BigInt>) -> Result<()> {
        self.write_var_uint(amount, COINS_LEN_BITS)
    }

    /// Write an address record, `00` for none.
    pub fn write_address(&mut self, address: Option<&Address>) -> Result<()> {
        match address {
            None => self.write_uint(0u8, 2),
            Some(address) => {
                self.ensure_free(Address::BIT_LEN)?;
                self.write_uint(2u8, 2)?;
                self.write_bit(false)?;
                self.write_int(address.workchain(), 8)?;
                self.write_bytes(address.hash_part())
            }
        }
    }

    /// Append the written bits of `other`.
    pub fn write_bit_string(&mut self, other: &BitString) -> Result<()> {
        self.ensure_free(other.used_bits())?;
        other.iter().for_each(|b| self.push_bit(b));
        Ok(())
    }

    /// The written bits as whole bytes, padded with a `1` terminator and `0`s
    /// when the bit count is not a multiple of eight.
    pub fn top_upped_bytes(&self) -> Vec<u8> {
        let padding = self.used_bytes() * 8 - self.cursor;
        if padding == 0 {
            return self.as_bytes().to_vec();
        }

        let mut padded = self.clone();
        padded.grow_to(self.cursor + padding);
        padded.push_bit(true);
        for _ in 1..padding {
            padded.push_bit(false);
        }
        padded.as_bytes().to_vec()
    }

    /// Replace the contents with a top-upped byte array.
    ///
    /// When `fulfilled` is false the last byte carries padding: the trailing
    /// `1` terminator is searched within the last 7 bits, cleared, and the
    /// cursor is placed on it.
    pub fn set_top_upped_bytes(&mut self, bytes: &[u8], fulfilled: bool) -> Result<()> {
        self.capacity = bytes.len() * 8;
        self.cursor = self.capacity;
        self.data = bytes.to_vec();

        if fulfilled || self.capacity == 0 {
            return Ok(());
        }

        for _ in 0..7 {
            self.cursor -= 1;
            if self.bit(self.cursor) {
                self.set_bit(self.cursor, false);
                return Ok(());
            }
        }
        Err(CellError::MalformedPadding)
    }

    /// Hex dump of the written bits.
    ///
    /// Bit counts that are not a multiple of four are completed with a `1`
    /// and `0`s up to the next nibble and marked with a trailing `_`.
    /// `fift_style` selects uppercase digits.
    pub fn to_hex(&self, fift_style: bool) -> String {
        if self.cursor % 4 == 0 {
            let mut hex = hex::encode(self.as_bytes());
            if self.cursor % 8 != 0 {
                hex.pop();
            }
            if fift_style {
                hex.make_ascii_uppercase();
            }
            return hex;
        }

        let mut padded = self.clone();
        padded.grow_to((self.cursor + 1).div_ceil(4) * 4);
        padded.push_bit(true);
        while padded.cursor % 4 != 0 {
            padded.push_bit(false);
        }
        let mut hex = padded.to_hex(fift_style);
        hex.push('_');
        hex
    }
}

impl PartialEq for BitString {
    fn eq(&self, other: &Self) -> bool {
        self.cursor == other.cursor && self.iter().eq(other.iter())
    }
}

impl Eq for BitString {}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex(true))
    }
}
