//! Read cursor over a single cell.

use std::sync::Arc;

use num_bigint::{BigInt, BigUint};
use num_traits::{ToPrimitive, Zero};

use crate::address::Address;
use crate::bits::{BitString, COINS_LEN_BITS};
use crate::cell::Cell;
use crate::error::{CellError, Result};

/// Sequential reader over a cell's bits and references.
///
/// Both cursors only move forward. A failed read leaves them untouched.
#[derive(Debug)]
pub struct Slice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> Slice<'a> {
    pub fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    /// Number of bits already consumed.
    pub fn bits_offset(&self) -> usize {
        self.bit_pos
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bits.used_bits() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.refs.len() - self.ref_pos
    }

    fn ensure_bits(&self, requested: usize) -> Result<()> {
        let remaining = self.remaining_bits();
        if requested > remaining {
            return Err(CellError::SliceUnderflow {
                requested,
                remaining,
            });
        }
        Ok(())
    }

    /// Bits `[bit_pos, bit_pos + n)` packed MSB first and right-aligned.
    fn peek_bytes(&self, n: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; n.div_ceil(8)];
        let shift = bytes.len() * 8 - n;
        for i in 0..n {
            if self.cell.bits.bit(self.bit_pos + i) {
                let j = i + shift;
                bytes[j / 8] |= 0x80 >> (j % 8);
            }
        }
        bytes
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.ensure_bits(n)?;
        self.bit_pos += n;
        Ok(())
    }

    pub fn preload_bit(&self) -> Result<bool> {
        self.ensure_bits(1)?;
        Ok(self.cell.bits.bit(self.bit_pos))
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        let bit = self.preload_bit()?;
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Read `n` bits into a new bit string of capacity `n`.
    pub fn load_bits(&mut self, n: usize) -> Result<BitString> {
        self.ensure_bits(n)?;
        let mut bits = BitString::new(n);
        for i in 0..n {
            bits.write_bit(self.cell.bits.bit(self.bit_pos + i))?;
        }
        self.bit_pos += n;
        Ok(bits)
    }

    /// Read `n` whole bytes.
    pub fn load_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure_bits(n * 8)?;
        let bytes = self.peek_bytes(n * 8);
        self.bit_pos += n * 8;
        Ok(bytes)
    }

    /// Read an `n`-bit unsigned integer without advancing.
    pub fn preload_uint(&self, n: usize) -> Result<BigUint> {
        self.ensure_bits(n)?;
        Ok(BigUint::from_bytes_be(&self.peek_bytes(n)))
    }

    /// Read an `n`-bit unsigned integer, MSB first.
    pub fn load_uint(&mut self, n: usize) -> Result<BigUint> {
        let value = self.preload_uint(n)?;
        self.bit_pos += n;
        Ok(value)
    }

    /// Read an `n`-bit two's-complement integer. A single set bit reads as -1.
    pub fn load_int(&mut self, n: usize) -> Result<BigInt> {
        let raw = BigInt::from(self.load_uint(n)?);
        if n > 0 && raw.bit(n as u64 - 1) {
            Ok(raw - (BigInt::from(1u8) << n))
        } else {
            Ok(raw)
        }
    }

    /// Small unsigned read for tags and fixed-width fields of at most 8 bits.
    fn load_u8(&mut self, n: usize) -> Result<u8> {
        debug_assert!(n <= 8);
        self.ensure_bits(n)?;
        let byte = self.peek_bytes(n).first().copied().unwrap_or(0);
        self.bit_pos += n;
        Ok(byte)
    }

    /// Read a value prefixed by its byte length in `len_bits` bits.
    ///
    /// Leaves the cursor untouched when the payload is truncated.
    pub fn load_var_uint(&mut self, len_bits: usize) -> Result<BigUint> {
        let start = self.bit_pos;
        let byte_len = self.load_uint(len_bits)?;
        let payload_bits = (byte_len * 8u8).to_usize().unwrap_or(usize::MAX);
        if let Err(e) = self.ensure_bits(payload_bits) {
            self.bit_pos = start;
            return Err(e);
        }
        if payload_bits == 0 {
            return Ok(BigUint::zero());
        }
        self.load_uint(payload_bits)
    }

    /// Read a coin amount written by [`BitString::write_coins`].
    pub fn load_coins(&mut self) -> Result<BigUint> {
        self.load_var_uint(COINS_LEN_BITS)
    }

    /// Read an address record: `00` is none, `10` a standard address.
    pub fn load_address(&mut self) -> Result<Option<Address>> {
        let start = self.bit_pos;
        let result = self.load_address_inner();
        if result.is_err() {
            self.bit_pos = start;
        }
        result
    }

    fn load_address_inner(&mut self) -> Result<Option<Address>> {
        match self.load_u8(2)? {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(CellError::InvalidAddress(
                        "anycast addresses are not supported".into(),
                    ));
                }
                let workchain = self.load_u8(8)? as i8;
                let mut hash_part = [0u8; 32];
                hash_part.copy_from_slice(&self.load_bytes(32)?);
                Ok(Some(Address::new(workchain, hash_part)))
            }
            tag => Err(CellError::InvalidAddressTag(tag)),
        }
    }

    /// Take the next child reference.
    pub fn load_ref(&mut self) -> Result<&'a Arc<Cell>> {
        let cell: &'a Cell = self.cell;
        let child = cell.refs.get(self.ref_pos).ok_or(CellError::RefsExhausted)?;
        self.ref_pos += 1;
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn cell_with(write: impl FnOnce(&mut BitString)) -> Cell {
        let mut cell = Cell::new();
        write(&mut cell.bits);
        cell
    }

    #[test]
    fn load_mixed_fields() {
        let cell = cell_with(|bits| {
            bits.write_bit(true).unwrap();
            bits.write_uint(0xBEEFu32, 16).unwrap();
            bits.write_int(-5, 8).unwrap();
            bits.write_bytes(b"ok").unwrap();
        });
        let mut slice = cell.begin_parse();

        assert!(slice.load_bit().unwrap());
        assert_eq!(slice.load_uint(16).unwrap(), BigUint::from(0xBEEFu32));
        assert_eq!(slice.load_int(8).unwrap(), BigInt::from(-5));
        assert_eq!(slice.load_bytes(2).unwrap(), b"ok".to_vec());
        assert_eq!(slice.remaining_bits(), 0);
        assert_eq!(slice.bits_offset(), 41);
    }

    #[test]
    fn load_int_single_bit() {
        let cell = cell_with(|bits| bits.write_bits(&[true, false]).unwrap());
        let mut slice = cell.begin_parse();
        assert_eq!(slice.load_int(1).unwrap(), BigInt::from(-1));
        assert_eq!(slice.load_int(1).unwrap(), BigInt::from(0));
    }

    #[test]
    fn underflow_leaves_cursor() {
        let cell = cell_with(|bits| bits.write_uint(3, 4).unwrap());
        let mut slice = cell.begin_parse();
        slice.skip_bits(1).unwrap();

        let err = slice.load_uint(8).unwrap_err();
        assert!(matches!(
            err,
            CellError::SliceUnderflow {
                requested: 8,
                remaining: 3
            }
        ));
        assert_eq!(slice.bits_offset(), 1);
        assert_eq!(slice.preload_uint(3).unwrap(), BigUint::from(3u8));
    }

    #[test]
    fn load_bits_copies_window() {
        let cell = cell_with(|bits| bits.write_uint(0b1011_0110u8, 8).unwrap());
        let mut slice = cell.begin_parse();
        slice.skip_bits(2).unwrap();
        let bits = slice.load_bits(4).unwrap();
        assert_eq!(bits.capacity(), 4);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![true, true, false, true]);
    }

    #[test]
    fn coins_round_trip() {
        let cell = cell_with(|bits| {
            bits.write_coins(0).unwrap();
            bits.write_coins(123_000_000_000u64).unwrap();
        });
        let mut slice = cell.begin_parse();
        assert_eq!(slice.load_coins().unwrap(), BigUint::zero());
        assert_eq!(slice.load_coins().unwrap(), BigUint::from(123_000_000_000u64));
    }

    #[test]
    fn truncated_coins_rewind() {
        let cell = cell_with(|bits| bits.write_uint(3, 4).unwrap());
        let mut slice = cell.begin_parse();
        assert!(slice.load_coins().is_err());
        assert_eq!(slice.bits_offset(), 0);
    }

    #[test]
    fn address_round_trip() {
        let address = Address::new(-1, [0x5A; 32]);
        let cell = cell_with(|bits| {
            bits.write_address(Some(&address)).unwrap();
            bits.write_address(None).unwrap();
        });
        let mut slice = cell.begin_parse();
        assert_eq!(slice.load_address().unwrap(), Some(address));
        assert_eq!(slice.load_address().unwrap(), None);
    }

    #[test]
    fn address_unknown_tag() {
        let cell = cell_with(|bits| bits.write_uint(0b01, 2).unwrap());
        let mut slice = cell.begin_parse();
        assert!(matches!(
            slice.load_address(),
            Err(CellError::InvalidAddressTag(0b01))
        ));
        assert_eq!(slice.bits_offset(), 0);
    }

    #[test]
    fn refs_in_order_then_exhausted() {
        let mut cell = Cell::new();
        cell.push_ref(cell_with(|b| b.write_uint8(1).unwrap())).unwrap();
        cell.push_ref(cell_with(|b| b.write_uint8(2).unwrap())).unwrap();

        let mut slice = cell.begin_parse();
        assert_eq!(slice.remaining_refs(), 2);
        let first = slice.load_ref().unwrap();
        let second = slice.load_ref().unwrap();
        assert_eq!(first.bits.to_hex(true), "01");
        assert_eq!(second.begin_parse().load_uint(8).unwrap(), BigUint::from(2u8));
        assert!(matches!(slice.load_ref(), Err(CellError::RefsExhausted)));
    }

    proptest! {
        #[test]
        fn uint_round_trip(width in 1usize..=256, seed in proptest::collection::vec(any::<u8>(), 32)) {
            let value = BigUint::from_bytes_be(&seed) >> (256 - width);
            let cell = cell_with(|bits| bits.write_uint(BigInt::from(value.clone()), width).unwrap());
            prop_assert_eq!(cell.bits.used_bits(), width);
            prop_assert_eq!(cell.begin_parse().load_uint(width).unwrap(), value);
        }

        #[test]
        fn int_round_trip(width in 2usize..=64, raw in any::<i64>()) {
            let value = BigInt::from(raw) >> (64 - width);
            let cell = cell_with(|bits| bits.write_int(value.clone(), width).unwrap());
            prop_assert_eq!(cell.begin_parse().load_int(width).unwrap(), value);
        }

        #[test]
        fn top_upped_restores_unaligned(bits in proptest::collection::vec(any::<bool>(), 1..1023)) {
            prop_assume!(bits.len() % 8 != 0);
            let mut original = BitString::new(1023);
            original.write_bits(&bits).unwrap();

            let restored = BitString::from_top_upped(&original.top_upped_bytes(), false).unwrap();
            prop_assert_eq!(restored.used_bits(), bits.len());
            prop_assert_eq!(restored, original);
        }
    }
}
