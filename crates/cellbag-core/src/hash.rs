//! Content-addressed hashing for cell graphs.
//!
//! A cell's hash is the SHA-256 digest of its representation: the two
//! descriptor bytes, the top-upped data bytes, the depth of every child as a
//! big-endian `u16`, then the hash of every child. Children are evaluated
//! before parents, and each distinct cell (by identity) is visited once no
//! matter how many parents reference it.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::cell::Cell;

/// A 32-byte SHA-256 cell hash.
pub type CellHash = [u8; 32];

/// Format a cell hash as a lowercase hex string.
pub fn hash_hex(hash: &CellHash) -> String {
    hex::encode(hash)
}

/// Memoized hashes and depths for one walk over a cell graph.
///
/// Entries are keyed by cell address, so a cache lives only for the duration
/// of a single call on a borrowed graph.
#[derive(Debug, Default)]
pub(crate) struct HashCache {
    hashes: HashMap<*const Cell, CellHash>,
    depths: HashMap<*const Cell, u16>,
}

impl HashCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of distinct cells hashed so far.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Depth of the deepest path below `cell`; leaves have depth 0.
    pub(crate) fn depth(&mut self, cell: &Cell) -> u16 {
        let key = cell as *const Cell;
        if let Some(&depth) = self.depths.get(&key) {
            return depth;
        }
        let depth = cell
            .refs
            .iter()
            .map(|child| self.depth(child).saturating_add(1))
            .max()
            .unwrap_or(0);
        self.depths.insert(key, depth);
        depth
    }

    /// Bytes fed to the digest for `cell`.
    pub(crate) fn repr(&mut self, cell: &Cell) -> Vec<u8> {
        let mut repr = cell.data_with_descriptors();
        for child in &cell.refs {
            repr.extend_from_slice(&self.depth(child).to_be_bytes());
        }
        for child in &cell.refs {
            repr.extend_from_slice(&self.hash(child));
        }
        repr
    }

    /// SHA-256 hash of `cell`, computing children first.
    pub(crate) fn hash(&mut self, cell: &Cell) -> CellHash {
        let key = cell as *const Cell;
        if let Some(hash) = self.hashes.get(&key) {
            return *hash;
        }
        let hash: CellHash = Sha256::digest(self.repr(cell)).into();
        self.hashes.insert(key, hash);
        hash
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn hash_hex_format() {
        let hex = hash_hex(&Cell::new().hash());
        assert_eq!(hex.len(), 64);
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn empty_cell_hash() {
        // SHA-256 of the two zero descriptor bytes.
        assert_eq!(
            Cell::new().hash_hex(),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }

    #[test]
    fn depth_of_chain() {
        let leaf = Arc::new(Cell::new());
        let mut mid = Cell::new();
        mid.refs.push(leaf.clone());
        let mid = Arc::new(mid);
        let mut root = Cell::new();
        root.refs.push(mid);
        root.refs.push(leaf);

        let mut cache = HashCache::new();
        assert_eq!(cache.depth(&root), 2);
    }

    #[test]
    fn shared_children_hashed_once() {
        let shared = Arc::new({
            let mut c = Cell::new();
            c.bits.write_uint8(7).unwrap();
            c
        });
        let mut root = Cell::new();
        for _ in 0..4 {
            root.refs.push(shared.clone());
        }

        let mut cache = HashCache::new();
        cache.hash(&root);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn diamond_depth_is_linear() {
        // Each level references the previous one twice; without memoization the
        // walk would be exponential in the number of levels.
        let mut level = Arc::new(Cell::new());
        for _ in 0..64 {
            let mut next = Cell::new();
            next.refs.push(level.clone());
            next.refs.push(level);
            level = Arc::new(next);
        }

        let mut cache = HashCache::new();
        assert_eq!(cache.depth(&level), 64);
        cache.hash(&level);
        assert_eq!(cache.len(), 65);
    }

    #[test]
    fn structurally_equal_cells_share_hash() {
        let mut a = Cell::new();
        a.bits.write_uint(42, 16).unwrap();
        let mut b = Cell::new();
        b.bits.write_uint(42, 16).unwrap();
        assert_eq!(a.hash(), b.hash());

        b.bits.write_bit(true).unwrap();
        assert_ne!(a.hash(), b.hash());
    }
}
