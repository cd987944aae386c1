//! Canonical-ish Huffman tree construction over an integer alphabet.
//!
//! Used by `lz77` to build the length-alphabet tree from a completed
//! compress pass (see [`length_alphabet_tree`]); the default wire format
//! does not embed a Huffman header (see the crate's design notes), so this
//! module is otherwise a standalone, fully tested component.
//!
//! The tree is stored as an arena (`Vec<Node>`) with children referenced by
//! index rather than owned pointers, mirroring the node-pool style the rest
//! of this codebase uses for its other search structures. This keeps the
//! tree trivially droppable with no cyclic ownership to unwind.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use crate::Error;

/// A fixed upper bound on how many bits a frequency value is permitted to
/// occupy when a length-alphabet header is serialised by a caller. Not used
/// by the tree construction itself; exposed for callers building a header'd
/// variant on top of this crate.
pub const MAX_FREQUENCY_BITS_LENGTH: u8 = 5;

#[derive(Clone, Copy, Debug)]
enum Node {
    Leaf { symbol: u32, freq: u64 },
    Internal { freq: u64, left: usize, right: usize },
}

impl Node {
    fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } => *freq,
            Node::Internal { freq, .. } => *freq,
        }
    }
}

/// Heap entry ordered by ascending `(frequency, tie_symbol)`, with a
/// monotonic sequence number breaking any remaining tie so repeated
/// construction from the same frequency map is reproducible.
#[derive(Clone, Copy, Eq, PartialEq)]
struct HeapKey {
    freq: u64,
    tie_symbol: u32,
    seq: usize,
    idx: usize,
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other.freq.cmp(&self.freq)
            .then_with(|| other.tie_symbol.cmp(&self.tie_symbol))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A Huffman tree built over a symbol -> frequency map, with per-symbol
/// canonical-ish codes assigned by a left=0/right=1 DFS from the root.
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
    codes: HashMap<u32, (u64, u8)>,
    frequencies: BTreeMap<u32, u64>,
}

impl HuffmanTree {
    /// Build a tree from a symbol -> frequency map. A single-symbol map is
    /// padded with a synthetic `0`-frequency-1 leaf so the tree always has
    /// at least two leaves and every real symbol gets a non-empty code.
    pub fn build(freqs: &BTreeMap<u32, u64>) -> Result<Self, Error> {
        if freqs.is_empty() {
            log::error!("attempted to build a huffman tree from an empty frequency map");
            return Err(Error::EmptyAlphabetError);
        }
        let mut nodes = Vec::new();
        let mut heap = BinaryHeap::new();
        let mut seq = 0usize;

        let mut push_leaf = |nodes: &mut Vec<Node>, heap: &mut BinaryHeap<HeapKey>, seq: &mut usize, symbol: u32, freq: u64| {
            let idx = nodes.len();
            nodes.push(Node::Leaf { symbol, freq });
            heap.push(HeapKey { freq, tie_symbol: symbol, seq: *seq, idx });
            *seq += 1;
        };

        for (&symbol, &freq) in freqs.iter() {
            push_leaf(&mut nodes, &mut heap, &mut seq, symbol, freq);
        }
        if freqs.len() == 1 {
            log::debug!("single-symbol alphabet, padding with a synthetic leaf");
            push_leaf(&mut nodes, &mut heap, &mut seq, 0, 1);
        }

        while heap.len() > 1 {
            let left = heap.pop().unwrap();
            let right = heap.pop().unwrap();
            let freq = left.freq + right.freq;
            let idx = nodes.len();
            nodes.push(Node::Internal { freq, left: left.idx, right: right.idx });
            heap.push(HeapKey { freq, tie_symbol: 0, seq, idx });
            seq += 1;
        }
        let root = heap.pop().expect("heap non-empty by loop invariant").idx;

        let mut codes = HashMap::new();
        let mut stack = vec![(root, 0u64, 0u8)];
        while let Some((idx, code, len)) = stack.pop() {
            match nodes[idx] {
                Node::Leaf { symbol, .. } => {
                    codes.insert(symbol, (code, len.max(1)));
                }
                Node::Internal { left, right, .. } => {
                    stack.push((left, code << 1, len + 1));
                    stack.push((right, (code << 1) | 1, len + 1));
                }
            }
        }
        // a tree with exactly one leaf total cannot happen (we pad above),
        // but a tree whose root IS a leaf (pathological: zero merges) still
        // needs a 1-bit code, handled by the `len.max(1)` above.

        Ok(Self { nodes, root, codes, frequencies: freqs.clone() })
    }

    /// Look up the `(code, code_length)` pair for a symbol, MSB-first.
    ///
    /// `code` is widened to `u64` to match `BitCarry::push_bits`'s own field
    /// width limit: a maximally unbalanced tree (Fibonacci-weighted
    /// frequencies) can assign codes deeper than 32 bits for alphabets of a
    /// few dozen symbols, and deeper than 64 bits past a few dozen more.
    /// Code lengths beyond 64 are outside what this crate's bit-packing
    /// layer can emit in a single field; callers serialising this tree's
    /// codes are expected to keep alphabets within that bound.
    pub fn lookup(&self, symbol: u32) -> Option<(u64, u8)> {
        self.codes.get(&symbol).copied()
    }

    /// Arena index of the root node.
    pub fn root(&self) -> usize {
        self.root
    }

    /// The frequency map this tree was built from (post-padding excluded).
    pub fn frequencies(&self) -> &BTreeMap<u32, u64> {
        &self.frequencies
    }

    #[cfg(test)]
    fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }
}

/// Build the length-alphabet Huffman tree from a completed compress pass's
/// match-length histogram. Exposed for instrumentation; the default wire
/// format does not embed this tree (see crate design notes).
pub fn length_alphabet_tree(length_histogram: &BTreeMap<u32, u64>) -> Result<HuffmanTree, Error> {
    HuffmanTree::build(length_histogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_alphabet_fails() {
        let freqs = BTreeMap::new();
        assert_eq!(HuffmanTree::build(&freqs).unwrap_err(), Error::EmptyAlphabetError);
    }

    #[test]
    fn single_symbol_gets_padded_and_one_bit_code() {
        let mut freqs = BTreeMap::new();
        freqs.insert(0x20, 7);
        let tree = HuffmanTree::build(&freqs).unwrap();
        assert_eq!(tree.leaf_count(), 2);
        let (_, len) = tree.lookup(0x20).unwrap();
        assert_eq!(len, 1);
    }

    #[test]
    fn no_code_is_a_prefix_of_another() {
        let mut freqs = BTreeMap::new();
        for (sym, freq) in [(b'a', 45), (b'b', 13), (b'c', 12), (b'd', 16), (b'e', 9), (b'f', 5)] {
            freqs.insert(sym as u32, freq as u64);
        }
        let tree = HuffmanTree::build(&freqs).unwrap();
        let mut codes: Vec<(u64, u8)> = freqs.keys().map(|s| tree.lookup(*s).unwrap()).collect();
        codes.sort_by_key(|(_, len)| *len);
        for i in 0..codes.len() {
            for j in (i + 1)..codes.len() {
                let (ci, li) = codes[i];
                let (cj, lj) = codes[j];
                assert!(li <= lj);
                let cj_prefix = cj >> (lj - li);
                assert_ne!(ci, cj_prefix, "code {:b} (len {}) is a prefix of {:b} (len {})", ci, li, cj, lj);
            }
        }
    }

    #[test]
    fn deterministic_across_builds() {
        let mut freqs = BTreeMap::new();
        freqs.insert(1, 4);
        freqs.insert(2, 4);
        freqs.insert(3, 1);
        let a = HuffmanTree::build(&freqs).unwrap();
        let b = HuffmanTree::build(&freqs).unwrap();
        for sym in [1, 2, 3] {
            assert_eq!(a.lookup(sym), b.lookup(sym));
        }
    }

    #[test]
    fn fibonacci_weights_force_a_deep_tree_without_overflow() {
        // Fibonacci-weighted frequencies are the classic worst case for
        // Huffman: every merge pairs the running total with the next-rarest
        // leaf, producing a maximally unbalanced tree of depth symbol_count-1.
        let mut fib = vec![1u64, 1u64];
        while fib.len() < 40 {
            let next = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(next);
        }
        let mut freqs = BTreeMap::new();
        for (sym, freq) in fib.into_iter().enumerate() {
            freqs.insert(sym as u32, freq);
        }
        let tree = HuffmanTree::build(&freqs).unwrap();
        let (_, deepest_len) = tree.lookup(0).unwrap();
        assert!(deepest_len > 32, "expected depth beyond u32, got {}", deepest_len);
        for sym in freqs.keys() {
            assert!(tree.lookup(*sym).unwrap().1 >= 1);
        }
    }

    #[test]
    fn every_leaf_code_length_at_least_one() {
        let mut freqs = BTreeMap::new();
        freqs.insert(9, 1);
        freqs.insert(10, 1);
        freqs.insert(11, 1);
        let tree = HuffmanTree::build(&freqs).unwrap();
        for sym in [9, 10, 11] {
            let (_, len) = tree.lookup(sym).unwrap();
            assert!(len >= 1);
        }
    }
}
