// lzw.rs
//
// Copyright (c) 2020-2026  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }

    /// Get the bit mask
    fn mask(self) -> u32 {
        (1 << (self.0 as u32)) - 1
    }
}

/// Code type
type Code = u16;

/// Cursor over a bit stream, least-significant bit first.
///
/// Bytes are pushed in as sub-blocks arrive; codes may span byte (and
/// sub-block) boundaries.
#[derive(Debug, Default)]
struct BitCursor {
    /// Pending bits
    acc: u32,
    /// Number of pending bits
    n_bits: u8,
}

impl BitCursor {
    /// Push one byte onto the high end of the pending bits
    fn push_byte(&mut self, byte: u8) {
        debug_assert!(self.n_bits <= 24);
        self.acc |= u32::from(byte) << self.n_bits;
        self.n_bits += 8;
    }

    /// Take one code of `width` bits, if enough bits are pending
    fn take_bits(&mut self, width: Bits) -> Option<Code> {
        let b = u8::from(width);
        if self.n_bits >= b {
            let code = (self.acc & width.mask()) as Code;
            self.acc >>= b;
            self.n_bits -= b;
            Some(code)
        } else {
            None
        }
    }
}

/// Node for code dictionary
trait Node {
    /// Create a new node
    fn new(next: Option<Code>, byte: u8) -> Self;

    /// Get the byte value
    fn byte(self) -> u8;
}

/// Node for Compressor
#[derive(Clone, Copy, Debug)]
struct CNode {
    /// Next node code
    next: Option<Code>,
    /// Left node code
    left: Option<Code>,
    /// Right node code
    right: Option<Code>,
    /// Byte value
    byte: u8,
}

/// Node for Decompressor
#[derive(Clone, Copy, Debug)]
struct DNode {
    /// Prefix node code
    next: Option<Code>,
    /// Byte value
    byte: u8,
}

/// Code dictionary trie
#[derive(Debug)]
struct Trie<N: Node> {
    /// Table of codes
    table: Vec<N>,
    /// Minimum code bits
    min_code_bits: u8,
}

/// LZW Data Compressor
///
/// Reference encoder, producing the code stream a GIF image data block
/// carries (before it is split into sub-blocks).
pub struct Compressor {
    /// Code dictionary
    trie: Trie<CNode>,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Current code
    code: u32,
    /// Number of bits in current code
    n_bits: u8,
}

/// LZW Data Decompressor
///
/// Expands a code stream into palette indices.  The dictionary holds at
/// most 4096 entries; once full, no entries are added until a clear code.
#[derive(Debug)]
pub struct Decompressor {
    /// Code dictionary
    trie: Trie<DNode>,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Last code
    last: Option<Code>,
    /// Pending input bits
    bits: BitCursor,
    /// End of information code has been read
    done: bool,
}

impl Node for CNode {
    fn new(next: Option<Code>, byte: u8) -> Self {
        CNode {
            next,
            left: None,
            right: None,
            byte,
        }
    }

    fn byte(self) -> u8 {
        self.byte
    }
}

impl Node for DNode {
    fn new(next: Option<Code>, byte: u8) -> Self {
        DNode { next, byte }
    }

    fn byte(self) -> u8 {
        self.byte
    }
}

impl CNode {
    /// Get a link code
    fn link(&self, ordering: Ordering) -> Option<Code> {
        match ordering {
            Ordering::Less => self.left,
            Ordering::Equal => self.next,
            Ordering::Greater => self.right,
        }
    }

    /// Set a link code
    fn set_link(&mut self, ordering: Ordering, code: Code) {
        match ordering {
            Ordering::Less => self.left = Some(code),
            Ordering::Equal => self.next = Some(code),
            Ordering::Greater => self.right = Some(code),
        }
    }
}

impl<N: Node> Trie<N> {
    /// Create a new code dictionary
    fn new(min_code_bits: u8) -> Self {
        let mut trie = Trie {
            table: Vec::with_capacity(Bits::MAX.entries().into()),
            min_code_bits,
        };
        trie.reset();
        trie
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Check whether the dictionary is full
    fn is_full(&self) -> bool {
        self.table.len() >= Bits::MAX.entries().into()
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.push_node(None, byte as u8);
        }
        self.push_node(None, 0); // clear code
        self.push_node(None, 0); // end code
    }

    /// Push a node into the dictionary
    fn push_node(&mut self, next: Option<Code>, byte: u8) {
        self.table.push(N::new(next, byte))
    }

    /// Get a mutable node
    fn node_mut(&mut self, code: Code) -> &mut N {
        debug_assert!(code < self.next_code());
        &mut self.table[code as usize]
    }
}

impl Trie<CNode> {
    /// Search and insert a node
    fn search_insert(&mut self, code: Option<Code>, byte: u8) -> Option<Code> {
        match code {
            Some(code) => self.insert(code, byte),
            None => Some(byte as Code),
        }
    }

    /// Insert a node
    fn insert(&mut self, code: Code, byte: u8) -> Option<Code> {
        let next_code = self.next_code();
        let mut node = self.node_mut(code);
        let mut ordering = Ordering::Equal;
        while let Some(code) = node.link(ordering) {
            node = self.node_mut(code);
            ordering = byte.cmp(&node.byte());
            if ordering == Ordering::Equal {
                return Some(code);
            }
        }
        node.set_link(ordering, next_code);
        self.push_node(None, byte);
        None
    }
}

/// Check a minimum code size (2 to 8 bits, as used by GIF)
fn check_code_bits(min_code_bits: u8) -> Result<()> {
    match min_code_bits {
        2..=8 => Ok(()),
        _ => Err(Error::InvalidCodeSize(min_code_bits)),
    }
}

impl Compressor {
    /// Create a new compressor
    pub fn new(min_code_bits: u8) -> Result<Self> {
        check_code_bits(min_code_bits)?;
        let trie = Trie::<CNode>::new(min_code_bits);
        let code_bits = Bits::from(min_code_bits + 1);
        Ok(Compressor {
            min_code_bits,
            trie,
            code_bits,
            code: 0,
            n_bits: 0,
        })
    }

    /// Pack a code into a buffer
    fn pack(&mut self, code: Code, buffer: &mut Vec<u8>) {
        self.code |= (code as u32) << self.n_bits;
        self.n_bits += u8::from(self.code_bits);
        while self.n_bits >= 8 {
            buffer.push(self.code as u8);
            self.code >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Flush partial byte into a buffer
    fn flush(&mut self, buffer: &mut Vec<u8>) {
        if self.n_bits > 0 {
            buffer.push(self.code as u8);
            self.code = 0;
            self.n_bits = 0;
        }
    }

    /// Compress palette indices into a buffer.
    ///
    /// Every index must be less than the clear code.
    pub fn compress(&mut self, bytes: &[u8], buffer: &mut Vec<u8>) {
        self.pack(self.trie.clear_code(), buffer);
        let mut code = None;
        for byte in bytes {
            code = self.trie.search_insert(code, *byte).or_else(|| {
                if let Some(code) = code {
                    self.pack(code, buffer);
                }
                Some(*byte as Code)
            });
            let next_code = self.trie.next_code();
            if next_code > self.code_bits.entries() {
                if next_code > Bits::MAX.entries() {
                    self.pack(self.trie.clear_code(), buffer);
                    self.trie.reset();
                    self.code_bits = Bits::from(self.min_code_bits + 1);
                } else {
                    self.code_bits += 1;
                }
            }
        }
        if let Some(code) = code {
            self.pack(code, buffer);
            // decompressor adds one more entry before reading end code
            if self.trie.next_code() == self.code_bits.entries() {
                self.code_bits += 1;
            }
        }
        self.pack(self.trie.end_code(), buffer);
        self.flush(buffer);
    }
}

impl Trie<DNode> {
    /// Lookup the first byte of a code's string
    fn lookup(&self, code: Code) -> u8 {
        debug_assert!(code < self.next_code());
        let mut node = self.table[code as usize];
        while let Some(code) = node.next {
            node = self.table[code as usize];
        }
        node.byte()
    }

    /// Decompress a code into a buffer (reversed)
    fn decompress_reversed(&self, code: Code, buffer: &mut Vec<u8>) {
        debug_assert!(code < self.next_code());
        let mut node = self.table[code as usize];
        while let Some(code) = node.next {
            buffer.push(node.byte());
            node = self.table[code as usize];
        }
        buffer.push(node.byte());
    }
}

impl Decompressor {
    /// Create a new decompressor
    pub fn new(min_code_bits: u8) -> Result<Self> {
        check_code_bits(min_code_bits)?;
        Ok(Decompressor {
            min_code_bits,
            trie: Trie::<DNode>::new(min_code_bits),
            code_bits: Bits::from(min_code_bits + 1),
            last: None,
            bits: BitCursor::default(),
            done: false,
        })
    }

    /// Check whether the end of information code has been read
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decompress a chunk of code stream into a buffer.
    ///
    /// Input after the end of information code is ignored.
    pub fn decompress(
        &mut self,
        bytes: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        for byte in bytes {
            if self.done {
                break;
            }
            self.bits.push_byte(*byte);
            while let Some(code) = self.bits.take_bits(self.code_bits) {
                self.decompress_code(code, buffer)?;
                if self.done {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Finish decompressing, after all input has been supplied
    pub fn finish(&self) -> Result<()> {
        if self.done {
            Ok(())
        } else {
            Err(Error::TruncatedLzwStream)
        }
    }

    /// Decompress one code
    fn decompress_code(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        if code == self.trie.clear_code() {
            self.trie.reset();
            self.code_bits = Bits::from(self.min_code_bits + 1);
            self.last = None;
        } else if code == self.trie.end_code() {
            self.done = true;
        } else {
            let start = buffer.len();
            self.decompress_reversed(code, buffer)?;
            buffer[start..].reverse();
            self.last = Some(code);
        }
        Ok(())
    }

    /// Decompress one code (reversed)
    fn decompress_reversed(
        &mut self,
        code: Code,
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        let next_code = self.trie.next_code();
        match (self.last, code.cmp(&next_code)) {
            (None, _) if code < self.trie.clear_code() => {
                buffer.push(code as u8)
            }
            (None, _) | (Some(_), Ordering::Greater) => {
                return Err(Error::CorruptLzwStream { code });
            }
            (Some(last), Ordering::Less) => {
                self.trie.decompress_reversed(code, buffer);
                if let Some(&byte) = buffer.last() {
                    self.add_entry(last, byte);
                }
            }
            (Some(last), Ordering::Equal) => {
                // code not yet defined: last string + its own first byte
                if self.trie.is_full() {
                    return Err(Error::CorruptLzwStream { code });
                }
                self.add_entry(last, self.trie.lookup(last));
                self.trie.decompress_reversed(code, buffer);
            }
        }
        Ok(())
    }

    /// Add a dictionary entry, growing code bits as needed
    fn add_entry(&mut self, last: Code, byte: u8) {
        if self.trie.is_full() {
            return;
        }
        self.trie.push_node(Some(last), byte);
        if self.trie.next_code() == self.code_bits.entries() {
            self.code_bits += 1;
        }
    }
}
