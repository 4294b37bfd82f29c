// cursor.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Forward-only byte reader
use crate::block::BlockKind;
use crate::error::{Error, Result};
use std::io::{ErrorKind, Read};

/// Forward-only cursor over the input stream.
///
/// Tracks the stream offset and the block being parsed so that errors can
/// say where they happened.
pub(crate) struct ByteCursor<R: Read> {
    /// Reader for input data
    reader: R,
    /// Number of bytes consumed
    offset: u64,
    /// Block being parsed
    block: BlockKind,
}

impl<R: Read> ByteCursor<R> {
    /// Create a new byte cursor
    pub fn new(reader: R) -> Self {
        ByteCursor {
            reader,
            offset: 0,
            block: BlockKind::Header,
        }
    }

    /// Get the number of bytes consumed
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Set the block being parsed
    pub fn enter(&mut self, block: BlockKind) {
        self.block = block;
    }

    /// Get the block being parsed
    pub fn block(&self) -> BlockKind {
        self.block
    }

    /// Fill a buffer completely
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.reader.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(Error::UnexpectedEof {
                    offset: self.offset,
                    block: self.block,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read exactly `n` bytes
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; n];
        self.read_into(&mut buf)?;
        Ok(buf)
    }

    /// Read one byte
    pub fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        self.read_into(&mut buf)?;
        Ok(buf[0])
    }
}
