// sub_block.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Length-prefixed data sub-blocks
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use std::io::Read;

/// Stream of data sub-blocks, ending at a zero-length block terminator.
///
/// A missing terminator surfaces as `UnexpectedEof` from the cursor, so
/// reading never loops past the end of input.
pub(crate) struct SubBlocks<'a, R: Read> {
    /// Cursor for input data
    cursor: &'a mut ByteCursor<R>,
    /// Block terminator has been read
    terminated: bool,
}

impl<'a, R: Read> SubBlocks<'a, R> {
    /// Create a sub-block stream at the cursor position
    pub fn new(cursor: &'a mut ByteCursor<R>) -> Self {
        SubBlocks {
            cursor,
            terminated: false,
        }
    }

    /// Read the next sub-block.
    ///
    /// Returns `None` exactly once, when the terminator is read.
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.terminated {
            return Err(Error::StreamExhausted);
        }
        let len = self.cursor.read_byte()?;
        if len == 0 {
            self.terminated = true;
            return Ok(None);
        }
        let chunk = self.cursor.read_exact(len.into())?;
        debug!("sub-block: {:?} {}", self.cursor.block(), len);
        Ok(Some(chunk))
    }

    /// Skip all remaining sub-blocks, returning the number of data bytes
    pub fn skip(&mut self) -> Result<usize> {
        let mut n_bytes = 0;
        while let Some(chunk) = self.next_chunk()? {
            n_bytes += chunk.len();
        }
        Ok(n_bytes)
    }

    /// Concatenate all remaining sub-blocks
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = vec![];
        while let Some(chunk) = self.next_chunk()? {
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }
}
