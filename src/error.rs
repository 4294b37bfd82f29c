// error.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
use crate::block::BlockKind;
use std::fmt;
use std::io;

/// Errors encountered while decoding
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error.
    Io(io::Error),
    /// Stream does not start with the `GIF` signature.
    BadSignature([u8; 3]),
    /// GIF version not supported (87a or 89a only).
    UnsupportedVersion([u8; 3]),
    /// Input ended in the middle of a block.
    UnexpectedEof {
        /// Stream offset where the failed read started
        offset: u64,
        /// Block being parsed
        block: BlockKind,
    },
    /// Tag byte is not an extension introducer, image separator or trailer.
    UnsupportedBlock {
        /// Tag byte
        tag: u8,
        /// Stream offset of the tag byte
        offset: u64,
    },
    /// Extension label not recognized (strict extensions only).
    UnsupportedExtension {
        /// Extension label
        label: u8,
        /// Stream offset of the label byte
        offset: u64,
    },
    /// Sub-block stream read again after its terminator.
    StreamExhausted,
    /// LZW minimum code size out of range.
    InvalidCodeSize(u8),
    /// LZW code with no dictionary entry.
    CorruptLzwStream {
        /// Offending code value
        code: u16,
    },
    /// LZW data ended before the end-of-information code.
    TruncatedLzwStream,
    /// Image data decompressed to fewer pixels than declared.
    TruncatedPixelData {
        /// Declared pixel count (width * height)
        expected: usize,
        /// Decompressed pixel count
        actual: usize,
    },
    /// Palette index not present in the color table.
    PaletteIndexOutOfRange {
        /// Palette index
        index: u8,
        /// Color table length
        len: usize,
    },
    /// Neither a local nor a global color table exists for a frame.
    MissingColorTable,
    /// Image larger than specified by
    /// [max_image_sz](struct.Decoder.html#method.max_image_sz).
    TooLargeImage,
    /// Error while reading an image, with its location.
    Image {
        /// Image number, counting from 0
        frame: usize,
        /// Stream offset of the image separator
        offset: u64,
        /// Underlying error
        error: Box<Error>,
    },
}

/// Gifdec result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get the underlying error, without image context
    pub fn inner(&self) -> &Error {
        match self {
            Error::Image { error, .. } => error.inner(),
            _ => self,
        }
    }

    /// Add image context, unless the error already has a stream offset
    pub(crate) fn in_image(self, frame: usize, offset: u64) -> Self {
        match self {
            Error::UnexpectedEof { .. } | Error::Image { .. } => self,
            error => Error::Image {
                frame,
                offset,
                error: Box::new(error),
            },
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::Image {
                frame,
                offset,
                error,
            } => write!(fmt, "{} (image {} @ {})", error, frame, offset),
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Image { ref error, .. } => Some(error.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
