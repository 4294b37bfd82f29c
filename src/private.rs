// private.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Private module for top-level items
use crate::block::Frame;
use crate::decode::{Config, Frames};
use crate::document::{GifDocument, Incomplete};
use crate::error::{Error, Result};
use std::io::{BufReader, Read};

/// GIF file decoder
///
/// Decodes a whole [GifDocument] with [decode] (or [decode_best_effort] to
/// keep frames decoded before an error), or streams [Frame]s with
/// [into_frames].
///
/// ## Example: Decode a GIF
/// ```
/// use gifdec::Decoder;
/// use pix::rgb::SRgb8;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// // ... open a `File` as "gif"
/// let doc = Decoder::new(gif).decode()?;
/// assert_eq!((doc.width(), doc.height()), (2, 2));
/// let frame = doc.frame(0).ok_or("no frame")?;
/// assert_eq!(frame.frame().pixels(), &[1, 0, 0, 1]);
/// assert_eq!(frame.resolve_color(1)?, SRgb8::new(0xFF, 0xFF, 0xFF));
/// # Ok(())
/// # }
/// ```
///
/// [decode]: struct.Decoder.html#method.decode
/// [decode_best_effort]: struct.Decoder.html#method.decode_best_effort
/// [Frame]: block/struct.Frame.html
/// [GifDocument]: struct.GifDocument.html
/// [into_frames]: struct.Decoder.html#method.into_frames
pub struct Decoder<R: Read> {
    /// Reader for input data
    reader: R,
    /// Decoder configuration
    config: Config,
}

impl<R: Read> Decoder<BufReader<R>> {
    /// Create a new buffered GIF decoder.
    pub fn new(reader: R) -> Self {
        Self::new_unbuffered(BufReader::new(reader))
    }
}

impl<R: Read> Decoder<R> {
    /// Create a new unbuffered GIF decoder.
    pub fn new_unbuffered(reader: R) -> Self {
        Decoder {
            reader,
            config: Config::default(),
        }
    }

    /// Set the maximum image size (in pixels) to allow for decoding.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.config.max_image_sz = max_image_sz;
        self
    }

    /// Set the maximum number of frames to decode.
    ///
    /// Image data for later frames is skipped, but the rest of the stream
    /// is still checked through the trailer.
    pub fn frame_limit(mut self, frame_limit: Option<usize>) -> Self {
        self.config.frame_limit = frame_limit;
        self
    }

    /// Reject extensions with unknown labels, instead of skipping them.
    pub fn strict_extensions(mut self, strict: bool) -> Self {
        self.config.strict_extensions = strict;
        self
    }

    /// Convert into a frame `Iterator`.
    pub fn into_frames(self) -> Frames<R> {
        Frames::new(self.reader, self.config)
    }

    /// Decode a complete document.
    pub fn decode(self) -> Result<GifDocument> {
        self.decode_best_effort().map_err(Incomplete::into_error)
    }

    /// Decode a document, keeping any frames decoded before an error.
    pub fn decode_best_effort(
        self,
    ) -> std::result::Result<GifDocument, Incomplete> {
        let mut frames = self.into_frames();
        if let Err(error) = frames.preamble() {
            return Err(Incomplete::new(None, error));
        }
        let mut decoded = vec![];
        let mut error = None;
        for frame in frames.by_ref() {
            match frame {
                Ok(frame) => decoded.push(frame),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }
        let document = frames.into_document(decoded);
        match (document, error) {
            (Some(document), None) => Ok(document),
            (document, Some(error)) => Err(Incomplete::new(document, error)),
            (None, None) => Err(Incomplete::new(None, Error::StreamExhausted)),
        }
    }
}

impl<R: Read> IntoIterator for Decoder<R> {
    type Item = Result<Frame>;
    type IntoIter = Frames<R>;

    /// Convert into a frame `Iterator`
    fn into_iter(self) -> Self::IntoIter {
        self.into_frames()
    }
}
