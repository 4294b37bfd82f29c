// decode.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Block dispatcher for GIF decoding
use crate::block::*;
use crate::cursor::ByteCursor;
use crate::document::GifDocument;
use crate::error::{Error, Result};
use crate::lzw::Decompressor;
use crate::sub_block::SubBlocks;
use std::io::Read;

/// Decoder configuration
#[derive(Clone, Debug)]
pub(crate) struct Config {
    /// Maximum image size, in pixels
    pub max_image_sz: Option<usize>,
    /// Maximum number of frames to decode
    pub frame_limit: Option<usize>,
    /// Reject unknown extensions instead of skipping them
    pub strict_extensions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_image_sz: Some(1 << 25),
            frame_limit: None,
            strict_extensions: false,
        }
    }
}

/// Blocks at the beginning of a GIF file, before any frame blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Preamble {
    pub header: Header,
    pub logical_screen_desc: LogicalScreenDesc,
    pub global_color_table: Option<ColorTable>,
}

impl Preamble {
    /// Get the screen width
    pub fn screen_width(&self) -> u16 {
        self.logical_screen_desc.screen_width()
    }

    /// Get the screen height
    pub fn screen_height(&self) -> u16 {
        self.logical_screen_desc.screen_height()
    }
}

/// Dispatcher state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Header, screen descriptor and global color table not yet read
    Start,
    /// Reading tag bytes between blocks
    BlockLoop,
    /// Trailer reached; decoding complete
    Trailer,
    /// An error was returned; no more frames
    Failed,
}

/// An `Iterator` for [Frame]s within a GIF file.
///
/// Blocks are consumed strictly in stream order.  After an error, the
/// iterator returns `None`.
///
/// [Frame]: block/struct.Frame.html
pub struct Frames<R: Read> {
    /// Cursor for input data
    cursor: ByteCursor<R>,
    /// Decoder configuration
    config: Config,
    /// Dispatcher state
    state: State,
    /// Preamble blocks, once read
    preamble: Option<Preamble>,
    /// Graphic control for the next frame
    graphic_control: Option<GraphicControl>,
    /// Number of image descriptors read
    n_images: usize,
    /// Comment extensions
    comments: Vec<Vec<u8>>,
    /// Number of frames decoded
    n_frames: usize,
}

impl<R: Read> Iterator for Frames<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(e) => {
                self.state = State::Failed;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> Frames<R> {
    /// Create a new frame iterator
    pub(crate) fn new(reader: R, config: Config) -> Self {
        Frames {
            cursor: ByteCursor::new(reader),
            config,
            state: State::Start,
            preamble: None,
            graphic_control: None,
            n_images: 0,
            comments: vec![],
            n_frames: 0,
        }
    }

    /// Read preamble blocks.  These are the blocks at the beginning of the
    /// file, before any frame blocks.
    ///
    /// Returns `None` if a previous error stopped decoding before the
    /// preamble was complete.
    pub fn preamble(&mut self) -> Result<Option<&Preamble>> {
        if self.state == State::Start {
            self.start()?;
        }
        Ok(self.preamble.as_ref())
    }

    /// Get comments read so far
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }

    /// Check whether the trailer has been reached
    pub fn is_complete(&self) -> bool {
        self.state == State::Trailer
    }

    /// Get the number of bytes consumed
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Convert into a document, with frames decoded from this iterator
    pub(crate) fn into_document(
        self,
        frames: Vec<Frame>,
    ) -> Option<GifDocument> {
        let complete = self.is_complete();
        let comments = self.comments;
        self.preamble
            .map(|p| GifDocument::new(p, frames, comments, complete))
    }

    /// Read preamble, updating state
    fn start(&mut self) -> Result<()> {
        let res = self.read_preamble();
        self.state = match res {
            Ok(()) => State::BlockLoop,
            Err(_) => State::Failed,
        };
        res
    }

    /// Read header, logical screen descriptor and global color table
    fn read_preamble(&mut self) -> Result<()> {
        self.cursor.enter(BlockKind::Header);
        let mut buf = [0; 3];
        self.cursor.read_into(&mut buf)?;
        Header::check_signature(&buf)?;
        self.cursor.read_into(&mut buf)?;
        let header = Header::from_version(&buf)?;
        debug!("  block  : {:?}", header);
        self.cursor.enter(BlockKind::LogicalScreenDesc);
        let mut buf = [0; 7];
        self.cursor.read_into(&mut buf)?;
        let logical_screen_desc = LogicalScreenDesc::from_buf(&buf);
        debug!("  block  : {:?}", logical_screen_desc);
        let len = logical_screen_desc.color_table_config().len();
        let global_color_table = if len > 0 {
            self.cursor.enter(BlockKind::GlobalColorTable);
            Some(read_color_table(&mut self.cursor, len)?)
        } else {
            None
        };
        self.preamble = Some(Preamble {
            header,
            logical_screen_desc,
            global_color_table,
        });
        Ok(())
    }

    /// Decode blocks until the next frame or the trailer
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.state {
            State::Start => self.start()?,
            State::BlockLoop => (),
            State::Trailer | State::Failed => return Ok(None),
        }
        loop {
            self.cursor.enter(BlockKind::Tag);
            let offset = self.cursor.offset();
            let tag = self.cursor.read_byte()?;
            match BlockCode::from_u8(tag) {
                Some(BlockCode::Extension_) => self.read_extension()?,
                Some(BlockCode::ImageDesc_) => {
                    let number = self.n_images;
                    self.n_images += 1;
                    match self.read_image() {
                        Ok(Some(frame)) => return Ok(Some(frame)),
                        Ok(None) => (),
                        Err(e) => return Err(e.in_image(number, offset)),
                    }
                }
                Some(BlockCode::Trailer_) => {
                    debug!("  block  : Trailer @ {}", offset);
                    self.state = State::Trailer;
                    return Ok(None);
                }
                None => return Err(Error::UnsupportedBlock { tag, offset }),
            }
        }
    }

    /// Read an extension block, including all sub-blocks
    fn read_extension(&mut self) -> Result<()> {
        self.cursor.enter(BlockKind::ExtensionLabel);
        let offset = self.cursor.offset();
        let code = ExtensionCode::from(self.cursor.read_byte()?);
        self.cursor.enter(code.block_kind());
        debug!("  block  : {:?} @ {}", code.block_kind(), offset);
        match code {
            ExtensionCode::GraphicControl_ => self.read_graphic_control()?,
            ExtensionCode::Comment_ => {
                let comment = SubBlocks::new(&mut self.cursor).read_all()?;
                self.comments.push(comment);
            }
            ExtensionCode::Application_ => {
                SubBlocks::new(&mut self.cursor).skip()?;
            }
            ExtensionCode::PlainText_ => {
                // graphic control applies to the plain text, not the next image
                self.graphic_control.take();
                SubBlocks::new(&mut self.cursor).skip()?;
            }
            ExtensionCode::Unknown_(label) => {
                if self.config.strict_extensions {
                    return Err(Error::UnsupportedExtension { label, offset });
                }
                let n_bytes = SubBlocks::new(&mut self.cursor).skip()?;
                warn!("Skipped extension 0x{:02X}: {} bytes", label, n_bytes);
            }
        }
        Ok(())
    }

    /// Read a graphic control extension block
    fn read_graphic_control(&mut self) -> Result<()> {
        let mut blocks = SubBlocks::new(&mut self.cursor);
        if let Some(buf) = blocks.next_chunk()? {
            if buf.len() >= 4 {
                if buf.len() > 4 {
                    warn!("Graphic control too long: {} bytes", buf.len());
                }
                self.graphic_control = Some(GraphicControl::from_buf(&buf));
            } else {
                warn!("Malformed graphic control: {:?}", buf);
            }
            blocks.skip()?;
        }
        Ok(())
    }

    /// Check whether the frame limit has been reached
    fn frame_limit_reached(&self) -> bool {
        self.config
            .frame_limit
            .map_or(false, |limit| self.n_frames >= limit)
    }

    /// Read an image descriptor, local color table and image data
    fn read_image(&mut self) -> Result<Option<Frame>> {
        self.cursor.enter(BlockKind::ImageDesc);
        let mut buf = [0; 9];
        self.cursor.read_into(&mut buf)?;
        let image_desc = ImageDesc::from_buf(&buf);
        debug!("  block  : {:?}", image_desc);
        let image_sz = image_desc.image_sz();
        if let Some(sz) = self.config.max_image_sz {
            if image_sz > sz {
                return Err(Error::TooLargeImage);
            }
        }
        let graphic_control = self.graphic_control.take();
        let len = image_desc.color_table_config().len();
        let local_color_table = if len > 0 {
            self.cursor.enter(BlockKind::LocalColorTable);
            Some(read_color_table(&mut self.cursor, len)?)
        } else {
            None
        };
        self.cursor.enter(BlockKind::ImageData);
        let dec = Decompressor::new(self.cursor.read_byte()?)?;
        if self.frame_limit_reached() {
            let n_bytes = SubBlocks::new(&mut self.cursor).skip()?;
            debug!("skipped image data: {} bytes", n_bytes);
            return Ok(None);
        }
        let pixels = decode_image_data(&mut self.cursor, dec, image_sz)?;
        let global_color_table = self
            .preamble
            .as_ref()
            .and_then(|p| p.global_color_table.as_ref());
        if let Some(tbl) = local_color_table.as_ref().or(global_color_table) {
            tbl.check_indices(&pixels)?;
        }
        self.n_frames += 1;
        Ok(Some(Frame::new(
            graphic_control,
            image_desc,
            local_color_table,
            pixels,
        )))
    }
}

/// Read a color table of `len` entries
fn read_color_table<R: Read>(
    cursor: &mut ByteCursor<R>,
    len: usize,
) -> Result<ColorTable> {
    let rgb = cursor.read_exact(len * CHANNELS)?;
    Ok(ColorTable::with_rgb_bytes(&rgb))
}

/// Decompress image data sub-blocks into `image_sz` palette indices
fn decode_image_data<R: Read>(
    cursor: &mut ByteCursor<R>,
    mut dec: Decompressor,
    image_sz: usize,
) -> Result<Vec<u8>> {
    let mut pixels = Vec::with_capacity(image_sz);
    let mut extra = 0;
    let mut blocks = SubBlocks::new(cursor);
    while let Some(chunk) = blocks.next_chunk()? {
        // drain sub-blocks after end of information
        if dec.is_done() {
            continue;
        }
        dec.decompress(&chunk, &mut pixels)?;
        if pixels.len() > image_sz {
            extra += pixels.len() - image_sz;
            pixels.truncate(image_sz);
        }
    }
    if extra > 0 {
        warn!("Extra image data: {} pixels", extra);
    }
    dec.finish()?;
    if pixels.len() < image_sz {
        return Err(Error::TruncatedPixelData {
            expected: image_sz,
            actual: pixels.len(),
        });
    }
    Ok(pixels)
}

impl Header {
    /// Check the signature at the start of a Header block
    fn check_signature(buf: &[u8; 3]) -> Result<()> {
        if buf == Header::SIGNATURE {
            Ok(())
        } else {
            Err(Error::BadSignature(*buf))
        }
    }

    /// Decode a Header block from its version bytes
    fn from_version(buf: &[u8; 3]) -> Result<Self> {
        match buf {
            b"87a" => Ok(Header::with_version(Version::Gif87a)),
            b"89a" => Ok(Header::with_version(Version::Gif89a)),
            _ => Err(Error::UnsupportedVersion(*buf)),
        }
    }
}

impl LogicalScreenDesc {
    /// Decode a Logical Screen Descriptor block from a buffer
    fn from_buf(buf: &[u8; 7]) -> Self {
        let width = u16::from_le_bytes([buf[0], buf[1]]);
        let height = u16::from_le_bytes([buf[2], buf[3]]);
        LogicalScreenDesc::default()
            .with_screen_width(width)
            .with_screen_height(height)
            .with_flags(buf[4])
            .with_background_color_idx(buf[5])
            .with_pixel_aspect_ratio(buf[6])
    }
}

impl ImageDesc {
    /// Decode an Image Descriptor block (after the separator) from a buffer
    fn from_buf(buf: &[u8; 9]) -> Self {
        let left = u16::from_le_bytes([buf[0], buf[1]]);
        let top = u16::from_le_bytes([buf[2], buf[3]]);
        let width = u16::from_le_bytes([buf[4], buf[5]]);
        let height = u16::from_le_bytes([buf[6], buf[7]]);
        ImageDesc::default()
            .with_left(left)
            .with_top(top)
            .with_width(width)
            .with_height(height)
            .with_flags(buf[8])
    }
}

impl GraphicControl {
    /// Decode a Graphic Control extension from its first sub-block
    fn from_buf(buf: &[u8]) -> Self {
        let mut control = GraphicControl::default();
        control.set_flags(buf[0]);
        control.set_delay_time_cs(u16::from_le_bytes([buf[1], buf[2]]));
        control.set_transparent_color_idx(buf[3]);
        control
    }
}
