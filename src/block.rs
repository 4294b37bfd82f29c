// block.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Data model for GIF blocks
use crate::error::{Error, Result};
use pix::rgb::SRgb8;

/// Number of channels in a color table entry
pub(crate) const CHANNELS: usize = 3;

/// Kind of block being parsed, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Signature and version
    Header,
    /// Logical screen descriptor
    LogicalScreenDesc,
    /// Global color table
    GlobalColorTable,
    /// Tag byte between blocks
    Tag,
    /// Extension label following an introducer
    ExtensionLabel,
    /// Graphic control extension
    GraphicControl,
    /// Application extension
    Application,
    /// Comment extension
    Comment,
    /// Plain text extension
    PlainText,
    /// Extension with an unrecognized label
    UnknownExtension,
    /// Image descriptor
    ImageDesc,
    /// Local color table
    LocalColorTable,
    /// LZW minimum code size and compressed image data
    ImageData,
}

/// Tag bytes introducing a block in the block loop
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BlockCode {
    Extension_,
    ImageDesc_,
    Trailer_,
}

impl BlockCode {
    pub fn from_u8(t: u8) -> Option<Self> {
        use self::BlockCode::*;
        match t {
            b',' => Some(ImageDesc_), // (0x2C) Image separator
            b'!' => Some(Extension_), // (0x21) Extension introducer
            b';' => Some(Trailer_),   // (0x3B) GIF trailer
            _ => None,
        }
    }
}

/// Extension labels
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ExtensionCode {
    PlainText_,
    GraphicControl_,
    Comment_,
    Application_,
    Unknown_(u8),
}

impl From<u8> for ExtensionCode {
    fn from(n: u8) -> Self {
        use self::ExtensionCode::*;
        match n {
            0x01 => PlainText_,
            0xF9 => GraphicControl_,
            0xFE => Comment_,
            0xFF => Application_,
            _ => Unknown_(n),
        }
    }
}

impl ExtensionCode {
    /// Get the block kind for diagnostics
    pub fn block_kind(self) -> BlockKind {
        use self::ExtensionCode::*;
        match self {
            PlainText_ => BlockKind::PlainText,
            GraphicControl_ => BlockKind::GraphicControl,
            Comment_ => BlockKind::Comment,
            Application_ => BlockKind::Application,
            Unknown_(_) => BlockKind::UnknownExtension,
        }
    }
}

/// GIF version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    /// GIF87a
    Gif87a,
    /// GIF89a
    Gif89a,
}

impl Version {
    /// Get the version bytes, as they appear after the signature
    pub fn as_bytes(self) -> &'static [u8; 3] {
        match self {
            Version::Gif87a => b"87a",
            Version::Gif89a => b"89a",
        }
    }
}

/// Header block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: Version,
}

impl Header {
    /// Signature at start of every GIF
    pub const SIGNATURE: &'static [u8; 3] = b"GIF";

    pub fn with_version(version: Version) -> Self {
        Header { version }
    }
    pub fn version(&self) -> Version {
        self.version
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableExistence {
    Absent,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTableOrdering {
    NotSorted,
    Sorted,
}

/// Color table flags from a screen or image descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorTableConfig {
    existence: ColorTableExistence,
    ordering: ColorTableOrdering,
    table_len: usize, // must be between 2...256
}

impl ColorTableConfig {
    /// Create a config from the 3-bit size field
    fn from_flags(
        existence: ColorTableExistence,
        ordering: ColorTableOrdering,
        size_bits: u8,
    ) -> Self {
        let table_len = 2 << (size_bits & 0b0111);
        ColorTableConfig {
            existence,
            ordering,
            table_len,
        }
    }
    pub fn existence(&self) -> ColorTableExistence {
        self.existence
    }
    pub fn ordering(&self) -> ColorTableOrdering {
        self.ordering
    }
    /// Get the number of entries (zero when absent)
    pub fn len(&self) -> usize {
        match self.existence {
            ColorTableExistence::Absent => 0,
            ColorTableExistence::Present => self.table_len,
        }
    }
    pub fn size_bytes(&self) -> usize {
        self.len() * CHANNELS
    }
}

/// Logical Screen Descriptor block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalScreenDesc {
    screen_width: u16,
    screen_height: u16,
    flags: u8,
    background_color_idx: u8, // index into global color table
    pixel_aspect_ratio: u8,
}

impl LogicalScreenDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const COLOR_RESOLUTION: u8 = 0b0111_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0000_1000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_screen_width(mut self, screen_width: u16) -> Self {
        self.screen_width = screen_width;
        self
    }
    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }
    pub fn with_screen_height(mut self, screen_height: u16) -> Self {
        self.screen_height = screen_height;
        self
    }
    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Get the number of colors available to the original image
    pub fn color_resolution(&self) -> u16 {
        2 << ((self.flags & Self::COLOR_RESOLUTION) >> 4)
    }
    pub fn color_table_config(&self) -> ColorTableConfig {
        let existence = if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            ColorTableExistence::Present
        } else {
            ColorTableExistence::Absent
        };
        let ordering = if self.flags & Self::COLOR_TABLE_ORDERING != 0 {
            ColorTableOrdering::Sorted
        } else {
            ColorTableOrdering::NotSorted
        };
        let size_bits = self.flags & Self::COLOR_TABLE_SIZE;
        ColorTableConfig::from_flags(existence, ordering, size_bits)
    }
    pub fn with_background_color_idx(mut self, idx: u8) -> Self {
        self.background_color_idx = idx;
        self
    }
    pub fn background_color_idx(&self) -> u8 {
        self.background_color_idx
    }
    pub fn with_pixel_aspect_ratio(mut self, ratio: u8) -> Self {
        self.pixel_aspect_ratio = ratio;
        self
    }
    pub fn pixel_aspect_ratio(&self) -> u8 {
        self.pixel_aspect_ratio
    }
}

/// Global or local color table
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    colors: Vec<SRgb8>,
}

impl ColorTable {
    /// Create a color table from packed RGB triplets
    pub fn with_rgb_bytes(rgb: &[u8]) -> Self {
        let colors = rgb
            .chunks_exact(CHANNELS)
            .map(|c| SRgb8::new(c[0], c[1], c[2]))
            .collect();
        ColorTable { colors }
    }
    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.colors.len()
    }
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
    pub fn colors(&self) -> &[SRgb8] {
        &self.colors
    }
    /// Look up the color for a palette index
    pub fn get(&self, index: u8) -> Result<SRgb8> {
        self.colors.get(usize::from(index)).copied().ok_or(
            Error::PaletteIndexOutOfRange {
                index,
                len: self.len(),
            },
        )
    }
    /// Check that every index in a pixel buffer is within the table
    pub(crate) fn check_indices(&self, pixels: &[u8]) -> Result<()> {
        let len = self.len();
        match pixels.iter().find(|&&p| usize::from(p) >= len) {
            Some(&index) => Err(Error::PaletteIndexOutOfRange { index, len }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    NoAction,
    #[default]
    Keep,
    Background,
    Previous,
    Reserved(u8),
}

impl From<u8> for DisposalMethod {
    fn from(n: u8) -> Self {
        use self::DisposalMethod::*;
        match n & 0b0111 {
            0 => NoAction,
            1 => Keep,
            2 => Background,
            3 => Previous,
            _ => Reserved(n & 0b0111),
        }
    }
}

/// Graphic Control extension block
///
/// Parsed and attached to the following frame; disposal and transparency
/// are left to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphicControl {
    flags: u8,
    delay_time_cs: u16, // delay in centiseconds (hundredths of a second)
    transparent_color_idx: u8,
}

impl GraphicControl {
    const DISPOSAL_METHOD: u8 = 0b0001_1100;
    const USER_INPUT: u8 = 0b0000_0010;
    const TRANSPARENT_COLOR: u8 = 0b0000_0001;

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    pub fn disposal_method(&self) -> DisposalMethod {
        ((self.flags & Self::DISPOSAL_METHOD) >> 2).into()
    }
    pub fn user_input(&self) -> bool {
        (self.flags & Self::USER_INPUT) != 0
    }
    pub fn delay_time_cs(&self) -> u16 {
        self.delay_time_cs
    }
    pub fn set_delay_time_cs(&mut self, delay_time_cs: u16) {
        self.delay_time_cs = delay_time_cs;
    }
    /// Get the transparent color index, if the flag is set
    pub fn transparent_color(&self) -> Option<u8> {
        if self.flags & Self::TRANSPARENT_COLOR != 0 {
            Some(self.transparent_color_idx)
        } else {
            None
        }
    }
    pub fn set_transparent_color_idx(&mut self, idx: u8) {
        self.transparent_color_idx = idx;
    }
}

/// Image Descriptor block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDesc {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    flags: u8,
}

impl ImageDesc {
    const COLOR_TABLE_PRESENT: u8 = 0b1000_0000;
    const INTERLACED: u8 = 0b0100_0000;
    const COLOR_TABLE_ORDERING: u8 = 0b0010_0000;
    const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

    pub fn with_left(mut self, left: u16) -> Self {
        self.left = left;
        self
    }
    pub fn left(&self) -> u16 {
        self.left
    }
    pub fn with_top(mut self, top: u16) -> Self {
        self.top = top;
        self
    }
    pub fn top(&self) -> u16 {
        self.top
    }
    pub fn with_width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }
    pub fn width(&self) -> u16 {
        self.width
    }
    pub fn with_height(mut self, height: u16) -> Self {
        self.height = height;
        self
    }
    pub fn height(&self) -> u16 {
        self.height
    }
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }
    pub fn flags(&self) -> u8 {
        self.flags
    }
    /// Check the interlace flag (rows are kept in stream order)
    pub fn interlaced(&self) -> bool {
        (self.flags & Self::INTERLACED) != 0
    }
    pub fn color_table_config(&self) -> ColorTableConfig {
        let existence = if self.flags & Self::COLOR_TABLE_PRESENT != 0 {
            ColorTableExistence::Present
        } else {
            ColorTableExistence::Absent
        };
        let ordering = if self.flags & Self::COLOR_TABLE_ORDERING != 0 {
            ColorTableOrdering::Sorted
        } else {
            ColorTableOrdering::NotSorted
        };
        let size_bits = self.flags & Self::COLOR_TABLE_SIZE;
        ColorTableConfig::from_flags(existence, ordering, size_bits)
    }
    /// Get the image size in pixels
    pub fn image_sz(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// One decoded image
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    graphic_control: Option<GraphicControl>,
    image_desc: ImageDesc,
    local_color_table: Option<ColorTable>,
    pixels: Vec<u8>,
}

impl Frame {
    pub(crate) fn new(
        graphic_control: Option<GraphicControl>,
        image_desc: ImageDesc,
        local_color_table: Option<ColorTable>,
        pixels: Vec<u8>,
    ) -> Self {
        debug_assert_eq!(pixels.len(), image_desc.image_sz());
        Frame {
            graphic_control,
            image_desc,
            local_color_table,
            pixels,
        }
    }
    pub fn graphic_control(&self) -> Option<&GraphicControl> {
        self.graphic_control.as_ref()
    }
    pub fn image_desc(&self) -> &ImageDesc {
        &self.image_desc
    }
    pub fn local_color_table(&self) -> Option<&ColorTable> {
        self.local_color_table.as_ref()
    }
    pub fn width(&self) -> u16 {
        self.image_desc.width()
    }
    pub fn height(&self) -> u16 {
        self.image_desc.height()
    }
    /// Get the palette indices, row-major (`width * height` long)
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn color_table_len() {
        let d = LogicalScreenDesc::default().with_flags(0x80);
        assert_eq!(d.color_table_config().len(), 2);
        let d = LogicalScreenDesc::default().with_flags(0x91);
        assert_eq!(d.color_table_config().len(), 4);
        assert_eq!(d.color_table_config().size_bytes(), 12);
        let d = LogicalScreenDesc::default().with_flags(0xF7);
        assert_eq!(d.color_table_config().len(), 256);
        let d = LogicalScreenDesc::default().with_flags(0x07);
        assert_eq!(d.color_table_config().len(), 0);
        let d = ImageDesc::default().with_flags(0x82);
        assert_eq!(d.color_table_config().len(), 8);
        assert_eq!(
            d.color_table_config().ordering(),
            ColorTableOrdering::NotSorted
        );
    }

    #[test]
    fn color_resolution() {
        let d = LogicalScreenDesc::default().with_flags(0b0111_0000);
        assert_eq!(d.color_resolution(), 256);
        let d = LogicalScreenDesc::default().with_flags(0b0001_0001);
        assert_eq!(d.color_resolution(), 4);
    }

    #[test]
    fn color_table_lookup() -> Result<()> {
        let t = ColorTable::with_rgb_bytes(&[0, 0, 0, 255, 0, 0]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(1)?, SRgb8::new(255, 0, 0));
        match t.get(2) {
            Err(Error::PaletteIndexOutOfRange { index: 2, len: 2 }) => (),
            r => panic!("unexpected {:?}", r),
        }
        assert!(t.check_indices(&[0, 1, 1, 0]).is_ok());
        assert!(t.check_indices(&[0, 1, 2]).is_err());
        Ok(())
    }

    #[test]
    fn graphic_control_flags() {
        let mut gc = GraphicControl::default();
        assert_eq!(gc.transparent_color(), None);
        gc.set_flags(0b0000_1001);
        gc.set_transparent_color_idx(7);
        assert_eq!(gc.disposal_method(), DisposalMethod::Background);
        assert_eq!(gc.transparent_color(), Some(7));
        assert!(!gc.user_input());
    }

    #[test]
    fn block_codes() {
        assert_eq!(BlockCode::from_u8(0x21), Some(BlockCode::Extension_));
        assert_eq!(BlockCode::from_u8(0x2C), Some(BlockCode::ImageDesc_));
        assert_eq!(BlockCode::from_u8(0x3B), Some(BlockCode::Trailer_));
        assert_eq!(BlockCode::from_u8(0x00), None);
        assert_eq!(ExtensionCode::from(0x42), ExtensionCode::Unknown_(0x42));
        assert_eq!(
            ExtensionCode::from(0xF9).block_kind(),
            BlockKind::GraphicControl
        );
    }
}
