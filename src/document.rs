// document.rs
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! Decoded GIF documents
use crate::block::{ColorTable, Frame, Header, LogicalScreenDesc};
use crate::decode::Preamble;
use crate::error::{Error, Result};
use pix::rgb::SRgb8;
use std::fmt;

/// A decoded GIF: screen descriptor, global color table and frames in
/// stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct GifDocument {
    header: Header,
    logical_screen_desc: LogicalScreenDesc,
    global_color_table: Option<ColorTable>,
    frames: Vec<Frame>,
    comments: Vec<Vec<u8>>,
    complete: bool,
}

/// Read-only view of one frame, resolving colors against the local color
/// table, or else the global color table.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a> {
    frame: &'a Frame,
    global_color_table: Option<&'a ColorTable>,
}

/// Decoding failed after part of a document was decoded.
///
/// The document holds every frame decoded before the error, and is absent
/// when the header or logical screen descriptor could not be read.
#[derive(Debug)]
pub struct Incomplete {
    document: Option<GifDocument>,
    error: Error,
}

impl GifDocument {
    /// Create a document from decoded parts
    pub(crate) fn new(
        preamble: Preamble,
        frames: Vec<Frame>,
        comments: Vec<Vec<u8>>,
        complete: bool,
    ) -> Self {
        GifDocument {
            header: preamble.header,
            logical_screen_desc: preamble.logical_screen_desc,
            global_color_table: preamble.global_color_table,
            frames,
            comments,
            complete,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn logical_screen_desc(&self) -> &LogicalScreenDesc {
        &self.logical_screen_desc
    }

    /// Get the canvas width
    pub fn width(&self) -> u16 {
        self.logical_screen_desc.screen_width()
    }

    /// Get the canvas height
    pub fn height(&self) -> u16 {
        self.logical_screen_desc.screen_height()
    }

    pub fn global_color_table(&self) -> Option<&ColorTable> {
        self.global_color_table.as_ref()
    }

    /// Get all frames, in stream order
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Get a view of one frame
    pub fn frame(&self, n: usize) -> Option<FrameRef<'_>> {
        self.frames.get(n).map(|frame| self.frame_ref(frame))
    }

    /// Iterate over views of all frames
    pub fn iter(&self) -> impl Iterator<Item = FrameRef<'_>> {
        self.frames.iter().map(move |frame| self.frame_ref(frame))
    }

    fn frame_ref<'a>(&'a self, frame: &'a Frame) -> FrameRef<'a> {
        FrameRef {
            frame,
            global_color_table: self.global_color_table.as_ref(),
        }
    }

    /// Get comment extensions (sub-blocks joined)
    pub fn comments(&self) -> &[Vec<u8>] {
        &self.comments
    }

    /// Check whether the trailer was reached
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Take ownership of the frames
    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl<'a> FrameRef<'a> {
    pub fn frame(&self) -> &'a Frame {
        self.frame
    }

    /// Get the color table in effect for the frame
    pub fn color_table(&self) -> Option<&'a ColorTable> {
        self.frame.local_color_table().or(self.global_color_table)
    }

    /// Resolve a palette index to a color
    pub fn resolve_color(&self, index: u8) -> Result<SRgb8> {
        self.color_table().ok_or(Error::MissingColorTable)?.get(index)
    }

    /// Resolve every pixel to a color, row-major
    pub fn resolve_pixels(&self) -> Result<Vec<SRgb8>> {
        let tbl = self.color_table().ok_or(Error::MissingColorTable)?;
        self.frame.pixels().iter().map(|&p| tbl.get(p)).collect()
    }
}

impl Incomplete {
    pub(crate) fn new(document: Option<GifDocument>, error: Error) -> Self {
        Incomplete { document, error }
    }

    /// Get the partial document
    pub fn document(&self) -> Option<&GifDocument> {
        self.document.as_ref()
    }

    pub fn error(&self) -> &Error {
        &self.error
    }

    pub fn into_document(self) -> Option<GifDocument> {
        self.document
    }

    pub fn into_error(self) -> Error {
        self.error
    }
}

impl fmt::Display for Incomplete {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let n_frames = self.document.as_ref().map_or(0, |d| d.frames.len());
        write!(fmt, "{} (after {} frames)", self.error, n_frames)
    }
}

impl std::error::Error for Incomplete {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
