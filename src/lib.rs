// lib.rs      gifdec crate.
//
// Copyright (c) 2019-2026  Douglas Lau
//
//! A GIF bitstream decoder.
//!
//! Decoding produces palette indices for each frame, plus the color tables
//! needed to resolve them to RGB.  Rendering is left to the caller.
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod cursor;
mod decode;
mod document;
mod error;
pub mod lzw;
mod private;
mod sub_block;

pub use crate::decode::{Frames, Preamble};
pub use crate::document::{FrameRef, GifDocument, Incomplete};
pub use crate::error::{Error, Result};
pub use crate::private::Decoder;
