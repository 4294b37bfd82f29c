use gifdec::block::{BlockKind, DisposalMethod, Version};
use gifdec::lzw::Compressor;
use gifdec::{Decoder, Error};
use pix::rgb::SRgb8;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const PALETTE_4: [[u8; 3]; 4] =
    [[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]];

/// Get the 3-bit size field for a color table
fn size_bits(len: usize) -> u8 {
    (len.trailing_zeros() - 1) as u8
}

/// Header, logical screen descriptor and global color table
fn preamble(width: u16, height: u16, gct: Option<&[[u8; 3]]>) -> Vec<u8> {
    let mut gif = b"GIF89a".to_vec();
    gif.extend_from_slice(&width.to_le_bytes());
    gif.extend_from_slice(&height.to_le_bytes());
    match gct {
        Some(tbl) => {
            gif.extend_from_slice(&[0xF0 | size_bits(tbl.len()), 0, 0]);
            for clr in tbl {
                gif.extend_from_slice(clr);
            }
        }
        None => gif.extend_from_slice(&[0, 0, 0]),
    }
    gif
}

/// Append data as sub-blocks, with terminator
fn sub_blocks(gif: &mut Vec<u8>, data: &[u8]) {
    for chunk in data.chunks(255) {
        gif.push(chunk.len() as u8);
        gif.extend_from_slice(chunk);
    }
    gif.push(0);
}

/// Append an image with raw LZW data
fn image_data(
    gif: &mut Vec<u8>,
    width: u16,
    height: u16,
    lct: Option<&[[u8; 3]]>,
    min_code_size: u8,
    data: &[u8],
) {
    gif.extend_from_slice(&[0x2C, 0, 0, 0, 0]);
    gif.extend_from_slice(&width.to_le_bytes());
    gif.extend_from_slice(&height.to_le_bytes());
    match lct {
        Some(tbl) => {
            gif.push(0x80 | size_bits(tbl.len()));
            for clr in tbl {
                gif.extend_from_slice(clr);
            }
        }
        None => gif.push(0),
    }
    gif.push(min_code_size);
    sub_blocks(gif, data);
}

/// Append an image, compressing pixels
fn image(
    gif: &mut Vec<u8>,
    width: u16,
    height: u16,
    lct: Option<&[[u8; 3]]>,
    min_code_size: u8,
    pixels: &[u8],
) {
    let mut data = vec![];
    Compressor::new(min_code_size)
        .expect("code size")
        .compress(pixels, &mut data);
    image_data(gif, width, height, lct, min_code_size, &data);
}

/// Decode, expecting an error within an image
fn image_error(gif: &[u8]) -> (usize, u64, Error) {
    match Decoder::new(gif).decode() {
        Err(Error::Image {
            frame,
            offset,
            error,
        }) => (frame, offset, *error),
        r => panic!("unexpected {:?}", r),
    }
}

fn gray_palette(len: usize) -> Vec<[u8; 3]> {
    (0..len).map(|i| [i as u8; 3]).collect()
}

#[test]
fn four_color_scenario() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    // clear, 0, 1, 2 (3 bits), then 3, end (4 bits)
    image_data(&mut gif, 2, 2, None, 2, &[0x44, 0x34, 0x05]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert!(doc.is_complete());
    assert_eq!(doc.header().version(), Version::Gif89a);
    assert_eq!((doc.width(), doc.height()), (2, 2));
    assert_eq!(doc.frames().len(), 1);
    let frame = doc.frame(0).ok_or(Error::StreamExhausted)?;
    assert_eq!(frame.frame().pixels(), &[0, 1, 2, 3]);
    assert_eq!(
        frame.resolve_pixels()?,
        vec![
            SRgb8::new(0, 0, 0),
            SRgb8::new(255, 0, 0),
            SRgb8::new(0, 255, 0),
            SRgb8::new(0, 0, 255),
        ]
    );
    Ok(())
}

#[test]
fn minimal_sizes() -> Result<(), Error> {
    for &(width, height) in &[(1, 1), (3, 5), (16, 16), (100, 7), (1, 300)] {
        let pixels: Vec<u8> = (0..usize::from(width) * usize::from(height))
            .map(|i| (i % 7 % 4) as u8)
            .collect();
        let mut gif = preamble(width, height, Some(&PALETTE_4));
        image(&mut gif, width, height, None, 2, &pixels);
        gif.push(0x3B);
        let doc = Decoder::new(&gif[..]).decode()?;
        let frame = &doc.frames()[0];
        assert_eq!(frame.pixels().len(), usize::from(width * height));
        assert_eq!(frame.pixels(), &pixels[..]);
    }
    Ok(())
}

#[test]
fn reencode_round_trip() -> Result<(), Error> {
    let palette = gray_palette(256);
    let pixels: Vec<u8> = (0..200 * 150u32)
        .map(|i| ((i / 200) * 3 ^ (i % 200) / 5) as u8)
        .collect();
    let mut gif = preamble(200, 150, Some(&palette));
    image(&mut gif, 200, 150, None, 8, &pixels);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    let decoded = doc.into_frames().remove(0).into_pixels();
    assert_eq!(decoded, pixels);
    let mut again = preamble(200, 150, Some(&palette));
    image(&mut again, 200, 150, None, 8, &decoded);
    again.push(0x3B);
    let doc = Decoder::new(&again[..]).decode()?;
    assert_eq!(doc.frames()[0].pixels(), &decoded[..]);
    Ok(())
}

#[test]
fn bad_signature() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    gif[2] = b'X';
    image_data(&mut gif, 2, 2, None, 2, &[0x44, 0x34, 0x05]);
    gif.push(0x3B);
    let incomplete = match Decoder::new(&gif[..]).decode_best_effort() {
        Err(incomplete) => incomplete,
        Ok(_) => panic!("decoded bad signature"),
    };
    assert!(incomplete.document().is_none());
    assert!(matches!(
        incomplete.error(),
        Error::BadSignature(sig) if sig == b"GIX"
    ));
}

#[test]
fn unsupported_version() {
    let mut gif = preamble(2, 2, None);
    gif[4] = b'0';
    assert!(matches!(
        Decoder::new(&gif[..]).decode(),
        Err(Error::UnsupportedVersion(v)) if &v == b"80a"
    ));
}

#[test]
fn unterminated_sub_blocks() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    // comment extension that never terminates
    gif.extend_from_slice(&[0x21, 0xFE, 5, b'h', b'e', b'l', b'l', b'o']);
    gif.extend_from_slice(&[3, b'a', b'b', b'c']);
    let (send, recv) = mpsc::channel();
    thread::spawn(move || {
        let res = Decoder::new(&gif[..]).decode();
        let _ = send.send(res);
    });
    let res = recv
        .recv_timeout(Duration::from_secs(5))
        .expect("decode did not finish");
    match res {
        Err(Error::UnexpectedEof { offset, block }) => {
            assert_eq!(offset, 37);
            assert_eq!(block, BlockKind::Comment);
        }
        r => panic!("unexpected {:?}", r),
    }
}

#[test]
fn unterminated_image_data() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    gif.extend_from_slice(&[0x2C, 0, 0, 0, 0, 2, 0, 2, 0, 0, 2]);
    gif.extend_from_slice(&[3, 0x44, 0x34, 0x05]);
    assert!(matches!(
        Decoder::new(&gif[..]).decode(),
        Err(Error::UnexpectedEof {
            block: BlockKind::ImageData,
            ..
        })
    ));
}

#[test]
fn palette_index_off_by_one() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    image(&mut gif, 2, 2, None, 2, &[3, 3, 0, 1]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    let frame = doc.frame(0).ok_or(Error::StreamExhausted)?;
    assert_eq!(frame.resolve_color(3)?, SRgb8::new(0, 0, 255));
    assert!(matches!(
        frame.resolve_color(4),
        Err(Error::PaletteIndexOutOfRange { index: 4, len: 4 })
    ));
    Ok(())
}

#[test]
fn palette_index_out_of_range_in_data() {
    let mut gif = preamble(2, 1, Some(&PALETTE_4[..2]));
    image(&mut gif, 2, 1, None, 2, &[1, 2]);
    gif.push(0x3B);
    let (frame, offset, error) = image_error(&gif);
    assert_eq!((frame, offset), (0, 19));
    assert!(matches!(
        error,
        Error::PaletteIndexOutOfRange { index: 2, len: 2 }
    ));
}

#[test]
fn local_color_table() -> Result<(), Error> {
    let local = [[9, 9, 9], [8, 8, 8], [7, 7, 7], [6, 6, 6]];
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    image(&mut gif, 2, 2, Some(&local), 2, &[3, 2, 1, 0]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert_eq!(doc.frames().len(), 2);
    let frames: Vec<_> = doc.iter().collect();
    assert_eq!(frames[0].resolve_color(1)?, SRgb8::new(255, 0, 0));
    assert_eq!(frames[1].resolve_color(1)?, SRgb8::new(8, 8, 8));
    assert_eq!(frames[1].frame().pixels(), &[3, 2, 1, 0]);
    assert_eq!(
        frames[1].color_table().map(|t| t.len()),
        Some(local.len())
    );
    Ok(())
}

#[test]
fn frame_limit() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    image(&mut gif, 2, 2, None, 2, &[3, 2, 1, 0]);
    image(&mut gif, 2, 2, None, 2, &[1, 1, 1, 1]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).frame_limit(Some(1)).decode()?;
    assert!(doc.is_complete());
    assert_eq!(doc.frames().len(), 1);
    assert_eq!(doc.frames()[0].pixels(), &[0, 1, 2, 3]);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert_eq!(doc.frames().len(), 3);
    assert_eq!(doc.frames()[2].pixels(), &[1, 1, 1, 1]);
    Ok(())
}

#[test]
fn truncated_second_frame() {
    let mut gif = preamble(4, 4, Some(&PALETTE_4));
    image(&mut gif, 4, 4, None, 2, &[1; 16]);
    image(&mut gif, 4, 4, None, 2, &[2; 16]);
    gif.truncate(gif.len() - 2);
    let incomplete = match Decoder::new(&gif[..]).decode_best_effort() {
        Err(incomplete) => incomplete,
        Ok(_) => panic!("decoded truncated stream"),
    };
    assert!(matches!(incomplete.error(), Error::UnexpectedEof { .. }));
    let doc = incomplete.into_document().expect("partial document");
    assert!(!doc.is_complete());
    assert_eq!(doc.frames().len(), 1);
    assert_eq!(doc.frames()[0].pixels(), &[1; 16]);
}

#[test]
fn missing_trailer() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    match Decoder::new(&gif[..]).decode_best_effort() {
        Err(incomplete) => {
            assert!(matches!(
                incomplete.error(),
                Error::UnexpectedEof {
                    block: BlockKind::Tag,
                    ..
                }
            ));
            let n_frames = incomplete.document().map(|d| d.frames().len());
            assert_eq!(n_frames, Some(1));
        }
        Ok(_) => panic!("decoded without trailer"),
    }
    assert!(Decoder::new(&gif[..]).decode().is_err());
}

#[test]
fn extensions_skipped() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    gif.extend_from_slice(&[0x21, 0xFF, 11]);
    gif.extend_from_slice(b"NETSCAPE2.0");
    gif.extend_from_slice(&[3, 1, 0, 0, 0]);
    gif.extend_from_slice(&[0x21, 0xFE]);
    sub_blocks(&mut gif, b"first line\nsecond line");
    gif.extend_from_slice(&[0x21, 0x01, 12]);
    gif.extend_from_slice(&[0; 12]);
    sub_blocks(&mut gif, b"plain text");
    gif.extend_from_slice(&[0x21, 0x42]);
    sub_blocks(&mut gif, &[0xAB; 300]);
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert_eq!(doc.frames().len(), 1);
    assert_eq!(doc.comments(), &[b"first line\nsecond line".to_vec()]);
    assert_eq!(doc.frames()[0].pixels(), &[0, 1, 2, 3]);
    Ok(())
}

#[test]
fn strict_extensions() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    gif.extend_from_slice(&[0x21, 0x42]);
    sub_blocks(&mut gif, b"unknown");
    gif.push(0x3B);
    assert!(Decoder::new(&gif[..]).decode().is_ok());
    assert!(matches!(
        Decoder::new(&gif[..]).strict_extensions(true).decode(),
        Err(Error::UnsupportedExtension {
            label: 0x42,
            offset: 26
        })
    ));
}

#[test]
fn unsupported_block() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    gif.push(0x00);
    assert!(matches!(
        Decoder::new(&gif[..]).decode(),
        Err(Error::UnsupportedBlock {
            tag: 0x00,
            offset: 25
        })
    ));
}

#[test]
fn graphic_control() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    // extra sub-block after the fixed payload
    gif.extend_from_slice(&[0x21, 0xF9, 4, 0b0000_1001, 10, 0, 2]);
    gif.extend_from_slice(&[2, 0xAA, 0xBB, 0]);
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    // first sub-block too short
    gif.extend_from_slice(&[0x21, 0xF9, 2, 0xFF, 0xFF, 0]);
    image(&mut gif, 2, 2, None, 2, &[3, 2, 1, 0]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    let control = doc.frames()[0].graphic_control();
    let control = control.ok_or(Error::StreamExhausted)?;
    assert_eq!(control.delay_time_cs(), 10);
    assert_eq!(control.disposal_method(), DisposalMethod::Background);
    assert_eq!(control.transparent_color(), Some(2));
    assert!(doc.frames()[1].graphic_control().is_none());
    assert_eq!(doc.frames()[1].pixels(), &[3, 2, 1, 0]);
    Ok(())
}

#[test]
fn corrupt_third_frame() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    image(&mut gif, 2, 2, None, 2, &[3, 2, 1, 0]);
    let offset = gif.len() as u64;
    // clear, then undefined code 7
    image_data(&mut gif, 2, 2, None, 2, &[0x3C, 0x00]);
    gif.push(0x3B);
    let (frame, at, error) = image_error(&gif);
    assert_eq!(frame, 2);
    assert_eq!(at, offset);
    assert!(matches!(error, Error::CorruptLzwStream { code: 7 }));
    match Decoder::new(&gif[..]).decode_best_effort() {
        Err(incomplete) => {
            let msg = incomplete.error().to_string();
            assert!(msg.contains(&format!("image 2 @ {}", offset)), "{}", msg);
            let n_frames = incomplete.document().map(|d| d.frames().len());
            assert_eq!(n_frames, Some(2));
        }
        Ok(_) => panic!("decoded corrupt frame"),
    }
}

#[test]
fn graphic_control_used_by_plain_text() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    gif.extend_from_slice(&[0x21, 0xF9, 4, 0b0000_0100, 50, 0, 0, 0]);
    gif.extend_from_slice(&[0x21, 0x01, 12]);
    gif.extend_from_slice(&[0; 12]);
    sub_blocks(&mut gif, b"caption");
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert!(doc.frames()[0].graphic_control().is_none());
    Ok(())
}

#[test]
fn missing_end_code() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    // clear, 0, 1, 2, 3 with no end code
    image_data(&mut gif, 2, 2, None, 2, &[0x44, 0x34]);
    gif.push(0x3B);
    let (_, _, error) = image_error(&gif);
    assert!(matches!(error, Error::TruncatedLzwStream));
}

#[test]
fn truncated_pixel_data() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    let mut data = vec![];
    Compressor::new(2)?.compress(&[0, 1, 2], &mut data);
    image_data(&mut gif, 2, 2, None, 2, &data);
    gif.push(0x3B);
    let (_, _, error) = image_error(&gif);
    assert!(matches!(
        error,
        Error::TruncatedPixelData {
            expected: 4,
            actual: 3
        }
    ));
    Ok(())
}

#[test]
fn extra_pixel_data() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    let mut data = vec![];
    Compressor::new(2)?.compress(&[0, 1, 2, 3, 3, 3, 3, 0], &mut data);
    image_data(&mut gif, 2, 2, None, 2, &data);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert_eq!(doc.frames()[0].pixels(), &[0, 1, 2, 3]);
    Ok(())
}

#[test]
fn sub_blocks_after_end_code() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    gif.extend_from_slice(&[0x2C, 0, 0, 0, 0, 2, 0, 2, 0, 0, 2]);
    gif.extend_from_slice(&[3, 0x44, 0x34, 0x05, 2, 0xFF, 0xFF, 0]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert_eq!(doc.frames()[0].pixels(), &[0, 1, 2, 3]);
    Ok(())
}

#[test]
fn no_color_table() -> Result<(), Error> {
    let mut gif = preamble(2, 2, None);
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    gif.push(0x3B);
    let doc = Decoder::new(&gif[..]).decode()?;
    assert!(doc.global_color_table().is_none());
    let frame = doc.frame(0).ok_or(Error::StreamExhausted)?;
    assert!(matches!(
        frame.resolve_color(0),
        Err(Error::MissingColorTable)
    ));
    Ok(())
}

#[test]
fn image_size_limit() {
    let mut gif = preamble(4, 4, Some(&PALETTE_4));
    image(&mut gif, 4, 4, None, 2, &[0; 16]);
    gif.push(0x3B);
    let res = Decoder::new(&gif[..]).max_image_sz(Some(15)).decode();
    assert!(matches!(
        res.as_ref().map_err(Error::inner),
        Err(Error::TooLargeImage)
    ));
    assert!(Decoder::new(&gif[..]).max_image_sz(Some(16)).decode().is_ok());
}

#[test]
fn invalid_code_size() {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    image_data(&mut gif, 2, 2, None, 9, &[0, 0]);
    gif.push(0x3B);
    let (_, _, error) = image_error(&gif);
    assert!(matches!(error, Error::InvalidCodeSize(9)));
}

#[test]
fn frame_iterator() -> Result<(), Error> {
    let mut gif = preamble(2, 2, Some(&PALETTE_4));
    image(&mut gif, 2, 2, None, 2, &[0, 1, 2, 3]);
    image(&mut gif, 2, 2, None, 2, &[3, 2, 1, 0]);
    gif.push(0x3B);
    let mut n_frames = 0;
    for frame in Decoder::new_unbuffered(&gif[..]) {
        assert_eq!(frame?.pixels().len(), 4);
        n_frames += 1;
    }
    assert_eq!(n_frames, 2);
    Ok(())
}

#[test]
fn parallel_decodes() {
    let palette = gray_palette(16);
    let mut gif = preamble(64, 64, Some(&palette));
    let pixels: Vec<u8> = (0..64 * 64).map(|i| (i % 13) as u8).collect();
    image(&mut gif, 64, 64, None, 4, &pixels);
    gif.push(0x3B);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let gif = gif.clone();
            thread::spawn(move || Decoder::new(&gif[..]).decode())
        })
        .collect();
    for handle in handles {
        let doc = handle.join().expect("thread panicked").expect("decode");
        assert_eq!(doc.frames()[0].pixels(), &pixels[..]);
    }
}
