// main.rs      gifdec command
//
// Copyright (c) 2019-2026  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifdec::block::DisposalMethod;
use gifdec::{Decoder, FrameRef, GifDocument};
use pix::rgb::Rgb;
use std::error::Error;
use std::ffi::OsStr;
use std::fs::File;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let res = match create_app().get_matches().subcommand() {
        ("show", Some(matches)) => show(&mut out, matches),
        ("pixels", Some(matches)) => pixels(&mut out, matches),
        _ => Ok(()),
    };
    out.reset()?;
    res
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifdec")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("GIF decoding utility")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF frame table")
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("pixels")
                .about("Print resolved colors of one frame")
                .arg(Arg::with_name("file").required(true).help("input file"))
                .arg(
                    Arg::with_name("frame")
                        .short("f")
                        .long("frame")
                        .takes_value(true)
                        .default_value("0")
                        .help("frame number"),
                ),
        )
}

/// Color specs for output
struct Palette {
    dflt: ColorSpec,
    bold: ColorSpec,
    red: ColorSpec,
    yellow: ColorSpec,
    cyan: ColorSpec,
    magenta: ColorSpec,
}

impl Palette {
    fn new() -> Self {
        let mut dflt = ColorSpec::new();
        dflt.set_fg(Some(Color::White));
        let mut bold = ColorSpec::new();
        bold.set_fg(Some(Color::White))
            .set_intense(true)
            .set_bold(true);
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        let mut yellow = ColorSpec::new();
        yellow.set_fg(Some(Color::Yellow)).set_intense(true);
        let mut cyan = ColorSpec::new();
        cyan.set_fg(Some(Color::Cyan)).set_intense(true);
        let mut magenta = ColorSpec::new();
        magenta.set_fg(Some(Color::Magenta));
        Palette {
            dflt,
            bold,
            red,
            yellow,
            cyan,
            magenta,
        }
    }
}

/// Handle show subcommand
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    if let Some(values) = matches.values_of_os("files") {
        for path in values {
            show_file(out, path)?;
        }
    }
    Ok(())
}

/// Show one GIF file
fn show_file(
    out: &mut StandardStream,
    path: &OsStr,
) -> Result<(), Box<dyn Error>> {
    let pal = Palette::new();
    out.set_color(&pal.magenta)?;
    writeln!(out, "{:?}", path)?;
    let (doc, err) = match Decoder::new(File::open(path)?).decode_best_effort()
    {
        Ok(doc) => (doc, None),
        Err(incomplete) => {
            let err = incomplete.error().to_string();
            match incomplete.into_document() {
                Some(doc) => (doc, Some(err)),
                None => {
                    out.set_color(&pal.red)?;
                    writeln!(out, "error: {}", err)?;
                    return Ok(());
                }
            }
        }
    };
    let version = String::from_utf8_lossy(doc.header().version().as_bytes())
        .to_string();
    out.set_color(&pal.bold)?;
    writeln!(
        out,
        "GIF{}, {}x{}, frames: {}",
        version,
        doc.width(),
        doc.height(),
        doc.frames().len()
    )?;
    out.set_color(&pal.cyan)?;
    for cmt in doc.comments() {
        for l in String::from_utf8_lossy(cmt).split('\n') {
            let l = l.trim();
            if !l.is_empty() {
                writeln!(out, "  # {}", l)?;
            }
        }
    }
    let cols = Columns::new(&doc);
    out.set_color(&pal.yellow)?;
    write!(out, " {:>w$}", "Fr#", w = cols.frame_digits)?;
    write!(out, "  Delay Disp")?;
    write!(out, " {:>w$}", "Size", w = cols.size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = cols.size_digits)?;
    writeln!(out, " Clrs Trn")?;
    for (n, frame) in doc.iter().enumerate() {
        show_frame(out, &pal, &doc, &cols, n, frame)?;
    }
    if let Some(err) = err {
        out.set_color(&pal.red)?;
        writeln!(out, "error: {}", err)?;
    }
    Ok(())
}

/// Column widths for frame table
struct Columns {
    frame_digits: usize,
    size_digits: usize,
}

impl Columns {
    fn new(doc: &GifDocument) -> Self {
        let frame_digits = digits(doc.frames().len()).max(3);
        let size_digits = 4.max(1 + digits(doc.width()) + digits(doc.height()));
        Columns {
            frame_digits,
            size_digits,
        }
    }
}

/// Show one frame of a GIF file
fn show_frame(
    out: &mut StandardStream,
    pal: &Palette,
    doc: &GifDocument,
    cols: &Columns,
    number: usize,
    frame: FrameRef,
) -> Result<(), Box<dyn Error>> {
    let desc = frame.frame().image_desc();
    let control = frame.frame().graphic_control();
    out.set_color(&pal.dflt)?;
    let interlaced = if desc.interlaced() { 'i' } else { ' ' };
    write!(out, "{}", interlaced)?;
    out.set_color(&pal.bold)?;
    write!(out, "{:>w$}", number, w = cols.frame_digits)?;
    let delay = control.map_or(0, |gc| gc.delay_time_cs());
    if delay == 0 {
        out.set_color(&pal.dflt)?;
    }
    write!(out, " {:6.2}", delay as f32 / 100f32)?;
    let disp = match control.map(|gc| gc.disposal_method()) {
        Some(DisposalMethod::NoAction) => "none",
        Some(DisposalMethod::Keep) => "keep",
        Some(DisposalMethod::Background) => "bg",
        Some(DisposalMethod::Previous) => "prev",
        Some(DisposalMethod::Reserved(_)) => "res",
        None => "-",
    };
    out.set_color(match disp {
        "none" | "-" => &pal.dflt,
        "res" => &pal.red,
        _ => &pal.bold,
    })?;
    write!(out, " {:>4}", disp)?;
    if doc.width() == desc.width() && doc.height() == desc.height() {
        out.set_color(&pal.dflt)?;
    } else {
        out.set_color(&pal.bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{}x{}", desc.width(), desc.height()),
        w = cols.size_digits
    )?;
    if desc.left() == 0 && desc.top() == 0 {
        out.set_color(&pal.dflt)?;
    } else {
        out.set_color(&pal.bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{},{}", desc.left(), desc.top()),
        w = cols.size_digits
    )?;
    match frame.frame().local_color_table() {
        Some(tbl) => {
            out.set_color(&pal.bold)?;
            write!(out, "  {:3}", tbl.len())?;
        }
        None => {
            let global = doc.global_color_table().map_or(0, |t| t.len());
            out.set_color(&pal.dflt)?;
            write!(out, " {:3}g", global)?;
        }
    }
    match control.and_then(|gc| gc.transparent_color()) {
        Some(tc) => {
            out.set_color(&pal.bold)?;
            writeln!(out, " {:>3}", tc)?;
        }
        None => {
            out.set_color(&pal.dflt)?;
            writeln!(out, " {:>3}", "-")?;
        }
    }
    Ok(())
}

/// Handle pixels subcommand
fn pixels(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let path = matches.value_of_os("file").ok_or("missing file")?;
    let frame = matches.value_of("frame").unwrap_or("0");
    let (number, limit) = parse_frame(frame)?;
    let doc = Decoder::new(File::open(path)?)
        .frame_limit(Some(limit))
        .decode()?;
    let frame = doc.frame(number).ok_or("frame not found")?;
    let width = usize::from(frame.frame().width()).max(1);
    let colors = frame.resolve_pixels()?;
    for row in colors.chunks(width) {
        for clr in row {
            let r = u8::from(Rgb::red(*clr));
            let g = u8::from(Rgb::green(*clr));
            let b = u8::from(Rgb::blue(*clr));
            write!(out, "{:02x}{:02x}{:02x} ", r, g, b)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Parse a frame number, with the frame limit needed to decode it
fn parse_frame(value: &str) -> Result<(usize, usize), Box<dyn Error>> {
    let number: usize = value.parse()?;
    let limit = number.checked_add(1).ok_or("frame not found")?;
    Ok((number, limit))
}

/// Calculate digits in a number
fn digits<T: Into<usize>>(v: T) -> usize {
    let v = v.into();
    match v {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
