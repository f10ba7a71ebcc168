use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use tilepaint::{io, Canvas, CanvasResult, EditorConfig, Palette, Transform};

const PROJECT_EXTENSION: &str = "tpa";

/// Headless tile canvas tool.
#[derive(Parser, Debug)]
#[command(name = "tilepaint", version, about = "Convert, inspect and quantize tile images")]
struct Cli {
    /// Editor settings as JSON. Defaults apply when omitted.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load an image or project, optionally process it, and write it out.
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Snap colors to this palette file before writing.
        #[arg(short, long, value_name = "FILE")]
        palette: Option<PathBuf>,
        /// Floyd-Steinberg dither down to 5 bits per channel.
        #[arg(short, long)]
        dither: bool,
        #[arg(long, value_enum)]
        flip: Option<Flip>,
        /// Quarter turns clockwise.
        #[arg(long, default_value_t = 0)]
        rotate: u8,
    },
    /// Print dimensions and color count.
    Info { input: PathBuf },
    /// Validate a palette file and print its entries.
    Palette {
        file: PathBuf,
        /// Entries are RGBA quads instead of RGB triples.
        #[arg(long)]
        rgba: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Flip {
    Horizontal,
    Vertical,
}

fn is_project(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PROJECT_EXTENSION))
}

fn open(path: &Path, config: EditorConfig) -> CanvasResult<Canvas> {
    if is_project(path) {
        io::load_native(path, config)
    } else {
        io::load_image(path, config)
    }
}

fn convert(
    config: EditorConfig,
    input: &Path,
    output: &Path,
    palette: Option<&Path>,
    dither: bool,
    flip: Option<Flip>,
    rotate: u8,
) -> CanvasResult<()> {
    let mut canvas = open(input, config)?;
    if let Some(flip) = flip {
        canvas.transform(match flip {
            Flip::Horizontal => Transform::FlipHorizontal,
            Flip::Vertical => Transform::FlipVertical,
        })?;
    }
    for _ in 0..rotate % 4 {
        canvas.rotate_90()?;
    }
    if dither {
        canvas.dither()?;
    }
    if let Some(path) = palette {
        canvas.set_palette(Palette::load(path)?);
        canvas.convert_to_palette()?;
    }

    if is_project(output) {
        io::save_native(&canvas, output)
    } else {
        io::export_flattened(&canvas, output)
    }
}

fn info(config: EditorConfig, input: &Path) -> CanvasResult<()> {
    let canvas = open(input, config)?;
    let colors: HashSet<u32> = canvas
        .layers()
        .active()
        .pixels()?
        .iter()
        .map(|c| c.0)
        .collect();
    println!("{}", input.display());
    println!("  size:   {}x{}", canvas.width(), canvas.height());
    println!("  layers: {}", canvas.layers().len());
    println!("  colors: {}", colors.len());
    Ok(())
}

fn palette(file: &Path, rgba: bool) -> CanvasResult<()> {
    let palette = Palette::load_with(file, if rgba { 4 } else { 3 })?;
    for (i, c) in palette.colors().iter().enumerate() {
        println!("{:3}: {:3} {:3} {:3} {:3}", i, c.r(), c.g(), c.b(), c.a());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match EditorConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::default(),
    };

    let result = match &cli.command {
        Command::Convert {
            input,
            output,
            palette,
            dither,
            flip,
            rotate,
        } => convert(config, input, output, palette.as_deref(), *dither, *flip, *rotate),
        Command::Info { input } => info(config, input),
        Command::Palette { file, rgba } => palette(file, *rgba),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
