//! Command-line front end for the `brother_label` crate.
//!
//! `clap`-derived subcommands, `anyhow` for top-level error plumbing,
//! `tracing-subscriber` with `EnvFilter` for logging. Keeps `lib` (pure,
//! unit-testable) separate from `bin` (process environment, argument
//! parsing, exit codes).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use brother_label::catalog::{self, Model};
use brother_label::connection::{self, Transport};
use brother_label::engine;
use brother_label::env as bql_env;
use brother_label::job::{CutBehavior, RasterJob};
use brother_label::render::{quantize, BitmapSource, RenderOptions, RenderSource};
use brother_label::status::{StatusInformation, STATUS_REQUEST_BYTES};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Brother QL/PT label printer driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging output.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Render and print one or more images to a label printer.
    Print {
        /// Printer model name, e.g. `QL-600`. Falls back to
        /// `BROTHER_LABEL_MODEL`, `auto` is treated as unset either way.
        #[arg(short, long)]
        model: Option<String>,

        /// Label identifier accepted by the model, e.g. `62` or `DK-22205`.
        #[arg(short, long)]
        label: String,

        /// Device URL (`usb://...`, `tcp://...`, `lp://...`, or a bare
        /// path). Falls back to `BROTHER_LABEL_DEVICE`.
        #[arg(short, long)]
        device: Option<String>,

        /// Image file(s) to print, one label per image.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Use nearest-palette thresholding instead of the default
        /// Floyd-Steinberg dithering.
        #[arg(long)]
        no_dither: bool,

        /// Disable PackBits compression even if the model supports it.
        #[arg(long)]
        no_compress: bool,
    },
    /// Query and print the printer's current status.
    Status {
        /// Device URL (`usb://...`, `tcp://...`, `lp://...`, or a bare path).
        #[arg(short, long)]
        device: Option<String>,
    },
}

fn resolve_model(requested: Option<String>) -> Result<&'static Model> {
    let name = requested
        .or_else(bql_env::model)
        .ok_or_else(|| anyhow!("no model given (use --model or BROTHER_LABEL_MODEL)"))?;
    catalog::model_by_name(&name).map_err(|e| anyhow!(e))
}

fn resolve_device(requested: Option<String>) -> Result<String> {
    requested.or_else(bql_env::device).ok_or_else(|| anyhow!("no device given (use --device or BROTHER_LABEL_DEVICE)"))
}

fn run_print(
    model_name: Option<String>,
    label_name: String,
    device: Option<String>,
    images: Vec<PathBuf>,
    no_dither: bool,
    no_compress: bool,
) -> Result<()> {
    let model = resolve_model(model_name)?;
    let label = catalog::label_by_identifier(model, &label_name)?;
    let device_url = resolve_device(device)?;

    let device_pixels = (model.device_pixel_width(), label.dots_printable.1);
    let offset_x = (model.device_pixel_width() as i32 - label.dots_printable.0 as i32 - label.offset_r).max(0);
    let mut options = RenderOptions {
        printable_pixels: (label.dots_printable.0, label.dots_printable.1),
        device_pixels,
        device_pixels_offset: (offset_x, 0),
        dither: !no_dither,
        ..RenderOptions::default()
    };
    if label.color == brother_label::catalog::Color::BlackRedWhite {
        options.palette = vec![[1.0, 1.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
    }

    let mut job = RasterJob::new(model, label).compressed(!no_compress && model.supports(brother_label::catalog::Capability::COMPRESSION));
    job = job.cut_behavior(if label.is_endless() { CutBehavior::CutEach } else { CutBehavior::CutAtEnd });

    for path in &images {
        let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let mut source = BitmapSource::from_bytes(&bytes)?;
        source.open()?;
        let page = brother_label::render::render_page(&mut source, 0, &options)?;
        let rows = brother_label::render::pack_page(&page, model.bytes_per_row as usize, 1);
        if let Some(red_indices) = &page.red {
            let red_rows: Vec<Vec<u8>> =
                red_indices.iter().map(|row| quantize::pack_row(row, 1, model.bytes_per_row as usize)).collect();
            job.add_two_color_page(rows, red_rows)?;
        } else {
            job.add_page(rows)?;
        }
    }

    let output = job.compile();
    for warning in &output.warnings {
        tracing::warn!(%warning, "encoder dropped an unsupported opcode");
    }

    let mut transport = connection::open(&device_url)?;
    let outcome = engine::communicate(&output.bytes, transport.as_mut())?;
    if outcome.did_print {
        println!("printed successfully");
    } else {
        println!("instructions sent; completion not confirmed");
    }
    Ok(())
}

fn run_status(device: Option<String>) -> Result<()> {
    let device_url = resolve_device(device)?;
    let mut transport = connection::open(&device_url)?;
    transport.write(&STATUS_REQUEST_BYTES)?;
    let data = transport.read(32)?;
    let status = StatusInformation::try_from(data.as_slice()).map_err(|e| anyhow!(e))?;
    println!("{status:#?}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(if cli.debug { "debug" } else { "info" })).init();

    let result = match cli.command {
        Commands::Print { model, label, device, images, no_dither, no_compress } => {
            run_print(model, label, device, images, no_dither, no_compress)
        }
        Commands::Status { device } => run_status(device),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
