//! Core driver for Brother QL/PT series thermal label printers.
//!
//! Covers four components end to end: a [`catalog`] of printer models and
//! label media, a raster command encoder ([`job`]) that turns rasterized
//! pages into the exact byte stream a given model expects, a [`reader`]
//! that does the inverse (byte stream back to pages and status replies),
//! and a [`render`] pipeline that turns a bitmap/vector/text source into
//! the pages the encoder consumes. A [`connection`] abstraction and
//! [`engine`] loop tie them to a physical printer.
//!
//! # Feature Flags
//!
//! - **`usb`** (optional) - direct USB printing via [`connection::UsbConnection`], built on `rusb`.
//! - **`text`** (optional) - the [`render::TextSource`] render source, built on `rusttype`.
//! - **`serde`** (optional) - `Serialize`/`Deserialize` on catalog and render option types.
//! - **`cli`** (optional) - pulls in `anyhow`/`clap`/`tracing-subscriber` for the `brother-label` binary.
//!
//! The crate has **no default features**. Encoding, decoding, and printing
//! via a kernel character device or a plain file sink work without any
//! feature enabled.
//!
//! # Quick Start
//!
//! ```no_run
//! use brother_label::{catalog, connection, engine, job::RasterJob};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = catalog::model_by_name("QL-600")?;
//! let label = catalog::label_by_identifier(model, "62")?;
//!
//! let mut job = RasterJob::new(model, label);
//! let blank_row = vec![0u8; model.bytes_per_row as usize];
//! job.add_page(vec![blank_row; 300])?;
//!
//! let output = job.compile();
//! let mut transport = connection::open("/dev/usb/lp0")?;
//! engine::communicate(&output.bytes, transport.as_mut())?;
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - [Official Raster Command Reference](https://download.brother.com/welcome/docp100278/cv_ql800_eng_raster_101.pdf)
//! - Images are processed using the [`image`] crate.

pub mod catalog;
mod commands;
pub mod connection;
pub mod engine;
pub mod env;
pub mod error;
pub mod job;
pub mod packbits;
pub mod reader;
pub mod render;
pub mod status;
