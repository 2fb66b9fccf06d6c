//! A multi-page vector document as a [`RenderSource`], rasterized through an
//! external interpreter subprocess.
//!
//! Page count/size/rasterization are delegated entirely to that subprocess,
//! so [`VectorInterpreter`] is the contract it must satisfy and
//! [`GhostscriptInterpreter`] is the one concrete collaborator, shelling out
//! to `gs`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::RgbImage;

use super::RenderSource;
use crate::error::{ExternalToolError, RenderError};

/// A subprocess collaborator that knows how to introspect and rasterize a
/// vector document (PDF/PS/EPS). Kept separate from [`VectorSource`] so
/// tests can supply a fake without spawning a real process.
pub trait VectorInterpreter {
    /// Number of pages in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalToolError`] if the subprocess fails or its output
    /// can't be parsed.
    fn page_count(&self, path: &Path) -> Result<usize, ExternalToolError>;

    /// Native page size, in points (1/72 inch), for page `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns [`ExternalToolError`] if the subprocess fails or its output
    /// can't be parsed.
    fn page_size_points(&self, path: &Path, index: usize) -> Result<(f32, f32), ExternalToolError>;

    /// Rasterizes page `index` to an RGB image of `target_size` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ExternalToolError`] if the subprocess fails or its output
    /// can't be decoded as an image.
    fn rasterize(&self, path: &Path, index: usize, target_size: (u32, u32)) -> Result<RgbImage, ExternalToolError>;
}

/// Invokes Ghostscript (`gs`) to introspect and rasterize PDF/PS/EPS files,
/// mirroring `ghostscript.py`'s invocations.
pub struct GhostscriptInterpreter {
    executable: PathBuf,
}

impl Default for GhostscriptInterpreter {
    fn default() -> Self {
        Self { executable: PathBuf::from("gs") }
    }
}

impl GhostscriptInterpreter {
    /// Uses a specific `gs`-compatible executable instead of the one on `PATH`.
    #[must_use]
    pub fn with_executable(executable: impl Into<PathBuf>) -> Self {
        Self { executable: executable.into() }
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output, ExternalToolError> {
        Command::new(&self.executable).args(args).output().map_err(|source| ExternalToolError::Spawn {
            name: "gs",
            source,
        })
    }
}

impl VectorInterpreter for GhostscriptInterpreter {
    fn page_count(&self, path: &Path) -> Result<usize, ExternalToolError> {
        let script = format!("({}) (r) file runpdfbegin pdfpagecount = quit", path.display());
        let output = self.run(&["-q", "-dNODISPLAY", "-dBATCH", "-c", script.as_str()])?;
        if !output.status.success() {
            return Err(ExternalToolError::NonZeroExit {
                name: "gs",
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .rev()
            .find_map(|line| line.trim().parse::<usize>().ok())
            .ok_or_else(|| ExternalToolError::Parse { name: "gs", reason: "no page count in output".to_owned() })
    }

    fn page_size_points(&self, path: &Path, index: usize) -> Result<(f32, f32), ExternalToolError> {
        let script = format!(
            "({}) (r) file runpdfbegin {} 1 add pdfgetpage /MediaBox get {{ == }} forall quit",
            path.display(),
            index
        );
        let output = self.run(&["-q", "-dNODISPLAY", "-dBATCH", "-c", script.as_str()])?;
        if !output.status.success() {
            return Err(ExternalToolError::NonZeroExit {
                name: "gs",
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let numbers: Vec<f32> =
            String::from_utf8_lossy(&output.stdout).split_whitespace().filter_map(|t| t.parse().ok()).collect();
        match numbers.as_slice() {
            [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => Err(ExternalToolError::Parse { name: "gs", reason: "could not parse MediaBox".to_owned() }),
        }
    }

    fn rasterize(&self, path: &Path, index: usize, target_size: (u32, u32)) -> Result<RgbImage, ExternalToolError> {
        let page = (index + 1).to_string();
        let geometry_arg = format!("-g{}x{}!", target_size.0, target_size.1);
        let path_arg = path.display().to_string();
        let output = self.run(&[
            "-q",
            "-dBATCH",
            "-dNOPAUSE",
            "-sDEVICE=png16m",
            "-dFirstPage",
            page.as_str(),
            "-dLastPage",
            page.as_str(),
            geometry_arg.as_str(),
            "-dPDFFitPage",
            "-sOutputFile=-",
            path_arg.as_str(),
        ])?;
        if !output.status.success() {
            return Err(ExternalToolError::NonZeroExit {
                name: "gs",
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let decoded = image::load_from_memory(&output.stdout)
            .map_err(|e| ExternalToolError::Parse { name: "gs", reason: e.to_string() })?;
        Ok(decoded.to_rgb8())
    }
}

/// A multi-page vector document, rasterized page-by-page through a
/// [`VectorInterpreter`].
pub struct VectorSource<I: VectorInterpreter> {
    path: PathBuf,
    interpreter: I,
    page_count: usize,
}

impl<I: VectorInterpreter> VectorSource<I> {
    /// Creates a source for `path`, using `interpreter` to introspect and rasterize it.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, interpreter: I) -> Self {
        Self { path: path.into(), interpreter, page_count: 0 }
    }
}

impl<I: VectorInterpreter> RenderSource for VectorSource<I> {
    fn open(&mut self) -> Result<(), RenderError> {
        self.page_count = self.interpreter.page_count(&self.path)?;
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), RenderError> {
        if index >= self.page_count {
            return Err(RenderError::PageOutOfRange { index, page_count: self.page_count });
        }
        Ok(self.interpreter.page_size_points(&self.path, index)?)
    }

    fn render(&mut self, index: usize, target_size: (u32, u32)) -> Result<RgbImage, RenderError> {
        if index >= self.page_count {
            return Err(RenderError::PageOutOfRange { index, page_count: self.page_count });
        }
        Ok(self.interpreter.rasterize(&self.path, index, target_size)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeInterpreter {
        pages: Vec<(f32, f32)>,
    }

    impl VectorInterpreter for FakeInterpreter {
        fn page_count(&self, _path: &Path) -> Result<usize, ExternalToolError> {
            Ok(self.pages.len())
        }
        fn page_size_points(&self, _path: &Path, index: usize) -> Result<(f32, f32), ExternalToolError> {
            self.pages.get(index).copied().ok_or(ExternalToolError::Parse { name: "fake", reason: "oob".into() })
        }
        fn rasterize(&self, _path: &Path, _index: usize, target_size: (u32, u32)) -> Result<RgbImage, ExternalToolError> {
            Ok(RgbImage::new(target_size.0, target_size.1))
        }
    }

    #[test]
    fn open_populates_page_count_from_interpreter() {
        let mut source = VectorSource::new("/tmp/doc.pdf", FakeInterpreter { pages: vec![(612.0, 792.0), (612.0, 792.0)] });
        source.open().unwrap();
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.page_size(1).unwrap(), (612.0, 792.0));
    }

    #[test]
    fn render_delegates_to_interpreter() {
        let mut source = VectorSource::new("/tmp/doc.pdf", FakeInterpreter { pages: vec![(100.0, 100.0)] });
        source.open().unwrap();
        let img = source.render(0, (30, 40)).unwrap();
        assert_eq!((img.width(), img.height()), (30, 40));
    }
}
