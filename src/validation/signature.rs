//! Per-format output checks
//!
//! These look at file signatures only: enough to tell a real export from an
//! empty, truncated or mislabelled file.

use crate::model::ExportFormat;
use anyhow::{bail, Context, Result};
use image::{ImageFormat, ImageReader};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// What was learned about a checked output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub bytes: u64,
    /// Pixel size, for raster outputs
    pub dimensions: Option<(u32, u32)>,
}

/// Check that `path` holds a plausible `format` export
pub fn validate_output(path: &Path, format: ExportFormat) -> Result<OutputSummary> {
    let bytes = fs::metadata(path)
        .with_context(|| format!("Failed to stat output: {:?}", path))?
        .len();
    if bytes == 0 {
        bail!("{:?} is empty", path);
    }

    let mut dimensions = None;
    match format {
        ExportFormat::Verilog => check_verilog(path)?,
        ExportFormat::Svg => check_svg(path)?,
        ExportFormat::Png => dimensions = Some(check_png(path)?),
        ExportFormat::Pdf => check_prefix(path, b"%PDF-", "PDF header")?,
        ExportFormat::Eps => check_eps(path)?,
        ExportFormat::Ps => check_prefix(path, b"%!PS-Adobe-", "PostScript header")?,
    }

    Ok(OutputSummary {
        path: path.to_path_buf(),
        format,
        bytes,
        dimensions,
    })
}

fn read_head(path: &Path, len: usize) -> Result<Vec<u8>> {
    let mut data = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    data.truncate(len);
    Ok(data)
}

fn check_prefix(path: &Path, magic: &[u8], what: &str) -> Result<()> {
    let head = read_head(path, magic.len())?;
    if head != magic {
        bail!("{:?} does not start with a {}", path, what);
    }
    Ok(())
}

fn check_eps(path: &Path) -> Result<()> {
    let head = read_head(path, 256)?;
    let first_line = head.split(|&b| b == b'\n' || b == b'\r').next().unwrap_or(&[]);
    let first_line = String::from_utf8_lossy(first_line);
    if !first_line.starts_with("%!PS-Adobe-") || !first_line.contains("EPSF") {
        bail!("{:?} does not start with an EPSF header", path);
    }
    Ok(())
}

fn check_verilog(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read Verilog netlist {:?}", path))?;
    let mut modules = 0usize;
    let mut ends = 0usize;
    for line in text.lines().map(str::trim) {
        if line.starts_with("module ") {
            modules += 1;
        } else if line.starts_with("endmodule") {
            ends += 1;
        }
    }
    if modules == 0 {
        bail!("{:?} declares no module", path);
    }
    if modules != ends {
        bail!(
            "{:?} has {} module(s) but {} endmodule(s)",
            path,
            modules,
            ends
        );
    }
    Ok(())
}

fn check_svg(path: &Path) -> Result<()> {
    let file = fs::File::open(path).with_context(|| format!("Failed to open SVG {:?}", path))?;
    let mut reader = Reader::from_reader(BufReader::new(file));
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"svg" {
                    return Ok(());
                }
                bail!(
                    "{:?} has root element <{}>, expected <svg>",
                    path,
                    String::from_utf8_lossy(name.as_ref())
                );
            }
            Ok(Event::Eof) => bail!("{:?} has no root element", path),
            Ok(Event::Text(t)) if !t.iter().all(u8::is_ascii_whitespace) => {
                bail!("{:?} has text before its root element", path)
            }
            Ok(_) => {}
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "XML error in {:?} at position {}: {}",
                    path,
                    reader.buffer_position(),
                    e
                ))
            }
        }
        buf.clear();
    }
}

fn check_png(path: &Path) -> Result<(u32, u32)> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open PNG {:?}", path))?
        .with_guessed_format()
        .with_context(|| format!("Failed to read PNG {:?}", path))?;
    if reader.format() != Some(ImageFormat::Png) {
        bail!("{:?} does not have a PNG signature", path);
    }
    let (width, height) = reader
        .into_dimensions()
        .with_context(|| format!("Failed to decode PNG header of {:?}", path))?;
    if width == 0 || height == 0 {
        bail!("{:?} is a {}x{} image", path, width, height);
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_verilog() {
        let dir = TempDir::new().unwrap();
        let good = write(
            &dir,
            "a.v",
            b"// Verilog netlist generated by Workcraft 3\nmodule buffer (out, in);\n    input in;\n    output out;\n    BUF _U0 (.O(out), .I(in));\nendmodule\n",
        );
        let bad = write(&dir, "b.v", b"// nothing here\n");

        assert!(validate_output(&good, ExportFormat::Verilog).is_ok());
        assert!(validate_output(&bad, ExportFormat::Verilog).is_err());
    }

    #[test]
    fn test_svg() {
        let dir = TempDir::new().unwrap();
        let good = write(
            &dir,
            "a.svg",
            b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE svg PUBLIC '-//W3C//DTD SVG 1.0//EN'\n          'http://www.w3.org/TR/2001/REC-SVG-20010904/DTD/svg10.dtd'>\n<svg xmlns=\"http://www.w3.org/2000/svg\"><g/></svg>",
        );
        let wrong_root = write(&dir, "b.svg", b"<?xml version=\"1.0\"?><html/>");

        assert!(validate_output(&good, ExportFormat::Svg).is_ok());
        let err = validate_output(&wrong_root, ExportFormat::Svg).unwrap_err();
        assert!(err.to_string().contains("<html>"));
    }

    #[test]
    fn test_png_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.png");
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::new(7, 3);
        img.save_with_format(&path, ImageFormat::Png).unwrap();

        let summary = validate_output(&path, ExportFormat::Png).unwrap();
        assert_eq!(summary.dimensions, Some((7, 3)));

        let fake = write(&dir, "b.png", b"not a png at all");
        assert!(validate_output(&fake, ExportFormat::Png).is_err());
    }

    #[test]
    fn test_document_headers() {
        let dir = TempDir::new().unwrap();
        let pdf = write(&dir, "a.pdf", b"%PDF-1.4\n%...");
        let eps = write(&dir, "a.eps", b"%!PS-Adobe-3.0 EPSF-3.0\n%%BoundingBox: 0 0 10 10\n");
        let ps = write(&dir, "a.ps", b"%!PS-Adobe-3.0\n");

        assert!(validate_output(&pdf, ExportFormat::Pdf).is_ok());
        assert!(validate_output(&eps, ExportFormat::Eps).is_ok());
        assert!(validate_output(&eps, ExportFormat::Ps).is_ok());
        assert!(validate_output(&ps, ExportFormat::Ps).is_ok());
        assert!(validate_output(&ps, ExportFormat::Eps).is_err());
        assert!(validate_output(&ps, ExportFormat::Pdf).is_err());
    }

    #[test]
    fn test_empty_file_fails() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "a.pdf", b"");
        let err = validate_output(&empty, ExportFormat::Pdf).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
