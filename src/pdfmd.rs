//! PDF/Markdown conversion via the external `pandoc` binary.
//!
//! The conversion direction is inferred from the input extension: `.pdf`
//! converts to Markdown, `.md`/`.markdown` to PDF. PDF output goes through
//! xelatex with a CJK font override so non-Latin scripts survive.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

const PDF_ENGINE_ARG: &str = "--pdf-engine=xelatex";
const CJK_FONT_ARG: &str = "CJKmainfont=Noto Serif CJK TC";

/// Conversion direction, inferred from the input extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `.md`/`.markdown` input, PDF output
    MarkdownToPdf,
    /// `.pdf` input, Markdown output
    PdfToMarkdown,
}

impl Direction {
    /// Returns the output file extension for this direction.
    #[must_use]
    pub const fn target_extension(self) -> &'static str {
        match self {
            Self::MarkdownToPdf => "pdf",
            Self::PdfToMarkdown => "md",
        }
    }
}

/// Infers the conversion direction from the input path's extension.
///
/// # Errors
///
/// Returns [`Error::UnsupportedInput`] for anything other than `.pdf`,
/// `.md` or `.markdown`.
pub fn infer_direction(input: &Path) -> Result<Direction> {
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    match ext.as_deref() {
        Some("pdf") => Ok(Direction::PdfToMarkdown),
        Some("md" | "markdown") => Ok(Direction::MarkdownToPdf),
        _ => Err(Error::unsupported_input(input)),
    }
}

/// Returns the default output path: same basename, target extension.
#[must_use]
pub fn default_output(input: &Path, direction: Direction) -> PathBuf {
    input.with_extension(direction.target_extension())
}

/// Builds the pandoc argument list for one conversion.
///
/// Markdown to PDF adds the Unicode-capable engine and the CJK font
/// override; the reverse direction passes no extra arguments.
fn pandoc_args(input: &Path, output: &Path, direction: Direction) -> Vec<OsString> {
    let mut args = vec![
        input.as_os_str().to_os_string(),
        OsString::from("-o"),
        output.as_os_str().to_os_string(),
    ];

    if direction == Direction::MarkdownToPdf {
        args.push(OsString::from(PDF_ENGINE_ARG));
        args.push(OsString::from("-V"));
        args.push(OsString::from(CJK_FONT_ARG));
    }

    args
}

/// Converts between PDF and Markdown using pandoc.
///
/// The output path defaults to the input's basename with the appropriate
/// extension.
///
/// # Errors
///
/// Returns [`Error::UnsupportedInput`] for an unrecognized input extension
/// and [`Error::Conversion`] when pandoc is missing or fails.
pub fn convert(input: &Path, output: Option<&Path>) -> Result<PathBuf> {
    let direction = infer_direction(input)?;
    let output = output.map_or_else(|| default_output(input, direction), Path::to_path_buf);

    info!(
        "converting {} -> {} via pandoc",
        input.display(),
        output.display()
    );

    let status = Command::new("pandoc")
        .args(pandoc_args(input, &output, direction))
        .status()
        .map_err(|e| Error::conversion(format!("could not run pandoc: {e}")))?;

    if !status.success() {
        return Err(Error::conversion(format!("pandoc exited with {status}")));
    }

    Ok(output)
}

/// Converts like [`convert`], but downgrades failures to a warning.
///
/// Used by the pipeline, where a missing converter must not discard the
/// outputs already written.
pub fn convert_or_warn(input: &Path, output: Option<&Path>) -> Option<PathBuf> {
    match convert(input, output) {
        Ok(path) => Some(path),
        Err(err) => {
            warn!("{err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_direction() {
        assert_eq!(
            infer_direction(Path::new("doc.md")).unwrap(),
            Direction::MarkdownToPdf
        );
        assert_eq!(
            infer_direction(Path::new("doc.markdown")).unwrap(),
            Direction::MarkdownToPdf
        );
        assert_eq!(
            infer_direction(Path::new("doc.PDF")).unwrap(),
            Direction::PdfToMarkdown
        );
    }

    #[test]
    fn test_infer_direction_rejects_other_extensions() {
        let err = infer_direction(Path::new("doc.txt")).unwrap_err();
        assert!(err.to_string().contains(".pdf or .md/.markdown"));
        assert!(infer_direction(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("out/doc.md"), Direction::MarkdownToPdf),
            PathBuf::from("out/doc.pdf")
        );
        assert_eq!(
            default_output(Path::new("doc.pdf"), Direction::PdfToMarkdown),
            PathBuf::from("doc.md")
        );
    }

    #[test]
    fn test_markdown_to_pdf_args_use_xelatex_and_cjk_font() {
        let args = pandoc_args(
            Path::new("doc.md"),
            Path::new("doc.pdf"),
            Direction::MarkdownToPdf,
        );

        assert!(args.contains(&OsString::from("--pdf-engine=xelatex")));
        assert!(args.contains(&OsString::from("-V")));
        assert!(args.contains(&OsString::from("CJKmainfont=Noto Serif CJK TC")));
    }

    #[test]
    fn test_pdf_to_markdown_args_have_no_engine_arguments() {
        let args = pandoc_args(
            Path::new("doc.pdf"),
            Path::new("doc.md"),
            Direction::PdfToMarkdown,
        );

        assert_eq!(
            args,
            vec![
                OsString::from("doc.pdf"),
                OsString::from("-o"),
                OsString::from("doc.md"),
            ]
        );
    }
}
