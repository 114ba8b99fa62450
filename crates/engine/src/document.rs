//! Rocket design documents and their admission checks.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::expression::{CustomExpression, ExpressionError};

/// Bytes inspected when recognising a document container.
const SNIFF_LEN: usize = 512;
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

/// Container a design document is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Zipped archive holding the design XML (the usual `.ork` layout).
    Zip,
    /// Gzip-compressed design XML.
    Gzip,
    /// Plain design XML.
    Xml,
}

/// Errors surfaced when a design document cannot be admitted.
#[derive(Debug, Error)]
pub enum DocumentLoadError {
    #[error("design document not found at {path}")]
    NotFound { path: PathBuf },
    #[error("design document path {path} is not a regular file")]
    NotAFile { path: PathBuf },
    #[error("failed to read design document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("design document {path} is empty")]
    Empty { path: PathBuf },
    #[error("{path} is not a recognised design document (expected ZIP, gzip or XML)")]
    UnrecognizedFormat { path: PathBuf },
}

/// Handle to a loaded rocket design.
///
/// Read-only once the sweep starts; the only mutation is attaching custom
/// expressions before the first simulation.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    format: DocumentFormat,
    expressions: Vec<CustomExpression>,
}

impl Document {
    /// Open `path` and check that it looks like a design document.
    pub fn open(path: &Path) -> Result<Self, DocumentLoadError> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DocumentLoadError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(DocumentLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if !metadata.is_file() {
            return Err(DocumentLoadError::NotAFile {
                path: path.to_path_buf(),
            });
        }

        let mut head = Vec::with_capacity(SNIFF_LEN);
        File::open(path)
            .and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut head))
            .map_err(|source| DocumentLoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if head.is_empty() {
            return Err(DocumentLoadError::Empty {
                path: path.to_path_buf(),
            });
        }

        let format = sniff_format(&head).ok_or_else(|| DocumentLoadError::UnrecognizedFormat {
            path: path.to_path_buf(),
        })?;
        tracing::debug!(path = %path.display(), ?format, "design document admitted");

        Ok(Self {
            path: path.to_path_buf(),
            format,
            expressions: Vec::new(),
        })
    }

    /// Path the document was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Container detected from the leading bytes.
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Custom expressions attached so far, in attachment order.
    pub fn expressions(&self) -> &[CustomExpression] {
        &self.expressions
    }

    /// Record `expression` on the document; symbols must be unique.
    pub fn attach(&mut self, expression: CustomExpression) -> Result<(), ExpressionError> {
        if self
            .expressions
            .iter()
            .any(|existing| existing.symbol() == expression.symbol())
        {
            return Err(ExpressionError::DuplicateSymbol(
                expression.symbol().to_string(),
            ));
        }
        self.expressions.push(expression);
        Ok(())
    }
}

fn sniff_format(head: &[u8]) -> Option<DocumentFormat> {
    if head.starts_with(ZIP_MAGIC) {
        return Some(DocumentFormat::Zip);
    }
    if head.starts_with(GZIP_MAGIC) {
        return Some(DocumentFormat::Gzip);
    }
    let text = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    let start = text.iter().position(|b| !b.is_ascii_whitespace())?;
    let text = &text[start..];
    if text.starts_with(b"<?xml") || text.starts_with(b"<openrocket") {
        return Some(DocumentFormat::Xml);
    }
    None
}
