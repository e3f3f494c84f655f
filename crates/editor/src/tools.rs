//! Editing tools and whole-document page tools

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::EditorConfig;
use crate::finalize::Progress;
use crate::library::DocumentLibrary;
use crate::raster::percent;
use crate::{EditorError, Result};

const MERGE_NEEDS_TWO: &str = "Please select at least two PDF files to merge.";

/// The visual editing tools
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Tool {
    #[default]
    #[serde(rename = "sign-pdf")]
    Sign,
    #[serde(rename = "edit-pdf")]
    Edit,
    #[serde(rename = "redact-pdf")]
    Redact,
    #[serde(rename = "organize-pdf")]
    Organize,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Sign, Tool::Edit, Tool::Redact, Tool::Organize];

    pub fn id(self) -> &'static str {
        match self {
            Tool::Sign => "sign-pdf",
            Tool::Edit => "edit-pdf",
            Tool::Redact => "redact-pdf",
            Tool::Organize => "organize-pdf",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Tool::Sign => "Sign PDF",
            Tool::Edit => "Edit PDF",
            Tool::Redact => "Redact PDF",
            Tool::Organize => "Organize PDF",
        }
    }

    /// Render scale for this tool's page previews
    pub fn render_scale(self, config: &EditorConfig) -> f64 {
        match self {
            Tool::Organize => config.organize_render_scale,
            Tool::Sign | Tool::Edit | Tool::Redact => config.edit_render_scale,
        }
    }

    /// Whether the tool places overlay items
    pub fn uses_overlays(self) -> bool {
        matches!(self, Tool::Sign | Tool::Edit)
    }

    fn suffix(self) -> &'static str {
        match self {
            Tool::Sign => "_signed",
            Tool::Edit => "_edited",
            Tool::Redact => "_redacted",
            Tool::Organize => "_organized",
        }
    }

    /// Suggested name for the processed file
    ///
    /// ```ignore
    /// assert_eq!(Tool::Redact.output_filename("report.final.pdf"), "report.final_redacted.pdf");
    /// ```
    pub fn output_filename(self, original: &str) -> String {
        let base = if original.is_empty() {
            "file"
        } else {
            match original.rsplit_once('.') {
                Some((stem, ext)) if !ext.is_empty() && !ext.contains('/') => stem,
                _ => original,
            }
        };
        format!("{base}{}.pdf", self.suffix())
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tool {
    type Err = EditorError;

    fn from_str(id: &str) -> Result<Self> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.id() == id)
            .ok_or_else(|| EditorError::ConfigError(format!("Unknown tool: {id}")))
    }
}

/// One page of a split document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPart {
    /// `page_<n>.pdf`, numbered from 1
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Concatenate all pages of every document, in order
pub fn merge<L: DocumentLibrary>(library: &L, documents: &[&[u8]]) -> Result<Vec<u8>> {
    if documents.len() < 2 {
        return Err(EditorError::EmptyInput(MERGE_NEEDS_TWO.to_string()));
    }

    let mut merged = library.create_document()?;
    for bytes in documents {
        let document = library.load_document(bytes)?;
        let pages: Vec<usize> = (0..library.page_count(&document)).collect();
        library.copy_pages(&mut merged, &document, &pages)?;
    }

    let output = library.save(&mut merged)?;
    info!(documents = documents.len(), pages = library.page_count(&merged), "documents merged");
    Ok(output)
}

/// One single-page document per page
pub fn split<L, F>(library: &L, bytes: &[u8], mut on_progress: F) -> Result<Vec<SplitPart>>
where
    L: DocumentLibrary,
    F: FnMut(Progress),
{
    let document = library.load_document(bytes)?;
    let page_count = library.page_count(&document);

    let mut parts = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let number = index + 1;
        on_progress(Progress::new(
            percent(number, page_count),
            format!("Splitting page {number} of {page_count}"),
        ));

        let mut single = library.create_document()?;
        library.copy_pages(&mut single, &document, &[index])?;
        parts.push(SplitPart {
            name: format!("page_{number}.pdf"),
            bytes: library.save(&mut single)?,
        });
    }

    info!(pages = page_count, "document split");
    Ok(parts)
}
