//! PDF/DOCX to plain text conversion.

use regex::Regex;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::ConvertError;

/// Binary formats that need conversion before they can be used as context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Docx,
}

/// Convert `source` to text and write it to `target`
pub fn convert_to_text(source: &Path, format: SourceFormat, target: &Path) -> Result<(), ConvertError> {
    let text = match format {
        SourceFormat::Pdf => pdf_to_text(source)?,
        SourceFormat::Docx => docx_to_text(source)?,
    };
    fs::write(target, text).map_err(|e| ConvertError::Write(target.to_path_buf(), e))?;
    debug!("Converted {} -> {}", source.display(), target.display());
    Ok(())
}

pub fn pdf_to_text(path: &Path) -> Result<String, ConvertError> {
    pdf_extract::extract_text(path).map_err(|e| ConvertError::Pdf(path.to_path_buf(), e.to_string()))
}

pub fn docx_to_text(path: &Path) -> Result<String, ConvertError> {
    let docx_err = |e: String| ConvertError::Docx(path.to_path_buf(), e);

    let file = File::open(path).map_err(|e| docx_err(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| docx_err(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| docx_err(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| docx_err(e.to_string()))?;

    Ok(document_xml_to_text(&xml))
}

/// Flatten WordprocessingML into one line per paragraph
pub fn document_xml_to_text(xml: &str) -> String {
    let paragraph_end = Regex::new(r"</w:p>").unwrap();
    let line_break = Regex::new(r"<w:(?:br|cr)\s*/>").unwrap();
    let tab = Regex::new(r"<w:tab\s*/>").unwrap();
    let tag = Regex::new(r"<[^>]+>").unwrap();

    let text = paragraph_end.replace_all(xml, "\n");
    let text = line_break.replace_all(&text, "\n");
    let text = tab.replace_all(&text, "\t");
    let text = tag.replace_all(&text, "");

    unescape_xml(&text)
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
