//! Multi-format document loading (plain text, PDF, Word).
//!
//! Decoding is selected by file extension and always produces plain
//! UTF-8 text; the rest of the pipeline never sees file formats. Each
//! failure carries the offending file's name, and batch loading keeps
//! going past individual failures so one bad file never sinks an upload.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::Document;

/// Decompressed-size cap for a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Load one document, dispatching on the file extension.
///
/// Supported: `.txt`/`.md` (plain read), `.pdf`, `.doc`/`.docx`.
pub fn load_document(path: &Path) -> Result<Document> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "txt" | "md" => load_txt(path, &name)?,
        "pdf" => load_pdf(path, &name)?,
        "doc" | "docx" => load_docx(path, &name)?,
        _ => {
            return Err(Error::Load {
                file: name,
                reason: format!("unsupported file extension '{}'", extension),
            })
        }
    };

    Ok(Document { name, text })
}

/// Load a batch of documents, collecting per-file failures instead of
/// aborting on the first one.
pub fn load_documents(paths: &[PathBuf]) -> (Vec<Document>, Vec<Error>) {
    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for path in paths {
        match load_document(path) {
            Ok(doc) => documents.push(doc),
            Err(e) => failures.push(e),
        }
    }
    (documents, failures)
}

fn load_txt(path: &Path, name: &str) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Load {
        file: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(content.trim().to_string())
}

fn load_pdf(path: &Path, name: &str) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::Load {
        file: name.to_string(),
        reason: e.to_string(),
    })?;
    let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| Error::Load {
        file: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(text.trim().to_string())
}

fn load_docx(path: &Path, name: &str) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| Error::Load {
        file: name.to_string(),
        reason: e.to_string(),
    })?;

    let ooxml = |reason: String| Error::Load {
        file: name.to_string(),
        reason,
    };

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| ooxml(e.to_string()))?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| ooxml("word/document.xml not found".to_string()))?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| ooxml(e.to_string()))?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(ooxml("word/document.xml exceeds size limit".to_string()));
        }
    }

    let text = extract_paragraph_text(&doc_xml).map_err(|reason| ooxml(reason))?;
    Ok(text.trim().to_string())
}

/// Pull the text runs (`<w:t>`) out of a WordprocessingML body, joining
/// paragraphs with newlines.
fn extract_paragraph_text(xml: &[u8]) -> std::result::Result<String, String> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" && !out.ends_with('\n') && !out.is_empty() {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
