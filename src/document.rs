use crate::error::{QaError, Result};
use indicatif::ProgressBar;
use jwalk::WalkDir;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{
    io,
    path::{Path, PathBuf},
    process::Command,
};

/// Fragments shorter than this are discarded at segmentation time.
pub const MIN_PASSAGE_CHARS: usize = 40;
/// Blocks longer than this get re-split on the blank-line boundary.
pub const MAX_BLOCK_CHARS: usize = 1500;

/// A single retrievable unit of document text. Immutable once created;
/// position in the collection assigns its 1-based citation number.
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    pub document: String,
    pub page: Option<u32>,
}

/// Split plain text on blank-line boundaries. No page numbers.
pub fn segment_text(raw: &str, document: &str) -> Vec<Passage> {
    raw.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Passage {
            text: p.to_string(),
            document: document.to_string(),
            page: None,
        })
        .collect()
}

/// Split per-page text on blank-line boundaries, keeping 1-based page
/// numbers. Over-long blocks are re-split on the same boundary and
/// fragments under the minimum length are dropped silently.
pub fn segment_pages(pages: &[String], document: &str) -> Vec<Passage> {
    let mut passages = vec![];
    for (p_idx, page_text) in pages.iter().enumerate() {
        let page_text = page_text.replace('\r', "\n");
        let page_text = page_text.trim();
        if page_text.is_empty() {
            continue;
        }

        let blocks = page_text.split("\n\n").map(str::trim).filter(|b| !b.is_empty());
        for block in blocks {
            let parts: Vec<&str> = if block.chars().count() > MAX_BLOCK_CHARS {
                block.split("\n\n").map(str::trim).filter(|x| !x.is_empty()).collect()
            } else {
                vec![block]
            };

            for part in parts {
                if part.chars().count() < MIN_PASSAGE_CHARS {
                    continue;
                }
                passages.push(Passage {
                    text: part.to_string(),
                    document: document.to_string(),
                    page: Some(p_idx as u32 + 1),
                });
            }
        }
    }
    passages
}

/// Load a plain text file whose paragraphs are separated by blank lines.
pub fn load_text_corpus(path: &Path) -> Result<Vec<Passage>> {
    let bytes = std::fs::read(path).map_err(|e| QaError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let raw = simdutf8::basic::from_utf8(&bytes).map_err(|_| QaError::InvalidUtf8 {
        path: path.to_path_buf(),
    })?;
    Ok(segment_text(raw, &path.display().to_string()))
}

/// Extract per-page text from a PDF and segment it with page tags.
pub fn load_pdf_corpus(path: &Path) -> Result<Vec<Passage>> {
    let pages = extract_pdf_pages(path)?;
    Ok(segment_pages(&pages, &path.display().to_string()))
}

/// Load every `*.pdf` under a directory and concatenate their passages,
/// preserving per-document tags. An empty result is the caller's fatal
/// precondition, not an error here.
pub fn load_pdf_group(root: &Path) -> Result<Vec<Passage>> {
    if !root.exists() {
        return Err(QaError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Group directory does not exist: {}", root.display()),
        )));
    }

    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) if entry.file_type().is_file() => {
                let path = entry.path();
                (path.extension().and_then(|x| x.to_str()) == Some("pdf")).then_some(path)
            }
            Ok(_) => None,
            Err(err) => {
                // Log but don't fail on individual directory entries
                log::warn!("Failed to walk directory entry: {}", err);
                None
            }
        })
        .collect();
    // Citation numbers depend on insertion order, so keep it reproducible.
    paths.sort();

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_message(format!("Parsing PDF files at {}", root.display()));

    let per_doc: Result<Vec<Vec<Passage>>> = paths
        .par_iter()
        .map(|path| {
            let passages = load_pdf_corpus(path);
            pb.inc(1);
            passages
        })
        .collect();
    pb.finish_and_clear();

    let per_doc = per_doc?;
    let mut all = Vec::with_capacity(per_doc.iter().map(|v| v.len()).sum::<usize>());
    for mut v in per_doc {
        all.append(&mut v);
    }
    Ok(all)
}

/// Page texts in reading order via the `pdftotext` binary. Pages arrive
/// separated by form-feed characters on stdout.
fn extract_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(path)
        .arg("-")
        .output()
        .map_err(|e| QaError::PdfExtract {
            path: path.to_path_buf(),
            reason: format!("failed to run pdftotext: {} (is poppler installed?)", e),
        })?;

    if !output.status.success() {
        return Err(QaError::PdfExtract {
            path: path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).to_string();
    Ok(text.split('\u{c}').map(|p| p.to_string()).collect())
}
