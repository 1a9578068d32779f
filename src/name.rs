use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use tokio::fs::{File, OpenOptions};
use url::Url;

use crate::error::{Result, SaveError};

const MAX_STEM_BYTES: usize = 200;
const MAX_INDEX: usize = 10_000;
const FALLBACK_STEM: &str = "download";

/// Makes `name` usable as a file name on common filesystems.
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '.',
            '\u{0}'..='\u{1f}' => '.',
            c => c,
        })
        .collect();

    let mut end = replaced.len().min(MAX_STEM_BYTES);
    while !replaced.is_char_boundary(end) {
        end -= 1;
    }
    let stem = replaced[..end].trim();

    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

/// Stem for a saved HTML page: its title, or the page URL when untitled.
pub fn html_stem(title: Option<&str>, page_url: &str) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => sanitize(title),
        None => sanitize(page_url),
    }
}

/// `(stem, extension)` for a non-HTML body fetched from `url`.
///
/// The last path segment keeps its own extension when it has one;
/// otherwise `detected` is used.
pub fn resource_name(url: &Url, detected: &str) -> (String, String) {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned());

    let Some(segment) = segment else {
        let host = url.host_str().unwrap_or(FALLBACK_STEM);
        return (sanitize(host), detected.to_string());
    };

    let segment = sanitize(&segment);
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_extension(ext) => {
            (stem.to_string(), ext.to_string())
        }
        _ => (segment, detected.to_string()),
    }
}

fn is_extension(ext: &str) -> bool {
    (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Candidate file name for attempt `index`: `stem.ext`, then `stem.1.ext`, ...
pub fn candidate(stem: &str, ext: &str, index: usize) -> String {
    if index == 0 {
        format!("{stem}.{ext}")
    } else {
        format!("{stem}.{index}.{ext}")
    }
}

/// Creates the first free `stem[.N].ext` in `dir` without ever replacing an
/// existing file.
pub async fn create_unique(dir: &Path, stem: &str, ext: &str) -> Result<(PathBuf, File)> {
    for index in 0..=MAX_INDEX {
        let path = dir.join(candidate(stem, ext, index));
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(SaveError::Create { path, source }),
        }
    }
    Err(SaveError::NamesExhausted {
        stem: stem.to_string(),
        dir: dir.to_path_buf(),
    })
}
