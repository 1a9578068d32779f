use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Gathers URLs from the command line, piped stdin and a list file, in that order.
pub fn collect_urls<R: BufRead>(
    positional: Vec<String>,
    stdin: Option<R>,
    list: Option<&Path>,
) -> Result<Vec<String>> {
    let mut urls = positional;

    if let Some(reader) = stdin {
        urls.extend(read_lines(reader).context("cannot read urls from stdin")?);
    }

    if let Some(path) = list {
        let file =
            File::open(path).with_context(|| format!("cannot open list {}", path.display()))?;
        urls.extend(
            read_lines(BufReader::new(file))
                .with_context(|| format!("cannot read list {}", path.display()))?,
        );
    }

    let urls: Vec<String> = urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .map(patch_scheme)
        .collect();

    if urls.is_empty() {
        bail!("no urls given");
    }

    Ok(urls)
}

fn read_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<String>> {
    reader.lines().collect()
}

/// `example.com/a` is fetched as `http://example.com/a`.
pub fn patch_scheme(raw: &str) -> String {
    if raw.starts_with("http") {
        return raw.to_string();
    }
    let patched = format!("http://{raw}");
    tracing::debug!("patch {raw} as {patched}");
    patched
}
