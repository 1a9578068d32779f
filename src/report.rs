use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::Serialize;

/// What happened to one entry of the URL list.
#[derive(Debug)]
pub struct Outcome {
    pub index: usize,
    pub url: String,
    pub result: std::result::Result<Saved, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Saved {
    pub path: PathBuf,
    pub content_type: String,
}

impl Outcome {
    pub fn is_saved(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    index: usize,
    url: &'a str,
    status: &'static str,
    path: String,
    content_type: &'a str,
    error: &'a str,
}

impl<'a> From<&'a Outcome> for ReportRow<'a> {
    fn from(outcome: &'a Outcome) -> Self {
        match &outcome.result {
            Ok(saved) => ReportRow {
                index: outcome.index,
                url: &outcome.url,
                status: "saved",
                path: saved.path.display().to_string(),
                content_type: &saved.content_type,
                error: "",
            },
            Err(e) => ReportRow {
                index: outcome.index,
                url: &outcome.url,
                status: "failed",
                path: String::new(),
                content_type: "",
                error: e,
            },
        }
    }
}

/// Writes one CSV row per outcome, in input order.
pub fn write_to_csv(outcomes: &[Outcome], path: &Path) -> Result<()> {
    tracing::debug!("write report to {}", path.display());

    let mut csv_writer = csv::Writer::from_path(path)?;
    for outcome in outcomes {
        csv_writer.serialize(ReportRow::from(outcome))?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Fails when any entry was not saved, after the whole batch has run.
pub fn ensure_all_saved(outcomes: &[Outcome]) -> Result<()> {
    let failed = outcomes.iter().filter(|o| !o.is_saved()).count();
    if failed > 0 {
        bail!("{failed} of {} urls failed", outcomes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Outcome> {
        vec![
            Outcome {
                index: 0,
                url: "https://a.example/".into(),
                result: Ok(Saved {
                    path: PathBuf::from("A.html"),
                    content_type: "text/html".into(),
                }),
            },
            Outcome {
                index: 1,
                url: "https://b.example/".into(),
                result: Err("HTTP 404 for https://b.example/".into()),
            },
        ]
    }

    #[test]
    fn report_has_one_row_per_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let outcomes = sample();

        write_to_csv(&outcomes, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "index,url,status,path,content_type,error");
        assert_eq!(lines[1], "0,https://a.example/,saved,A.html,text/html,");
        assert_eq!(lines[2], "1,https://b.example/,failed,,,HTTP 404 for https://b.example/");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn any_failure_fails_the_run() {
        let err = ensure_all_saved(&sample()).unwrap_err();
        assert_eq!(err.to_string(), "1 of 2 urls failed");
    }

    #[test]
    fn all_saved_is_ok() {
        let mut outcomes = sample();
        outcomes.truncate(1);
        assert!(ensure_all_saved(&outcomes).is_ok());
        assert!(ensure_all_saved(&[]).is_ok());
    }
}
