use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use saveurls_rs::config::{Config, ConfigOverrides};

/// Save web pages as .html files, with resource links made absolute.
#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
    /// URLs to save. More are read from piped stdin and --list.
    urls: Vec<String>,

    /// URL list file, one per line.
    #[clap(short = 'i', long)]
    list: Option<PathBuf>,

    /// Directory to save into.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Number of pages fetched in parallel.
    #[clap(short = 'j', long)]
    concurrency: Option<usize>,

    /// Request timeout in seconds.
    #[clap(short, long)]
    timeout: Option<u64>,

    /// User-Agent header sent with every request.
    #[clap(long)]
    user_agent: Option<String>,

    /// Do not append footer.
    #[clap(long)]
    no_footer: bool,

    /// JSON config file.
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Write a CSV report of every URL to this file.
    #[clap(long)]
    report: Option<PathBuf>,

    /// Verbose printing.
    #[clap(short, long)]
    verbose: bool,

    /// Print where the project lives and exit.
    #[clap(long)]
    about: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            concurrency: self.concurrency,
            timeout_secs: self.timeout,
            user_agent: self.user_agent.clone(),
            output_dir: self.output.clone(),
            footer: self.no_footer.then_some(false),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.about {
        println!("Visit {}", saveurls_rs::patch::PROJECT_URL);
        return Ok(());
    }
    saveurls_rs::logging::init_logging(args.verbose);

    let file = args
        .config
        .as_deref()
        .map(ConfigOverrides::from_json_file)
        .transpose()?;
    let config = Config::layered(file, args.overrides())?;

    let stdin = std::io::stdin();
    let piped = (!stdin.is_terminal()).then(|| stdin.lock());
    let urls = saveurls_rs::input::collect_urls(args.urls.clone(), piped, args.list.as_deref())?;

    let outcomes = saveurls_rs::save_urls(urls, config).await?;

    if let Some(report) = &args.report {
        saveurls_rs::report::write_to_csv(&outcomes, report)?;
    }

    saveurls_rs::report::ensure_all_saved(&outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn about_needs_no_urls() {
        let args = Args::try_parse_from(["saveurls", "--about"]).unwrap();
        assert!(args.about);
        assert!(args.urls.is_empty());
    }

    #[test]
    fn flags_become_overrides() {
        let args = Args::try_parse_from([
            "saveurls",
            "-j",
            "5",
            "--no-footer",
            "--user-agent",
            "curl/8",
            "https://a.example/",
        ])
        .unwrap();

        let overrides = args.overrides();
        assert_eq!(overrides.concurrency, Some(5));
        assert_eq!(overrides.footer, Some(false));
        assert_eq!(overrides.user_agent.as_deref(), Some("curl/8"));
        assert_eq!(overrides.timeout_secs, None);
        assert_eq!(args.urls, vec!["https://a.example/"]);
    }

    #[test]
    fn footer_is_left_to_lower_layers_by_default() {
        let args = Args::try_parse_from(["saveurls", "https://a.example/"]).unwrap();
        assert_eq!(args.overrides().footer, None);
    }
}
