pub mod config;
pub mod detect;
pub mod error;
pub mod input;
pub mod logging;
pub mod name;
pub mod patch;
pub mod report;

use std::sync::Arc;

use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

pub use config::Config;
pub use error::{Result, SaveError};
pub use report::{Outcome, Saved};

pub fn build_client(config: &Config) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .build()?)
}

/// Fetches `url` and stores it in `config.output_dir`, returning where it went.
pub async fn save_url(client: reqwest::Client, url: &str, config: &Config) -> Result<Saved> {
    debug!("processing {url}");

    let parsed = Url::parse(url)?;
    let response = client.get(parsed).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SaveError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let page_url = response.url().clone();
    let declared = detect::declared(
        response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    );

    let body = response.bytes().await?;
    let mime = declared.unwrap_or_else(|| detect::sniff(&body));
    debug!("{url} is {}", mime.essence_str());

    let (stem, ext, contents) = if detect::is_html(&mime) {
        let encoding = detect::charset(&mime, &body);
        debug!("{url} decoded as {}", encoding.name());
        let (text, _, _) = encoding.decode(&body);
        let title = patch::title(&text)?;
        let patched = patch::patch(&body, encoding, &page_url, url, config.footer)?;
        let stem = name::html_stem(title.as_deref(), url);
        (stem, "html".to_string(), bytes::Bytes::from(patched))
    } else {
        let (stem, ext) = name::resource_name(&page_url, detect::extension(&mime));
        (stem, ext, body)
    };

    let (path, mut file) = name::create_unique(&config.output_dir, &stem, &ext).await?;
    let written = async {
        file.write_all(&contents).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(e.into());
    }

    Ok(Saved {
        path,
        content_type: mime.essence_str().to_string(),
    })
}

/// Saves every URL with at most `config.concurrency` in flight.
///
/// A failing URL never stops the others; every entry gets an [`Outcome`],
/// returned in input order.
pub async fn save_url_list(
    client: reqwest::Client,
    urls: Vec<String>,
    config: Arc<Config>,
) -> Vec<Outcome> {
    let total = urls.len();
    let mut results = futures::stream::iter(urls.into_iter().enumerate())
        .map(|(index, url)| {
            let client = client.clone();
            let config = config.clone();
            let task_url = url.clone();
            let handle =
                tokio::spawn(async move { save_url(client, &task_url, &config).await });
            async move { (index, url, handle.await) }
        })
        .buffer_unordered(config.concurrency);

    let mut outcomes = Vec::with_capacity(total);
    while let Some((index, url, joined)) = results.next().await {
        let result = match joined {
            Ok(Ok(saved)) => {
                info!("saved {url} as {}", saved.path.display());
                Ok(saved)
            }
            Ok(Err(e)) => {
                warn!("process {url} failed: {e}");
                Err(e.to_string())
            }
            Err(e) => {
                warn!("process {url} failed: {e}");
                Err(format!("task failed: {e}"))
            }
        };
        outcomes.push(Outcome { index, url, result });
    }

    outcomes.sort_by_key(|o| o.index);
    outcomes
}

/// Prepares the output directory and client, then saves all `urls`.
pub async fn save_urls(urls: Vec<String>, config: Config) -> Result<Vec<Outcome>> {
    tokio::fs::create_dir_all(&config.output_dir).await?;
    let client = build_client(&config)?;

    let outcomes = save_url_list(client, urls, Arc::new(config)).await;
    let saved = outcomes.iter().filter(|o| o.is_saved()).count();
    info!("saved {saved}/{}", outcomes.len());

    Ok(outcomes)
}
