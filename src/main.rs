use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context};
use gallery::config::{Config, DEFAULT_CONFIG_FILE};
use gallery::feed::{FeedCache, FeedManager, FeedView, FetchOutcome};
use gallery::form::{AttachOutcome, SelectedFile, SubmitOutcome, UploadForm};
use gallery::utils::{init_tracing, LogNotifier};
use gallery::{ApiClient, ImageHostClient};

const USAGE: &str = "\
Usage:
  gallery [--config PATH] feed [--pages N]
  gallery [--config PATH] upload FILE --title TITLE --description DESCRIPTION";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return Ok(());
    }

    let config_path: PathBuf = args
        .opt_value_from_str("--config")?
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load_config(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match args.subcommand()?.as_deref() {
        Some("feed") => {
            let pages: usize = args.opt_value_from_str("--pages")?.unwrap_or(1);
            run_feed(&config, pages).await
        }
        Some("upload") => {
            let title: String = args.value_from_str("--title")?;
            let description: String = args.value_from_str("--description")?;
            let file: PathBuf = args.free_from_str()?;
            run_upload(&config, file, title, description).await
        }
        _ => {
            eprintln!("{USAGE}");
            bail!("Unknown command")
        }
    }
}

async fn run_feed(config: &Config, pages: usize) -> anyhow::Result<()> {
    let api = Arc::new(ApiClient::from_config(config)?);
    let handle = FeedManager::new(api, Arc::new(FeedCache::new()));
    let feed = handle.manager.clone();

    if let FetchOutcome::Failed(error) = feed.load().await? {
        bail!("Failed to load the feed: {}", error);
    }
    for _ in 1..pages {
        match feed.fetch_next_page().await? {
            FetchOutcome::Failed(error) => bail!("Failed to load the feed: {}", error),
            FetchOutcome::Exhausted => break,
            _ => {}
        }
    }

    match feed.view().await? {
        FeedView::Loaded { cards, load_more } => {
            for card in &cards {
                println!("{}\t{}\t{}\t{}", card.id, card.title, card.description, card.url);
            }
            if let Some(button) = load_more {
                println!("-- {} (--pages {}) --", button.label, pages + 1);
            }
        }
        FeedView::Failed { message } => bail!("Failed to load the feed: {}", message),
        FeedView::Loading => bail!("Feed is still loading"),
    }

    drop(feed);
    handle.shutdown().await?;
    Ok(())
}

async fn run_upload(
    config: &Config,
    file: PathBuf,
    title: String,
    description: String,
) -> anyhow::Result<()> {
    let Some(host_config) = &config.image_host else {
        bail!("[image_host] is not configured");
    };

    let api = Arc::new(ApiClient::from_config(config)?);
    let host = Arc::new(ImageHostClient::from_config(host_config, config.request_timeout())?);

    let mut form = UploadForm::new(
        api,
        host,
        Arc::new(FeedCache::new()),
        Arc::new(LogNotifier),
        Arc::new(|| tracing::debug!("upload modal closed")),
    );

    let selected = SelectedFile::from_path(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if let AttachOutcome::Invalid(err) = form.attach_image(selected).await {
        bail!("{}: {}", file.display(), err);
    }
    form.set_title(title);
    form.set_description(description);

    match form.submit().await {
        SubmitOutcome::Created(record) => {
            println!("{}\t{}", record.id, record.url);
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            for (field, err) in errors.iter() {
                eprintln!("{:?}: {}", field, err);
            }
            bail!("Invalid form")
        }
        SubmitOutcome::MissingImage => bail!("Image was not uploaded"),
        SubmitOutcome::Failed(error) => bail!("Failed to create image: {}", error),
        SubmitOutcome::Cancelled => bail!("Upload cancelled"),
    }
}
