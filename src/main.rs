use std::fs;

use anyhow::{Context, Result};
use livepatch::{transport, ClientConfig, Interaction, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_DOCUMENT: &str = r#"<!DOCTYPE html><html><body><div id="app"></div></body></html>"#;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let session_id = args
        .next()
        .context("usage: livepatch <session-id> [initial.html]")?;
    let document_path = args.next();

    let subscriber_result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .try_init();
    if subscriber_result.is_err() {
        // tracing was already initialised; continue silently
    }

    let config = ClientConfig::from_env().context("failed to load client configuration")?;
    let html = match document_path {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read initial document {path}"))?,
        None => DEFAULT_DOCUMENT.to_string(),
    };
    let url = config
        .endpoint_for(&session_id)
        .context("failed to build connection endpoint")?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let outcome = rt.block_on(async move {
        let mut session = Session::new(&html, &config);

        let (interaction_tx, interaction_rx) = unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match Interaction::parse(&line) {
                    Some(interaction) => {
                        if interaction_tx.send(interaction).is_err() {
                            break;
                        }
                    }
                    None => warn!("expected '<event> <selector>', got {line:?}"),
                }
            }
        });

        transport::run(&mut session, &url, interaction_rx)
            .await
            .with_context(|| format!("connection to {url} failed"))
    });

    // The stdin reader sits in an uncancellable blocking read.
    rt.shutdown_background();
    outcome
}
