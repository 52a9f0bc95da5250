//! `vidrelay fetch <url>` – stream a video into a local file under the relay policy.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::BufWriter;
use vidrelay_core::config::RelayConfig;
use vidrelay_core::probe::ProbeResult;
use vidrelay_core::relay::Relay;
use vidrelay_core::url_model::ValidatedUrl;

/// `<dir>/<name>.part`, renamed to `<dir>/<name>` once the body is complete.
fn part_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    final_path.with_file_name(name)
}

pub async fn run_fetch(
    cfg: &RelayConfig,
    raw_url: &str,
    output_dir: &Path,
    overwrite: bool,
) -> Result<()> {
    cfg.validate()?;
    let relay = Relay::from_config(cfg)?;
    let url = relay.validate(raw_url)?;

    let final_path = output_dir.join(url.filename());
    if !overwrite && fs::try_exists(&final_path).await.unwrap_or(false) {
        bail!(
            "{} already exists (use --overwrite to replace it)",
            final_path.display()
        );
    }

    let probe = relay.probe(&url).await?;
    fetch_into(&relay, &url, &probe, &final_path).await
}

async fn fetch_into(
    relay: &Relay,
    url: &ValidatedUrl,
    probe: &ProbeResult,
    final_path: &Path,
) -> Result<()> {
    let part = part_path(final_path);
    let file = fs::File::create(&part)
        .await
        .with_context(|| format!("failed to create {}", part.display()))?;
    let mut sink = BufWriter::new(file);

    let outcome = match relay.stream_to(url, probe, &mut sink).await {
        Ok(outcome) => outcome,
        Err(err) => {
            drop(sink);
            if let Err(e) = fs::remove_file(&part).await {
                tracing::warn!("failed to remove {}: {}", part.display(), e);
            }
            return Err(err).with_context(|| format!("download of {} failed", url));
        }
    };
    drop(sink);

    fs::rename(&part, final_path)
        .await
        .with_context(|| format!("failed to move {} into place", part.display()))?;

    tracing::info!(
        path = %final_path.display(),
        bytes = outcome.bytes_written,
        "fetch complete"
    );
    println!(
        "Saved {} ({} bytes, {})",
        final_path.display(),
        outcome.bytes_written,
        outcome.content_type
    );
    Ok(())
}
