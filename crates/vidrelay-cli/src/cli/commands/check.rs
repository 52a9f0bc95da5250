//! `vidrelay check <url>` – validate and probe, no body transfer.

use anyhow::Result;
use vidrelay_core::config::RelayConfig;
use vidrelay_core::probe::ProbeResult;
use vidrelay_core::relay::Relay;

fn describe_length(probe: &ProbeResult) -> String {
    match probe.content_length {
        Some(n) => format!("{} bytes ({:.1} MiB)", n, n as f64 / 1_048_576.0),
        None => "not declared".to_string(),
    }
}

pub async fn run_check(cfg: &RelayConfig, raw_url: &str) -> Result<()> {
    cfg.validate()?;
    let relay = Relay::from_config(cfg)?;
    let url = relay.validate(raw_url)?;
    let probe = relay.probe(&url).await?;

    println!("OK  {}", url);
    println!("  filename:      {}", url.filename());
    println!("  content type:  {}", probe.content_type);
    println!("  length:        {}", describe_length(&probe));
    println!("  ceiling:       {} bytes", relay.policy().max_bytes);
    Ok(())
}
