//! CLI for the vidrelay video download relay.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vidrelay_core::config::{self, RelayConfig};

use commands::{run_check, run_fetch, run_serve};

/// Top-level CLI for the vidrelay relay.
#[derive(Debug, Parser)]
#[command(name = "vidrelay")]
#[command(about = "vidrelay: stream remote video files to clients as attachments", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the HTTP relay until interrupted.
    Serve {
        /// Port to listen on (overrides config and PORT).
        #[arg(long)]
        port: Option<u16>,
        /// Address to bind (overrides config and VIDRELAY_BIND).
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
        /// Directory with a static UI served for non-API paths.
        #[arg(long, value_name = "DIR")]
        static_dir: Option<PathBuf>,
    },

    /// Validate and probe a URL without transferring the body.
    Check {
        /// Direct HTTP/HTTPS link to a video file.
        url: String,
    },

    /// Download a video through the relay policy into a local file.
    Fetch {
        /// Direct HTTP/HTTPS link to a video file.
        url: String,
        /// Directory to write into (default: current directory).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Replace an existing file with the same name.
        #[arg(long)]
        overwrite: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        cfg.apply_env();
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Serve {
                port,
                bind,
                static_dir,
            } => {
                apply_serve_flags(&mut cfg, port, bind, static_dir);
                run_serve(&cfg).await?;
            }
            CliCommand::Check { url } => run_check(&cfg, &url).await?,
            CliCommand::Fetch {
                url,
                output_dir,
                overwrite,
            } => {
                let dir = match output_dir {
                    Some(d) => d,
                    None => std::env::current_dir()?,
                };
                run_fetch(&cfg, &url, &dir, overwrite).await?;
            }
        }

        Ok(())
    }
}

/// Flags win over file and environment.
fn apply_serve_flags(
    cfg: &mut RelayConfig,
    port: Option<u16>,
    bind: Option<String>,
    static_dir: Option<PathBuf>,
) {
    if let Some(port) = port {
        cfg.port = port;
    }
    if let Some(bind) = bind {
        cfg.bind_address = bind;
    }
    if static_dir.is_some() {
        cfg.static_dir = static_dir;
    }
}

#[cfg(test)]
mod tests;
