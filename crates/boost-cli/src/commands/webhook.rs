use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

type HmacSha256 = Hmac<Sha256>;

#[derive(Subcommand)]
pub enum Commands {
    /// Post a Stripe event payload to the webhook endpoint, signed like Stripe does
    Send {
        #[arg(help = "Path to the event JSON")]
        file: PathBuf,
        #[arg(long, help = "Signing secret, overrides the configured one")]
        secret: Option<String>,
        #[arg(long, help = "Send without a Stripe-Signature header")]
        unsigned: bool,
    },
    /// Print the Stripe-Signature header for a payload
    Sign {
        #[arg(help = "Path to the event JSON")]
        file: PathBuf,
        #[arg(long)]
        secret: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct WebhookAck {
    received: bool,
}

/// `t=<unix>,v1=<hex hmac-sha256 of "<t>.<payload>">`
pub fn signature_header(payload: &str, secret: &str, timestamp: i64) -> Result<String> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).context("invalid signing secret")?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("t={},v1={}", timestamp, signature))
}

fn resolve_secret(flag: Option<String>, config: &Config) -> Result<String> {
    flag.or_else(|| config.webhook_secret.clone()).context(
        "no webhook secret, pass --secret or run `boost config set --webhook-secret <secret>`",
    )
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    match cmd {
        Commands::Send {
            file,
            secret,
            unsigned,
        } => {
            let payload = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let signature = if unsigned {
                None
            } else {
                let secret = resolve_secret(secret, config)?;
                Some(signature_header(&payload, &secret, Utc::now().timestamp())?)
            };

            let client = ApiClient::new(config);
            let ack: WebhookAck = client.post_webhook(payload, signature.as_deref()).await?;
            match format {
                Format::Json => output::print_json(&serde_json::json!({ "received": ack.received })),
                Format::Table => output::print_success("Webhook accepted"),
            }
        }
        Commands::Sign { file, secret } => {
            let payload = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let secret = resolve_secret(secret, config)?;
            println!("{}", signature_header(&payload, &secret, Utc::now().timestamp())?);
        }
    }

    Ok(())
}
