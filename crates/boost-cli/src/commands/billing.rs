use anyhow::Result;
use clap::Subcommand;
use serde::Deserialize;

use super::signup::UrlResponse;
use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Cancel the subscription at the end of the current period
    Cancel,
    /// Open a Stripe billing portal session
    Portal,
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    success: bool,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Cancel => {
            let resp: SuccessResponse = client.post("/billing/cancel", &()).await?;
            match format {
                Format::Json => output::print_json(&serde_json::json!({ "success": resp.success })),
                Format::Table => {
                    output::print_success("Subscription ends with the current billing period")
                }
            }
        }
        Commands::Portal => {
            let resp: UrlResponse = client.post("/billing/portal", &()).await?;
            output::print_url("Billing portal", &resp.url, format);
        }
    }

    Ok(())
}
