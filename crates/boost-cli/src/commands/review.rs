use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, display_option, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a star rating the way the review page does
    Create {
        #[arg(long)]
        business_id: Uuid,
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=5))]
        rating: i32,
        #[arg(long)]
        message: Option<String>,
    },
    /// Attach the private message to a review that has none yet
    Message {
        #[arg(help = "Review ID")]
        id: Uuid,
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    business_id: Uuid,
    rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageRequest {
    review_id: Uuid,
    message: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Review {
    pub id: Uuid,
    pub rating: i32,
    #[tabled(display_with = "display_option")]
    pub message: Option<String>,
    pub redirected_to_google: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewResponse {
    review: Review,
    redirect_url: Option<String>,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Create {
            business_id,
            rating,
            message,
        } => {
            let req = CreateRequest {
                business_id,
                rating,
                message,
            };
            let resp: ReviewResponse = client.post_public("/reviews", &req).await?;
            match format {
                Format::Json => output::print_json(&resp),
                Format::Table => {
                    output::print_created(resp.review, format);
                    match resp.redirect_url {
                        Some(url) => output::print_url("Redirect", &url, format),
                        None => println!("Kept private"),
                    }
                }
            }
        }
        Commands::Message { id, message } => {
            let req = MessageRequest {
                review_id: id,
                message,
            };
            let resp: ReviewResponse = client.patch_public("/reviews", &req).await?;
            output::print_item(resp.review, format);
        }
    }

    Ok(())
}
