use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Create the business and admin link for a freshly registered user
    CreateBusiness {
        #[arg(long, help = "Identity user ID of the new admin")]
        user_id: Uuid,
        #[arg(long)]
        business_name: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        google_review_url: String,
        #[arg(long)]
        email: String,
    },
    /// Start the subscription checkout for a business
    Checkout {
        #[arg(help = "Business ID")]
        business_id: Uuid,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest {
    user_id: Uuid,
    business_name: String,
    address: String,
    google_review_url: String,
    email: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub business_id: Uuid,
    pub slug: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutRequest {
    business_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UrlResponse {
    pub url: String,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::CreateBusiness {
            user_id,
            business_name,
            address,
            google_review_url,
            email,
        } => {
            let req = SignupRequest {
                user_id,
                business_name,
                address,
                google_review_url,
                email,
            };
            let resp: SignupResponse = client
                .post_public("/signup/create-business", &req)
                .await?;
            output::print_created(resp, format);
        }
        Commands::Checkout { business_id } => {
            let resp: UrlResponse = client
                .post_public("/checkout/subscription", &CheckoutRequest { business_id })
                .await?;
            output::print_url("Checkout", &resp.url, format);
        }
    }

    Ok(())
}
