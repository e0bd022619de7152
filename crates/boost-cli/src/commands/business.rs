use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, display_option, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Show the public profile behind a review page slug
    Show {
        #[arg(help = "Business slug")]
        slug: String,
    },
    /// Create a business (super-admin only)
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, help = "Defaults to a slug derived from the name")]
        slug: Option<String>,
        #[arg(long)]
        google_review_url: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        logo_url: Option<String>,
    },
    /// Delete a business with its reviews, admins and subscriptions (super-admin only)
    Delete {
        #[arg(help = "Business ID")]
        id: Uuid,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    google_review_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
pub struct PublicBusiness {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[tabled(display_with = "display_option")]
    pub address: Option<String>,
    pub google_review_url: String,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Business {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[tabled(display_with = "display_option")]
    pub address: Option<String>,
    pub google_review_url: String,
    #[tabled(display_with = "display_option")]
    pub stripe_customer_id: Option<String>,
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Show { slug } => {
            let business: PublicBusiness =
                client.get_public(&format!("/businesses/{}", slug)).await?;
            output::print_item(business, format);
        }
        Commands::Create {
            name,
            slug,
            google_review_url,
            address,
            logo_url,
        } => {
            let req = CreateRequest {
                name,
                slug,
                google_review_url,
                address,
                logo_url,
            };
            let business: Business = client.post("/admin/businesses", &req).await?;
            output::print_created(business, format);
        }
        Commands::Delete { id } => {
            client.delete(&format!("/admin/businesses/{}", id)).await?;
            output::print_success(&format!("Business {} deleted", id));
        }
    }

    Ok(())
}
