use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tabled::Tabled;
use uuid::Uuid;

use super::business::Business;
use super::review::Review;
use crate::client::ApiClient;
use crate::config::Config;
use crate::output::{self, display_option, Format};

#[derive(Subcommand)]
pub enum Commands {
    /// Show the dashboard for the logged-in admin
    Dashboard,
    /// Create the first super-admin (only works once)
    Setup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create a tenant admin for a business (super-admin only)
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        business_id: Uuid,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    email: String,
    password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    business_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Tabled)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    #[tabled(display_with = "display_uuid")]
    pub business_id: Option<Uuid>,
    pub is_super_admin: bool,
}

#[derive(Debug, Deserialize)]
struct AdminCreated {
    admin: Admin,
}

#[derive(Debug, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct Stats {
    total_reviews: i64,
    average_rating: f64,
    private_reviews: i64,
    google_redirects: i64,
}

#[derive(Debug, Deserialize, Tabled)]
#[serde(rename_all = "camelCase")]
struct ValueSummary {
    protection_rate: i64,
    estimated_revenue_saved: i64,
    rating_without_protection: String,
    rating_with_protection: String,
    months_active: i64,
    roi_multiplier: i64,
}

#[derive(Debug, Deserialize, Tabled)]
struct Subscription {
    business_id: Uuid,
    #[tabled(display_with = "display_option")]
    stripe_subscription_id: Option<String>,
    status: String,
    #[tabled(display_with = "display_time")]
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
}

#[derive(Debug, Deserialize, Tabled)]
struct Payment {
    #[tabled(display_with = "display_option")]
    stripe_invoice_id: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    currency: String,
    status: String,
    #[tabled(display_with = "display_time")]
    paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TenantDashboard {
    business: Business,
    stats: Stats,
    value: ValueSummary,
    recent_reviews: Vec<Review>,
    subscription: Option<Subscription>,
    payments: Vec<Payment>,
}

#[derive(Debug, Deserialize)]
struct GlobalOverview {
    businesses: Vec<Business>,
    admins: Vec<Admin>,
    subscriptions: Vec<Subscription>,
    payments: Vec<Payment>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
enum Dashboard {
    Tenant(Box<TenantDashboard>),
    Global(GlobalOverview),
}

fn display_uuid(o: &Option<Uuid>) -> String {
    o.map(|id| id.to_string()).unwrap_or_else(|| "-".into())
}

fn display_time(o: &Option<DateTime<Utc>>) -> String {
    o.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into())
}

fn section(title: &str) {
    println!();
    println!("{}", title);
}

fn print_tenant(dashboard: TenantDashboard) {
    output::print_single(dashboard.business);
    section("Reviews");
    output::print_single(dashboard.stats);
    section("Value");
    output::print_single(dashboard.value);
    section("Subscription");
    match dashboard.subscription {
        Some(sub) => output::print_single(sub),
        None => println!("No subscription"),
    }
    if !dashboard.payments.is_empty() {
        section("Payments");
        output::print_table(dashboard.payments);
    }
    if !dashboard.recent_reviews.is_empty() {
        section("Recent reviews");
        output::print_table(dashboard.recent_reviews);
    }
}

fn print_global(overview: GlobalOverview) {
    section("Businesses");
    output::print_items(overview.businesses, Format::Table);
    section("Admins");
    output::print_items(overview.admins, Format::Table);
    section("Subscriptions");
    if overview.subscriptions.is_empty() {
        println!("No results");
    } else {
        output::print_table(overview.subscriptions);
    }
    section("Payments");
    if overview.payments.is_empty() {
        println!("No results");
    } else {
        output::print_table(overview.payments);
    }
}

pub async fn run(cmd: Commands, config: &Config, format: Format) -> Result<()> {
    let client = ApiClient::new(config);

    match cmd {
        Commands::Dashboard => {
            let raw: serde_json::Value = client.get("/admin/dashboard").await?;
            match format {
                Format::Json => output::print_json(&raw),
                Format::Table => {
                    let dashboard: Dashboard =
                        serde_json::from_value(raw).context("unexpected dashboard shape")?;
                    match dashboard {
                        Dashboard::Tenant(tenant) => print_tenant(*tenant),
                        Dashboard::Global(overview) => print_global(overview),
                    }
                }
            }
        }
        Commands::Setup { email, password } => {
            let req = CreateRequest {
                email,
                password,
                business_id: None,
            };
            let resp: AdminCreated = client.post_public("/admin/setup", &req).await?;
            output::print_created(resp.admin, format);
        }
        Commands::Create {
            email,
            password,
            business_id,
        } => {
            let req = CreateRequest {
                email,
                password,
                business_id: Some(business_id),
            };
            let resp: AdminCreated = client.post("/admin/create-admin", &req).await?;
            output::print_created(resp.admin, format);
        }
    }

    Ok(())
}
