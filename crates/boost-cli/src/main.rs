mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{admin, billing, business, review, signup, webhook};

#[derive(Parser)]
#[command(name = "boost")]
#[command(about = "BewertungenBoost CLI - Manage businesses, reviews and subscriptions")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "API server URL")]
    server: Option<String>,

    #[arg(long, global = true, help = "Access token for admin endpoints")]
    access_token: Option<String>,

    #[arg(long, global = true, help = "Output format", default_value = "table")]
    format: output::Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure CLI settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Look up and manage businesses
    Business {
        #[command(subcommand)]
        command: business::Commands,
    },
    /// Submit reviews
    Review {
        #[command(subcommand)]
        command: review::Commands,
    },
    /// Self-service signup and checkout
    Signup {
        #[command(subcommand)]
        command: signup::Commands,
    },
    /// Manage the subscription of your business
    Billing {
        #[command(subcommand)]
        command: billing::Commands,
    },
    /// Admin dashboard and admin accounts
    Admin {
        #[command(subcommand)]
        command: admin::Commands,
    },
    /// Send signed test events to the Stripe webhook endpoint
    #[command(alias = "wh")]
    Webhook {
        #[command(subcommand)]
        command: webhook::Commands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration values
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        access_token: Option<String>,
        #[arg(long)]
        webhook_secret: Option<String>,
    },
    /// Show current configuration
    Show,
    /// Get config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::Config::load()?;

    if let Some(server) = &cli.server {
        cfg.server = server.clone();
    }
    if let Some(token) = &cli.access_token {
        cfg.access_token = Some(token.clone());
    }

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Set {
                server,
                access_token,
                webhook_secret,
            } => {
                if let Some(s) = server {
                    cfg.server = s;
                }
                if let Some(t) = access_token {
                    cfg.access_token = Some(t);
                }
                if let Some(w) = webhook_secret {
                    cfg.webhook_secret = Some(w);
                }
                cfg.save()?;
                output::print_success("Configuration saved");
            }
            ConfigCommands::Show => {
                println!("Server:         {}", cfg.server);
                println!("Access Token:   {}", config::mask(&cfg.access_token));
                println!("Webhook Secret: {}", config::mask(&cfg.webhook_secret));
            }
            ConfigCommands::Path => {
                println!("{}", config::config_path()?.display());
            }
        },
        Commands::Business { command } => {
            business::run(command, &cfg, cli.format).await?;
        }
        Commands::Review { command } => {
            review::run(command, &cfg, cli.format).await?;
        }
        Commands::Signup { command } => {
            signup::run(command, &cfg, cli.format).await?;
        }
        Commands::Billing { command } => {
            billing::run(command, &cfg, cli.format).await?;
        }
        Commands::Admin { command } => {
            admin::run(command, &cfg, cli.format).await?;
        }
        Commands::Webhook { command } => {
            webhook::run(command, &cfg, cli.format).await?;
        }
    }

    Ok(())
}
