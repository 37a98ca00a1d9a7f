//! Command-line interface.
//!
//! Without a subcommand the binary runs the server. The subcommands talk to
//! a running server through [`SiteClient`]:
//! - `status` - Server health and content counts
//! - `projects` / `blogs` / `blog <slug>` / `pricing` - Browse published content
//! - `contact` - Send a contact message
//! - `chat <message>` - Ask the site assistant
//! - `config check` - Validate the configuration file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::client::{ChatSession, ClientError, SiteClient};
use crate::db::ContactInput;
use crate::ui::{category_label, format_price};
use crate::utils::truncate;

#[derive(Parser, Debug)]
#[command(name = "atelier")]
#[command(author, version, about = "Agency website, portfolio showcase and content dashboard", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "atelier.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API URL to connect to
    #[arg(long, env = "ATELIER_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Admin token (can also be set via ATELIER_TOKEN env var)
    #[arg(long, env = "ATELIER_TOKEN")]
    pub token: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show server status
    Status,

    /// List published projects
    Projects {
        /// Only this category (e.g. ai-automation)
        #[arg(long)]
        category: Option<String>,
        /// Maximum number of projects
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },

    /// List blog posts
    Blogs,

    /// Show one blog post
    Blog {
        /// Post slug
        slug: String,
    },

    /// Show pricing plans
    Pricing,

    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "")]
        phone: String,
    },

    /// Ask the site assistant a question
    Chat {
        message: String,
    },

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

fn create_client(cli: &Cli) -> Result<SiteClient> {
    Ok(SiteClient::new(cli.api_url.as_str())
        .context("Failed to create HTTP client")?
        .with_token(cli.token.clone()))
}

/// Context for a failed request, with a hint when the server is unreachable
fn request_failed(e: ClientError) -> anyhow::Error {
    match e {
        ClientError::Transport(ref inner) if inner.is_connect() => {
            anyhow::Error::new(e).context("Failed to connect to server. Is atelier running?")
        }
        other => anyhow::Error::new(other),
    }
}

/// Run a CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Status) => cmd_status(cli).await,
        Some(Commands::Projects { category, limit }) => {
            cmd_projects(cli, category.as_deref(), *limit).await
        }
        Some(Commands::Blogs) => cmd_blogs(cli).await,
        Some(Commands::Blog { slug }) => cmd_blog(cli, slug).await,
        Some(Commands::Pricing) => cmd_pricing(cli).await,
        Some(Commands::Contact {
            name,
            email,
            message,
            phone,
        }) => {
            let input = ContactInput {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                message: message.clone(),
                website_url: String::new(),
            };
            cmd_contact(cli, &input).await
        }
        Some(Commands::Chat { message }) => cmd_chat(cli, message).await,
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        None => {
            // No subcommand means start the server - this is handled in main.rs
            Ok(())
        }
    }
}

async fn cmd_status(cli: &Cli) -> Result<()> {
    let client = create_client(cli)?;
    println!("Connecting to {}...", client.base_url());

    let health = client.health().await.map_err(request_failed)?;
    let settings = client.settings().await.ok();
    let projects = client.projects(None, None).await.ok();
    let blogs = client.blogs().await.ok();
    let plans = client.pricing().await.ok();

    println!();
    println!("=== Atelier Server Status ===");
    println!();
    let healthy = health.trim() == "OK";
    println!(
        "Status:     {} {}",
        if healthy { "[OK]" } else { "[!!]" },
        if healthy { "Healthy" } else { health.trim() }
    );
    if let Some(settings) = settings {
        println!("Site:       {} - {}", settings.site_name, settings.tagline);
    }
    println!();
    println!("Content:");
    print_count("Projects", projects.map(|p| p.len()));
    print_count("Blog posts", blogs.map(|b| b.len()));
    print_count("Plans", plans.map(|p| p.len()));

    if cli.token.is_some() {
        println!();
        println!("Inbox:");
        let orders = client.orders().await.map_err(request_failed)?;
        let messages = client.messages().await.map_err(request_failed)?;
        let pending = orders.iter().filter(|o| o.status == "pending").count();
        let unread = messages.iter().filter(|m| m.status == "new").count();
        println!("  Orders:     {} ({} pending)", orders.len(), pending);
        println!("  Messages:   {} ({} unread)", messages.len(), unread);
    }

    println!();
    Ok(())
}

fn print_count(name: &str, count: Option<usize>) {
    match count {
        Some(count) => println!("  {:12}{}", format!("{}:", name), count),
        None => println!("  {:12}[!!] unavailable", format!("{}:", name)),
    }
}

async fn cmd_projects(cli: &Cli, category: Option<&str>, limit: Option<u32>) -> Result<()> {
    let client = create_client(cli)?;
    let projects = client
        .projects(category, limit)
        .await
        .map_err(request_failed)?;

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    println!();
    println!(
        "{:<30}  {:<22}  {:<24}  {:<6}  {}",
        "SLUG", "CATEGORY", "CLIENT", "YEAR", "TITLE"
    );
    println!("{}", "-".repeat(110));
    for project in projects {
        println!(
            "{:<30}  {:<22}  {:<24}  {:<6}  {}{}",
            truncate(&project.slug, 30),
            category_label(&project.category),
            truncate(&project.client, 24),
            project.year,
            project.title,
            if project.featured { " *" } else { "" }
        );
    }
    println!();
    Ok(())
}

async fn cmd_blogs(cli: &Cli) -> Result<()> {
    let client = create_client(cli)?;
    let blogs = client.blogs().await.map_err(request_failed)?;

    if blogs.is_empty() {
        println!("No blog posts found.");
        return Ok(());
    }

    println!();
    println!("{:<12}  {:<36}  {}", "DATE", "SLUG", "TITLE");
    println!("{}", "-".repeat(90));
    for blog in blogs {
        println!(
            "{:<12}  {:<36}  {}",
            blog.publication_date.get(..10).unwrap_or(&blog.publication_date),
            truncate(&blog.slug, 36),
            blog.title
        );
    }
    println!();
    Ok(())
}

async fn cmd_blog(cli: &Cli, slug: &str) -> Result<()> {
    let client = create_client(cli)?;
    let Some(blog) = client.blog(slug).await.map_err(request_failed)? else {
        anyhow::bail!("Blog not found: {}", slug);
    };

    println!();
    println!("=== {} ===", blog.title);
    println!();
    println!("Author:     {}", blog.author);
    println!("Published:  {}", blog.publication_date);
    if !blog.category.is_empty() {
        println!("Category:   {}", blog.category);
    }
    println!();
    if !blog.excerpt.is_empty() {
        println!("{}", blog.excerpt);
        println!();
    }
    println!("{}", blog.text);
    println!();
    Ok(())
}

async fn cmd_pricing(cli: &Cli) -> Result<()> {
    let client = create_client(cli)?;
    let plans = client.pricing().await.map_err(request_failed)?;

    if plans.is_empty() {
        println!("No pricing plans found.");
        return Ok(());
    }

    println!();
    for plan in plans {
        let price = if plan.is_custom {
            "Custom quote".to_string()
        } else {
            format!("{} {}", plan.currency, format_price(plan.price))
        };
        println!(
            "{}{}  {}{}",
            plan.name,
            if plan.popular { " (most popular)" } else { "" },
            price,
            if plan.period.is_empty() {
                String::new()
            } else {
                format!(" / {}", plan.period)
            }
        );
        if !plan.tagline.is_empty() {
            println!("  {}", plan.tagline);
        }
        for feature in &plan.features {
            println!("  - {}", feature);
        }
        println!("  id: {}", plan.id);
        println!();
    }
    Ok(())
}

async fn cmd_contact(cli: &Cli, input: &ContactInput) -> Result<()> {
    let client = create_client(cli)?;
    client.submit_contact(input).await.map_err(request_failed)?;
    println!("[OK] Message sent. Thank you, {}!", input.name);
    Ok(())
}

async fn cmd_chat(cli: &Cli, message: &str) -> Result<()> {
    let client = create_client(cli)?;
    let mut session = ChatSession::new();
    let reply = session.send(&client, message).await?;
    println!("{}", reply);
    Ok(())
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli) -> Result<()> {
    use crate::config::Config;

    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!("[!!] Configuration file not found: {}", config_path.display());
        println!();
        println!("A default configuration will be used when starting the server.");
        println!("To create a custom configuration, copy atelier.example.toml to atelier.toml");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("Server:");
            println!("  Host:         {}", config.server.host);
            println!("  Port:         {}", config.server.port);
            println!("  Data Dir:     {}", config.server.data_dir.display());
            println!("  Uploads Dir:  {}", config.server.uploads_dir.display());
            println!();
            println!("Features:");
            println!(
                "  Rate Limiting: {}",
                enabled(config.rate_limit.enabled)
            );
            println!(
                "  Chat:         {}",
                config.chat.upstream_url.as_deref().unwrap_or("Disabled")
            );
            println!("  Metrics:      {}", enabled(config.metrics.enabled));
            println!(
                "  Upload Limit: {} MB",
                config.uploads.max_bytes / (1024 * 1024)
            );
            println!();

            let warnings = config_warnings(&config);
            if !warnings.is_empty() {
                println!("Warnings:");
                for warning in warnings {
                    println!("  [!] {}", warning);
                }
                println!();
            }

            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            println!("Please check the configuration file syntax and try again.");
            anyhow::bail!("Invalid configuration file");
        }
    }
}

fn enabled(on: bool) -> &'static str {
    if on {
        "Enabled"
    } else {
        "Disabled"
    }
}

fn config_warnings(config: &crate::config::Config) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.auth.admin_token.len() < 16 {
        warnings.push("Admin token is shorter than 16 characters");
    }
    if config.chat.upstream_url.is_some() && config.chat.api_key.is_none() {
        warnings.push("Chat upstream is set without an API key");
    }
    if config.server.public_url.is_empty() {
        warnings.push("No public_url set - upload URLs will be relative");
    }
    warnings
}
