//! # Lustre CLI
//!
//! Operator entry point for the checkout rules.
//!
//! ## Commands
//! ```text
//! lustre template [--output bulk.csv]
//! lustre validate-csv orders.csv [--config checkout.toml]
//! lustre promo --seed seed.json --code GIFT5 --total 2000
//! lustre gift-card --seed seed.json --code GIFT-AB12-CD34-EF56 --total 1500 [--redeem]
//! lustre issue-gift-card --amount 5000 --recipient-name "Asha" --recipient-email asha@example.com
//! ```
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Subscriber};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use lustre_checkout::{
    validate_csv_file, CheckoutConfig, GiftCardService, InMemoryStore, LocalFile,
    PromoCodeService, StoreSeed,
};
use lustre_core::bulk_order::{generate_csv_template, BulkOrderQuote};
use lustre_core::gift_card::GiftCardPurchase;
use lustre_core::money::Money;
use lustre_core::validation::{parse_amount, validate_design_theme};
use lustre_core::GiftCard;

const DEFAULT_LOG_FILTER: &str = "info,lustre=debug";

#[derive(Debug, Parser)]
#[command(name = "lustre", about = "Lustre checkout tools", long_about = None)]
struct Cli {
    /// checkout.toml to use instead of the platform default
    #[arg(long, global = true, env = "LUSTRE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the bulk order CSV template
    Template {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Validate a bulk order CSV file
    ValidateCsv {
        path: PathBuf,
    },

    /// Validate a promo code against an order total
    Promo(QuoteArgs),

    /// Validate, or redeem, a gift card against an order total
    GiftCard {
        #[command(flatten)]
        quote: QuoteArgs,

        /// Apply the card and print the redemption (seed file is not rewritten)
        #[arg(long)]
        redeem: bool,
    },

    /// Issue a new gift card and print it
    IssueGiftCard(IssueArgs),
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// JSON file with `promo_codes` and `gift_cards` arrays
    #[arg(long)]
    seed: PathBuf,

    #[arg(long)]
    code: String,

    /// Order total in rupees
    #[arg(long)]
    total: String,
}

#[derive(Debug, Args)]
struct IssueArgs {
    /// Face value in rupees
    #[arg(long)]
    amount: String,

    #[arg(long)]
    recipient_name: String,

    #[arg(long)]
    recipient_email: String,

    #[arg(long, default_value = "classic")]
    theme: String,

    #[arg(long)]
    sender_name: Option<String>,

    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    run(cli).await
}

/// Initializes the tracing subscriber for logging.
///
/// ## Log Levels
/// - ERROR: Something failed
/// - WARN: Something unexpected, like a store lookup failure
/// - INFO: Redemptions and usage changes
/// - DEBUG: Lookups and validation results
///
/// Override with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    build_subscriber(filter).init();
}

fn build_subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Template { output } => template(output).await,
        Commands::ValidateCsv { path } => validate_csv(path, cli.config).await,
        Commands::Promo(args) => promo(args).await,
        Commands::GiftCard { quote, redeem } => gift_card(quote, redeem, cli.config).await,
        Commands::IssueGiftCard(args) => issue_gift_card(args),
    }
}

async fn template(output: Option<PathBuf>) -> Result<()> {
    let template = generate_csv_template();

    match output {
        Some(path) => {
            tokio::fs::write(&path, format!("{template}\n"))
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(?path, "CSV template written");
        }
        None => println!("{template}"),
    }
    Ok(())
}

async fn validate_csv(path: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let config = CheckoutConfig::load(config).context("failed to load checkout config")?;
    let file = LocalFile::open(&path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;

    let result = validate_csv_file(&file, &config.bulk_order_limits()).await;
    print_json(&result)?;

    if result.valid {
        print_json(&BulkOrderQuote::from_rows(&result.valid_rows))?;
        Ok(())
    } else {
        bail!("{} problem(s) found in {}", result.errors.len(), path.display())
    }
}

async fn promo(args: QuoteArgs) -> Result<()> {
    let store = load_store(&args.seed).await?;
    let total = parse_total(&args.total)?;

    let service = PromoCodeService::new(Arc::new(store));
    let result = service.validate(&args.code, total).await;
    print_json(&result)
}

async fn gift_card(args: QuoteArgs, redeem: bool, config: Option<PathBuf>) -> Result<()> {
    let config = CheckoutConfig::load(config).context("failed to load checkout config")?;
    let store = load_store(&args.seed).await?;
    let total = parse_total(&args.total)?;

    let service = GiftCardService::new(Arc::new(store))
        .with_balance_validity(config.balance.validity_months);

    if redeem {
        let redemption = service.redeem(&args.code, total).await?;
        print_json(&redemption)
    } else {
        let result = service.validate(&args.code, total).await;
        print_json(&result)
    }
}

fn issue_gift_card(args: IssueArgs) -> Result<()> {
    let purchase = GiftCardPurchase {
        amount: parse_amount(&args.amount)?,
        design_theme: validate_design_theme(&args.theme)?,
        recipient_name: args.recipient_name,
        recipient_email: args.recipient_email,
        sender_name: args.sender_name,
        personal_message: args.message,
    };

    let errors = purchase.validate();
    if !errors.is_empty() {
        for err in &errors {
            eprintln!("{err}");
        }
        bail!("gift card purchase is invalid");
    }

    let card = GiftCard::issue(purchase, chrono::Utc::now())?;
    info!(code = %card.code, amount = %card.face_value(), "Gift card issued");
    print_json(&card)
}

async fn load_store(seed: &Path) -> Result<InMemoryStore> {
    let seed = StoreSeed::from_file(seed)
        .await
        .with_context(|| format!("failed to load seed file {}", seed.display()))?;
    Ok(InMemoryStore::from_seed(seed))
}

fn parse_total(raw: &str) -> Result<Money> {
    let total = parse_amount(raw)?;
    if total.is_negative() {
        bail!("order total must not be negative");
    }
    Ok(total)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tracing::Level;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_redeem_help_describes_output() {
        let cmd = Cli::command();
        let gift_card = cmd.find_subcommand("gift-card").unwrap();
        let redeem = gift_card
            .get_arguments()
            .find(|arg| arg.get_id() == "redeem")
            .unwrap();

        let help = redeem.get_help().unwrap().to_string();
        assert!(help.contains("redemption"), "{help}");
    }

    #[test]
    fn test_default_filter_is_honored() {
        let subscriber = build_subscriber(EnvFilter::new(DEFAULT_LOG_FILTER));

        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "lustre_checkout::store", Level::DEBUG));
            assert!(tracing::enabled!(target: "hyper::proto", Level::INFO));
            assert!(!tracing::enabled!(target: "hyper::proto", Level::DEBUG));
            assert!(!tracing::enabled!(target: "lustre_checkout::store", Level::TRACE));
        });
    }
}
