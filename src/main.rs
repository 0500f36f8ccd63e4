//! Pricing Engine CLI

use std::{error::Error, path::PathBuf, process};

use clap::{Args, Parser, Subcommand};
use jiff::Zoned;
use tally::{
    database::{self, Db},
    domain::{
        carts::models::CartLine,
        coupons::{CouponsService, PgCouponsService},
        promotions::{PgPromotionsService, PromotionsService},
    },
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "tally", about = "Promotion and coupon pricing engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price a cart against the automatic promotion catalog
    Quote(QuoteArgs),
    /// Validate a coupon code against an order amount
    ValidateCoupon(ValidateCouponArgs),
}

#[derive(Debug, Args)]
struct QuoteArgs {
    /// Path to a JSON file containing the cart lines
    #[arg(long)]
    cart: PathBuf,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[derive(Debug, Args)]
struct ValidateCouponArgs {
    /// Coupon code as entered by the user
    #[arg(long)]
    code: String,

    /// Order amount in minor units
    #[arg(long)]
    order_amount: u64,

    /// Acting user, when known
    #[arg(long)]
    user: Option<Uuid>,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Quote(args) => quote(args).await,
        Commands::ValidateCoupon(args) => validate_coupon(args).await,
    };

    if let Err(error) = outcome {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn quote(args: QuoteArgs) -> Result<(), Box<dyn Error>> {
    let raw = std::fs::read_to_string(&args.cart)?;
    let lines: Vec<CartLine> = serde_json::from_str(&raw)?;

    let pool = database::connect(&args.database_url).await?;
    let service = PgPromotionsService::new(Db::new(pool));

    let result = service
        .evaluate_automatic_promotions(lines, Zoned::now())
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}

async fn validate_coupon(args: ValidateCouponArgs) -> Result<(), Box<dyn Error>> {
    let pool = database::connect(&args.database_url).await?;
    let service = PgCouponsService::new(Db::new(pool));

    let quote = service
        .validate_coupon(&args.code, args.order_amount, args.user, Zoned::now())
        .await?;

    println!("{}", serde_json::to_string_pretty(&quote)?);

    Ok(())
}
