//! Command-line interface.
//!
//! Thin presentation layer: collects raw strings, calls into the library and
//! prints the result.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use secrecy::SecretString;

use crate::auth::{CredentialStore, FileCredentialStore, Identity};
use crate::config::Config;
use crate::error::{PredictionError, ServiceError};
use crate::history::{JsonlOrderHistory, OrderHistory, OrderRecord, RawOrder};
use crate::prediction::{DeliveryPrediction, Predictor, parse_order_date};
use crate::service::OrderService;

/// Delivery time prediction for retail orders.
#[derive(Parser, Debug)]
#[command(name = "timelytics", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create an account
    Register {
        #[arg(long, env = "TIMELYTICS_EMAIL")]
        email: String,

        #[arg(long, env = "TIMELYTICS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Predict the delivery date for an order
    Predict {
        /// Product category (e.g. Electronics, Clothing, Fragile, Large, Other)
        #[arg(long)]
        category: String,

        /// Customer location (e.g. Local, Regional, Remote, International)
        #[arg(long)]
        location: String,

        /// Shipping method (e.g. Express, Standard, Economy)
        #[arg(long)]
        shipping: String,

        /// Order date as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Record the order under this account
        #[arg(long, env = "TIMELYTICS_EMAIL", requires = "password")]
        email: Option<String>,

        #[arg(long, env = "TIMELYTICS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Show recent orders for an account
    History {
        #[arg(long, env = "TIMELYTICS_EMAIL")]
        email: String,

        #[arg(long, env = "TIMELYTICS_PASSWORD", hide_env_values = true)]
        password: String,

        /// Maximum number of orders to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the active estimation tables as JSON
    Tables,
}

/// Run a command.
pub async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Register { email, password } => register(config, &email, password).await,
        Command::Predict {
            category,
            location,
            shipping,
            date,
            email,
            password,
        } => {
            let raw = RawOrder::new(category, location, shipping);
            let credentials = email.zip(password);
            predict(config, raw, date, credentials).await
        }
        Command::History {
            email,
            password,
            limit,
        } => history(config, &email, password, limit).await,
        Command::Tables => show_tables(config),
    }
}

fn credential_store(config: &Config) -> FileCredentialStore {
    FileCredentialStore::new(config.users_path())
}

async fn login(config: &Config, email: &str, password: String) -> anyhow::Result<Identity> {
    let identity = credential_store(config)
        .authenticate(email, &SecretString::from(password))
        .await?;
    Ok(identity)
}

async fn register(config: &Config, email: &str, password: String) -> anyhow::Result<()> {
    let identity = credential_store(config)
        .register(email, &SecretString::from(password))
        .await?;
    println!("Registered {}. You can now record orders.", identity);
    Ok(())
}

async fn predict(
    config: &Config,
    raw: RawOrder,
    date: Option<String>,
    credentials: Option<(String, String)>,
) -> anyhow::Result<()> {
    let predictor = Arc::new(
        config
            .build_predictor()
            .context("Failed to load estimation tables")?,
    );

    let Some((email, password)) = credentials else {
        let prediction = predict_once(&predictor, &raw, date.as_deref()).map_err(explain)?;
        print_prediction(&raw, &prediction);
        return Ok(());
    };

    let order_date = check_order(&predictor, &raw, date.as_deref()).map_err(explain)?;
    let identity = login(config, &email, password).await?;
    let service = OrderService::new(
        predictor,
        Arc::new(JsonlOrderHistory::new(config.orders_path())),
    );
    let record = match service.place_order(&identity, raw, order_date).await {
        Ok(record) => record,
        Err(ServiceError::Prediction(e)) => return Err(explain(e)),
        Err(e) => return Err(e.into()),
    };

    print_prediction(&record.raw, &record.prediction);
    println!();
    println!("Order {} saved for {}.", record.id, identity);
    Ok(())
}

/// Predict without recording. An explicit date goes through the string
/// surface so attribute errors are reported before date errors.
fn predict_once(
    predictor: &Predictor,
    raw: &RawOrder,
    date: Option<&str>,
) -> Result<DeliveryPrediction, PredictionError> {
    match date {
        Some(raw_date) => predictor.predict_delivery_str(
            &raw.product_category,
            &raw.customer_location,
            &raw.shipping_method,
            raw_date,
        ),
        None => predictor.predict_delivery(
            &raw.product_category,
            &raw.customer_location,
            &raw.shipping_method,
            Local::now().date_naive(),
        ),
    }
}

/// Validate the attributes, then the date, before asking for a login.
fn check_order(
    predictor: &Predictor,
    raw: &RawOrder,
    date: Option<&str>,
) -> Result<NaiveDate, PredictionError> {
    predictor.normalizer().normalize(
        &raw.product_category,
        &raw.customer_location,
        &raw.shipping_method,
    )?;
    match date {
        Some(raw_date) => Ok(parse_order_date(raw_date)?),
        None => Ok(Local::now().date_naive()),
    }
}

async fn history(
    config: &Config,
    email: &str,
    password: String,
    limit: usize,
) -> anyhow::Result<()> {
    let identity = login(config, email, password).await?;
    let records = JsonlOrderHistory::new(config.orders_path())
        .list_for_user(&identity, limit)
        .await?;

    if records.is_empty() {
        println!("No orders recorded for {}.", identity);
        return Ok(());
    }

    println!("Recent orders for {}:", identity);
    println!();
    for record in &records {
        print_history_row(record);
    }
    Ok(())
}

fn show_tables(config: &Config) -> anyhow::Result<()> {
    let data = config.load_reference_data()?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

/// Attach the accepted values to a normalization error so the user knows
/// what to re-enter.
fn explain(err: PredictionError) -> anyhow::Error {
    match &err {
        PredictionError::Normalization(e) => {
            let accepted = e.field.accepted_values().join(", ");
            anyhow::Error::new(err.clone()).context(format!(
                "Please re-enter {} (accepted values: {})",
                e.field, accepted
            ))
        }
        PredictionError::InvalidDate(_) => anyhow::Error::new(err)
            .context("Please re-enter the order date (format: YYYY-MM-DD)"),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}

fn print_prediction(raw: &RawOrder, prediction: &DeliveryPrediction) {
    println!(
        "Predicted delivery time: {} days",
        prediction.predicted_duration_days()
    );
    println!(
        "Expected delivery date:  {}",
        format_date(prediction.estimated_delivery_date)
    );
    println!(
        "Confidence:              {} ({})",
        prediction.estimation.confidence, prediction.estimation.strategy_id
    );
    println!();
    println!("Order summary:");
    println!("  Product category:  {}", raw.product_category);
    println!("  Customer location: {}", raw.customer_location);
    println!("  Shipping method:   {}", raw.shipping_method);
    println!("  Order date:        {}", format_date(prediction.order_date));
}

fn print_history_row(record: &OrderRecord) {
    println!(
        "  {}  {} / {} / {}  ->  {} ({} days, {})",
        record.prediction.order_date,
        record.raw.product_category,
        record.raw.customer_location,
        record.raw.shipping_method,
        record.prediction.estimated_delivery_date,
        record.prediction.predicted_duration_days(),
        record.prediction.estimation.confidence,
    );
}
