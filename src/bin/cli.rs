use std::process::ExitCode;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use clap::{Args, Parser, Subcommand};

use paypal_payments::client::http::new_http_client;
use paypal_payments::config;
use paypal_payments::service::payment::service::{
    CreatePaymentParams, ExecutePaymentParams, PaymentIntent, PaymentMethod,
    Service as PaymentService,
};
use paypal_payments::telemetry::{get_subscriber, init_subscriber};

#[derive(Parser)]
#[command(name = "cli", about = "create and execute paypal payments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a payment and print it, including the approval link.
    Create(CreateArgs),
    /// Execute an approved payment.
    Execute(ExecuteArgs),
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    total: String,
    #[arg(long, default_value = "USD")]
    currency: String,
    #[arg(long, default_value = "paypal")]
    method: String,
    #[arg(long, default_value = "sale")]
    intent: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    cancel_url: String,
    #[arg(long)]
    success_url: String,
    #[arg(long)]
    request_id: Option<String>,
}

#[derive(Args)]
struct ExecuteArgs {
    #[arg(long)]
    payment_id: String,
    #[arg(long)]
    payer_id: String,
}

impl TryFrom<CreateArgs> for CreatePaymentParams {
    type Error = String;

    fn try_from(args: CreateArgs) -> Result<Self, Self::Error> {
        let method = PaymentMethod::from(&args.method)
            .ok_or_else(|| format!("invalid payment method {}", args.method))?;
        let intent = PaymentIntent::from(&args.intent)
            .ok_or_else(|| format!("invalid payment intent {}", args.intent))?;
        let total = BigDecimal::from_str(&args.total)
            .map_err(|e| format!("invalid total {}: {}", args.total, e))?;
        Ok(CreatePaymentParams {
            total,
            currency: args.currency,
            method,
            intent,
            description: args.description,
            cancel_url: args.cancel_url,
            success_url: args.success_url,
            request_id: args.request_id,
        })
    }
}

impl From<ExecuteArgs> for ExecutePaymentParams {
    fn from(args: ExecuteArgs) -> Self {
        ExecutePaymentParams {
            payment_id: args.payment_id,
            payer_id: args.payer_id,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let subscriber = get_subscriber("paypal-payments-cli".into(), "warn".into(), std::io::stderr);
    init_subscriber(subscriber);

    match run(cli.command).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let cfg = config::Settings::new()?;
    let http_client = new_http_client(&cfg.paypal)?;
    let payment_service = PaymentService::new(&cfg.paypal, http_client)?;

    let payment = match command {
        Command::Create(args) => {
            payment_service
                .create_payment(CreatePaymentParams::try_from(args)?)
                .await?
        }
        Command::Execute(args) => payment_service.execute_payment(args.into()).await?,
    };
    Ok(serde_json::to_string_pretty(&payment)?)
}
