//! Terminal front-end for the wallet view-model.

use bigdecimal::BigDecimal;
use clap::{builder::BoolishValueParser, Parser, Subcommand};
use rust_wallet_gateway::activity::DayGroup;
use rust_wallet_gateway::core::view_model::WalletViewModel;
use rust_wallet_gateway::errors::AppError;
use rust_wallet_gateway::integrations::wallet_client::WalletClient;
use rust_wallet_gateway::local_store::JsonFileStore;
use rust_wallet_gateway::profile::{ViewModelOptions, WalletProfile};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// wallet-cli - Mono sandbox wallet in the terminal
#[derive(Parser, Debug)]
#[command(name = "wallet-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Gateway action endpoint
    #[arg(long, env = "WALLET_GATEWAY_URL", default_value = "http://localhost:8888/api")]
    gateway_url: String,

    /// File holding local wallet state
    #[arg(long, env = "WALLET_STORE_PATH", default_value = "wallet-store.json")]
    store: PathBuf,

    /// Show demo balance, cards and activity layered with real results
    #[arg(
        long,
        env = "WALLET_DEMO_MODE",
        default_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    demo_mode: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Greeting, balance, first cards and recent activity (default)
    Dashboard,

    /// Full activity feed grouped by day
    Activity,

    /// All cards of the primary account
    Cards,

    /// Top up the primary account
    Topup {
        /// Amount in COP (defaults to the profile's top-up amount)
        #[arg(value_parser = parse_amount)]
        amount: Option<BigDecimal>,
    },

    /// Send money from the primary account
    Send {
        /// Receiving ledger account
        account_id: String,
        /// Amount in COP
        #[arg(value_parser = parse_amount)]
        amount: BigDecimal,
        /// Message shown on the receipt
        message: Option<String>,
    },

    /// Create a virtual card
    CreateCard {
        /// Card program id (ccg_...)
        program: Option<String>,
        /// Card nickname
        nickname: Option<String>,
    },

    /// List saved recipients
    #[command(alias = "ls")]
    Recipients,

    /// Add or replace a saved recipient
    SaveRecipient {
        /// Display name
        name: String,
        /// Ledger account id
        account_id: String,
    },
}

fn parse_amount(raw: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(raw.trim()).map_err(|_| format!("invalid amount: {}", raw))
}

fn print_groups(groups: &[DayGroup]) {
    if groups.is_empty() {
        println!("No activity yet.");
    }
    for group in groups {
        println!("{}", group.day);
        for entry in &group.entries {
            let icon = if entry.is_card { "[card]" } else { "[wallet]" };
            println!(
                "  {} {:<36} {:>20}  {} · {}",
                icon, entry.title, entry.amount_text, entry.sub, entry.time_of_day
            );
        }
    }
}

async fn run(vm: &WalletViewModel<JsonFileStore>, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Dashboard => {
            let dashboard = vm.dashboard().await?;
            println!("{}", dashboard.greeting);
            println!("Account {}", dashboard.account_mask);
            println!("Balance COP {}", dashboard.balance_text);
            println!();
            println!("Cards");
            for card in &dashboard.cards {
                println!("  {}  ({})", card.title, card.subtitle);
            }
            println!();
            print_groups(&dashboard.activity);
        }
        Commands::Activity => {
            vm.seed_demo_data_once()?;
            print_groups(&vm.activity_feed()?);
        }
        Commands::Cards => {
            vm.seed_demo_data_once()?;
            let cards = vm.cards().await?;
            if cards.is_empty() {
                println!("No cards yet.");
            }
            for card in cards {
                println!("{}  ({})", card.title, card.subtitle);
            }
        }
        Commands::Topup { amount } => {
            vm.topup(amount).await?;
            println!("Topup success ✅");
        }
        Commands::Send {
            account_id,
            amount,
            message,
        } => {
            let preview = vm.confirm_transfer(Some(account_id.as_str()), Some(&amount))?;
            println!(
                "Sending {} to {} {}",
                preview.amount_text, preview.recipient_name, preview.recipient_mask
            );

            let receipt = vm
                .send_money(&account_id, &amount, message.as_deref())
                .await?;
            println!("Transfer sent ✅");
            println!("  Amount      {}", receipt.amount_text);
            println!("  Date        {}", receipt.date);
            println!("  Message     {}", receipt.message);
            println!("  To          {} {}", receipt.recipient_name, receipt.account_mask);
            println!("  Transaction {}", receipt.transaction_id);
            println!("  Status      {}", receipt.status);
        }
        Commands::CreateCard { program, nickname } => {
            vm.create_card(program.as_deref(), nickname.as_deref())
                .await?;
            println!("Card created ✅");
        }
        Commands::Recipients => {
            for recipient in vm.recipients()? {
                println!("{:<20} {}", recipient.name, vm.mask(&recipient.account_id)?);
            }
        }
        Commands::SaveRecipient { name, account_id } => {
            let saved = vm.save_recipient(&name, &account_id)?;
            println!("Recipient saved: {}", saved.name);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_wallet_gateway=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let profile = WalletProfile::from_env()?;
    let options = if cli.demo_mode {
        ViewModelOptions::default()
    } else {
        ViewModelOptions::live()
    };

    let client = WalletClient::new(&cli.gateway_url)?;
    let store = JsonFileStore::open(&cli.store)?;
    let vm = WalletViewModel::new(client, store, profile, options);

    if let Err(e) = run(&vm, cli.command.unwrap_or(Commands::Dashboard)).await {
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }

    Ok(())
}
