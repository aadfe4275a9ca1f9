use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::application::reporting::{
    BalancePoint, HistoryWindow, balance_history, breakdown_total, expense_breakdown,
    filter_history,
};
use crate::application::{LedgerService, LoadReport};
use crate::domain::{Cents, TransactionType, format_cents, parse_cents};
use crate::settings::Settings;
use crate::storage::SqliteStore;
use crate::telemetry::init_tracing;

/// MeusGastos - Income & Expense Tracker
#[derive(Parser)]
#[command(name = "meusgastos")]
#[command(about = "Record income and expenses and keep a running balance")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides the configured one)
    #[arg(short, long, env = "MEUSGASTOS_DATABASE")]
    pub database: Option<String>,

    /// Configuration file (defaults to ./meusgastos.toml when present)
    #[arg(long)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record money coming in
    Income {
        /// Amount (e.g., "1500", "1500.00" or "1500,00")
        amount: String,

        /// Category (e.g., "Salary", "Freelance")
        #[arg(short, long)]
        category: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Record money going out
    Expense {
        /// Amount (e.g., "30", "30.50" or "30,50")
        amount: String,

        /// Category (e.g., "Food", "Rent")
        #[arg(short, long)]
        category: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Show the current balance with income and expense totals
    Balance,

    /// Overwrite the balance (e.g., an opening balance)
    SetBalance {
        /// New balance, must not be negative
        amount: String,
    },

    /// Add funds to the balance without recording a transaction
    Deposit {
        /// Amount to add
        amount: String,
    },

    /// List recorded transactions, most recent first
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete the balance and every transaction
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Generate reports
    #[command(subcommand)]
    Report(ReportCommands),
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Expenses grouped by category
    Categories {
        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Running balance over time
    History {
        /// Period: all, week, month
        #[arg(long, default_value = "all")]
        period: String,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

impl Commands {
    fn is_mutation(&self) -> bool {
        matches!(
            self,
            Commands::Income { .. }
                | Commands::Expense { .. }
                | Commands::SetBalance { .. }
                | Commands::Deposit { .. }
        )
    }
}

// Writing after a failed load would replace stored data we could not read
fn ensure_writable(report: &LoadReport, command: &Commands) -> Result<()> {
    if report.failure.is_some() && command.is_mutation() {
        bail!(
            "Stored data could not be read; refusing to modify it (use `reset --yes` to start over)"
        );
    }
    Ok(())
}

impl Cli {
    /// Settings from file and environment, with command-line flags on top.
    fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(database) = &self.database {
            settings.database = database.clone();
        }
        Ok(settings)
    }

    pub async fn run(self) -> Result<()> {
        let settings = self.settings()?;

        let filter = if self.verbose {
            "meusgastos=debug"
        } else {
            settings.log_filter.as_str()
        };
        init_tracing(filter);

        let store = SqliteStore::open(&settings.database)
            .await
            .with_context(|| format!("Failed to open database '{}'", settings.database))?;
        let (mut service, report) =
            LedgerService::open(store, settings.fallback_category.clone()).await;
        report_load_problems(&report, self.verbose);

        ensure_writable(&report, &self.command)?;

        match self.command {
            Commands::Income {
                amount,
                category,
                description,
            } => {
                run_add_command(
                    &mut service,
                    TransactionType::Income,
                    &amount,
                    category,
                    description,
                )
                .await?;
            }

            Commands::Expense {
                amount,
                category,
                description,
            } => {
                run_add_command(
                    &mut service,
                    TransactionType::Expense,
                    &amount,
                    category,
                    description,
                )
                .await?;
            }

            Commands::Balance => run_balance_command(&service),

            Commands::SetBalance { amount } => {
                let amount_cents = parse_amount(&amount)?;
                if amount_cents < 0 {
                    bail!("Balance cannot be negative");
                }
                service.set_initial_balance(amount_cents).await?;
                println!("Balance set to {}", format_cents(amount_cents));
                warn_on_drift(&service);
            }

            Commands::Deposit { amount } => {
                let amount_cents = parse_amount(&amount)?;
                if amount_cents <= 0 {
                    bail!("Deposit amount must be positive");
                }
                let balance = service.add_to_balance(amount_cents).await?;
                println!(
                    "Added {} (balance: {})",
                    format_cents(amount_cents),
                    format_cents(balance)
                );
            }

            Commands::Transactions { limit } => run_transactions_command(&service, limit),

            Commands::Reset { yes } => {
                if !yes {
                    bail!("This deletes all data. Re-run with --yes to confirm");
                }
                service.reset_data().await?;
                println!("All data has been reset.");
            }

            Commands::Report(report_cmd) => run_report_command(&service, report_cmd)?,
        }

        Ok(())
    }
}

fn report_load_problems(report: &LoadReport, verbose: bool) {
    if let Some(failure) = &report.failure {
        eprintln!("Warning: could not read stored data: {}", failure);
    } else if verbose && !report.is_clean() {
        eprintln!(
            "[Load] {} transaction(s) restored, {} repaired, {} dropped",
            report.restored, report.repaired, report.dropped
        );
    }
}

async fn run_add_command(
    service: &mut LedgerService<SqliteStore>,
    kind: TransactionType,
    amount: &str,
    category: String,
    description: Option<String>,
) -> Result<()> {
    let amount_cents = parse_amount(amount)?;
    let tx = service
        .add_transaction(kind, amount_cents, category, description)
        .await?;

    println!(
        "Recorded {}: {} ({}) [{}]",
        tx.kind,
        format_cents(tx.amount_cents),
        tx.category,
        tx.id
    );
    println!("Balance: {}", format_cents(service.balance()));
    Ok(())
}

fn run_balance_command(service: &LedgerService<SqliteStore>) {
    let totals = service.totals();

    println!("Balance:  {:>12}", format_cents(service.balance()));
    println!("Income:   {:>12}", format_cents(totals.income));
    println!("Expenses: {:>12}", format_cents(totals.expense));
    warn_on_drift(service);
}

fn warn_on_drift(service: &LedgerService<SqliteStore>) {
    let drift = service.balance_drift();
    if drift != 0 && !service.transactions().is_empty() {
        println!(
            "Note: balance differs from recorded transactions by {} (set manually)",
            format_cents(drift)
        );
    }
}

fn run_transactions_command(service: &LedgerService<SqliteStore>, limit: Option<usize>) {
    let transactions = service.transactions();
    if transactions.is_empty() {
        println!("No transactions found.");
        return;
    }

    println!(
        "{:<12} {:<8} {:>12} {:<20} DESCRIPTION",
        "DATE", "TYPE", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(70));

    let limit = limit.unwrap_or(transactions.len());
    for tx in transactions.iter().rev().take(limit) {
        println!(
            "{:<12} {:<8} {:>12} {:<20} {}",
            tx.date.format("%Y-%m-%d"),
            tx.kind,
            format_cents(tx.signed_amount()),
            truncate(&tx.category, 20),
            tx.description.as_deref().unwrap_or("")
        );
    }
}

fn run_report_command(service: &LedgerService<SqliteStore>, cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Categories { format } => {
            let breakdown = expense_breakdown(service.transactions());

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&breakdown)?);
                }
                "table" => {
                    if breakdown.is_empty() {
                        println!("No expenses recorded.");
                        return Ok(());
                    }
                    println!(
                        "{:<20} {:>12} {:>8} {:>8}",
                        "CATEGORY", "TOTAL", "COUNT", "PERCENT"
                    );
                    println!("{}", "-".repeat(51));

                    for cat in &breakdown {
                        println!(
                            "{:<20} {:>12} {:>8} {:>7.1}%",
                            truncate(&cat.category, 20),
                            format_cents(cat.total),
                            cat.count,
                            cat.percentage
                        );
                    }

                    let total = breakdown_total(&breakdown);
                    println!("{}", "-".repeat(51));
                    println!("{:<20} {:>12}", "TOTAL", format_cents(total));
                }
                other => bail!("Unknown format '{}'. Use table or json", other),
            }
        }

        ReportCommands::History { period, format } => {
            let window: HistoryWindow = period.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let now = Utc::now();
            let history = balance_history(service.transactions(), service.balance(), now);
            let points = filter_history(&history, window, now);

            match format.as_str() {
                "json" => {
                    println!("{}", serde_json::to_string_pretty(&points)?);
                }
                "table" => print_history_table(&points, window),
                other => bail!("Unknown format '{}'. Use table or json", other),
            }
        }
    }

    Ok(())
}

fn print_history_table(points: &[BalancePoint], window: HistoryWindow) {
    println!("Balance history ({})", window.as_str());
    println!();
    println!("{:<12} {:>12}", "DATE", "BALANCE");
    println!("{}", "-".repeat(25));

    if points.is_empty() {
        println!("(no activity in this period)");
    }
    for point in points {
        println!(
            "{:<12} {:>12}",
            point.date.format("%d/%m/%Y"),
            format_cents(point.balance)
        );
    }
}

fn parse_amount(input: &str) -> Result<Cents> {
    parse_cents(input)
        .with_context(|| format!("Invalid amount '{}'. Use '50', '50.00' or '50,00'", input))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
