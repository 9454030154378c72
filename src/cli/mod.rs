use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use crate::application::{VoucherFilter, VoucherService};
use crate::domain::{
    ApplyResult, Cents, MIN_AMOUNT_FOR_DISCOUNT, Voucher, format_cents, parse_cents,
};

/// Vouchers - single-use discount codes
#[derive(Parser)]
#[command(name = "vouchers")]
#[command(about = "Create discount vouchers and apply them to purchase amounts")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "vouchers.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Create a new voucher
    Create {
        /// Voucher code (unique, case-sensitive)
        code: String,

        /// Discount percentage (e.g. 20 for 20%)
        #[arg(short = 'p', long)]
        discount: i64,
    },

    /// Apply a voucher to an amount
    Apply {
        /// Voucher code
        code: String,

        /// Purchase amount (e.g., "150.00" or "150")
        amount: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a voucher
    Show {
        /// Voucher code
        code: String,
    },

    /// List vouchers
    List {
        /// Only vouchers that have not been used
        #[arg(long, conflicts_with = "used")]
        unused: bool,

        /// Only vouchers that have been used
        #[arg(long)]
        used: bool,
    },

    /// Export vouchers to CSV or JSON
    Export {
        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Only vouchers that have not been used
        #[arg(long, conflicts_with = "used")]
        unused: bool,

        /// Only vouchers that have been used
        #[arg(long)]
        used: bool,
    },
}

fn filter_from_flags(unused: bool, used: bool) -> VoucherFilter {
    match (unused, used) {
        (true, _) => VoucherFilter::Unused,
        (_, true) => VoucherFilter::Used,
        _ => VoucherFilter::All,
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                VoucherService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Create { code, discount } => {
                let service = VoucherService::connect(&self.database).await?;
                let voucher = service.create_voucher(&code, discount).await?;
                println!(
                    "Created voucher: {} ({}% off, id {})",
                    voucher.code, voucher.discount, voucher.id
                );
            }

            Commands::Apply { code, amount, json } => {
                let service = VoucherService::connect(&self.database).await?;
                let amount_cents = parse_amount(&amount)?;
                let result = service.apply_voucher(&code, amount_cents).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    print_apply_result(&code, &result);
                }
            }

            Commands::Show { code } => {
                let service = VoucherService::connect(&self.database).await?;
                let voucher = service.get_voucher(&code).await?;
                print_voucher(&voucher);
            }

            Commands::List { unused, used } => {
                let service = VoucherService::connect(&self.database).await?;
                let vouchers = service
                    .list_vouchers(filter_from_flags(unused, used))
                    .await?;
                print_voucher_table(&vouchers);
            }

            Commands::Export {
                format,
                output,
                unused,
                used,
            } => {
                let service = VoucherService::connect(&self.database).await?;
                run_export_command(&service, &format, output, filter_from_flags(unused, used))
                    .await?;
            }
        }

        Ok(())
    }
}

/// Parse a purchase amount. Sub-cent amounts are refused so the service
/// always sees exactly what was typed.
fn parse_amount(amount: &str) -> Result<Cents> {
    parse_cents(amount).with_context(|| {
        format!(
            "Invalid amount '{}'. Use '150.00' or '150', at most two decimals",
            amount
        )
    })
}

fn print_apply_result(code: &str, result: &ApplyResult) {
    if result.applied {
        println!(
            "Applied voucher {}: {} -> {} ({}% off, saved {})",
            code,
            format_cents(result.amount),
            format_cents(result.final_amount),
            result.discount,
            format_cents(result.savings())
        );
    } else {
        println!(
            "Voucher {} not applied: total stays {}",
            code,
            format_cents(result.final_amount)
        );
        if result.amount <= MIN_AMOUNT_FOR_DISCOUNT {
            println!(
                "  Vouchers apply only to amounts above {}",
                format_cents(MIN_AMOUNT_FOR_DISCOUNT)
            );
        }
    }
}

fn print_voucher(voucher: &Voucher) {
    println!("Voucher: {}", voucher.code);
    println!("  ID:         {}", voucher.id);
    println!("  Discount:   {}%", voucher.discount);
    println!("  Used:       {}", if voucher.used { "yes" } else { "no" });
    println!(
        "  Created:    {}",
        voucher.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(used_at) = voucher.used_at {
        println!("  Used at:    {}", used_at.format("%Y-%m-%d %H:%M:%S"));
    }
}

fn print_voucher_table(vouchers: &[Voucher]) {
    if vouchers.is_empty() {
        println!("No vouchers found.");
        return;
    }

    println!("{:<6} {:<20} {:>8} {:<6}", "ID", "CODE", "DISCOUNT", "USED");
    println!("{}", "-".repeat(43));
    for voucher in vouchers {
        println!(
            "{:<6} {:<20} {:>7}% {:<6}",
            voucher.id,
            voucher.code,
            voucher.discount,
            if voucher.used { "yes" } else { "no" }
        );
    }
}

async fn run_export_command(
    service: &VoucherService,
    format: &str,
    output: Option<String>,
    filter: VoucherFilter,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let writer: Box<dyn Write> = match &output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create file: {}", path))?,
        ),
        None => Box::new(stdout()),
    };

    let exporter = Exporter::new(service);
    let count = match format {
        "csv" => exporter.export_vouchers_csv(writer, filter).await?,
        "json" => exporter.export_vouchers_json(writer, filter).await?,
        other => bail!("Unknown export format '{}'. Use: csv, json", other),
    };

    if output.is_some() {
        eprintln!("Exported {} vouchers", count);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParseCentsError;
    use tempfile::TempDir;

    #[test]
    fn test_parse_apply_command() {
        let cli = Cli::try_parse_from(["vouchers", "-d", "test.db", "apply", "ABC123", "150.00"])
            .unwrap();
        assert_eq!(cli.database, "test.db");
        match cli.command {
            Commands::Apply { code, amount, json } => {
                assert_eq!(code, "ABC123");
                assert_eq!(amount, "150.00");
                assert!(!json);
            }
            _ => panic!("expected apply command"),
        }
    }

    #[test]
    fn test_parse_create_command() {
        let cli = Cli::try_parse_from(["vouchers", "create", "ABC123", "--discount", "20"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Create { ref code, discount: 20 } if code == "ABC123"
        ));
    }

    #[test]
    fn test_list_flags_conflict() {
        assert!(Cli::try_parse_from(["vouchers", "list", "--used", "--unused"]).is_err());
    }

    #[test]
    fn test_filter_from_flags() {
        assert_eq!(filter_from_flags(false, false), VoucherFilter::All);
        assert_eq!(filter_from_flags(true, false), VoucherFilter::Unused);
        assert_eq!(filter_from_flags(false, true), VoucherFilter::Used);
    }

    #[test]
    fn test_parse_amount_refuses_sub_cent_input() {
        let err = parse_amount("100.001").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ParseCentsError>(),
            Some(&ParseCentsError::TooPrecise)
        );
        assert_eq!(parse_amount("100.01").unwrap(), 10001);
    }

    #[tokio::test]
    async fn test_apply_command_refuses_sub_cent_amount() -> Result<()> {
        let temp = TempDir::new()?;
        let db_path = temp.path().join("cli.db");
        let db = db_path.to_str().unwrap();

        let service = VoucherService::init(db).await?;
        service.create_voucher("ABC123", 20).await?;

        let cli = Cli::try_parse_from(["vouchers", "-d", db, "apply", "ABC123", "100.001"])?;
        let err = cli.run().await.unwrap_err();
        assert!(err.downcast_ref::<ParseCentsError>().is_some());

        // Nothing reached the service: the voucher is still available
        assert!(!service.get_voucher("ABC123").await?.used);
        let result = service.apply_voucher("ABC123", 10001).await?;
        assert!(result.applied);
        Ok(())
    }
}
