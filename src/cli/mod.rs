use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{
    customer_line, format_currency, product_line, sale_line, write_report, LedgerService,
    DEFAULT_REPORT_PATH,
};
use crate::domain::{parse_cents, Customer, CustomerId, ProductId, Quantity, Sale};

/// Stockledger - Inventory and Sales Ledger
#[derive(Parser)]
#[command(name = "stockledger")]
#[command(about = "Track products, customers and sales with a fulfillment queue and undo")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "STOCKLEDGER_DB", default_value = "stockledger.db")]
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

    /// Product management commands
    #[command(subcommand)]
    Product(ProductCommands),

    /// Customer management commands
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Record a sale and queue it for fulfillment
    Sell {
        /// Product ID
        #[arg(short, long)]
        product: ProductId,

        /// Units to sell
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: Quantity,

        /// Customer ID
        #[arg(short, long)]
        customer: CustomerId,
    },

    /// Show pending sales, oldest first
    Queue,

    /// Fulfill the oldest pending sale
    Fulfill,

    /// Undo the most recent sale
    Undo,

    /// Show total stock value and total sales value
    Totals,

    /// Write the text report
    Report {
        /// Output file
        #[arg(short, long, env = "STOCKLEDGER_REPORT", default_value = DEFAULT_REPORT_PATH)]
        output: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: products, customers, sales, queue, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import a full JSON snapshot, replacing the current ledger
    Import {
        /// What to import: full
        import_type: String,

        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Validate without importing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// Register a new product
    Add {
        /// Product name
        name: String,

        /// Units in stock
        #[arg(short, long, allow_negative_numbers = true)]
        quantity: Quantity,

        /// Unit price (e.g., "2.50" or "2")
        #[arg(short, long, allow_negative_numbers = true)]
        price: String,
    },

    /// List all products
    List,

    /// Show a single product
    Show {
        /// Product ID
        id: ProductId,
    },
}

#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Register a new customer
    Add {
        /// Customer name
        name: String,
    },

    /// List all customers
    List,

    /// Show customers with the total each has spent
    Spend,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Product(product_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_product_command(&service, product_cmd).await?;
            }

            Commands::Customer(customer_cmd) => {
                let service = LedgerService::connect(&self.database).await?;
                run_customer_command(&service, customer_cmd).await?;
            }

            Commands::Sell {
                product,
                quantity,
                customer,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                let sale = service.record_sale(product, quantity, customer).await?;
                println!(
                    "Recorded sale {}: {}x {} for {} ({})",
                    sale.id,
                    sale.quantity,
                    sale.product_name,
                    sale.customer_name,
                    format_currency(sale.amount_cents)
                );
            }

            Commands::Queue => {
                let service = LedgerService::connect(&self.database).await?;
                let pending = service.view_pending_queue().await?;
                print_sales(&pending, "No pending sales.");
            }

            Commands::Fulfill => {
                let service = LedgerService::connect(&self.database).await?;
                let sale = service.fulfill_next_sale().await?;
                println!(
                    "Fulfilled sale {}: {}x {} for {} ({})",
                    sale.id,
                    sale.quantity,
                    sale.product_name,
                    sale.customer_name,
                    format_currency(sale.amount_cents)
                );
            }

            Commands::Undo => {
                let service = LedgerService::connect(&self.database).await?;
                let sale = service.undo_last_operation().await?;
                println!(
                    "Undid sale {}: {}x {} returned to stock, {} refunded to {}",
                    sale.id,
                    sale.quantity,
                    sale.product_name,
                    format_currency(sale.amount_cents),
                    sale.customer_name
                );
            }

            Commands::Totals => {
                let service = LedgerService::connect(&self.database).await?;
                let totals = service.totals().await?;
                println!("Total stock value: {}", format_currency(totals.stock_value));
                println!("Total sales value: {}", format_currency(totals.sales_value));
            }

            Commands::Report { output } => {
                let service = LedgerService::connect(&self.database).await?;
                let ledger = service.ledger().await?;
                write_report(&ledger, &output)?;
                println!("Report written: {}", output);
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }

            Commands::Import {
                import_type,
                input,
                dry_run,
            } => {
                let service = LedgerService::connect(&self.database).await?;
                run_import_command(&service, &import_type, input.as_deref(), dry_run).await?;
            }
        }

        Ok(())
    }
}

async fn run_product_command(service: &LedgerService, cmd: ProductCommands) -> Result<()> {
    match cmd {
        ProductCommands::Add {
            name,
            quantity,
            price,
        } => {
            let price_cents =
                parse_cents(&price).context("Invalid price format. Use '2.50' or '2'")?;
            let product = service.register_product(&name, quantity, price_cents).await?;
            println!("Registered product: {}", product_line(&product));
        }

        ProductCommands::List => {
            let products = service.list_products().await?;
            if products.is_empty() {
                println!("No products registered.");
            } else {
                for product in &products {
                    println!("{}", product_line(product));
                }
            }
        }

        ProductCommands::Show { id } => {
            let product = service.find_product_by_id(id).await?;
            println!("{}", product_line(&product));
        }
    }
    Ok(())
}

async fn run_customer_command(service: &LedgerService, cmd: CustomerCommands) -> Result<()> {
    match cmd {
        CustomerCommands::Add { name } => {
            let customer = service.register_customer(&name).await?;
            println!("Registered customer: {}", customer_line(&customer));
        }

        CustomerCommands::List => {
            let customers = service.list_customers().await?;
            print_customers(&customers);
        }

        CustomerCommands::Spend => {
            let customers = service.customers_with_spend().await?;
            print_customers(&customers);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match export_type {
        "products" => exporter.export_products_csv(writer).await?,
        "customers" => exporter.export_customers_csv(writer).await?,
        "sales" => exporter.export_sales_csv(writer).await?,
        "queue" => exporter.export_queue_csv(writer).await?,
        "full" => {
            let export = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} products, {} customers, {} sales ({} pending)",
                    export.ledger.products.len(),
                    export.ledger.customers.len(),
                    export.ledger.history.len(),
                    export.ledger.pending.len()
                );
            }
            return Ok(());
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: products, customers, sales, queue, full",
                export_type
            );
        }
    };

    if output.is_some() {
        eprintln!("Exported {} {}", count, export_type);
    }
    Ok(())
}

async fn run_import_command(
    service: &LedgerService,
    import_type: &str,
    input: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    use crate::io::{ImportOptions, Importer};
    use std::fs::File;
    use std::io::{stdin, Read};

    if import_type != "full" {
        anyhow::bail!("Invalid import type '{}'. Valid types: full", import_type);
    }

    let importer = Importer::new(service);

    // Determine input reader
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let result = importer
        .import_full_json(reader, ImportOptions { dry_run })
        .await?;

    if result.written {
        println!("Import complete");
    } else {
        println!("Validation successful");
    }
    println!("  Products:  {}", result.products);
    println!("  Customers: {}", result.customers);
    println!("  Sales:     {} ({} pending)", result.sales, result.pending);

    Ok(())
}

fn print_customers(customers: &[Customer]) {
    if customers.is_empty() {
        println!("No customers registered.");
    } else {
        for customer in customers {
            println!("{}", customer_line(customer));
        }
    }
}

fn print_sales(sales: &[Sale], empty_message: &str) {
    if sales.is_empty() {
        println!("{}", empty_message);
    } else {
        for sale in sales {
            println!("{}", sale_line(sale));
        }
    }
}
