use clap::{Parser, Subcommand};
use colored::Colorize;
use partmark::aggregator::Aggregator;
use partmark::auth::DigikeyAuth;
use partmark::browser::{BrowserGate, WebDriverFactory};
use partmark::error::Result;
use partmark::layout;
use partmark::ledger::LedgerStore;
use partmark::printer::PrintTransport;
use partmark::prompt::{Prompt, TermPrompt};
use partmark::providers::{chipdip, ChipdipProvider, DigikeyProvider, LcscProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "partmark")]
#[command(author, version, about = "Resolve part queries against catalogs and print inventory labels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Ledger file (inventory counter, stored labels, cached auth)
    #[arg(long, env = "PARTMARK_LEDGER", default_value = "ledger.json", global = true)]
    ledger: PathBuf,

    /// Base URL of the HTTP-to-USB printer bridge
    #[arg(
        long,
        env = "PARTMARK_PRINTER_URL",
        default_value = "http://labeler.int.bksp.in",
        global = true
    )]
    printer_url: String,

    /// WebDriver endpoint used for browser-scraping fallback
    #[arg(
        long,
        env = "PARTMARK_WEBDRIVER_URL",
        default_value = "http://localhost:9515",
        global = true
    )]
    webdriver_url: String,

    /// Digikey OAuth client id (adapter is skipped when absent)
    #[arg(long, env = "DIGIKEY_CLIENT_ID", hide_env_values = true, global = true)]
    digikey_client_id: Option<String>,

    /// Digikey OAuth client secret
    #[arg(long, env = "DIGIKEY_CLIENT_SECRET", hide_env_values = true, global = true)]
    digikey_client_secret: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reprint a stored label by inventory number
    Reprint {
        /// Inventory number, e.g. 000123
        number: String,
    },

    /// List ledger records whose model matches a query
    Find {
        /// Query string
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(format!("partmark/{}", env!("CARGO_PKG_VERSION")))
        .build()?;

    let store = Arc::new(LedgerStore::load(&cli.ledger)?);
    let printer = PrintTransport::new(client.clone(), cli.printer_url.clone());
    let prompt: Arc<dyn Prompt> = Arc::new(TermPrompt);

    match cli.command {
        Some(Commands::Reprint { number }) => {
            reprint(&store, &printer, &number).await?;
        }
        Some(Commands::Find { query }) => {
            let matches = store.find_by_model(&query);
            if matches.is_empty() {
                println!("no ledger records match '{query}'");
            }
            for item in matches {
                println!(
                    "({}) {} - {}",
                    item.inventory_number.bold(),
                    item.model,
                    item.description
                );
            }
        }
        None => {
            let auth = match (&cli.digikey_client_id, &cli.digikey_client_secret) {
                (Some(id), Some(secret)) => Some(DigikeyAuth::new(
                    client.clone(),
                    id.clone(),
                    secret.clone(),
                    Arc::clone(&store),
                )),
                _ => None,
            };
            let digikey = DigikeyProvider::new(client.clone(), auth, cli.digikey_client_id.clone());
            let lcsc = LcscProvider::new(client.clone());

            let gate = Arc::new(BrowserGate::new(
                Box::new(WebDriverFactory::new(
                    cli.webdriver_url.clone(),
                    chipdip::LANDING_URL,
                )),
                chipdip::READINESS_MARKER,
            ));
            let chipdip = Arc::new(ChipdipProvider::new(gate, Arc::clone(&prompt)));

            let aggregator = Aggregator::new(
                vec![Arc::new(digikey), Arc::new(lcsc)],
                chipdip.clone(),
                chipdip,
                Arc::clone(&prompt),
                Arc::clone(&store),
            );

            run_loop(&store, &aggregator, &printer, prompt.as_ref()).await?;
        }
    }

    Ok(())
}

/// The interactive loop: one query per iteration, fatal errors print a
/// diagnostic and the loop moves on to the next query.
async fn run_loop(
    store: &Arc<LedgerStore>,
    aggregator: &Aggregator,
    printer: &PrintTransport,
    prompt: &dyn Prompt,
) -> Result<()> {
    loop {
        let Some(query) = prompt.read_line(">") else {
            // End of input: quit cleanly.
            return Ok(());
        };
        let query = query.trim().to_string();
        if query.is_empty() {
            continue;
        }

        if query == "reprint" {
            let Some(number) = prompt.read_line("number to reprint >") else {
                continue;
            };
            if let Err(err) = reprint(store, printer, number.trim()).await {
                eprintln!("{}", format!("error: {err}").red());
            }
            continue;
        }

        if let Err(err) = handle_query(store, aggregator, printer, prompt, &query).await {
            eprintln!("{}", format!("error: {err}").red());
        }
    }
}

async fn handle_query(
    store: &Arc<LedgerStore>,
    aggregator: &Aggregator,
    printer: &PrintTransport,
    prompt: &dyn Prompt,
    query: &str,
) -> Result<()> {
    // Duplicate hint: the part may already carry a label.
    let matches = store.find_by_model(query);
    if !matches.is_empty() {
        println!("{}", "found possible matches:".yellow());
        for item in &matches {
            println!(
                "({}) {} - {}",
                item.inventory_number.bold(),
                item.model,
                item.description
            );
        }
        if prompt.read_line("continue (enter), abort (Ctrl+C)").is_none() {
            return Ok(());
        }
    }

    let Some(record) = aggregator.resolve(query).await? else {
        return Ok(());
    };

    println!("printing {}...", record.inventory_number.bold());
    printer.send(layout::render(&record)).await?;
    store.assign(record)?;
    Ok(())
}

/// Re-emit a stored label. An unknown number is a diagnostic, not an error,
/// and never touches the ledger or the renderer.
async fn reprint(store: &Arc<LedgerStore>, printer: &PrintTransport, number: &str) -> Result<()> {
    let Some(record) = store.get(number) else {
        eprintln!("item with inventory number {number} not found");
        return Ok(());
    };
    printer.send(layout::render(&record)).await
}
