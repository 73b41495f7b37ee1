//! plasma CLI - move value between the root chain and the Plasma chain
//!
//!   plasma init [--force]          → Resolve the account and load balances
//!   plasma deposit <amount>        → Deposit wei (or --currency <token> [--approve])
//!   plasma send <to> <amount>      → Transfer on the Plasma chain
//!   plasma exit                    → Start exits for every UTXO
//!   plasma status|balance|utxos    → Inspect the account
//!   plasma repl                    → Interactive console
//!   plasma serve [--port 8080]     → HTTP surface
//!
//! Configuration: defaults < .plasma.json (or --config) < environment < flags.

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use plasma_account::console::{self, Command};
use plasma_account::logging::init_logging;
use plasma_account::{install_signal_handlers, PlasmaAccount, PlasmaConfig, ServiceMonitor, Shutdown};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }
    if opts.version {
        println!("plasma {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("repl") => cmd_repl(&opts).await,
        Some("serve") => cmd_serve(&opts).await,
        Some(_) => cmd_once(&opts).await,
        None => {
            print_usage();
            return;
        }
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    rest: Vec<String>,
    config: Option<PathBuf>,
    contract: Option<String>,
    rpc_url: Option<String>,
    watcher_url: Option<String>,
    address: Option<String>,
    depth: Option<u64>,
    poll_interval_ms: Option<u64>,
    max_utxos: Option<usize>,
    currency: Option<String>,
    approve: bool,
    force: bool,
    port: Option<u16>,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            let value = args.get(i + 1).cloned();
            let mut takes_value = true;
            match arg.as_str() {
                "--help" | "-h" => { opts.help = true; takes_value = false; }
                "--version" | "-V" => { opts.version = true; takes_value = false; }
                "--force" => { opts.force = true; takes_value = false; }
                "--approve" => { opts.approve = true; takes_value = false; }
                "--config" | "-c" => opts.config = value.map(PathBuf::from),
                "--contract" => opts.contract = value,
                "--rpc" => opts.rpc_url = value,
                "--watcher" => opts.watcher_url = value,
                "--address" => opts.address = value,
                "--currency" => opts.currency = value,
                "--depth" => opts.depth = value.and_then(|v| v.parse().ok()),
                "--poll-interval" => opts.poll_interval_ms = value.and_then(|v| v.parse().ok()),
                "--max-utxos" => opts.max_utxos = value.and_then(|v| v.parse().ok()),
                "--port" | "-p" => opts.port = value.and_then(|v| v.parse().ok()),
                _ if !arg.starts_with('-') => { positional.push(arg.clone()); takes_value = false; }
                _ => takes_value = false, // Ignore unknown flags
            }
            i += if takes_value { 2 } else { 1 };
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }
        opts.rest = positional;

        if opts.port.is_none() {
            opts.port = env::var("PLASMA_PORT").ok().and_then(|p| p.parse().ok());
        }
        opts
    }

    fn config(&self) -> Result<PlasmaConfig> {
        let mut config = PlasmaConfig::load(self.config.as_deref())?;
        if let Some(contract) = &self.contract {
            config = config.with_contract(parse_address(contract)?);
        }
        if let Some(url) = &self.rpc_url {
            config = config.with_root_chain_url(url.clone());
        }
        if let Some(url) = &self.watcher_url {
            config = config.with_watcher_url(url.clone());
        }
        if let Some(address) = &self.address {
            config = config.with_address(parse_address(address)?);
        }
        if let Some(depth) = self.depth {
            config = config.with_confirmation_depth(depth);
        }
        if let Some(ms) = self.poll_interval_ms {
            config = config.with_poll_interval_ms(ms);
        }
        if let Some(max) = self.max_utxos {
            config = config.with_max_selected_utxos(max);
        }
        Ok(config.validate()?)
    }

    fn account(&self, shutdown: Shutdown) -> Result<PlasmaAccount> {
        let config = self.config()?;
        debug!(watcher = %config.watcher_url, rpc = %config.root_chain_url, "connecting");
        Ok(PlasmaAccount::connect(config)?.with_shutdown(shutdown))
    }

    /// The positional arguments as a console line.
    fn console_line(&self) -> String {
        let mut words = vec!["plasma".to_string()];
        words.extend(self.command.iter().cloned());
        words.extend(self.rest.iter().cloned());
        if self.force {
            words.push("--force".into());
        }
        words.join(" ")
    }
}

fn parse_address(value: &str) -> Result<Address> {
    value.parse().map_err(|e| anyhow!("invalid address '{}': {}", value, e))
}

fn print_usage() {
    println!(
        r#"plasma - Plasma chain account client

USAGE:
    plasma <command> [args] [options]

COMMANDS:
    init [--force]          Initialize the account
    deposit <amount>        Deposit from the root chain
    send <to> <amount>      Transfer on the Plasma chain
    exit                    Start exits for every UTXO
    status                  Show account state
    balance                 Show root and Plasma chain balances
    utxos                   List UTXOs
    repl                    Interactive console
    serve                   Start HTTP server

OPTIONS:
    --config, -c <path>     Config file (default: .plasma.json)
    --contract <address>    Plasma contract (env: PLASMA_CONTRACT_ADDRESS)
    --rpc <url>             Web3 provider (env: WEB3_PROVIDER_URL)
    --watcher <url>         Watcher service (env: WATCHER_URL)
    --address <address>     Account to use (env: PLASMA_ADDRESS)
    --depth <blocks>        Confirmation depth (env: PLASMA_CONFIRMATION_DEPTH)
    --poll-interval <ms>    Confirmation poll interval (env: PLASMA_POLL_INTERVAL_MS)
    --max-utxos <n>         Inputs scanned per transfer, 1-4 (env: PLASMA_MAX_UTXOS)
    --currency <token>      Token for deposit/send (default: ETH)
    --approve               Approve the token before depositing
    --port, -p <port>       Server port (default: 8080, env: PLASMA_PORT)
    --version, -V           Print version

ENVIRONMENT:
    RUST_LOG                Log filter (default: info)
    PLASMA_LOG_JSON=1       JSON log output"#
    );
}

/// Runs one command. Every process starts uninitialized, so commands other
/// than `init` initialize first.
async fn cmd_once(opts: &ParsedArgs) -> Result<String> {
    let shutdown = install_signal_handlers();
    let account = opts.account(shutdown)?;

    let command = console::parse(&opts.console_line()).map_err(|msg| anyhow!(msg))?;
    if matches!(command, Command::Help) {
        return Ok(console::USAGE.to_string());
    }
    if matches!(command, Command::Init { .. }) {
        return Ok(account.initialize().await?);
    }
    account.initialize().await.context("initializing")?;

    if let Some(token) = &opts.currency {
        let currency = parse_address(token)?;
        match command {
            Command::Deposit { amount } => return Ok(account.deposit(amount, currency, opts.approve).await?),
            Command::Send { to, amount } => return Ok(account.transfer(to, amount, currency).await?),
            _ => warn!("--currency only applies to deposit and send"),
        }
    }

    console::execute(&account, command).await.map_err(|msg| anyhow!(msg))
}

async fn cmd_repl(opts: &ParsedArgs) -> Result<String> {
    let shutdown = Shutdown::new();
    let account = opts.account(shutdown)?;
    println!("Plasma console - type 'plasma help' or 'quit'\n");

    loop {
        print!("plasma> ");
        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "quit" | "q") {
            break;
        }

        let line = if input.starts_with("plasma") { input.to_string() } else { format!("plasma {}", input) };
        let output = match console::parse(&line) {
            Ok(command) => console::execute(&account, command).await,
            Err(usage) => Err(usage),
        };
        match output {
            Ok(message) => println!("{}", message),
            Err(message) => println!("{}", message),
        }
    }

    Ok("bye".to_string())
}

async fn cmd_serve(opts: &ParsedArgs) -> Result<String> {
    use plasma_account::server::create_router;

    let port = opts.port.unwrap_or(8080);
    let shutdown = install_signal_handlers();
    let account = Arc::new(opts.account(shutdown.clone())?);

    if let Err(e) = account.initialize().await {
        warn!("Plasma chain not initialized at startup ({}); POST /init to retry", e);
    }

    let monitor = ServiceMonitor::new(account.root().clone(), account.config().service_check_interval(), shutdown.clone()).spawn();

    let router = create_router(account, "plasma");
    let addr = format!("0.0.0.0:{}", port);

    info!("Plasma server listening on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /health              - Health and root chain check");
    info!("  GET  /status              - Account state");
    info!("  GET  /balance             - Refresh balances");
    info!("  GET  /utxos               - Account UTXOs");
    info!("  GET  /transactions        - Child chain history");
    info!("  POST /init                - {{\"force\": bool}}");
    info!("  POST /deposit             - {{\"amount\", \"currency\"?, \"approve\"?}}");
    info!("  POST /transfer            - {{\"to\", \"amount\", \"currency\"?}}");
    info!("  POST /exit                - Exit every UTXO");

    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind {}", addr))?;

    // Run server with graceful shutdown
    let mut shutdown_rx = shutdown.subscribe();
    tokio::select! {
        result = axum::serve(listener, router) => {
            result.context("Server error")?;
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received, stopping server...");
        }
    }

    shutdown.trigger().await;
    let _ = monitor.await;
    info!("Service monitor stopped");

    Ok("stopped".to_string())
}
