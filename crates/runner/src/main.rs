use scalper_clock::SystemClock;
use scalper_gateway::{
    PaperConfig, PaperTradingApi, SimulatedFeed, SimulatedFeedConfig, feed_channel,
};
use scalper_runner::{Command, StdoutSink, Terminal, TerminalConfig};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

fn print_help() {
    eprintln!(
        r#"Scalper - manual spot/margin trading terminal (paper trading)

USAGE:
    scalper [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

COMMANDS (one per line on stdin):
    buy | sell              market order at the set size
    bid | ask               limit order at the margin best bid / ask
    bid-offset | ask-offset limit order one offset beyond the margin touch
    sfd-sell | sfd-buyback  limit orders at the SFD line over spot
    flatten                 close the margin position at market
    cancel                  cancel every order on the traded product
    size+ | size-           change the order size
    offset+ | offset-       change the limit offset ratio
    quit                    stop the terminal

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: scalper=info)
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("scalper=info"))
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            TerminalConfig::from_file(&path)?
        }
        None => TerminalConfig::default(),
    };

    let terminal = Terminal::new(config.clone(), Arc::new(SystemClock::new()))?;
    let shutdown = terminal.shutdown_token();
    let (publisher, subscriber) = feed_channel(config.feed_capacity);

    let api = Arc::new(
        PaperTradingApi::new(PaperConfig {
            products: config.products.clone(),
            ..Default::default()
        })
        .with_events(publisher.clone()),
    );

    let mut feeds = Vec::new();
    for (offset, feed_config) in [SimulatedFeedConfig::spot(), SimulatedFeedConfig::margin()]
        .into_iter()
        .enumerate()
    {
        let feed_config = SimulatedFeedConfig {
            seed: config.simulation_seed.map(|seed| seed + offset as u64),
            ..feed_config
        };
        let feed = SimulatedFeed::new(feed_config)?;
        feeds.push(tokio::spawn(feed.run(publisher.clone(), shutdown.clone())));
    }
    drop(publisher);

    let running = terminal.start(api, subscriber, StdoutSink);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                if matches!(text, "quit" | "q" | "exit") {
                    break;
                }
                match text.parse::<Command>() {
                    Ok(command) => running.submit(command).await?,
                    Err(e) => log::warn!("{}", e),
                }
            }
        }
    }

    let report = running.shutdown().await?;
    for feed in feeds {
        feed.await?;
    }
    log::info!(
        "Routed {} spot / {} margin batches, {} order events, {} commands",
        report.router.spot_batches,
        report.router.margin_batches,
        report.router.spot_order_events + report.router.margin_order_events,
        report.commands
    );
    Ok(())
}
