use anyhow::Context;
use tracing::info;
use unifex::{ExchangeConfig, ExchangeFactory, ExchangeKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let kind: ExchangeKind = args
        .next()
        .unwrap_or_else(|| "upbit".to_string())
        .parse()
        .context("first argument must be an exchange id")?;

    let mut connector = ExchangeFactory::create_connector(kind, ExchangeConfig::read_only())?;
    let markets = connector
        .load_markets(false)
        .await
        .with_context(|| format!("loading {} markets", kind))?;
    info!(exchange = %kind, markets = markets.len(), "markets loaded");

    let symbol = match args.next() {
        Some(symbol) => symbol,
        None => connector
            .markets()
            .symbols()
            .into_iter()
            .next()
            .context("exchange listed no markets")?,
    };

    let ticker = connector
        .fetch_ticker(&symbol)
        .await
        .with_context(|| format!("fetching {} ticker", symbol))?;
    println!(
        "{} {}: last={} bid={} ask={} volume={}",
        kind,
        symbol,
        display(ticker.last),
        display(ticker.bid),
        display(ticker.ask),
        display(ticker.base_volume),
    );
    Ok(())
}

fn display(value: Option<rust_decimal::Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.normalize().to_string())
}
