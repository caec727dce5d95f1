use anyhow::{Context, bail};
use api_client::{GatewayClient, HttpGatewayClient, LiveConnector};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use composer::{LegField, SymbolCatalog, TradeComposer};
use configuration::Config;
use core_types::{
    AccountId, CandidateLeg, CloseRequestLeg, FeedStrategy, MarginMode, OpenPosition, PositionSide,
};
use engine::{MonitorSession, TradeLifecycle};
use events::ConnectionStatus;
use monitor::{PositionMonitor, parse_roi_filter};
use rust_decimal::Decimal;
use std::sync::Arc;
use templates::{TemplateClient, apply_template, settings_snapshot};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the Helm trading dashboard.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment overrides from a .env file when one exists.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command-line arguments
    let cli = Cli::parse();
    let config = configuration::load_config().context("failed to load helm.toml")?;

    // Execute the appropriate command
    match cli.command {
        Commands::Symbols(args) => handle_symbols(args, &config).await,
        Commands::Watch(args) => handle_watch(args, &config).await,
        Commands::Submit(args) => handle_submit(args, &config).await,
        Commands::Close(args) => handle_close(args, &config).await,
        Commands::Templates(args) => handle_templates(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A terminal dashboard for composing, monitoring and closing leveraged trades.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tradable futures symbols known to the gateway.
    Symbols(SymbolsArgs),
    /// Watch an account's open positions live.
    Watch(WatchArgs),
    /// Compose and submit a batch of trade legs.
    Submit(SubmitArgs),
    /// Close open positions in one batched request.
    Close(CloseArgs),
    /// Manage stored trade templates.
    Templates(TemplatesArgs),
}

#[derive(Parser)]
struct SymbolsArgs {
    /// Only show symbols containing this fragment (e.g., "BTC").
    #[arg(long)]
    contains: Option<String>,
}

#[derive(Parser)]
struct WatchArgs {
    /// The gateway account id to watch.
    #[arg(long)]
    account: AccountId,

    /// Override the configured feed strategy ("push" or "poll").
    #[arg(long)]
    strategy: Option<String>,

    /// Only show positions with ROI at or above this percentage.
    #[arg(long)]
    min_roi: Option<String>,
}

#[derive(Parser)]
struct SubmitArgs {
    /// The gateway account id to trade under.
    #[arg(long)]
    account: AccountId,

    /// The bot name the submission is tagged with.
    #[arg(long)]
    bot: Option<String>,

    /// Position side applied to every leg ("long" or "short").
    #[arg(long)]
    side: Option<String>,

    /// Margin mode applied to every leg ("isolated" or "cross").
    #[arg(long)]
    margin_mode: Option<String>,

    /// Start from a stored template instead of an empty selection.
    #[arg(long)]
    template: Option<i64>,

    /// A leg spec `SYMBOL[:leverage[:margin]]`; repeat for multiple legs.
    #[arg(long = "coin")]
    coins: Vec<String>,

    /// Quote a current price for each leg before submitting.
    #[arg(long)]
    quote: bool,
}

#[derive(Parser)]
struct CloseArgs {
    /// The gateway account id to close positions under.
    #[arg(long)]
    account: AccountId,

    /// Close every open position on the account.
    #[arg(long)]
    all: bool,

    /// A position spec `SYMBOL:SIDE`; repeat for multiple positions.
    #[arg(long = "position", conflicts_with = "all")]
    positions: Vec<String>,
}

#[derive(Parser)]
struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplateCommands,
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List stored templates.
    List,
    /// Print a template's full settings as JSON.
    Show {
        /// The template id to fetch.
        id: i64,
    },
    /// Save a selection of coins as a new template.
    Save(SaveTemplateArgs),
    /// Delete a stored template.
    Delete {
        /// The template id to delete.
        id: i64,
    },
}

#[derive(Parser)]
struct SaveTemplateArgs {
    /// The name to store the template under.
    name: String,

    /// The bot name saved with the template.
    #[arg(long)]
    bot: String,

    /// Position side saved with the template ("long" or "short").
    #[arg(long, default_value = "long")]
    side: String,

    /// Margin mode saved with the template ("isolated" or "cross").
    #[arg(long, default_value = "isolated")]
    margin_mode: String,

    /// A leg spec `SYMBOL[:leverage[:margin]]`; repeat for multiple legs.
    #[arg(long = "coin", required = true)]
    coins: Vec<String>,
}

// ==============================================================================
// Symbols Command Logic
// ==============================================================================

/// Handles listing the tradable symbols known to the gateway.
async fn handle_symbols(args: SymbolsArgs, config: &Config) -> anyhow::Result<()> {
    let gateway = build_gateway(config);
    let catalog = SymbolCatalog::fetch(gateway.as_ref()).await?;
    let fragment = args.contains.map(|raw| raw.to_uppercase());

    let shown: Vec<&String> = catalog
        .symbols()
        .iter()
        .filter(|symbol| fragment.as_deref().map_or(true, |f| symbol.contains(f)))
        .collect();
    for symbol in &shown {
        println!("{symbol}");
    }
    println!("{} of {} symbols", shown.len(), catalog.len());
    Ok(())
}

// ==============================================================================
// Watch Command Logic
// ==============================================================================

/// Handles the live position view. The session delivers feed messages over
/// its channel; every message that changes the tracked state triggers a
/// redraw, and Ctrl-C tears the delivery down before exiting.
async fn handle_watch(args: WatchArgs, config: &Config) -> anyhow::Result<()> {
    let mut feed_settings = config.feed.clone();
    if let Some(raw) = &args.strategy {
        feed_settings.strategy = raw.parse::<FeedStrategy>()?;
    }
    let min_roi = args.min_roi.as_deref().and_then(parse_roi_filter);

    let gateway = build_gateway(config);
    let connector = LiveConnector::new(&config.gateway, &feed_settings)?;
    let mut session = MonitorSession::new(gateway, connector, feed_settings.clone());

    session.watch(args.account).await;
    println!(
        "Watching account {} over the {} feed. Press Ctrl-C to stop.",
        args.account, feed_settings.strategy
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            message = session.next_message() => {
                let Some(message) = message else { break };
                if session.handle_message(message) {
                    render_view(&session, feed_settings.strategy, min_roi);
                }
            }
        }
    }

    session.unwatch().await;
    println!("Stopped watching.");
    Ok(())
}

/// Redraws the live view: a status line plus the filtered position table.
fn render_view(session: &MonitorSession, strategy: FeedStrategy, min_roi: Option<Decimal>) {
    let feed_state = match (strategy, session.connection()) {
        (FeedStrategy::Poll, _) => "poll",
        (FeedStrategy::Push, ConnectionStatus::Connected) => "push, live",
        (FeedStrategy::Push, ConnectionStatus::Disconnected) => "push, reconnecting",
    };
    let monitor = session.monitor();
    println!(
        "\n[{}] feed: {} | positions: {} shown / {} open",
        chrono::Local::now().format("%H:%M:%S"),
        feed_state,
        monitor.match_count(min_roi),
        monitor.len(),
    );
    if let Some(reason) = session.last_transport_error() {
        println!("Feed fault: {reason}");
    }
    if monitor.is_empty() {
        println!("No open positions.");
    } else {
        println!("{}", positions_table(&monitor.visible_positions(min_roi)));
    }
}

// ==============================================================================
// Submit Command Logic
// ==============================================================================

/// Handles composing and submitting a batch of trade legs. A template seeds
/// the selection and the defaults; explicit flags still win.
async fn handle_submit(args: SubmitArgs, config: &Config) -> anyhow::Result<()> {
    let gateway = build_gateway(config);

    let mut bot_name = args.bot.clone();
    let mut side = args
        .side
        .as_deref()
        .map(|raw| raw.parse::<PositionSide>())
        .transpose()?;
    let mut margin_mode = args
        .margin_mode
        .as_deref()
        .map(|raw| raw.parse::<MarginMode>())
        .transpose()?;

    let mut composer = TradeComposer::new(config.composer.clone());

    if let Some(id) = args.template {
        let templates = TemplateClient::new(Arc::clone(&gateway));
        let defaults = apply_template(templates.get(id).await?, &mut composer);
        bot_name.get_or_insert(defaults.bot_name);
        side.get_or_insert(defaults.side);
        margin_mode.get_or_insert(defaults.margin_mode);
    }

    let Some(bot_name) = bot_name else {
        bail!("--bot is required unless --template supplies one");
    };
    let side = side.unwrap_or(PositionSide::Long);
    let margin_mode = margin_mode.unwrap_or(MarginMode::Isolated);

    if !args.coins.is_empty() {
        let catalog = SymbolCatalog::fetch(gateway.as_ref()).await?;
        stage_legs(&mut composer, &catalog, &args.coins)?;
    }

    if args.quote {
        let symbols: Vec<String> = composer
            .legs()
            .iter()
            .map(|leg| leg.symbol.clone())
            .collect();
        for symbol in symbols {
            if !composer.resolve_price(gateway.as_ref(), &symbol).await {
                println!("No quote for {symbol}; submitting without one.");
            }
        }
    }

    println!("{}", legs_table(composer.legs()));
    println!(
        "Estimated cost: {}",
        composer.total_estimated_cost().round_dp(2)
    );

    let lifecycle = TradeLifecycle::new(Arc::clone(&gateway));
    let message = lifecycle
        .submit(&mut composer, args.account, &bot_name, side, margin_mode)
        .await?;
    println!("{message}");

    print_position_set(gateway.as_ref(), args.account).await?;
    Ok(())
}

/// Stages the `--coin` specs onto the composer, validating each symbol
/// against the catalog. A spec is `SYMBOL[:leverage[:margin]]`.
fn stage_legs(
    composer: &mut TradeComposer,
    catalog: &SymbolCatalog,
    specs: &[String],
) -> anyhow::Result<()> {
    for spec in specs {
        let mut parts = spec.split(':');
        let symbol = parts.next().unwrap_or("").trim().to_uppercase();
        if symbol.is_empty() {
            bail!("empty coin spec");
        }
        if !catalog.contains(&symbol) {
            bail!("unknown symbol: {symbol}");
        }
        composer.add_leg(&symbol);
        if let Some(leverage) = parts.next() {
            composer.set_leg_field(&symbol, LegField::Leverage, leverage);
        }
        if let Some(margin) = parts.next() {
            composer.set_leg_field(&symbol, LegField::Margin, margin);
        }
    }
    Ok(())
}

// ==============================================================================
// Close Command Logic
// ==============================================================================

/// Handles closing positions, either the whole account or a named subset,
/// in a single batched request.
async fn handle_close(args: CloseArgs, config: &Config) -> anyhow::Result<()> {
    if !args.all && args.positions.is_empty() {
        bail!("pass --all or at least one --position");
    }

    let gateway = build_gateway(config);
    let legs: Vec<CloseRequestLeg> = if args.all {
        gateway
            .fetch_roi(args.account)
            .await?
            .into_iter()
            .map(|update| CloseRequestLeg {
                symbol: update.symbol,
                side: update.side,
            })
            .collect()
    } else {
        args.positions
            .iter()
            .map(|spec| parse_close_spec(spec))
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    let lifecycle = TradeLifecycle::new(Arc::clone(&gateway));
    match lifecycle.close(args.account, &legs).await? {
        Some(message) => println!("{message}"),
        None => println!("No open positions to close."),
    }

    print_position_set(gateway.as_ref(), args.account).await?;
    Ok(())
}

/// Parses a `SYMBOL:SIDE` position spec.
fn parse_close_spec(spec: &str) -> anyhow::Result<CloseRequestLeg> {
    let Some((symbol, side)) = spec.split_once(':') else {
        bail!("position spec must be SYMBOL:SIDE, got '{spec}'");
    };
    Ok(CloseRequestLeg {
        symbol: symbol.trim().to_uppercase(),
        side: side.parse::<PositionSide>()?,
    })
}

// ==============================================================================
// Templates Command Logic
// ==============================================================================

/// Handles the template CRUD subcommands.
async fn handle_templates(args: TemplatesArgs, config: &Config) -> anyhow::Result<()> {
    let gateway = build_gateway(config);
    let client = TemplateClient::new(Arc::clone(&gateway));

    match args.command {
        TemplateCommands::List => {
            let summaries = client.list().await?;
            if summaries.is_empty() {
                println!("No templates stored.");
                return Ok(());
            }
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["ID", "Name", "Created"]);
            for summary in summaries {
                table.add_row(vec![
                    summary.id.to_string(),
                    summary.name,
                    format_created_at(summary.created_at),
                ]);
            }
            println!("{table}");
        }
        TemplateCommands::Show { id } => {
            let settings = client.get(id).await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        TemplateCommands::Save(save) => {
            let side = save.side.parse::<PositionSide>()?;
            let margin_mode = save.margin_mode.parse::<MarginMode>()?;

            let mut composer = TradeComposer::new(config.composer.clone());
            let catalog = SymbolCatalog::fetch(gateway.as_ref()).await?;
            stage_legs(&mut composer, &catalog, &save.coins)?;

            let settings = settings_snapshot(&save.bot, side, margin_mode, &composer);
            client.save(&save.name, &settings).await?;
            println!("Saved template '{}' with {} legs.", save.name, composer.len());
        }
        TemplateCommands::Delete { id } => {
            client.delete(id).await?;
            println!("Deleted template {id}.");
        }
    }
    Ok(())
}

// ==============================================================================
// Shared Helpers
// ==============================================================================

fn build_gateway(config: &Config) -> Arc<dyn GatewayClient> {
    Arc::new(HttpGatewayClient::new(&config.gateway))
}

/// Renders a template's server-assigned unix timestamp as local time.
fn format_created_at(unix_secs: i64) -> String {
    match chrono::DateTime::from_timestamp(unix_secs, 0) {
        Some(moment) => moment
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => unix_secs.to_string(),
    }
}

/// One-shot fetch-and-render of the account's current position set.
async fn print_position_set(
    gateway: &dyn GatewayClient,
    account_id: AccountId,
) -> anyhow::Result<()> {
    let mut monitor = PositionMonitor::new();
    monitor.apply_snapshot(gateway.fetch_roi(account_id).await?);
    if monitor.is_empty() {
        println!("No open positions.");
    } else {
        println!("{}", positions_table(&monitor.visible_positions(None)));
    }
    Ok(())
}

/// Renders the open-position table shown by the watch, submit and close
/// commands.
fn positions_table(positions: &[&OpenPosition]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Symbol", "Side", "Entry", "Mark", "Lev", "ROI %"]);
    for position in positions {
        table.add_row(vec![
            position.symbol.clone(),
            position.side.to_string(),
            position.entry_price.normalize().to_string(),
            position.mark_price.normalize().to_string(),
            format!("{}x", position.leverage),
            position.roi_percent.round_dp(2).to_string(),
        ]);
    }
    table
}

/// Renders the staged-leg preview shown before a submission.
fn legs_table(legs: &[CandidateLeg]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Symbol", "Lev", "Margin", "Price", "Est. Cost"]);
    for leg in legs {
        let price = match leg.price.quoted() {
            Some(price) => price.normalize().to_string(),
            None => "-".to_string(),
        };
        let cost = match leg.estimated_cost() {
            Some(cost) => cost.round_dp(2).to_string(),
            None => "-".to_string(),
        };
        table.add_row(vec![
            leg.symbol.clone(),
            format!("{}x", leg.leverage),
            leg.margin.normalize().to_string(),
            price,
            cost,
        ]);
    }
    table
}
