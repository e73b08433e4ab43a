use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use takehome::core::{
    FilingStatus, IncomeInput, TaxCalculationEngine, TaxCalculationInput, TaxCalculationResult,
    UsState,
};
use takehome::rules::{
    HttpRemoteSource, ProviderConfig, RefreshOutcome, RemoteSource, RuleDataProvider,
};

/// takehome - US after-tax income calculator
#[derive(Parser, Debug)]
#[command(name = "takehome")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, env = "TAKEHOME_PORT", default_value_t = 8080)]
        port: u16,

        /// Base URL of the rule-data service; refresh is disabled without it
        #[arg(long, env = "TAKEHOME_DATA_URL")]
        data_url: Option<String>,

        /// Directory for cached rule data
        #[arg(long, env = "TAKEHOME_CACHE_DIR")]
        cache_dir: Option<PathBuf>,

        #[arg(long, env = "TAKEHOME_FETCH_TIMEOUT_SECS", default_value_t = 15)]
        fetch_timeout_secs: u64,

        #[arg(long, env = "TAKEHOME_CACHE_TTL_HOURS", default_value_t = 168)]
        cache_ttl_hours: u64,

        /// Minutes between background refreshes; 0 refreshes only at startup
        #[arg(long, env = "TAKEHOME_REFRESH_INTERVAL_MINS", default_value_t = 0)]
        refresh_interval_mins: u64,
    },
    /// Calculate take-home pay once and print it
    Calculate {
        /// Annual salary
        #[arg(long)]
        gross: Decimal,

        #[arg(long, default_value = "0")]
        bonus: Decimal,

        #[arg(long, default_value = "0")]
        other_income: Decimal,

        #[arg(long, default_value = "CA")]
        state: UsState,

        #[arg(long, default_value = "single")]
        filing_status: FilingStatus,

        #[arg(long, default_value = "0")]
        pre_tax: Decimal,

        #[arg(long, default_value = "0")]
        post_tax: Decimal,

        #[arg(long = "traditional-401k", default_value = "0")]
        traditional_401k: Decimal,

        #[arg(long = "roth-401k", default_value = "0")]
        roth_401k: Decimal,

        /// Compare against the same input with this gross income
        #[arg(long)]
        compare_gross: Option<Decimal>,

        /// Compare against the same input in this state
        #[arg(long)]
        compare_state: Option<UsState>,

        /// Rank every state for this input
        #[arg(long)]
        all_states: bool,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let result = match cli.command {
        Commands::Serve {
            port,
            data_url,
            cache_dir,
            fetch_timeout_secs,
            cache_ttl_hours,
            refresh_interval_mins,
        } => {
            let config = ProviderConfig {
                cache_dir,
                cache_ttl: Duration::from_secs(cache_ttl_hours * 60 * 60),
                fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            };
            serve(port, config, data_url, refresh_interval_mins).await
        }
        Commands::Calculate {
            gross,
            bonus,
            other_income,
            state,
            filing_status,
            pre_tax,
            post_tax,
            traditional_401k,
            roth_401k,
            compare_gross,
            compare_state,
            all_states,
            json,
        } => {
            let income = IncomeInput {
                bonuses: bonus,
                other_income,
                ..IncomeInput::new(gross)
            };
            let mut input = TaxCalculationInput {
                filing_status,
                state,
                pre_tax_deductions: pre_tax,
                post_tax_deductions: post_tax,
                traditional_401k,
                roth_401k,
                ..TaxCalculationInput::default()
            };
            income.apply_to(&mut input);
            let scenario = (compare_gross.is_some() || compare_state.is_some()).then(|| {
                TaxCalculationInput {
                    gross_income: compare_gross.unwrap_or(input.gross_income),
                    state: compare_state.unwrap_or(state),
                    ..input.clone()
                }
            });
            calculate(&input, scenario.as_ref(), all_states, json)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn serve(
    port: u16,
    config: ProviderConfig,
    data_url: Option<String>,
    refresh_interval_mins: u64,
) -> Result<(), String> {
    let remote = match data_url {
        Some(url) => {
            let source =
                HttpRemoteSource::new(url, config.fetch_timeout).map_err(|e| e.to_string())?;
            Some(Arc::new(source) as Arc<dyn RemoteSource>)
        }
        None => None,
    };
    let refresh_enabled = remote.is_some();
    let provider = Arc::new(RuleDataProvider::new(config, remote).map_err(|e| e.to_string())?);
    info!(tier = ?provider.tier(), version = %provider.version(), "rule data ready");

    if refresh_enabled {
        let background = Arc::clone(&provider);
        tokio::spawn(async move {
            log_refresh(background.spawn_refresh().await.ok());
            if refresh_interval_mins == 0 {
                return;
            }
            let period = Duration::from_secs(refresh_interval_mins * 60);
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                log_refresh(background.spawn_refresh().await.ok());
            }
        });
    }

    takehome::api::run_http_server(port, provider)
        .await
        .map_err(|e| format!("server error: {e}"))
}

fn log_refresh(outcome: Option<RefreshOutcome>) {
    match outcome {
        Some(RefreshOutcome::Updated { version }) => info!(%version, "rule data refreshed"),
        Some(RefreshOutcome::Failed(error)) => warn!(%error, "rule data refresh failed"),
        Some(other) => info!(outcome = ?other, "rule data refresh finished"),
        None => warn!("rule data refresh task aborted"),
    }
}

fn calculate(
    input: &TaxCalculationInput,
    scenario: Option<&TaxCalculationInput>,
    all_states: bool,
    json: bool,
) -> Result<(), String> {
    let provider =
        RuleDataProvider::new(ProviderConfig::default(), None).map_err(|e| e.to_string())?;
    let rules = provider.rules();
    let engine = TaxCalculationEngine::new(rules.as_ref());

    if all_states {
        let results = engine.compare_all_states(input).map_err(|e| e.to_string())?;
        if json {
            return print_json(&results);
        }
        for (rank, result) in results.iter().enumerate() {
            println!(
                "{:>2}. {:<16} net {:>12}  monthly {:>10}  state tax {:>10}",
                rank + 1,
                result.state.state.name(),
                money(result.net),
                money(result.timeframes.monthly),
                money(result.state.total_tax),
            );
        }
        return Ok(());
    }

    if let Some(scenario) = scenario {
        let comparison = engine
            .compare_scenarios(input, scenario)
            .map_err(|e| e.to_string())?;
        if json {
            return print_json(&comparison);
        }
        print_summary("Base", &comparison.base);
        print_summary("Scenario", &comparison.scenario);
        println!(
            "Difference: {} per year, {} per month ({}%)",
            money(comparison.net_difference),
            money(comparison.monthly_difference),
            comparison.net_difference_percent().round_dp(2),
        );
        return Ok(());
    }

    let result = engine.calculate(input).map_err(|e| e.to_string())?;
    if json {
        return print_json(&result);
    }
    print_summary("Take-home", &result);
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

fn print_summary(label: &str, result: &TaxCalculationResult) {
    println!(
        "{label}: {}, tax year {}, federal marginal rate {}%",
        result.state.state.name(),
        result.year,
        (result.federal.marginal_rate * Decimal::ONE_HUNDRED).normalize(),
    );
    println!("  Gross:        {:>12}", money(result.gross_income));
    println!("  Pre-tax:      {:>12}", money(result.total_pre_tax));
    println!("  Federal tax:  {:>12}", money(result.federal.tax));
    println!("  State tax:    {:>12}", money(result.state.total_tax));
    println!("  FICA:         {:>12}", money(result.fica.total));
    println!("  Post-tax:     {:>12}", money(result.total_post_tax));
    println!("  Net:          {:>12}", money(result.net));
    println!("  Monthly:      {:>12}", money(result.timeframes.monthly));
    println!("  Bi-weekly:    {:>12}", money(result.timeframes.bi_weekly));
    println!("  Hourly:       {:>12}", money(result.timeframes.hourly));
    println!("  Take-home:    {:>11}%", result.take_home_percentage.round_dp(1));
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}
