//! portopt CLI binary.
//!
//! Provides command-line access to the portfolio optimization views.

mod args;
mod cache;
mod progress;

use args::{
    DiversificationArgs, FrontierArgs, HcpArgs, MeanRiskArgs, OutputArgs, OutputFormat,
    PortfolioArgs, RelaxedArgs, RiskArgs, RiskParityArgs,
};
use cache::CacheAction;
use clap::{Parser, Subcommand};
use portopt::output::{BrowserSink, ChartSink, ExportFormat, Exporter, HtmlDirSink};
use portopt::{Allocation, HcpModel, Objective, PortfolioViews, additional_plots};
use portopt_data::{YahooPropertyClient, YahooQuoteProvider, YahooReturnsProvider};
use portopt_engine::ReferenceEngine;
use progress::Spinning;
use std::io::{self, Write};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

type Views = PortfolioViews<Spinning<YahooReturnsProvider>, ReferenceEngine, Box<dyn Write>>;

#[derive(Parser)]
#[command(name = "portopt")]
#[command(about = "portopt: Portfolio optimization views", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Equally weighted portfolio
    Equal {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        risk: RiskArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Portfolio weighted by an asset property such as market cap
    Property {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        /// Property to weight by
        #[arg(long)]
        property: Option<String>,
        #[command(flatten)]
        risk: RiskArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Mean-risk portfolio with a chosen objective
    MeanRisk {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        /// Objective: minrisk, sharpe, utility or maxret
        #[arg(long, default_value = "sharpe")]
        objective: String,
        #[command(flatten)]
        mean_risk: MeanRiskArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Maximal return/risk ratio portfolio
    MaxSharpe {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        mean_risk: MeanRiskArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Minimum risk portfolio
    MinRisk {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        mean_risk: MeanRiskArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Maximal risk averse utility portfolio
    MaxUtil {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        mean_risk: MeanRiskArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Maximal return portfolio
    MaxRet {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        mean_risk: MeanRiskArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Maximal diversification portfolio
    MaxDiv {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        diversification: DiversificationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Maximal decorrelation portfolio
    MaxDecorr {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        diversification: DiversificationArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Efficient frontier chart
    Ef {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        frontier: FrontierArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Risk parity portfolio by risk budgeting
    RiskParity {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        parity: RiskParityArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Relaxed risk parity portfolio
    RelRiskParity {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        relaxed: RelaxedArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Hierarchical clustering portfolio with a chosen model
    Hcp {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        /// Model: HRP, HERC or NCO
        #[arg(long, default_value = "HRP")]
        model: String,
        #[command(flatten)]
        hcp: HcpArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Hierarchical risk parity portfolio
    Hrp {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        hcp: HcpArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Hierarchical equal risk contribution portfolio
    Herc {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        hcp: HcpArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Nested clustered optimization portfolio
    Nco {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        #[command(flatten)]
        hcp: HcpArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Inspect or clear the market data cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Equal {
            portfolio,
            risk,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = risk.weighting(portfolio.value)?;
            let allocation = views
                .display_equal_weight(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::Property {
            portfolio,
            property,
            risk,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = risk.weighting(portfolio.value)?;
            let allocation = views
                .display_property_weighting(&portfolio.request()?, property.as_deref(), &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::MeanRisk {
            portfolio,
            objective,
            mean_risk,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = mean_risk.params(objective.parse()?, portfolio.value)?;
            let allocation = views
                .display_mean_risk(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::MaxSharpe {
            portfolio,
            mean_risk,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = mean_risk.params(Objective::Sharpe, portfolio.value)?;
            let allocation = views
                .display_max_sharpe(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::MinRisk {
            portfolio,
            mean_risk,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = mean_risk.params(Objective::MinRisk, portfolio.value)?;
            let allocation = views
                .display_min_risk(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::MaxUtil {
            portfolio,
            mean_risk,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = mean_risk.params(Objective::Utility, portfolio.value)?;
            let allocation = views
                .display_max_util(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::MaxRet {
            portfolio,
            mean_risk,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = mean_risk.params(Objective::MaxRet, portfolio.value)?;
            let allocation = views
                .display_max_ret(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::MaxDiv {
            portfolio,
            diversification,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = diversification.params(portfolio.value)?;
            let allocation = views
                .display_max_div(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::MaxDecorr {
            portfolio,
            diversification,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = diversification.params(portfolio.value)?;
            let allocation = views
                .display_max_decorr(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::Ef {
            portfolio,
            frontier,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = frontier.params(portfolio.value)?;
            let allocation = views
                .display_ef(&portfolio.request()?, &params, None)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::RiskParity {
            portfolio,
            parity,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = parity.params(portfolio.value)?;
            let allocation = views
                .display_risk_parity(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::RelRiskParity {
            portfolio,
            relaxed,
            output,
        } => {
            let mut views = views(&portfolio, &output)?;
            let params = relaxed.params(portfolio.value)?;
            let allocation = views
                .display_rel_risk_parity(&portfolio.request()?, &params)
                .await?;
            finish(views, allocation, &output)?;
        }
        Commands::Hcp {
            portfolio,
            model,
            hcp,
            output,
        } => hierarchical(&portfolio, model.parse()?, &hcp, &output).await?,
        Commands::Hrp {
            portfolio,
            hcp,
            output,
        } => hierarchical(&portfolio, HcpModel::Hrp, &hcp, &output).await?,
        Commands::Herc {
            portfolio,
            hcp,
            output,
        } => hierarchical(&portfolio, HcpModel::Herc, &hcp, &output).await?,
        Commands::Nco {
            portfolio,
            hcp,
            output,
        } => hierarchical(&portfolio, HcpModel::Nco, &hcp, &output).await?,
        Commands::Cache { action } => cache::run(action)?,
    }

    Ok(())
}

async fn hierarchical(
    portfolio: &PortfolioArgs,
    model: HcpModel,
    hcp: &HcpArgs,
    output: &OutputArgs,
) -> CliResult<()> {
    let mut views = views(portfolio, output)?;
    let params = hcp.params(model, portfolio.value)?;
    let allocation = views.display_hcp(&portfolio.request()?, &params).await?;
    finish(views, allocation, output)
}

/// Views over Yahoo data, the reference engine and the requested outputs.
fn views(portfolio: &PortfolioArgs, output: &OutputArgs) -> CliResult<Views> {
    let config = portfolio.fetch_config();
    let cache = if config.use_cache {
        match cache::open_cache() {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "cache unavailable, fetching without it");
                None
            }
        }
    } else {
        None
    };

    let provider = YahooReturnsProvider::new(
        YahooQuoteProvider::new()?,
        YahooPropertyClient::new()?,
        cache,
        config,
    );
    let out: Box<dyn Write> = match output.format {
        OutputFormat::Text => Box::new(io::stdout()),
        OutputFormat::Json => Box::new(io::sink()),
    };
    let sink: Box<dyn ChartSink> = match &output.charts {
        Some(dir) => Box::new(HtmlDirSink::new(dir)),
        None => Box::new(BrowserSink),
    };
    Ok(PortfolioViews::new(
        Spinning::new(provider),
        ReferenceEngine::new(),
        out,
        sink,
    ))
}

/// Draw the requested charts, then print and export the allocation.
fn finish(mut views: Views, allocation: Option<Allocation>, output: &OutputArgs) -> CliResult<()> {
    let Some(allocation) = allocation else {
        if output.format == OutputFormat::Json {
            println!("null");
        }
        return Ok(());
    };

    let flags = output.flags();
    if flags.any() {
        let engine = *views.engine();
        additional_plots(&allocation.plot_input(), flags, &engine, None, views.sink())?;
    }

    let report = allocation.report();
    if output.format == OutputFormat::Json {
        println!("{}", report.to_json()?);
    }
    if let Some(path) = &output.export {
        report.export_to_file(path, ExportFormat::from_path(path)?)?;
        info!(path = %path.display(), "allocation exported");
    }
    Ok(())
}
