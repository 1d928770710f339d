//! # shipcast
//!
//! Command-line front end for exploring, forecasting and evaluating a
//! monthly shipment history.

use clap::{Args, Parser, Subcommand, ValueEnum};
use shipcast::config::PipelineConfig;
use shipcast::export::{save_forecast_csv, save_report_json};
use shipcast::models::{Arima, Component, HoltWinters, ModelKind, ModelSpec, MovingAverage, Sarima};
use shipcast::series::format_month;
use shipcast::{Pipeline, SessionCache, SessionId};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "shipcast")]
#[command(about = "Monthly shipment forecasting", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// CSV file with `date` and `shipped_qty` columns (overrides the config)
    #[arg(short, long, global = true)]
    data: Option<PathBuf>,

    /// Number of held-out months (overrides the config)
    #[arg(long, global = true)]
    horizon: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report outliers and a seasonal decomposition
    Explore,

    /// Forecast the held-out months
    Forecast {
        #[command(flatten)]
        model: ModelArgs,

        /// Write the forecast table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Forecast the held-out months and score the forecast
    Evaluate {
        #[command(flatten)]
        model: ModelArgs,

        /// Write the evaluation report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelChoice {
    MovingAverage,
    Arima,
    Sarima,
    HoltWinters,
    Prophet,
}

impl From<ModelChoice> for ModelKind {
    fn from(choice: ModelChoice) -> Self {
        match choice {
            ModelChoice::MovingAverage => ModelKind::MovingAverage,
            ModelChoice::Arima => ModelKind::Arima,
            ModelChoice::Sarima => ModelKind::Sarima,
            ModelChoice::HoltWinters => ModelKind::HoltWinters,
            ModelChoice::Prophet => ModelKind::Prophet,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ComponentChoice {
    Add,
    Mul,
    None,
}

impl From<ComponentChoice> for Component {
    fn from(choice: ComponentChoice) -> Self {
        match choice {
            ComponentChoice::Add => Component::Additive,
            ComponentChoice::Mul => Component::Multiplicative,
            ComponentChoice::None => Component::None,
        }
    }
}

/// Model selection; unset flags keep the configured values
#[derive(Args)]
struct ModelArgs {
    /// Forecasting model
    #[arg(short, long, value_enum)]
    model: Option<ModelChoice>,

    /// Moving average window
    #[arg(long)]
    window: Option<usize>,

    /// Autoregressive order
    #[arg(long)]
    p: Option<usize>,

    /// Differencing order
    #[arg(long)]
    d: Option<usize>,

    /// Moving average order
    #[arg(long)]
    q: Option<usize>,

    /// Seasonal autoregressive order
    #[arg(long)]
    seasonal_p: Option<usize>,

    /// Seasonal differencing order
    #[arg(long)]
    seasonal_d: Option<usize>,

    /// Seasonal moving average order
    #[arg(long)]
    seasonal_q: Option<usize>,

    /// Season length (SARIMA and Holt-Winters)
    #[arg(short, long)]
    season_length: Option<usize>,

    /// Holt-Winters trend component
    #[arg(long, value_enum)]
    trend: Option<ComponentChoice>,

    /// Holt-Winters seasonal component
    #[arg(long, value_enum)]
    seasonal: Option<ComponentChoice>,
}

impl ModelArgs {
    /// Apply the flags on top of the configured model
    fn resolve(&self, configured: &ModelSpec) -> ModelSpec {
        let mut spec = match self.model.map(ModelKind::from) {
            Some(kind) if kind != configured.kind() => ModelSpec::default_for(kind),
            _ => configured.clone(),
        };

        match &mut spec {
            ModelSpec::MovingAverage(MovingAverage { window }) => {
                override_with(window, self.window);
            }
            ModelSpec::Arima(Arima { p, d, q }) => {
                override_with(p, self.p);
                override_with(d, self.d);
                override_with(q, self.q);
            }
            ModelSpec::Sarima(Sarima {
                p,
                d,
                q,
                big_p,
                big_d,
                big_q,
                s,
            }) => {
                override_with(p, self.p);
                override_with(d, self.d);
                override_with(q, self.q);
                override_with(big_p, self.seasonal_p);
                override_with(big_d, self.seasonal_d);
                override_with(big_q, self.seasonal_q);
                override_with(s, self.season_length);
            }
            ModelSpec::HoltWinters(HoltWinters {
                trend,
                seasonal,
                seasonal_periods,
            }) => {
                override_with(trend, self.trend.map(Component::from));
                override_with(seasonal, self.seasonal.map(Component::from));
                override_with(seasonal_periods, self.season_length);
            }
            ModelSpec::Prophet(_) => {}
        }

        spec
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn load_config(cli: &Cli) -> CliResult<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(horizon) = cli.horizon {
        config.horizon = horizon;
    }
    Ok(config)
}

fn explore(pipeline: &Pipeline) -> CliResult<()> {
    let outliers = pipeline.outliers()?;
    println!(
        "Outlier fences: [{:.2}, {:.2}]",
        outliers.lower, outliers.upper
    );
    if outliers.months.is_empty() {
        println!("No outliers detected");
    } else {
        for month in &outliers.months {
            println!("  outlier: {}", format_month(*month));
        }
    }

    // A short or gappy series cannot be decomposed, but the outliers still stand
    match pipeline.decomposition() {
        Ok(decomposition) => {
            println!(
                "\n{} decomposition (period {}), seasonal indices:",
                decomposition.kind, decomposition.period
            );
            for (i, index) in decomposition.seasonal_indices().iter().enumerate() {
                println!("  {:>2}: {:>10.3}", i + 1, index);
            }
        }
        Err(err) => println!("\nDecomposition unavailable: {}", err),
    }
    Ok(())
}

fn forecast(
    pipeline: &Pipeline,
    cache: &mut SessionCache,
    session: &SessionId,
    spec: &ModelSpec,
    output: Option<PathBuf>,
) -> CliResult<()> {
    let forecast = pipeline.forecast(cache, session, spec)?;

    println!("{} forecast:", spec.name());
    println!("{:<10} {:>12}", "month", "forecast");
    for point in forecast.points() {
        println!("{:<10} {:>12.2}", format_month(point.month), point.forecast);
    }

    if let Some(path) = output {
        save_forecast_csv(&forecast, path)?;
    }
    Ok(())
}

fn evaluate(
    pipeline: &Pipeline,
    cache: &mut SessionCache,
    session: &SessionId,
    spec: &ModelSpec,
    json: Option<PathBuf>,
) -> CliResult<()> {
    pipeline.forecast(cache, session, spec)?;
    let report = pipeline.evaluate(cache, session)?;

    println!("{} evaluation", spec.name());
    print!("{}", report.metrics);
    println!();
    println!("{:<10} {:>12} {:>12}", "month", "actual", "forecast");
    for row in &report.comparison {
        println!(
            "{:<10} {:>12.2} {:>12.2}",
            format_month(row.month),
            row.actual,
            row.forecast
        );
    }

    if let Some(path) = json {
        save_report_json(&report, path)?;
    }
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    let pipeline = Pipeline::load(config)?;
    let mut cache = SessionCache::new();
    let session = SessionId::new("cli");

    match cli.command {
        Commands::Explore => explore(&pipeline),
        Commands::Forecast { model, output } => {
            let spec = model.resolve(&pipeline.config().model);
            forecast(&pipeline, &mut cache, &session, &spec, output)
        }
        Commands::Evaluate { model, json } => {
            let spec = model.resolve(&pipeline.config().model);
            evaluate(&pipeline, &mut cache, &session, &spec, json)
        }
    }
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shipcast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
