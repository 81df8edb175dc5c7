use std::{fmt, fs, path::PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::rngs::OsRng;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zktoken_common::{Address, SecretKey};
use zktoken_simulator::{
    run_scenario, sample_scenario, ScenarioConfig, ScenarioReport, SCENARIO_PATH_ENV,
};

#[derive(Parser)]
#[command(
    name = "zktoken-tools",
    about = "Utility commands for zktoken keys, addresses and scenarios"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the public address committed to by a secret key.
    Address(AddressArgs),
    /// Generate a random secret key and its address.
    Keygen(KeygenArgs),
    /// Run a JSON scenario against a fresh ledger.
    Run(RunArgs),
    /// Print a sample scenario exercising every operation.
    SampleScenario(SampleArgs),
}

#[derive(Args)]
struct AddressArgs {
    /// Hex-encoded 32-byte secret key.
    #[arg(long)]
    secret_key: String,
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct KeygenArgs {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Scenario file. Defaults to the path in ZKTOKEN_SCENARIO.
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long)]
    json: bool,
    /// Exit with an error when any step misses its expectation.
    #[arg(long)]
    strict: bool,
}

#[derive(Args)]
struct SampleArgs {
    /// Write the scenario here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "zktoken_tools=info,zktoken_simulator=info,zktoken_ledger=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Address(args) => address(args),
        Commands::Keygen(args) => keygen(args),
        Commands::Run(args) => run(args),
        Commands::SampleScenario(args) => sample(args),
    }
}

fn address(args: AddressArgs) -> Result<()> {
    let secret_key = SecretKey::from_hex(&args.secret_key).context("invalid --secret-key")?;
    let summary = AddressSummary {
        address: secret_key.address(),
    };
    output_summary(&summary, args.json)
}

fn keygen(args: KeygenArgs) -> Result<()> {
    let secret_key = SecretKey::random(&mut OsRng);
    let summary = KeygenSummary {
        secret_key: secret_key.to_hex(),
        address: secret_key.address(),
    };
    tracing::info!(address = %summary.address, "generated secret key");
    output_summary(&summary, args.json)
}

fn run(args: RunArgs) -> Result<()> {
    let scenario = match &args.scenario {
        Some(path) => ScenarioConfig::from_path(path)?,
        None => ScenarioConfig::from_env()
            .with_context(|| format!("pass --scenario or set {SCENARIO_PATH_ENV}"))?,
    };

    let report = run_scenario(&scenario)?;
    output_summary(&RunSummary(&report), args.json)?;

    if args.strict && !report.passed() {
        let failed: Vec<usize> = report.failed_steps().map(|step| step.index).collect();
        bail!("scenario steps {failed:?} did not match expectations");
    }
    Ok(())
}

fn sample(args: SampleArgs) -> Result<()> {
    let json = serde_json::to_string_pretty(&sample_scenario())?;
    match args.output {
        Some(path) => {
            fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote sample scenario");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn output_summary<T>(summary: &T, json: bool) -> Result<()>
where
    T: Serialize + fmt::Display,
{
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        print!("{summary}");
    }
    Ok(())
}

#[derive(Serialize)]
struct AddressSummary {
    address: Address,
}

impl fmt::Display for AddressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "address: {}", self.address)
    }
}

#[derive(Serialize)]
struct KeygenSummary {
    secret_key: String,
    address: Address,
}

impl fmt::Display for KeygenSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "secret_key: {}", self.secret_key)?;
        writeln!(f, "address: {}", self.address)
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct RunSummary<'a>(&'a ScenarioReport);

impl fmt::Display for RunSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "token: {} ({}), decimals {}, supply {}",
            report.token.name, report.token.symbol, report.token.decimals, report.token.total_supply
        )?;
        writeln!(f, "steps:")?;
        for step in &report.steps {
            let mark = if step.expectation_met { "  " } else { "!!" };
            write!(f, "{mark} #{} {} by {}: {}", step.index, step.op, step.caller, step.outcome.code())?;
            match &step.expected {
                Some(expected) if !step.expectation_met => writeln!(f, " (expected {expected})")?,
                _ => writeln!(f)?,
            }
        }
        writeln!(f, "balances:")?;
        for (holder, amount) in &report.balances {
            writeln!(f, "   {holder}: {amount}")?;
        }
        writeln!(f, "commitment: {}", report.commitment)?;
        writeln!(f, "passed: {}", report.passed())
    }
}
