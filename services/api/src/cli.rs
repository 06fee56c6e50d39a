use crate::report::{run_evaluate, run_review, run_stats, EvaluateArgs, ReviewArgs, StatsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use extension_ai::config::AppConfig;
use extension_ai::error::AppError;
use extension_ai::telemetry;

#[derive(Parser, Debug)]
#[command(
    name = "Payment Extension Review",
    about = "Evaluate, review, and serve vendor payment-extension decisions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a single request given on the command line
    Evaluate(EvaluateArgs),
    /// Show AI recommendations for the pending queue and optionally apply them
    Review(ReviewArgs),
    /// Print queue and decision-history statistics
    Stats(StatsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    dispatch(command, config).await
}

async fn dispatch(command: Command, config: AppConfig) -> Result<(), AppError> {
    match command {
        Command::Serve(args) => server::run(args, config).await,
        Command::Evaluate(args) => run_evaluate(args, &config),
        Command::Review(args) => run_review(args, &config),
        Command::Stats(args) => run_stats(args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extension_ai::config::{AppEnvironment, ServerConfig, StorageConfig, TelemetryConfig};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "warn".to_string(),
            },
            storage: StorageConfig {
                data_dir: dir.path().to_path_buf(),
            },
            policy_path: None,
        }
    }

    #[tokio::test]
    async fn report_commands_run_against_loaded_config() {
        let dir = TempDir::new().expect("temp dir");
        telemetry::init(&config(&dir).telemetry).expect("subscriber installs");

        dispatch(
            Command::Evaluate(EvaluateArgs {
                amount: Some("12500".to_string()),
                ..EvaluateArgs::default()
            }),
            config(&dir),
        )
        .await
        .expect("evaluate runs");

        dispatch(
            Command::Review(ReviewArgs {
                data_dir: None,
                apply: true,
                actor: "System".to_string(),
            }),
            config(&dir),
        )
        .await
        .expect("review runs");

        dispatch(
            Command::Stats(StatsArgs {
                data_dir: None,
                today: None,
                recent: 5,
            }),
            config(&dir),
        )
        .await
        .expect("stats runs");
    }

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["extension-ai-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn evaluate_accepts_raw_field_values() {
        let cli = Cli::try_parse_from([
            "extension-ai-api",
            "evaluate",
            "--amount",
            "12500",
            "--days",
            "14",
            "--cash-flow",
            "Low",
            "--json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.amount.as_deref(), Some("12500"));
                assert_eq!(args.days.as_deref(), Some("14"));
                assert_eq!(args.cash_flow.as_deref(), Some("Low"));
                assert!(args.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn review_defaults_to_dry_run() {
        let cli = Cli::try_parse_from(["extension-ai-api", "review"]).expect("parses");
        match cli.command {
            Some(Command::Review(args)) => {
                assert!(!args.apply);
                assert_eq!(args.actor, "System");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
