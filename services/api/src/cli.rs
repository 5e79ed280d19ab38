use crate::demo::{run_demo, run_quote, run_rates, DemoArgs, QuoteArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use tutor_payroll::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Tutor Payroll",
    about = "Track tutoring sessions and reconcile tutor payroll from the command line",
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
    /// Print the hourly rate table
    Rates,
    /// Price a single lesson without storing it
    Quote(QuoteArgs),
    /// Run an in-memory walkthrough of intake, approvals, and exports
    Demo(DemoArgs),
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

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rates => {
            run_rates();
            Ok(())
        }
        Command::Quote(args) => run_quote(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["tutor-payroll-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn quote_arguments_parse() {
        let cli = Cli::try_parse_from([
            "tutor-payroll-api",
            "quote",
            "--class-level",
            "Year 8",
            "--start",
            "2025-03-10T10:00",
            "--end",
            "2025-03-10T11:30",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Quote(args)) => {
                assert_eq!(args.class_level, "Year 8");
                assert_eq!(args.utc_offset_minutes, None);
            }
            other => panic!("expected quote command, got {other:?}"),
        }
    }

    #[test]
    fn demo_rejects_malformed_dates() {
        let result = Cli::try_parse_from(["tutor-payroll-api", "demo", "--date", "10/03/2025"]);
        assert!(result.is_err());
    }
}
