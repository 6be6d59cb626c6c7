use crate::report::{run_calc, run_rules, CalcArgs, RulesArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use import_duty::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Import Duty Calculator",
    about = "Estimate customs duty, excise, VAT and fees for imported vehicles",
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
    /// Calculate the payments for a single vehicle
    Calc(CalcArgs),
    /// Summarise the loaded rule table
    Rules(RulesArgs),
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
        Command::Calc(args) => run_calc(args),
        Command::Rules(args) => run_rules(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn calc_accepts_repeated_rates() {
        let cli = Cli::try_parse_from([
            "import-duty-api",
            "calc",
            "--importer",
            "company",
            "--usage",
            "commercial",
            "--fuel",
            "diesel",
            "--engine-cc",
            "2400",
            "--engine-hp",
            "190",
            "--production-year",
            "2021",
            "--value",
            "30000",
            "--rate",
            "EUR=100",
            "--rate",
            "USD=90.5",
        ])
        .expect("calc arguments parse");

        match cli.command {
            Some(Command::Calc(args)) => {
                assert_eq!(args.rates.len(), 2);
                assert_eq!(args.rates[1].0, "USD");
                assert_eq!(args.engine_hp, Some(190));
            }
            other => panic!("expected calc command, got {other:?}"),
        }
    }

    #[test]
    fn calc_requires_an_engine_displacement() {
        let parsed = Cli::try_parse_from([
            "import-duty-api",
            "calc",
            "--fuel",
            "электро",
            "--production-year",
            "2024",
            "--value",
            "20000",
        ]);
        match parsed {
            Err(err) => assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument),
            Ok(cli) => panic!("expected a missing --engine-cc error, got {:?}", cli.command),
        }
    }

    #[test]
    fn missing_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["import-duty-api"]).expect("empty args parse");
        assert!(cli.command.is_none());
    }
}
