use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Evaluates lazily recomputed matrix algebra models.
#[derive(Parser)]
#[command(
    name = "semcore",
    version,
    about = "Matrix algebra graph evaluator for structural equation models"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Evaluate the nodes listed in the model file.
    Eval(EvalArgs),
    /// Print (I - A)^-1 and the expected covariance of the RAM block.
    Ram(RamArgs),
    /// List the operator table.
    Ops,
}

/// Arguments for the `eval` subcommand.
#[derive(clap::Args)]
pub struct EvalArgs {
    /// Path to TOML model file.
    #[arg(short, long, default_value = "model.toml")]
    pub model: PathBuf,

    /// Free parameter values overriding the model's start values.
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    pub params: Option<Vec<f64>>,

    /// Evaluate these nodes instead of the model's `evaluate` list.
    #[arg(short, long)]
    pub node: Vec<String>,
}

/// Arguments for the `ram` subcommand.
#[derive(clap::Args)]
pub struct RamArgs {
    /// Path to TOML model file.
    #[arg(short, long, default_value = "model.toml")]
    pub model: PathBuf,

    /// Free parameter values overriding the model's start values.
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    pub params: Option<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_params_accept_negative_values() {
        let cli = Cli::try_parse_from(["semcore", "-vv", "eval", "--params", "-0.5,2", "-n", "Z"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Eval(args) => {
                assert_eq!(args.model, PathBuf::from("model.toml"));
                assert_eq!(args.params, Some(vec![-0.5, 2.0]));
                assert_eq!(args.node, vec!["Z".to_string()]);
            }
            _ => panic!("expected eval"),
        }
    }

    #[test]
    fn ram_takes_model_path() {
        let cli = Cli::try_parse_from(["semcore", "ram", "--model", "chain.toml"]).unwrap();
        match cli.command {
            Command::Ram(args) => {
                assert_eq!(args.model, PathBuf::from("chain.toml"));
                assert!(args.params.is_none());
            }
            _ => panic!("expected ram"),
        }
    }

    #[test]
    fn bad_parameter_is_rejected() {
        assert!(Cli::try_parse_from(["semcore", "eval", "--params", "1,x"]).is_err());
        assert!(Cli::try_parse_from(["semcore"]).is_err());
    }
}
