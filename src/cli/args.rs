use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pargamd-setup",
    version,
    about = "Generate ParGaMD/WESTPA configuration bundles"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v INFO, -vv DEBUG, -vvv TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH", env = "PARGAMD_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render every artifact and write the full bundle zip
    Generate(GenerateArgs),
    /// Print one rendered artifact
    Preview(PreviewArgs),
    /// List artifacts and their declared parameters
    Schema,
    /// Run the HTTP API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// JSON object of parameter values
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Override one parameter. Can be repeated. Example: -S nstlim=40000
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub params: ParamArgs,

    /// Prepared simulation directory whose static files are bundled
    #[arg(long, value_name = "DIR", env = "PARGAMD_STATIC_ROOT", default_value = ".")]
    pub static_root: PathBuf,

    /// Output zip path; defaults to a timestamped name in the current directory
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Artifact name or bundle path, e.g. west.cfg or westpa_scripts/runseg.sh
    pub name: String,

    #[command(flatten)]
    pub params: ParamArgs,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, value_name = "ADDR", env = "PARGAMD_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    #[arg(long, value_name = "DIR", env = "PARGAMD_STATIC_ROOT", default_value = ".")]
    pub static_root: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "pargamd-setup",
            "preview",
            "west.cfg",
            "-S",
            "nstlim=40000",
            "--set",
            "ntpr=400",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Preview(args) => {
                assert_eq!(args.name, "west.cfg");
                assert_eq!(args.params.set_values, vec!["nstlim=40000", "ntpr=400"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["pargamd-setup", "-q", "-v", "schema"]).is_err());
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["pargamd-setup", "serve", "--bind", "127.0.0.1:8080"])
            .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.bind, "127.0.0.1:8080".parse().unwrap());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
