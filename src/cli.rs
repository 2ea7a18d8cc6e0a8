use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "stackward")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Policy-driven filters and actions for CloudFormation stacks", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run policies against the stacks of a region
    Run(RunArgs),

    /// Parse a policy file and build every filter and action
    Validate {
        /// Policy file (default: ~/.config/stackward/policy.toml)
        policy: Option<String>,
    },

    /// Describe registered filters and actions
    Schema {
        /// Show a single filter or action
        name: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Policy file (default: ~/.config/stackward/policy.toml)
    pub policy: Option<String>,

    /// Only run these policies (repeatable)
    #[arg(short = 'p', long = "policy-name")]
    pub names: Vec<String>,

    /// Run filters and show matches without running actions
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// Region to target (overrides [settings] region)
    #[arg(long, env = "STACKWARD_REGION")]
    pub region: Option<String>,

    /// Named credentials profile (overrides [settings] profile)
    #[arg(long, env = "STACKWARD_PROFILE")]
    pub profile: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "stackward",
            "-vv",
            "run",
            "policy.toml",
            "--dry-run",
            "--region",
            "eu-west-1",
            "-p",
            "delete-failed",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.policy.as_deref(), Some("policy.toml"));
        assert!(args.dry_run);
        assert_eq!(args.region.as_deref(), Some("eu-west-1"));
        assert_eq!(args.names, vec!["delete-failed"]);
        assert_eq!(args.output, OutputFormat::Json);
    }
}
