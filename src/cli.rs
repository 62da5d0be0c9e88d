use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ristretto")]
#[command(about = "Non-destructive photo edits with parallel export")]
#[command(long_about = "\
Non-destructive photo edits with parallel export

A recipe is a JSON array of edit steps applied in order to every input:

  [
    { \"kind\": \"white_balance\", \"temp\": 6200, \"tint\": 4 },
    { \"kind\": \"exposure\", \"value\": 0.3 },
    { \"kind\": \"curve_adjust\", \"curve\": [{\"x\": 0, \"y\": 0}, {\"x\": 1, \"y\": 0.9}] },
    { \"preset\": \"s-curve\", \"channel\": \"luminance\" },
    { \"kind\": \"crop\", \"x\": 0, \"y\": 0, \"width\": 800, \"height\": 600 },
    { \"kind\": \"custom\", \"name\": \"saturation\", \"params\": { \"amount\": 15 } }
  ]

Each input's edit history is saved, keyed by file content, unless
--no-session is given. Run 'ristretto presets' to list curve presets.")]
#[command(version)]
pub struct Cli {
    /// JSON config file (export settings, history limit, session database)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply a recipe to images and export them as JPEG
    Apply(ApplyArgs),
    /// Print the built-in curve presets as JSON
    Presets,
    /// Show the saved edit history of an image
    History(HistoryArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct ApplyArgs {
    /// Images to edit
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Recipe file (JSON array of edit steps)
    #[arg(long)]
    pub recipe: PathBuf,

    /// Output directory
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// JPEG quality (0-100), overrides the config file
    #[arg(long)]
    pub quality: Option<u8>,

    /// Maximum number of encoder threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Per-image encode timeout in milliseconds (0 waits forever)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[command(flatten)]
    pub session: SessionArgs,

    /// Do not record edit history
    #[arg(long)]
    pub no_session: bool,
}

#[derive(clap::Args, Clone, Debug)]
pub struct HistoryArgs {
    /// Image whose history to show
    pub input: PathBuf,

    #[command(flatten)]
    pub session: SessionArgs,
}

/// Shared flag for commands that touch the session database.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct SessionArgs {
    /// Session database, overrides the config file
    #[arg(long)]
    pub session_db: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_apply() {
        let cli = Cli::try_parse_from([
            "ristretto", "apply", "a.jpg", "b.png", "--recipe", "r.json", "--quality", "80",
            "--workers", "2", "--session-db", "s.db",
        ])
        .unwrap();
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.quality, Some(80));
        assert_eq!(args.workers, Some(2));
        assert_eq!(args.out, PathBuf::from("out"));
        assert_eq!(args.session.session_db, Some(PathBuf::from("s.db")));
        assert!(!args.no_session);
    }

    #[test]
    fn apply_requires_inputs_and_recipe() {
        assert!(Cli::try_parse_from(["ristretto", "apply", "--recipe", "r.json"]).is_err());
        assert!(Cli::try_parse_from(["ristretto", "apply", "a.jpg"]).is_err());
    }

    #[test]
    fn global_config_flag() {
        let cli =
            Cli::try_parse_from(["ristretto", "history", "a.jpg", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        assert!(matches!(cli.command, Command::History(_)));
    }
}
