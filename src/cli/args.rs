//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `transform`: extract strings, assign identifiers, rewrite call sites
//! - `restore`: rewrite translation calls back to their original literals
//! - `translate`: machine-translate outstanding entries in batches
//! - `status`: summarize untranslated/translated entry counts
//! - `init`: write a default configuration file

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Transform(cmd)) => cmd.common.verbose,
            Some(Command::Restore(cmd)) => cmd.common.verbose,
            Some(Command::Translate(cmd)) => cmd.common.verbose,
            Some(Command::Status(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Source code root directory (overrides config file)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Locales directory path (overrides config file)
    #[arg(long)]
    pub locales_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Internationalize source files: extract, assign ids, rewrite
    Transform(TransformCommand),
    /// Rewrite translation calls back to literals for debugging
    Restore(RestoreCommand),
    /// Machine-translate outstanding entries in concurrent batches
    Translate(TranslateCommand),
    /// Show untranslated/translated entry counts
    Status(StatusCommand),
    /// Create a default configuration file
    Init,
}

#[derive(Debug, Args)]
pub struct TransformCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Include the original text as the default message in rewritten calls
    #[arg(long)]
    pub include_default: bool,

    /// Skip the LLM identifier proposal and use local generation only
    #[arg(long)]
    pub offline: bool,

    /// Report what would change without writing any file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct RestoreCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Locale to restore from (defaults to the configured source locale)
    #[arg(long)]
    pub locale: Option<String>,

    /// Report what would change without writing any file
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct TranslateCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Target locale (defaults to every configured target locale)
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Debug, Args)]
pub struct StatusCommand {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transform() {
        let args =
            Arguments::try_parse_from(["autoglot", "transform", "--offline", "--include-default"])
                .unwrap();
        match args.command {
            Some(Command::Transform(cmd)) => {
                assert!(cmd.offline);
                assert!(cmd.include_default);
                assert!(!cmd.dry_run);
            }
            _ => panic!("expected transform command"),
        }
    }

    #[test]
    fn test_parse_restore_locale() {
        let args = Arguments::try_parse_from(["autoglot", "restore", "--locale", "zh"]).unwrap();
        match args.command {
            Some(Command::Restore(cmd)) => assert_eq!(cmd.locale.as_deref(), Some("zh")),
            _ => panic!("expected restore command"),
        }
    }

    #[test]
    fn test_verbose_flag() {
        let args = Arguments::try_parse_from(["autoglot", "status", "-v"]).unwrap();
        assert!(args.verbose());
        let args = Arguments::try_parse_from(["autoglot", "init"]).unwrap();
        assert!(!args.verbose());
    }
}
