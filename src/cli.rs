// CLI module for argument parsing and configuration

use crate::config::{ResetPolicy, UserConfig};
use crate::domain::{CollectionId, JsonFileStore};
use crate::session::SessionSettings;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// photoswipe - swipe through a photo library and classify each photo
///
/// Left trashes, right keeps, up favorites, down hides. Drag right into a
/// destination album to file the photo there.
#[derive(Parser, Debug, Clone)]
#[command(name = "photoswipe")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Library directory holding the photos
    ///
    /// If not specified, defaults to the current directory.
    #[arg(default_value = ".")]
    pub library: PathBuf,

    /// Only review photos in this collection
    ///
    /// Can be specified multiple times; a photo qualifies when it belongs to
    /// any of them.
    #[arg(short = 's', long = "source")]
    pub sources: Vec<String>,

    /// Destination album offered by the picker, in band order
    ///
    /// Overrides the albums from the config file when given.
    #[arg(short = 'd', long = "dest")]
    pub destinations: Vec<String>,

    /// State file holding the processed set
    #[arg(long = "state")]
    pub state: Option<PathBuf>,

    /// Dry run mode - record decisions without changing the library
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// What `reset` does with the decision history
    #[arg(long = "reset-policy", value_enum)]
    pub reset_policy: Option<ResetPolicyArg>,

    /// Show the welcome screen even if it was already shown
    #[arg(long = "welcome", action = ArgAction::SetTrue)]
    pub show_welcome: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Review photos interactively (default)
    Swipe,
    /// Print progress and exit
    Status,
    /// Forget every classification so all photos come up again
    Reset {
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes", action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// List collections with their ids
    Collections,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResetPolicyArg {
    /// Keep history entries as display-only records
    Keep,
    /// Clear history too
    Clear,
}

impl From<ResetPolicyArg> for ResetPolicy {
    fn from(arg: ResetPolicyArg) -> Self {
        match arg {
            ResetPolicyArg::Keep => ResetPolicy::KeepHistory,
            ResetPolicyArg::Clear => ResetPolicy::ClearHistory,
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        if !self.library.exists() {
            return Err(format!(
                "Library directory does not exist: {}",
                self.library.display()
            ));
        }

        if !self.library.is_dir() {
            return Err(format!(
                "Path is not a directory: {}",
                self.library.display()
            ));
        }

        if let Some(empty) = self
            .sources
            .iter()
            .chain(self.destinations.iter())
            .find(|id| id.trim().is_empty())
        {
            return Err(format!("Collection id cannot be empty: '{}'", empty));
        }

        if let Some(state) = &self.state {
            if state.is_dir() {
                return Err(format!(
                    "State path is a directory: {}",
                    state.display()
                ));
            }
        }

        Ok(())
    }
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub library: PathBuf,
    pub source_filter: BTreeSet<CollectionId>,
    pub destinations: Vec<CollectionId>,
    pub state_path: Option<PathBuf>,
    pub dry_run: bool,
    pub reset_policy: Option<ResetPolicy>,
    pub show_welcome: bool,
    pub command: Command,
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        AppConfig {
            library: args.library,
            source_filter: args.sources.into_iter().map(CollectionId::new).collect(),
            destinations: args.destinations.into_iter().map(CollectionId::new).collect(),
            state_path: args.state,
            dry_run: args.dry_run,
            reset_policy: args.reset_policy.map(ResetPolicy::from),
            show_welcome: args.show_welcome,
            command: args.command.unwrap_or(Command::Swipe),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            library: PathBuf::from("."),
            source_filter: BTreeSet::new(),
            destinations: Vec::new(),
            state_path: None,
            dry_run: false,
            reset_policy: None,
            show_welcome: false,
            command: Command::Swipe,
        }
    }
}

impl AppConfig {
    /// Destination albums: the command line wins over the config file
    pub fn destinations(&self, user: &UserConfig) -> Vec<CollectionId> {
        if self.destinations.is_empty() {
            user.destination_albums.clone()
        } else {
            self.destinations.clone()
        }
    }

    pub fn session_settings(&self, user: &UserConfig) -> SessionSettings {
        let mut settings = SessionSettings::from(user);
        if let Some(policy) = self.reset_policy {
            settings.reset_policy = policy;
        }
        settings
    }

    /// State file: command line, then config file, then the data directory
    pub fn state_path(&self, user: &UserConfig) -> Option<PathBuf> {
        self.state_path
            .clone()
            .or_else(|| user.state_path.clone())
            .or_else(JsonFileStore::default_path)
    }
}
