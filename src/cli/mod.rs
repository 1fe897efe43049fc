pub mod commands;
pub mod output;

use crate::errors::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "git-stack")]
#[command(about = "Infer and manage stacks of dependent Git branches")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every stack in the repository
    List,

    /// Show the branches of a stack, top to bottom
    Show {
        /// Stack name (defaults to the current stack)
        stack: Option<String>,

        /// Look up the pull request of every branch
        #[arg(long)]
        prs: bool,
    },

    /// Show the commits of a stack
    Log {
        /// Stack name (defaults to the current stack)
        stack: Option<String>,
    },

    /// Check out the tip of a stack, or a branch of the current stack
    Switch {
        /// Stack name, or branch name with --branch (prompts when omitted)
        name: Option<String>,

        /// Pick a branch within the current stack
        #[arg(short, long)]
        branch: bool,
    },

    /// Start a new branch on top of the current stack
    #[command(alias = "add")]
    Append {
        /// Name of the new branch
        branch: String,
    },

    /// Commit staged changes as a fixup for a branch of the current stack
    Fixup {
        /// Branch to fix up (prompts when omitted)
        branch: Option<String>,

        /// Stage all modified and deleted files first
        #[arg(short = 'a', long = "all")]
        stage_all: bool,

        /// Squash the fixup into place right away
        #[arg(short, long)]
        rebase: bool,
    },

    /// Edit the current stack with an interactive rebase
    Edit,

    /// Update the default branch from its upstream and rebase the stack onto it
    Pull,

    /// Push every branch of the current stack and create or update pull requests
    Push,

    /// Rebase the current stack onto the default branch or a new base
    Rebase {
        /// Branch or commit to rebase onto (defaults to the default branch)
        new_base: Option<String>,

        /// Run the rebase interactively
        #[arg(short, long)]
        interactive: bool,

        /// Keep the current fork point
        #[arg(short, long)]
        keep_base: bool,

        /// Rebase even when off the tip or sharing commits with another stack
        #[arg(short, long)]
        force: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., git.default_branch)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// List all configuration values
    List,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        self.setup_logging();

        if self.no_color {
            console::set_colors_enabled(false);
        }

        match self.command {
            Commands::List => commands::list::run().await,
            Commands::Show { stack, prs } => commands::show::run(stack, prs).await,
            Commands::Log { stack } => commands::log::run(stack).await,
            Commands::Switch { name, branch } => commands::switch::run(name, branch).await,
            Commands::Append { branch } => commands::append::run(branch).await,
            Commands::Fixup {
                branch,
                stage_all,
                rebase,
            } => commands::fixup::run(branch, stage_all, rebase).await,
            Commands::Edit => commands::edit::run().await,
            Commands::Pull => commands::pull::run().await,
            Commands::Push => commands::push::run().await,
            Commands::Rebase {
                new_base,
                interactive,
                keep_base,
                force,
            } => {
                commands::rebase::run(commands::rebase::RebaseArgs {
                    new_base,
                    interactive,
                    keep_base,
                    force,
                })
                .await
            }
            Commands::Config { action } => commands::config::run(action).await,
            Commands::Completions { shell } => commands::completions::generate_completions(shell),
        }
    }

    fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr);

        if self.no_color {
            subscriber.with_ansi(false).init();
        } else {
            subscriber.init();
        }
    }
}
