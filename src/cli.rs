//! Command-line interface definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Overrides, ResolveStrategy, DEFAULT_CONFIG_FILE};

/// Clean-URL dev server and page maintenance tools for a static site
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Config file path
    #[arg(short = 'C', long, global = true, default_value = DEFAULT_CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Site root directory (overrides `site.root`)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Site manifest, relative to the site root unless absolute
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the site with clean URLs
    #[command(visible_alias = "s")]
    Serve {
        /// Address to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// How extensionless paths are mapped to pages
        #[arg(short, long, value_enum)]
        strategy: Option<ResolveStrategy>,
    },

    /// Report pages missing shared header/footer markup
    #[command(visible_alias = "c")]
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a rewrite job from the manifest; lists jobs when none is given
    #[command(visible_alias = "r")]
    Rewrite {
        /// Job name
        job: Option<String>,

        /// Report changes without writing files
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Command-line values layered over file and environment configuration
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            root: self.root.as_ref().map(|p| p.to_string_lossy().into_owned()),
            manifest: self
                .manifest
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            ..Overrides::default()
        };

        if let Commands::Serve {
            host,
            port,
            strategy,
        } = &self.command
        {
            overrides.host.clone_from(host);
            overrides.port = *port;
            overrides.strategy = *strategy;
        }

        overrides
    }
}
