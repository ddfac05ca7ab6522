use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use notesync::config::{Config, ConfigManager};
use notesync::git::GitRepository;
use notesync::note::{self, NoteRequest};
use notesync::sync::{SyncEngine, SyncOptions, SyncOutcome};
use notesync::workspace::{self, Workspace};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "notes",
    about = "Create templated markdown notes and sync them through git",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository root (defaults to the enclosing git work tree)
    #[arg(long, global = true, env = "NOTESYNC_ROOT")]
    pub root: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new dated note from the template
    NewNote {
        /// Title of the note
        title: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Note category
        #[arg(long)]
        category: Option<String>,
        /// Short description/summary
        #[arg(long)]
        summary: Option<String>,
    },

    /// Update timestamps in changed notes, commit them and push
    Sync {
        /// Custom commit message (default: auto-generated)
        #[arg(long, short)]
        message: Option<String>,
        /// Commit but don't push to the remote
        #[arg(long)]
        no_push: bool,
    },

    /// Write the default note template and create the notes directory
    Init,

    /// Show or create the notesync configuration
    Config {
        /// Show the effective configuration
        #[arg(long)]
        show: bool,
        /// Print a commented sample configuration
        #[arg(long)]
        sample: bool,
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::NewNote { title, tags, category, summary } => self.handle_new_note(
                title,
                tags.as_deref(),
                category.as_deref(),
                summary.as_deref(),
            ),
            Commands::Sync { message, no_push } => self.handle_sync(message.as_deref(), *no_push),
            Commands::Init => self.handle_init(),
            Commands::Config { show, sample, init } => self.handle_config(*show, *sample, *init),
        }
    }

    /// Load the layered configuration, including the repository file of the root in use
    fn load_config(&self) -> Result<ConfigManager> {
        let probe_root = match &self.root {
            Some(root) => Some(root.clone()),
            None => workspace::discover_root(&std::env::current_dir()?),
        };
        ConfigManager::new(probe_root.as_deref())
    }

    fn workspace(&self, config: &Config) -> Result<Workspace> {
        Workspace::resolve(self.root.as_deref(), config)
    }

    fn handle_new_note(
        &self,
        title: &str,
        tags: Option<&str>,
        category: Option<&str>,
        summary: Option<&str>,
    ) -> Result<()> {
        info!("Creating note: {}", title);

        let manager = self.load_config()?;
        let config = manager.get();
        let ws = self.workspace(config)?;

        let mut request = NoteRequest::with_defaults(title, &config.note);
        if let Some(tags) = tags {
            request.tags = tags.to_string();
        }
        if let Some(category) = category {
            request.category = category.to_string();
        }
        if let Some(summary) = summary {
            request.summary = summary.to_string();
        }

        let now = chrono::Local::now().naive_local();
        let path = note::create_note(&ws, &request, &now)?;

        println!("Created note: {}", path.display());
        Ok(())
    }

    fn handle_sync(&self, message: Option<&str>, no_push: bool) -> Result<()> {
        info!("Syncing notes");

        let manager = self.load_config()?;
        let config = manager.get();
        let ws = self.workspace(config)?;

        let repo = GitRepository::discover(ws.root())?;
        // Git reports paths relative to the work tree, so the notes dir is re-expressed from there
        let ws = ws.anchored_at(repo.root_path())?;

        let options = SyncOptions {
            message: message.map(str::to_string),
            push: config.git.push && !no_push,
            remote: config.git.remote.clone(),
            skip_hooks: config.git.skip_hooks.clone(),
        };

        let now = chrono::Local::now().naive_local();
        let outcome = SyncEngine::new(&repo, &ws).run(&options, &now)?;

        match outcome {
            SyncOutcome::NothingToSync => println!("No notes to sync"),
            SyncOutcome::PushedPending { .. } => println!("Successfully pushed commits!"),
            SyncOutcome::NothingStaged { .. } => {}
            SyncOutcome::Committed { pushed: true, .. } => println!("Successfully synced notes!"),
            SyncOutcome::Committed { pushed: false, .. } => {
                println!("Changes committed (not pushed)")
            }
        }
        Ok(())
    }

    fn handle_init(&self) -> Result<()> {
        let manager = self.load_config()?;
        let ws = self.workspace(manager.get())?;

        if note::init_template(&ws)? {
            println!("Created template: {}", ws.template_path().display());
        } else {
            println!("Template already exists: {}", ws.template_path().display());
        }
        Ok(())
    }

    fn handle_config(&self, show: bool, sample: bool, init: bool) -> Result<()> {
        info!("Config command");

        if sample {
            println!("{}", Config::sample_config());
            if !show && !init {
                return Ok(());
            }
        }

        let manager = self.load_config()?;

        if init {
            if manager.config_exists() {
                println!("Config file already exists: {}", manager.config_path().display());
            } else {
                manager.create_default_config()?;
                println!("Created config file: {}", manager.config_path().display());
            }
        }

        // A bare `notes config` shows the effective configuration
        if show || (!sample && !init) {
            let config = manager.get();
            let ws = self.workspace(config)?;

            println!("Config file: {}", manager.config_path().display());
            println!();
            println!("Paths:");
            println!("  Root: {}", ws.root().display());
            println!("  Notes: {}", ws.notes_path().display());
            println!("  Template: {}", ws.template_path().display());
            println!();
            println!("Note defaults:");
            println!("  Tags: {}", config.note.default_tags);
            println!("  Category: {}", config.note.default_category);
            println!("  Summary: {}", config.note.default_summary);
            println!();
            println!("Git:");
            println!("  Remote: {}", config.git.remote);
            println!("  Push: {}", config.git.push);
            println!("  Skipped hooks: {}", config.git.skip_hooks.join(", "));
        }

        Ok(())
    }
}
