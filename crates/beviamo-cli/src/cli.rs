use std::path::PathBuf;

use beviamo_core::models::InterventionType;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "beviamo")]
#[command(about = "Record maintenance interventions on Punto Acqua water stations")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local data file
    #[arg(long, global = true, value_name = "PATH", env = "BEVIAMO_DATA_PATH")]
    pub data_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discard the current draft and start a new intervention
    New,
    /// Show the current draft
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search the station catalog by id, name or town
    Station {
        /// Search query
        query: String,
    },
    /// Edit fields of the current draft
    Set {
        /// Station id (e.g. CA-001)
        #[arg(long, value_name = "ID")]
        station: Option<String>,
        /// Intervention type
        #[arg(long = "type", value_enum, value_name = "TYPE")]
        kind: Option<InterventionKind>,
        /// Free-text note (replaces the current one)
        #[arg(long)]
        note: Option<String>,
        /// Description required for the "altro" type
        #[arg(long, value_name = "TEXT")]
        altro: Option<String>,
    },
    /// Toggle a checklist item on the current draft
    Check {
        /// Checklist item id (e.g. `sec1_dpi`)
        item: String,
    },
    /// Attach a note to a checklist item
    CheckNote {
        /// Checklist item id
        item: String,
        /// Note text (empty clears the note)
        text: Vec<String>,
    },
    /// Manage photos on the current draft
    Photo {
        #[command(subcommand)]
        command: PhotoCommands,
    },
    /// Submit the current draft to history and share it with the workspace
    Submit,
    /// List submitted interventions
    History {
        /// Only interventions for this station id
        #[arg(long, value_name = "ID")]
        station: Option<String>,
        /// Number of interventions to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reconcile local history with the workspace bucket
    Sync,
    /// Export history
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import interventions from a JSON export (additive)
    Import {
        /// Export file to read
        path: PathBuf,
    },
    /// Show or change the shared workspace key
    Workspace {
        #[command(subcommand)]
        command: Option<WorkspaceCommands>,
    },
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum InterventionKind {
    /// Manutenzione Ordinaria
    Manutenzione,
    /// Guasto
    Guasto,
    /// Altro
    Altro,
}

impl From<InterventionKind> for InterventionType {
    fn from(kind: InterventionKind) -> Self {
        match kind {
            InterventionKind::Manutenzione => Self::ManutenzioneOrdinaria,
            InterventionKind::Guasto => Self::Guasto,
            InterventionKind::Altro => Self::Altro,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for beviamo_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Subcommand)]
pub enum PhotoCommands {
    /// Attach an image file
    Add {
        /// Image file to attach
        path: PathBuf,
    },
    /// Remove a photo by id
    Remove {
        /// Photo id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// Print the current workspace key
    Show,
    /// Set the workspace key (characters outside A-Z, a-z, 0-9, '-', '_' are dropped)
    Set {
        /// New workspace key
        key: String,
    },
    /// Clear the workspace key and work locally only
    Clear,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update the CLI config file
    Init {
        /// Technician name recorded on shared writes
        #[arg(long, value_name = "NAME")]
        technician: Option<String>,
        /// Bucket service base URL (e.g. <https://getpantry.cloud/apiv1/pantry/ID/basket>)
        #[arg(long, value_name = "URL")]
        bucket_url: Option<String>,
    },
}
