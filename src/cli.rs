use std::path::PathBuf;

use clap::Parser;

use crate::config::ProctorConfig;

#[derive(Debug, Parser)]
#[command(name = "shortlist-proctor")]
#[command(about = "Proctor a Shortlist interview session over a JSON-line stdin/stdout protocol")]
pub struct Cli {
    /// Interview to proctor. A new local record is created when omitted.
    #[arg(long)]
    pub interview_id: Option<String>,

    /// JSON settings file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Local SQLite database, used when no backend URL is configured
    #[arg(long, default_value = "data/shortlist.sqlite3")]
    pub db: PathBuf,

    #[arg(long)]
    pub screenpipe_url: Option<String>,

    /// Interview backend base URL, e.g. http://localhost:8000
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Topic for a locally created interview record
    #[arg(long, default_value = "General")]
    pub topic: String,

    /// Require screen monitoring for a locally created interview record
    #[arg(long)]
    pub require_monitoring: bool,
}

impl Cli {
    /// Flags win over the settings file and the environment.
    pub fn apply_to(&self, config: &mut ProctorConfig) {
        if let Some(url) = &self.screenpipe_url {
            config.screenpipe_url = url.clone();
        }
        if let Some(url) = &self.backend_url {
            config.backend_url = Some(url.clone());
        }
    }
}
