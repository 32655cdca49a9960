//! `docguard` command line.
//!
//! Each invocation is one session: the feed lives only as long as the
//! command runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::client::{ApiClient, ClientError, Collaborators};
use crate::config::{
    ClientConfig, ENV_API_URL, ENV_POLL_INTERVAL_MS, ENV_POLL_MAX_WAIT_MS, ENV_PUBLIC_KEY,
    ENV_TIMEOUT_SECS, ENV_TOKEN,
};
use crate::dashboard::{Dashboard, DashboardError, SensitivityBand};
use crate::models::{
    Classification, Department, DocumentFilter, DocumentId, DocumentRecord, DocumentStatus,
    DocumentType, SecurityLevel, SharePermission, TimeWindow,
};
use crate::notifications::NotificationCenter;
use crate::pipeline::import::{
    format_file_size, validate_with_report, AcceptRules, FileHandle, ImportError, UploadMetadata,
};
use crate::share::{ShareError, ShareSelection};

#[derive(Parser)]
#[command(author, version, about = "Docguard document client", long_about = None)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = ENV_API_URL, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,

    /// First delay between analysis checks, in milliseconds
    #[arg(long, env = ENV_POLL_INTERVAL_MS, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    /// Give up on an analysis after this many milliseconds
    #[arg(long, env = ENV_POLL_MAX_WAIT_MS, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_max_wait_ms: Option<u64>,

    /// Bearer token for the backend
    #[arg(long, env = ENV_TOKEN, global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// PEM public key used instead of the one served by the backend
    #[arg(long, env = ENV_PUBLIC_KEY, global = true, hide_env_values = true)]
    pub public_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload documents and wait for their sensitivity analysis
    Upload {
        #[arg(long = "type", value_enum)]
        document_type: TypeArg,
        #[arg(long, value_enum)]
        level: LevelArg,
        #[arg(long, value_enum)]
        department: DepartmentArg,
        #[arg(long)]
        notes: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// List documents on the server
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, value_enum)]
        window: Option<WindowArg>,
    },

    /// Delete a document
    Delete { id: String },

    /// Save the original file of a document
    Download { id: String, out: PathBuf },

    /// Share a document with colleagues
    Share {
        id: String,
        /// Recipient user id (repeatable)
        #[arg(long = "user", required = true)]
        users: Vec<String>,
        /// Grant edit instead of view permission
        #[arg(long)]
        edit: bool,
        #[arg(long, default_value = "")]
        message: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    Contract,
    Report,
    Policy,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LevelArg {
    Public,
    Internal,
    Confidential,
    #[value(name = "top_secret")]
    TopSecret,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DepartmentArg {
    Hr,
    Finance,
    Tech,
    Sales,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Analyzing,
    Completed,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    Today,
    Week,
    Month,
}

impl From<TypeArg> for DocumentType {
    fn from(arg: TypeArg) -> Self {
        match arg {
            TypeArg::Contract => DocumentType::Contract,
            TypeArg::Report => DocumentType::Report,
            TypeArg::Policy => DocumentType::Policy,
            TypeArg::Other => DocumentType::Other,
        }
    }
}

impl From<LevelArg> for SecurityLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Public => SecurityLevel::Public,
            LevelArg::Internal => SecurityLevel::Internal,
            LevelArg::Confidential => SecurityLevel::Confidential,
            LevelArg::TopSecret => SecurityLevel::TopSecret,
        }
    }
}

impl From<DepartmentArg> for Department {
    fn from(arg: DepartmentArg) -> Self {
        match arg {
            DepartmentArg::Hr => Department::HumanResources,
            DepartmentArg::Finance => Department::Finance,
            DepartmentArg::Tech => Department::Engineering,
            DepartmentArg::Sales => Department::Sales,
            DepartmentArg::Other => Department::Other,
        }
    }
}

impl From<StatusArg> for DocumentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Analyzing => DocumentStatus::Analyzing,
            StatusArg::Completed => DocumentStatus::Completed,
            StatusArg::Error => DocumentStatus::Error,
        }
    }
}

impl From<WindowArg> for TimeWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::Today => TimeWindow::Today,
            WindowArg::Week => TimeWindow::Week,
            WindowArg::Month => TimeWindow::Month,
        }
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error("Unknown document: {0}")]
    UnknownDocument(String),
}

impl Cli {
    /// Defaults with flag and `DOCGUARD_*` environment values applied.
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        if let Some(ms) = self.poll_interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = self.poll_max_wait_ms {
            config = config.with_poll_max_wait(Duration::from_millis(ms));
        }
        config.token = self.token.clone().filter(|t| !t.is_empty());
        config.public_key = self.public_key.clone().filter(|k| !k.trim().is_empty());
        config
    }
}

pub async fn execute(cli: Cli) -> Result<(), CliError> {
    let config = cli.config();
    let client = Arc::new(ApiClient::from_config(&config)?);
    let notifications = NotificationCenter::new();
    let mut dashboard = Dashboard::new(
        Collaborators::from_client(client),
        config.poll.clone(),
        notifications,
    );

    let result = match cli.command {
        Commands::Upload {
            document_type,
            level,
            department,
            notes,
            files,
        } => {
            let metadata = UploadMetadata::new(Classification {
                document_type: document_type.into(),
                security_level: level.into(),
                department: department.into(),
                notes,
            })?;
            upload(&mut dashboard, &files, &metadata).await
        }
        Commands::List {
            search,
            status,
            window,
        } => {
            let filter = DocumentFilter {
                search_term: search,
                status: status.map(DocumentStatus::from),
                time_window: window.map(TimeWindow::from),
            };
            list(&mut dashboard, filter).await
        }
        Commands::Delete { id } => {
            let id = find(&mut dashboard, &id).await?;
            let removed = dashboard.delete(&id).await?;
            println!("Deleted {} ({})", removed.name(), removed.id());
            Ok(())
        }
        Commands::Download { id, out } => {
            let id = find(&mut dashboard, &id).await?;
            let bytes = dashboard.download(&id, &out).await?;
            println!("Saved {} to {}", format_file_size(bytes), out.display());
            Ok(())
        }
        Commands::Share {
            id,
            users,
            edit,
            message,
        } => {
            let id = find(&mut dashboard, &id).await?;
            let mut selection = ShareSelection::default();
            for user in &users {
                if !selection.is_selected(user) {
                    selection.toggle(user);
                }
            }
            let permission = if edit {
                SharePermission::Edit
            } else {
                SharePermission::View
            };
            let request = selection.into_request(id, permission, &message)?;
            dashboard.share(&request).await?;
            println!("Shared with {} user(s)", request.user_ids.len());
            Ok(())
        }
    };

    dashboard.shutdown();
    result
}

async fn upload(
    dashboard: &mut Dashboard,
    paths: &[PathBuf],
    metadata: &UploadMetadata,
) -> Result<(), CliError> {
    let candidates = paths
        .iter()
        .map(|p| FileHandle::from_path(p))
        .collect::<Result<Vec<_>, _>>()?;
    let (accepted, report) = validate_with_report(&candidates, &AcceptRules::documents());
    if report.dropped() > 0 {
        tracing::warn!(
            dropped_type = report.dropped_type,
            dropped_size = report.dropped_size,
            dropped_total = report.dropped_total,
            "Some files were not accepted"
        );
    }
    if accepted.is_empty() {
        return Err(ImportError::NothingToUpload.into());
    }

    dashboard.submit_batch(accepted, metadata);
    dashboard.settle().await;

    for record in dashboard.records() {
        println!("{}", summary_line(record));
    }
    Ok(())
}

async fn list(dashboard: &mut Dashboard, filter: DocumentFilter) -> Result<(), CliError> {
    dashboard.refresh().await?;
    // Listing only; do not wait for pending analyses.
    dashboard.shutdown();
    dashboard.set_filter(filter);

    let visible = dashboard.visible();
    for record in &visible {
        println!("{}", summary_line(record));
    }
    let stats = dashboard.stats();
    println!(
        "{} shown, {} total: {} analyzing, {} completed, {} error, {} at risk",
        visible.len(),
        stats.total,
        stats.analyzing,
        stats.completed,
        stats.errored,
        stats.at_risk
    );
    Ok(())
}

/// Load the feed and resolve a document id typed by the user.
async fn find(dashboard: &mut Dashboard, raw: &str) -> Result<DocumentId, CliError> {
    dashboard.refresh().await?;
    dashboard.shutdown();
    let id = DocumentId::parse(raw);
    dashboard
        .records()
        .iter()
        .any(|r| r.id() == &id)
        .then_some(id)
        .ok_or_else(|| CliError::UnknownDocument(raw.to_string()))
}

pub fn summary_line(record: &DocumentRecord) -> String {
    let classification = record.classification();
    let analysis = match record.sensitivity_score() {
        Some(score) => format!(
            "score {score} ({:?})",
            SensitivityBand::from_score(score)
        ),
        None => record.status().display_name().to_string(),
    };
    format!(
        "{:<12} {:<32} {:>10}  {} / {} / {}  {}",
        record.id(),
        record.name(),
        format_file_size(record.size_bytes()),
        classification.document_type,
        classification.security_level,
        classification.department,
        analysis
    )
}
