// YC Roster - Core Library
// Exposes all modules for use in the CLI/TUI, the API server, and tests

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod roster;

#[cfg(feature = "server")]
pub mod api;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::Config;
pub use db::{
    get_company, get_stats, import_companies_csv, import_founders_csv, insert_companies,
    insert_founders, list_companies, list_founders, load_companies_csv, load_founders_csv,
    open_database, remove_duplicate_companies, setup_database, DedupeReport, ImportReport,
};
pub use error::{ClientError, ClientResult};
pub use models::{BatchStat, Company, Founder, Stats, TopCompany};
pub use roster::{
    filter, join, join_key, sort, JoinOutcome, Roster, SortColumn, SortDirection, SortState,
    SortTarget,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
