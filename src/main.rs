use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use yc_roster::logging::{self, LogTarget};
use yc_roster::models::non_empty;
use yc_roster::{
    import_companies_csv, import_founders_csv, open_database, remove_duplicate_companies,
    ApiClient, Company, Config, ImportReport, SortColumn, SortDirection, SortTarget,
};

#[derive(Parser)]
#[command(name = "yc-roster", version, about = "Browse YC companies and their founders")]
struct Cli {
    /// Directory API base URL (overrides YC_ROSTER_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// SQLite database for import and dedupe (overrides YC_ROSTER_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset (overrides YC_ROSTER_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to this file (overrides YC_ROSTER_LOG_FILE)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive terminal browser (default)
    Ui,

    /// Print the joined roster
    List {
        /// Case-insensitive substring of the company name
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, value_enum)]
        sort: Option<SortColumn>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Load company and founder CSV exports into the database
    Import {
        #[arg(long)]
        companies: PathBuf,

        #[arg(long)]
        founders: Option<PathBuf>,
    },

    /// Collapse duplicate company rows into the most complete one
    Dedupe,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if cli.log_file.is_some() {
        config.log_file = cli.log_file;
    }

    let command = cli.command.unwrap_or(Command::Ui);

    let target = match (&command, &config.log_file) {
        (_, Some(path)) => LogTarget::File(path),
        (Command::Ui, None) => LogTarget::Discard,
        (_, None) => LogTarget::Stderr,
    };
    logging::init(&config.log_level, target)?;

    match command {
        Command::Ui => run_ui_mode(&config),
        Command::List { search, sort, desc } => run_list(&config, search.as_deref(), sort, desc),
        Command::Import { companies, founders } => run_import(&config, &companies, founders.as_deref()),
        Command::Dedupe => run_dedupe(&config),
    }
}

fn connect(config: &Config) -> Result<ApiClient> {
    ApiClient::new(&config.api_url, config.request_timeout)
        .with_context(|| format!("Cannot use API address {}", config.api_url))
}

fn print_report(what: &str, report: &ImportReport) {
    println!("✓ Read {} {}", report.read, what);
    println!("✓ Inserted {}", report.inserted);
    if report.duplicates > 0 {
        println!("✓ Duplicates skipped: {}", report.duplicates);
    }
}

fn run_import(config: &Config, companies: &std::path::Path, founders: Option<&std::path::Path>) -> Result<()> {
    println!("🗄️  Data Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n🔧 Opening database {}...", config.db_path.display());
    let conn = open_database(&config.db_path)?;
    println!("✓ Database initialized with WAL mode");

    println!("\n📂 Importing companies from {}...", companies.display());
    let report = import_companies_csv(&conn, companies)?;
    print_report("companies", &report);

    if let Some(path) = founders {
        println!("\n📂 Importing founders from {}...", path.display());
        let report = import_founders_csv(&conn, path)?;
        print_report("founders", &report);
        println!("✓ Linked to a company: {}", report.linked);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✅ Import complete: {} companies, {} founders",
        yc_roster::db::count_companies(&conn)?,
        yc_roster::db::count_founders(&conn)?
    );
    info!(db = %config.db_path.display(), "import finished");

    Ok(())
}

fn run_dedupe(config: &Config) -> Result<()> {
    println!("🧹 Removing duplicate companies");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if !config.db_path.exists() {
        eprintln!("❌ Database not found at {}", config.db_path.display());
        eprintln!("   Run: yc-roster import --companies <csv>");
        std::process::exit(1);
    }

    let conn = open_database(&config.db_path)?;
    let report = remove_duplicate_companies(&conn)?;

    if report.groups.is_empty() {
        println!("\n✓ No duplicate companies found");
    }

    for group in &report.groups {
        let name = yc_roster::models::first_line(&group.name);
        println!(
            "  {} - kept #{}, removed {:?}",
            name, group.kept_id, group.removed_ids
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Removed: {}", report.removed);
    println!("✓ Remaining companies: {}", report.remaining);
    println!("✓ Unique names: {}", report.unique_names);

    Ok(())
}

fn founders_column(company: &Company) -> String {
    if company.founders.is_empty() {
        return "No founders".to_string();
    }

    company
        .founders
        .iter()
        .map(|f| match non_empty(&f.role) {
            Some(role) => format!("{} ({})", f.name, role),
            None => f.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn run_list(config: &Config, search: Option<&str>, sort: Option<SortColumn>, desc: bool) -> Result<()> {
    let client = connect(config)?;
    let mut roster = client
        .load_roster()
        .with_context(|| format!("Error loading companies from {}", config.api_url))?;

    if let Some(term) = search {
        roster.set_search(term);
    }
    if let Some(column) = sort {
        let direction = if desc { SortDirection::Desc } else { SortDirection::Asc };
        roster.apply_sort(column, direction, SortTarget::Visible);
    }

    if roster.visible().is_empty() {
        println!("No companies found");
        return Ok(());
    }

    println!("{:<40} {:<8} FOUNDERS", "COMPANY", "BATCH");
    for company in roster.visible() {
        println!(
            "{:<40} {:<8} {}",
            company.display_name(),
            non_empty(&company.batch).unwrap_or("—"),
            founders_column(company)
        );
    }
    println!(
        "\n{} of {} companies",
        roster.visible().len(),
        roster.all().len()
    );

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    use yc_roster::ui;

    println!("🖥️  Loading YC Roster from {}...\n", config.api_url);

    let client = connect(config)?;
    let mut app = match client.load_roster() {
        Ok(roster) => {
            println!("✓ Loaded {} companies\n", roster.all().len());
            ui::App::new(roster)
        }
        Err(e) => {
            tracing::error!(error = %e, "Error loading companies");
            ui::App::with_error(format!("Error loading companies: {}", e.placeholder()))
        }
    };

    ui::run_ui(&mut app, &client)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: yc-roster list");
    std::process::exit(1);
}
