use crate::models::{first_line, parse_flag, BatchStat, Company, Founder, Stats, TopCompany};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Only rows whose `yc_url` is a company profile page count as companies;
/// the scrapers also captured listing and filter pages.
const PROFILE_URL_FILTER: &str = "yc_url LIKE '%/companies/%'
         AND yc_url NOT LIKE '%?%'
         AND yc_url NOT LIKE '%industry=%'
         AND yc_url NOT LIKE '%batch=%'";

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Companies Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            batch TEXT,
            description TEXT,
            website TEXT,
            location TEXT,
            industry TEXT,
            is_hiring BOOLEAN DEFAULT 1,
            yc_url TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(name, batch)
        )",
        [],
    )?;

    // ==========================================================================
    // Founders Table (company_name is the scraped name, company_id the link)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS founders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_id INTEGER,
            company_name TEXT,
            name TEXT NOT NULL,
            role TEXT,
            previous_company TEXT,
            linkedin_url TEXT,
            twitter_url TEXT,
            yc_profile_url TEXT,
            bio TEXT,
            email TEXT,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (company_id) REFERENCES companies(id),
            UNIQUE(company_name, name)
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_companies_name ON companies(name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_founders_company_id ON founders(company_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_founders_company_name ON founders(company_name)",
        [],
    )?;

    Ok(())
}

pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

// ============================================================================
// ROW MAPPING
// ============================================================================

const COMPANY_COLUMNS: &str =
    "id, name, batch, description, website, location, industry, is_hiring, yc_url";

fn company_from_row(row: &Row) -> rusqlite::Result<Company> {
    Ok(Company {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        batch: row.get(2)?,
        description: row.get(3)?,
        website: row.get(4)?,
        location: row.get(5)?,
        industry: row.get(6)?,
        is_hiring: row.get(7)?,
        yc_url: row.get(8)?,
        founders: Vec::new(),
    })
}

const FOUNDER_COLUMNS: &str = "f.id, f.company_id, f.company_name, f.name, f.role,
        f.previous_company, f.linkedin_url, f.twitter_url, f.yc_profile_url,
        f.bio, f.email, c.name";

fn founder_from_row(row: &Row) -> rusqlite::Result<Founder> {
    Ok(Founder {
        id: row.get(0)?,
        company_id: row.get(1)?,
        company_name: row.get(2)?,
        name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        role: row.get(4)?,
        previous_company: row.get(5)?,
        linkedin_url: row.get(6)?,
        twitter_url: row.get(7)?,
        yc_profile_url: row.get(8)?,
        bio: row.get(9)?,
        email: row.get(10)?,
        company_display_name: row.get(11)?,
    })
}

// ============================================================================
// QUERIES
// ============================================================================

/// Company profiles ordered by name, names reduced to their first line.
pub fn list_companies(
    conn: &Connection,
    search: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Company>> {
    let mut query = format!(
        "SELECT {} FROM companies WHERE {}",
        COMPANY_COLUMNS, PROFILE_URL_FILTER
    );

    let mut bind: Vec<String> = Vec::new();
    if let Some(term) = search.filter(|s| !s.is_empty()) {
        query.push_str(" AND name LIKE ?");
        bind.push(format!("%{}%", term));
    }

    query.push_str(" ORDER BY name");

    if let Some(limit) = limit {
        // SQLite limits are signed 64-bit
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        query.push_str(&format!(" LIMIT {}", limit));
    }

    let mut stmt = conn.prepare(&query)?;
    let companies = stmt
        .query_map(params_from_iter(bind.iter()), company_from_row)?
        .map(|r| {
            r.map(|mut company| {
                company.name = first_line(&company.name).to_string();
                company
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(companies)
}

/// One company with the founders linked to it by `company_id`.
pub fn get_company(conn: &Connection, id: i64) -> Result<Option<Company>> {
    let company = conn
        .query_row(
            &format!("SELECT {} FROM companies WHERE id = ?1", COMPANY_COLUMNS),
            [id],
            company_from_row,
        )
        .optional()?;

    let Some(mut company) = company else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM founders f
         LEFT JOIN companies c ON f.company_id = c.id
         WHERE f.company_id = ?1
         ORDER BY f.id",
        FOUNDER_COLUMNS
    ))?;

    company.founders = stmt
        .query_map([id], founder_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(company))
}

/// Founders ordered by company name then founder name.
///
/// `search` matches the founder's name, `company` the scraped company name.
pub fn list_founders(
    conn: &Connection,
    search: Option<&str>,
    company: Option<&str>,
) -> Result<Vec<Founder>> {
    let mut query = format!(
        "SELECT {} FROM founders f
         LEFT JOIN companies c ON f.company_id = c.id
         WHERE 1=1",
        FOUNDER_COLUMNS
    );

    let mut bind: Vec<String> = Vec::new();
    if let Some(term) = search.filter(|s| !s.is_empty()) {
        query.push_str(" AND f.name LIKE ?");
        bind.push(format!("%{}%", term));
    }
    if let Some(term) = company.filter(|s| !s.is_empty()) {
        query.push_str(" AND f.company_name LIKE ?");
        bind.push(format!("%{}%", term));
    }

    query.push_str(" ORDER BY f.company_name, f.name");

    let mut stmt = conn.prepare(&query)?;
    let founders = stmt
        .query_map(params_from_iter(bind.iter()), founder_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(founders)
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    // Looser than PROFILE_URL_FILTER; the dashboard total has always counted
    // this way, so it can exceed the list length.
    let total_companies: i64 = conn.query_row(
        "SELECT COUNT(*) FROM companies
         WHERE yc_url LIKE '%/companies/%' AND yc_url NOT LIKE '%?%'",
        [],
        |row| row.get(0),
    )?;

    let companies_with_founders: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT company_name) FROM founders",
        [],
        |row| row.get(0),
    )?;

    let total_founders: i64 =
        conn.query_row("SELECT COUNT(*) FROM founders", [], |row| row.get(0))?;

    let mut stmt = conn.prepare(
        "SELECT batch, COUNT(*) as count
         FROM companies
         WHERE batch IS NOT NULL AND batch != ''
         GROUP BY batch
         ORDER BY count DESC, batch",
    )?;
    let batch_stats = stmt
        .query_map([], |row| {
            Ok(BatchStat {
                batch: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT company_name, COUNT(*) as founder_count
         FROM founders
         GROUP BY company_name
         ORDER BY founder_count DESC, company_name
         LIMIT 10",
    )?;
    let top_companies = stmt
        .query_map([], |row| {
            Ok(TopCompany {
                company_name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                founder_count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Stats {
        total_companies,
        total_founders,
        companies_with_founders,
        top_companies,
        batch_stats,
    })
}

pub fn count_companies(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_founders(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM founders", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// IMPORT
// ============================================================================

/// One row of a companies export.
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub is_hiring: Option<String>,
    #[serde(default)]
    pub yc_url: Option<String>,
}

/// One row of a founders export.
#[derive(Debug, Clone, Deserialize)]
pub struct FounderRecord {
    pub company_name: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub previous_company: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub yc_profile_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub read: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// Founders whose company was found and linked by `company_id`
    pub linked: usize,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    fn new() -> Self {
        ImportReport {
            read: 0,
            inserted: 0,
            duplicates: 0,
            linked: 0,
            finished_at: Utc::now(),
        }
    }
}

pub fn load_companies_csv(path: &Path) -> Result<Vec<CompanyRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: CompanyRecord = result.context("Failed to deserialize company")?;
        records.push(record);
    }

    Ok(records)
}

pub fn load_founders_csv(path: &Path) -> Result<Vec<FounderRecord>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file {}", path.display()))?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: FounderRecord = result.context("Failed to deserialize founder")?;
        records.push(record);
    }

    Ok(records)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Insert companies, skipping rows already present as (name, batch).
pub fn insert_companies(conn: &Connection, records: &[CompanyRecord]) -> Result<ImportReport> {
    let mut report = ImportReport::new();
    let tx = conn.unchecked_transaction()?;

    for record in records {
        report.read += 1;

        let is_hiring = record.is_hiring.as_deref().and_then(parse_flag).unwrap_or(true);

        let result = tx.execute(
            "INSERT INTO companies (
                name, batch, description, website, location, industry, is_hiring, yc_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.name,
                record.batch,
                record.description,
                record.website,
                record.location,
                record.industry,
                is_hiring,
                record.yc_url,
            ],
        );

        match result {
            Ok(_) => report.inserted += 1,
            Err(e) if is_constraint_violation(&e) => report.duplicates += 1,
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    report.finished_at = Utc::now();

    info!(
        inserted = report.inserted,
        duplicates = report.duplicates,
        "companies imported"
    );

    Ok(report)
}

/// Insert founders, linking each to the company whose first-line name
/// matches exactly. Founders already present as (company_name, name) are
/// skipped.
pub fn insert_founders(conn: &Connection, records: &[FounderRecord]) -> Result<ImportReport> {
    let mut report = ImportReport::new();

    let mut ids_by_name: HashMap<String, i64> = HashMap::new();
    {
        let mut stmt = conn.prepare("SELECT id, name FROM companies ORDER BY id")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (id, name) = row?;
            ids_by_name.entry(first_line(&name).to_string()).or_insert(id);
        }
    }

    let tx = conn.unchecked_transaction()?;

    for record in records {
        report.read += 1;

        let company_id = ids_by_name.get(first_line(&record.company_name)).copied();

        let result = tx.execute(
            "INSERT INTO founders (
                company_id, company_name, name, role, previous_company,
                linkedin_url, twitter_url, yc_profile_url, bio, email
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                company_id,
                record.company_name,
                record.name,
                record.role,
                record.previous_company,
                record.linkedin_url,
                record.twitter_url,
                record.yc_profile_url,
                record.bio,
                record.email,
            ],
        );

        match result {
            Ok(_) => {
                report.inserted += 1;
                if company_id.is_some() {
                    report.linked += 1;
                }
            }
            Err(e) if is_constraint_violation(&e) => report.duplicates += 1,
            Err(e) => return Err(e.into()),
        }
    }

    tx.commit()?;
    report.finished_at = Utc::now();

    info!(
        inserted = report.inserted,
        linked = report.linked,
        duplicates = report.duplicates,
        "founders imported"
    );

    Ok(report)
}

/// Load a companies export and insert it.
pub fn import_companies_csv(conn: &Connection, path: &Path) -> Result<ImportReport> {
    let records = load_companies_csv(path)?;
    insert_companies(conn, &records)
        .with_context(|| format!("Failed to import companies from {}", path.display()))
}

/// Load a founders export and insert it, linking to companies already stored.
pub fn import_founders_csv(conn: &Connection, path: &Path) -> Result<ImportReport> {
    let records = load_founders_csv(path)?;
    insert_founders(conn, &records)
        .with_context(|| format!("Failed to import founders from {}", path.display()))
}

// ============================================================================
// DUPLICATE REMOVAL
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub name: String,
    pub kept_id: i64,
    pub removed_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DedupeReport {
    pub groups: Vec<DuplicateGroup>,
    pub removed: usize,
    pub remaining: i64,
    pub unique_names: i64,
}

/// Completeness score: one point per filled field, plus a bonus for the
/// profile URL and the batch.
fn completeness(company: &Company) -> usize {
    let filled = [
        Some(company.name.as_str()),
        company.batch.as_deref(),
        company.description.as_deref(),
        company.website.as_deref(),
        company.location.as_deref(),
        company.industry.as_deref(),
        company.yc_url.as_deref(),
    ]
    .iter()
    .filter(|f| f.map(|s| !s.is_empty()).unwrap_or(false))
    .count()
        + usize::from(company.is_hiring.is_some());

    let mut score = filled;
    if company.yc_url.as_deref().map(|s| !s.is_empty()).unwrap_or(false) {
        score += 10;
    }
    if company.batch.as_deref().map(|s| !s.is_empty()).unwrap_or(false) {
        score += 5;
    }
    score
}

/// Collapse companies sharing a name into their most complete row.
///
/// Founders linked to a removed row are repointed to the kept one. Ties go
/// to the most recently created row.
pub fn remove_duplicate_companies(conn: &Connection) -> Result<DedupeReport> {
    let names: Vec<String> = {
        let mut stmt = conn.prepare(
            "SELECT name, COUNT(*) as count
             FROM companies
             GROUP BY name
             HAVING count > 1
             ORDER BY count DESC, name",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>()?
    };

    let tx = conn.unchecked_transaction()?;
    let mut groups = Vec::new();

    for name in names {
        let entries: Vec<Company> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM companies WHERE name = ?1 ORDER BY created_at DESC, id DESC",
                COMPANY_COLUMNS
            ))?;
            let rows = stmt.query_map([&name], company_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        // max_by_key keeps the last maximum, so walk newest-last
        let Some(best) = entries
            .iter()
            .rev()
            .max_by_key(|c| completeness(c))
            .map(|c| c.id)
        else {
            continue;
        };

        let removed_ids: Vec<i64> = entries.iter().map(|c| c.id).filter(|id| *id != best).collect();

        for dup_id in &removed_ids {
            tx.execute(
                "UPDATE founders SET company_id = ?1 WHERE company_id = ?2",
                params![best, dup_id],
            )?;
            tx.execute("DELETE FROM companies WHERE id = ?1", [dup_id])?;
        }

        debug!(name = %first_line(&name), kept = best, removed = removed_ids.len(), "collapsed duplicates");

        groups.push(DuplicateGroup {
            name,
            kept_id: best,
            removed_ids,
        });
    }

    tx.commit()?;

    let removed = groups.iter().map(|g| g.removed_ids.len()).sum();
    let remaining = count_companies(conn)?;
    let unique_names: i64 =
        conn.query_row("SELECT COUNT(DISTINCT name) FROM companies", [], |row| row.get(0))?;

    info!(removed, remaining, "duplicate companies removed");

    Ok(DedupeReport {
        groups,
        removed,
        remaining,
        unique_names,
    })
}
