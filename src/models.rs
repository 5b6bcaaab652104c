// Wire types shared by the store, the API server and the client.
//
// Field names follow the JSON the directory API has always served, including
// the legacy `*_members` spellings that older servers still emit.

use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// NAME KEYS
// ============================================================================

/// Text before the first line break.
///
/// Scraped company names often carry location or tagline text on the
/// following lines; only the first line identifies the company.
pub fn first_line(s: &str) -> &str {
    let line = s.split('\n').next().unwrap_or("");
    line.strip_suffix('\r').unwrap_or(line)
}

/// `Some(value)` only when the field is present and not blank.
pub fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// SQLite hands booleans out as 0/1, newer servers send real booleans.
fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        None => None,
        Some(Flag::Bool(b)) => Some(b),
        Some(Flag::Int(n)) => Some(n != 0),
        Some(Flag::Text(s)) => parse_flag(&s),
    })
}

/// Parse the loose truthy spellings found in exported spreadsheets.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

// ============================================================================
// FOUNDER
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Founder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Company name as scraped alongside the founder; this is the join key.
    #[serde(default)]
    pub company_name: Option<String>,

    /// Name of the company row the founder is linked to, when the server
    /// resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_display_name: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub previous_company: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub linkedin_url: Option<String>,

    #[serde(default)]
    pub twitter_url: Option<String>,

    #[serde(default)]
    pub yc_profile_url: Option<String>,
}

impl Founder {
    pub fn new(name: &str, company_name: &str) -> Self {
        Founder {
            name: name.to_string(),
            company_name: Some(company_name.to_string()),
            ..Default::default()
        }
    }

    /// Company name used for joining, falling back to the display name.
    ///
    /// Blank names count as missing, but the chosen name is returned as
    /// stored so it keys the same way as the company's own name.
    pub fn join_name(&self) -> Option<&str> {
        [&self.company_name, &self.company_display_name]
            .into_iter()
            .find(|name| non_empty(name).is_some())
            .and_then(|name| name.as_deref())
    }

    /// Labelled social links, in display order. Blank URLs are skipped.
    pub fn links(&self) -> Vec<(&'static str, &str)> {
        [
            ("LinkedIn", &self.linkedin_url),
            ("Twitter/X", &self.twitter_url),
            ("YC Profile", &self.yc_profile_url),
        ]
        .into_iter()
        .filter_map(|(label, url)| non_empty(url).map(|u| (label, u)))
        .collect()
    }
}

// ============================================================================
// COMPANY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default)]
    pub batch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub industry: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub yc_url: Option<String>,

    #[serde(default, deserialize_with = "flexible_bool")]
    pub is_hiring: Option<bool>,

    /// Attached by the roster join on list views, or by the server from the
    /// `company_id` link on the detail endpoint.
    #[serde(default, deserialize_with = "null_as_default")]
    pub founders: Vec<Founder>,
}

impl Company {
    pub fn new(id: i64, name: &str, batch: Option<&str>) -> Self {
        Company {
            id,
            name: name.to_string(),
            batch: batch.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        first_line(&self.name).trim()
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTopCompany")]
pub struct TopCompany {
    pub company_name: String,
    pub founder_count: i64,
}

#[derive(Deserialize)]
struct RawTopCompany {
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    founder_count: Option<i64>,
    #[serde(default)]
    member_count: Option<i64>,
}

impl From<RawTopCompany> for TopCompany {
    fn from(raw: RawTopCompany) -> Self {
        TopCompany {
            company_name: raw.company_name.unwrap_or_default(),
            founder_count: prefer_nonzero(raw.founder_count, raw.member_count),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStat {
    #[serde(default)]
    pub batch: Option<String>,
    #[serde(default)]
    pub count: i64,
}

/// Aggregate figures for the dashboard.
///
/// Serializes with the `founders` spellings; deserializes from either those
/// or the `members` spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawStats")]
pub struct Stats {
    pub total_companies: i64,
    pub total_founders: i64,
    pub companies_with_founders: i64,
    pub top_companies: Vec<TopCompany>,
    pub batch_stats: Vec<BatchStat>,
}

#[derive(Deserialize)]
struct RawStats {
    #[serde(default)]
    total_companies: Option<i64>,
    #[serde(default)]
    total_founders: Option<i64>,
    #[serde(default)]
    total_members: Option<i64>,
    #[serde(default)]
    companies_with_founders: Option<i64>,
    #[serde(default)]
    companies_with_members: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    top_companies: Vec<TopCompany>,
    #[serde(default, deserialize_with = "null_as_default")]
    batch_stats: Vec<BatchStat>,
}

impl From<RawStats> for Stats {
    fn from(raw: RawStats) -> Self {
        Stats {
            total_companies: raw.total_companies.unwrap_or(0),
            total_founders: prefer_nonzero(raw.total_founders, raw.total_members),
            companies_with_founders: prefer_nonzero(
                raw.companies_with_founders,
                raw.companies_with_members,
            ),
            top_companies: raw.top_companies,
            batch_stats: raw.batch_stats,
        }
    }
}

/// A zero in the preferred field falls through to the legacy one.
fn prefer_nonzero(primary: Option<i64>, legacy: Option<i64>) -> i64 {
    primary
        .filter(|n| *n != 0)
        .or(legacy)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("Acme\nSan Francisco, CA, USA"), "Acme");
        assert_eq!(first_line("Acme\r\nRemote"), "Acme");
        assert_eq!(first_line("Acme"), "Acme");
        assert_eq!(first_line(""), "");
        assert_eq!(first_line("\nAcme"), "");
    }

    #[test]
    fn test_company_from_list_json() {
        let json = r#"{"id": 7, "name": "Acme\nBoston", "batch": "W21",
            "location": null, "industry": "B2B", "is_hiring": 1,
            "yc_url": "https://www.ycombinator.com/companies/acme"}"#;

        let company: Company = serde_json::from_str(json).unwrap();

        assert_eq!(company.id, 7);
        assert_eq!(company.display_name(), "Acme");
        assert_eq!(company.batch.as_deref(), Some("W21"));
        assert_eq!(company.location, None);
        assert_eq!(company.is_hiring, Some(true));
        assert!(company.founders.is_empty());
    }

    #[test]
    fn test_company_null_name_and_bool_hiring() {
        let company: Company =
            serde_json::from_str(r#"{"id": 1, "name": null, "is_hiring": false}"#).unwrap();
        assert_eq!(company.name, "");
        assert_eq!(company.is_hiring, Some(false));
    }

    #[test]
    fn test_company_serializes_empty_founders_array() {
        let company = Company::new(1, "Acme", Some("W21"));
        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["founders"], serde_json::json!([]));
        assert_eq!(value["batch"], "W21");

        let back: Company = serde_json::from_str(r#"{"id": 1, "name": "Acme", "founders": null}"#).unwrap();
        assert!(back.founders.is_empty());
    }

    #[test]
    fn test_founder_join_name_fallback() {
        let mut founder = Founder::new("Al", "Acme");
        assert_eq!(founder.join_name(), Some("Acme"));

        founder.company_name = None;
        founder.company_display_name = Some("Acme Corp".to_string());
        assert_eq!(founder.join_name(), Some("Acme Corp"));

        founder.company_name = Some("  ".to_string());
        assert_eq!(founder.join_name(), Some("Acme Corp"));

        founder.company_display_name = None;
        assert_eq!(founder.join_name(), None);

        // Kept as stored, padding included
        founder.company_name = Some(" Acme \nSF".to_string());
        assert_eq!(founder.join_name(), Some(" Acme \nSF"));
    }

    #[test]
    fn test_founder_links_skip_blank() {
        let founder = Founder {
            name: "Al".to_string(),
            linkedin_url: Some("https://linkedin.com/in/al".to_string()),
            twitter_url: Some("".to_string()),
            yc_profile_url: Some("https://ycombinator.com/al".to_string()),
            ..Default::default()
        };

        let links = founder.links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0, "LinkedIn");
        assert_eq!(links[1].0, "YC Profile");
    }

    #[test]
    fn test_stats_members_aliases() {
        let json = r#"{
            "total_companies": 120,
            "total_members": 300,
            "companies_with_members": 80,
            "top_companies": [{"company_name": "Acme\nRemote", "member_count": 4}],
            "batch_stats": [{"batch": "W21", "count": 12}]
        }"#;

        let stats: Stats = serde_json::from_str(json).unwrap();

        assert_eq!(stats.total_companies, 120);
        assert_eq!(stats.total_founders, 300);
        assert_eq!(stats.companies_with_founders, 80);
        assert_eq!(stats.top_companies[0].founder_count, 4);
        assert_eq!(stats.batch_stats[0].count, 12);
    }

    #[test]
    fn test_stats_prefers_founders_fields() {
        let json = r#"{"total_companies": 2, "total_founders": 5, "total_members": 9,
            "companies_with_founders": 0, "companies_with_members": 1,
            "top_companies": [], "batch_stats": []}"#;

        let stats: Stats = serde_json::from_str(json).unwrap();

        assert_eq!(stats.total_founders, 5);
        // Zero falls through to the legacy field
        assert_eq!(stats.companies_with_founders, 1);
    }

    #[test]
    fn test_stats_serializes_founders_spelling() {
        let stats = Stats {
            total_companies: 1,
            total_founders: 2,
            companies_with_founders: 1,
            ..Default::default()
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["total_founders"], 2);
        assert!(value.get("total_members").is_none());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
