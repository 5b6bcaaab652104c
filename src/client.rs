// Blocking client for the directory API
//
// Used by the terminal UI and the `list` command. Each call maps transport
// failures, non-2xx statuses and undecodable bodies to `ClientError`; callers
// turn those into a placeholder in whatever widget asked.

use crate::error::{ClientError, ClientResult};
use crate::models::{Company, Founder, Stats};
use crate::roster::Roster;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ApiClient {
    base: Url,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base = parse_base(base_url)?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ClientError::Request {
                url: base.to_string(),
                source,
            })?;

        Ok(ApiClient { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a path below the base, e.g. `api/companies`.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ClientError::InvalidBaseUrl {
                url: format!("{}{}", self.base, path),
            })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ClientResult<T> {
        let url = self.endpoint(path)?;
        debug!(%url, ?query, "GET");

        let response = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .map_err(|source| ClientError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// GET /api/companies
    pub fn companies(&self, search: Option<&str>, limit: Option<usize>) -> ClientResult<Vec<Company>> {
        self.get_json("api/companies", &companies_query(search, limit))
    }

    /// GET /api/companies/{id}, including the linked founders
    pub fn company(&self, id: i64) -> ClientResult<Company> {
        self.get_json(&format!("api/companies/{}", id), &[])
    }

    /// GET /api/founders
    pub fn founders(&self, search: Option<&str>) -> ClientResult<Vec<Founder>> {
        self.get_json("api/founders", &search_query(search))
    }

    /// GET /api/stats
    pub fn stats(&self) -> ClientResult<Stats> {
        self.get_json("api/stats", &[])
    }

    /// Fetch companies, then founders, and join them.
    ///
    /// A failed founders fetch still yields a roster, with every company
    /// showing no founders.
    pub fn load_roster(&self) -> ClientResult<Roster> {
        let companies = self.companies(None, None)?;

        let founders = match self.founders(None) {
            Ok(founders) => founders,
            Err(e) => {
                warn!(error = %e, "could not load founders; showing companies without them");
                Vec::new()
            }
        };

        Ok(Roster::new(companies, &founders))
    }
}

fn parse_base(base_url: &str) -> ClientResult<Url> {
    // Url::join drops the last segment unless the base ends in '/'
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };

    let url = Url::parse(&normalized).map_err(|_| ClientError::InvalidBaseUrl {
        url: base_url.to_string(),
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
        });
    }

    Ok(url)
}

fn search_query(search: Option<&str>) -> Vec<(&'static str, String)> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| vec![("search", s.to_string())])
        .unwrap_or_default()
}

fn companies_query(search: Option<&str>, limit: Option<usize>) -> Vec<(&'static str, String)> {
    let mut query = search_query(search);
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_below_base() {
        let c = client("http://localhost:5001");
        assert_eq!(
            c.endpoint("api/companies").unwrap().as_str(),
            "http://localhost:5001/api/companies"
        );
        assert_eq!(
            c.endpoint("/api/stats").unwrap().as_str(),
            "http://localhost:5001/api/stats"
        );
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let c = client("https://example.com/directory");
        assert_eq!(
            c.endpoint("api/companies/7").unwrap().as_str(),
            "https://example.com/directory/api/companies/7"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            ApiClient::new("ftp://example.com", Duration::from_secs(1)),
            Err(ClientError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_query_building() {
        assert!(search_query(None).is_empty());
        assert!(search_query(Some("   ")).is_empty());
        assert_eq!(search_query(Some(" acme ")), vec![("search", "acme".to_string())]);

        assert_eq!(
            companies_query(Some("acme"), Some(6)),
            vec![("search", "acme".to_string()), ("limit", "6".to_string())]
        );
        assert_eq!(companies_query(None, Some(6)), vec![("limit", "6".to_string())]);
    }
}
