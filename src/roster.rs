// Roster Builder - joins companies with founders, then filters and sorts
//
// The two collections come from separate endpoints and share no foreign key
// on the list views, so founders are attached by the first line of the
// company name. The join is best-effort: mismatched spellings simply leave a
// company with no founders.

use crate::models::{first_line, Company, Founder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

// ============================================================================
// JOIN
// ============================================================================

/// Join key for a company or founder's company name.
pub fn join_key(name: &str) -> &str {
    first_line(name)
}

/// Founder counts from a single join pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    /// Founders attached to at least one company
    pub matched: usize,

    /// Founders whose key matched no company
    pub unmatched: usize,

    /// Founders with no company name at all
    pub skipped: usize,
}

/// Attach to each company the founders whose key matches its own.
///
/// Founders keep their fetch order within a company. Companies with no
/// matching founders get an empty list. Two companies sharing a key both
/// receive the whole group.
pub fn join(companies: &mut [Company], founders: &[Founder]) -> JoinOutcome {
    let mut outcome = JoinOutcome::default();
    let mut groups: HashMap<&str, Vec<&Founder>> = HashMap::new();

    for founder in founders {
        match founder.join_name() {
            Some(name) => groups.entry(join_key(name)).or_default().push(founder),
            None => outcome.skipped += 1,
        }
    }

    let mut claimed: HashSet<&str> = HashSet::new();

    for company in companies.iter_mut() {
        company.founders = match groups.get_key_value(join_key(&company.name)) {
            Some((key, group)) => {
                claimed.insert(*key);
                group.iter().map(|f| (*f).clone()).collect()
            }
            None => Vec::new(),
        };
    }

    for (key, group) in &groups {
        if claimed.contains(key) {
            outcome.matched += group.len();
        } else {
            outcome.unmatched += group.len();
        }
    }

    outcome
}

// ============================================================================
// FILTER
// ============================================================================

/// Case-insensitive substring match on the company name.
///
/// An empty term keeps everything. Relative order is preserved.
pub fn filter(companies: &[Company], term: &str) -> Vec<Company> {
    let needle = term.to_lowercase();

    companies
        .iter()
        .filter(|c| needle.is_empty() || c.name.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

// ============================================================================
// SORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Name,
    Founders,
    Batch,
}

impl SortColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Founders => "founders",
            SortColumn::Batch => "batch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Current sort column and direction. A direction only exists alongside a
/// column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<(SortColumn, SortDirection)>,
}

impl SortState {
    pub fn column(&self) -> Option<SortColumn> {
        self.active.map(|(c, _)| c)
    }

    pub fn direction(&self) -> Option<SortDirection> {
        self.active.map(|(_, d)| d)
    }

    pub fn active(&self) -> Option<(SortColumn, SortDirection)> {
        self.active
    }

    /// Direction a click on `column` would select: toggle on the active
    /// column, ascending on any other.
    pub fn next_direction(&self, column: SortColumn) -> SortDirection {
        match self.active {
            Some((current, direction)) if current == column => direction.toggled(),
            _ => SortDirection::Asc,
        }
    }

    pub fn set(&mut self, column: SortColumn, direction: SortDirection) {
        self.active = Some((column, direction));
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

fn compare(a: &Company, b: &Company, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortColumn::Batch => {
            let a = a.batch.as_deref().unwrap_or("").to_lowercase();
            let b = b.batch.as_deref().unwrap_or("").to_lowercase();
            a.cmp(&b)
        }
        SortColumn::Founders => a.founders.len().cmp(&b.founders.len()),
    }
}

/// Stable sort by one column; equal keys keep their relative order in
/// either direction.
pub fn sort(companies: &mut [Company], column: SortColumn, direction: SortDirection) {
    companies.sort_by(|a, b| {
        let ordering = compare(a, b, column);
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

// ============================================================================
// ROSTER STATE
// ============================================================================

/// Which view a sort applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortTarget {
    /// The filtered, displayed view
    Visible,

    /// The full roster
    All,
}

/// Enriched companies plus the derived filtered/sorted view.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    all: Vec<Company>,
    visible: Vec<Company>,
    sort: SortState,
    search: String,
    outcome: JoinOutcome,
}

impl Roster {
    /// Join `founders` into `companies` and start with an unfiltered view.
    pub fn new(mut companies: Vec<Company>, founders: &[Founder]) -> Self {
        let outcome = join(&mut companies, founders);

        if outcome.unmatched > 0 {
            warn!(
                unmatched = outcome.unmatched,
                "founders did not match any company name"
            );
        }
        debug!(
            companies = companies.len(),
            matched = outcome.matched,
            skipped = outcome.skipped,
            "roster joined"
        );

        Self::with_outcome(companies, outcome)
    }

    /// Wrap companies whose `founders` are already populated.
    pub fn from_enriched(companies: Vec<Company>) -> Self {
        let matched = companies.iter().map(|c| c.founders.len()).sum();
        Self::with_outcome(
            companies,
            JoinOutcome {
                matched,
                ..Default::default()
            },
        )
    }

    fn with_outcome(companies: Vec<Company>, outcome: JoinOutcome) -> Self {
        Roster {
            visible: companies.clone(),
            all: companies,
            sort: SortState::default(),
            search: String::new(),
            outcome,
        }
    }

    pub fn all(&self) -> &[Company] {
        &self.all
    }

    pub fn visible(&self) -> &[Company] {
        &self.visible
    }

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn join_outcome(&self) -> JoinOutcome {
        self.outcome
    }

    pub fn unmatched_founders(&self) -> usize {
        self.outcome.unmatched
    }

    pub fn find(&self, id: i64) -> Option<&Company> {
        self.all.iter().find(|c| c.id == id)
    }

    /// Header click: toggles on the active column, ascending on a new one.
    /// Returns the direction now in effect.
    pub fn click_header(&mut self, column: SortColumn) -> SortDirection {
        let direction = self.sort.next_direction(column);
        self.apply_sort(column, direction, SortTarget::Visible);
        direction
    }

    /// Record the sort and apply it to the chosen view.
    pub fn apply_sort(&mut self, column: SortColumn, direction: SortDirection, target: SortTarget) {
        self.sort.set(column, direction);

        match target {
            SortTarget::Visible => sort(&mut self.visible, column, direction),
            SortTarget::All => sort(&mut self.all, column, direction),
        }
    }

    /// Rebuild the visible view for a new search term, keeping the current
    /// sort.
    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.visible = filter(&self.all, term);

        if let Some((column, direction)) = self.sort.active() {
            sort(&mut self.visible, column, direction);
        }
    }

    /// Drop the sort and show the full roster in join order.
    pub fn reset(&mut self) {
        self.sort.clear();
        self.search.clear();
        self.visible = self.all.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(companies: &[Company]) -> Vec<&str> {
        companies.iter().map(|c| c.name.as_str()).collect()
    }

    fn sample_companies() -> Vec<Company> {
        vec![
            Company::new(1, "Acme", Some("W21")),
            Company::new(2, "Zeta", Some("S20")),
            Company::new(3, "beta labs", None),
            Company::new(4, "Delta\nNew York, NY, USA", Some("w21")),
        ]
    }

    #[test]
    fn test_join_scenario() {
        let mut companies = vec![
            Company::new(1, "Acme", Some("W21")),
            Company::new(2, "Zeta", Some("S20")),
        ];
        let founders = vec![Founder::new("Al", "Acme")];

        let outcome = join(&mut companies, &founders);

        assert_eq!(companies[0].founders.len(), 1);
        assert_eq!(companies[0].founders[0].name, "Al");
        assert!(companies[1].founders.is_empty());
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.unmatched, 0);

        sort(&mut companies, SortColumn::Founders, SortDirection::Desc);
        assert_eq!(names(&companies), vec!["Acme", "Zeta"]);
    }

    #[test]
    fn test_join_uses_first_line_and_keeps_order() {
        let mut companies = sample_companies();
        let founders = vec![
            Founder::new("Dana", "Delta\nBrooklyn"),
            Founder::new("Al", "Acme"),
            Founder::new("Dev", "Delta"),
            Founder::new("Ann", "Acme\nSan Francisco"),
        ];

        join(&mut companies, &founders);

        let delta: Vec<&str> = companies[3].founders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(delta, vec!["Dana", "Dev"]);

        let acme: Vec<&str> = companies[0].founders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(acme, vec!["Al", "Ann"]);
    }

    #[test]
    fn test_join_counts_unmatched_and_skipped() {
        let mut companies = sample_companies();
        let mut nameless = Founder::new("Nobody", "");
        nameless.company_name = None;
        let founders = vec![
            Founder::new("Al", "Acme"),
            Founder::new("Typo", "Acme Inc"),
            Founder::new("Case", "acme"),
            nameless,
        ];

        let outcome = join(&mut companies, &founders);

        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.unmatched, 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(companies[0].founders.len(), 1);
    }

    #[test]
    fn test_join_display_name_fallback() {
        let mut companies = sample_companies();
        let founder = Founder {
            name: "Zed".to_string(),
            company_display_name: Some("Zeta".to_string()),
            ..Default::default()
        };

        join(&mut companies, &[founder]);

        assert_eq!(companies[1].founders[0].name, "Zed");
    }

    #[test]
    fn test_join_replaces_previous_founders() {
        let mut companies = sample_companies();
        join(&mut companies, &[Founder::new("Al", "Acme")]);
        join(&mut companies, &[Founder::new("Ann", "Acme")]);

        assert_eq!(companies[0].founders.len(), 1);
        assert_eq!(companies[0].founders[0].name, "Ann");
    }

    #[test]
    fn test_filter_empty_term_keeps_everything() {
        let companies = sample_companies();
        let filtered = filter(&companies, "");
        assert_eq!(filtered, companies);
    }

    #[test]
    fn test_filter_case_insensitive_substring() {
        let companies = sample_companies();
        let filtered = filter(&companies, "ETA");
        assert_eq!(names(&filtered), vec!["Zeta", "beta labs"]);
    }

    #[test]
    fn test_filter_idempotent() {
        let companies = sample_companies();
        let once = filter(&companies, "a");
        let twice = filter(&once, "a");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_sort_name_asc_desc_reversed() {
        let mut asc = sample_companies();
        sort(&mut asc, SortColumn::Name, SortDirection::Asc);
        assert_eq!(
            names(&asc),
            vec!["Acme", "beta labs", "Delta\nNew York, NY, USA", "Zeta"]
        );

        let mut desc = sample_companies();
        sort(&mut desc, SortColumn::Name, SortDirection::Desc);

        let mut reversed = asc.clone();
        reversed.reverse();
        assert_eq!(desc, reversed);
    }

    #[test]
    fn test_sort_batch_case_insensitive_and_stable() {
        let mut companies = sample_companies();
        sort(&mut companies, SortColumn::Batch, SortDirection::Asc);

        // Missing batch sorts as empty; W21 and w21 tie and keep input order
        assert_eq!(
            names(&companies),
            vec!["beta labs", "Zeta", "Acme", "Delta\nNew York, NY, USA"]
        );

        sort(&mut companies, SortColumn::Batch, SortDirection::Desc);
        assert_eq!(
            names(&companies),
            vec!["Acme", "Delta\nNew York, NY, USA", "Zeta", "beta labs"]
        );
    }

    #[test]
    fn test_sort_state_toggle_rules() {
        let mut state = SortState::default();
        assert_eq!(state.column(), None);
        assert_eq!(state.direction(), None);
        assert_eq!(state.next_direction(SortColumn::Name), SortDirection::Asc);

        state.set(SortColumn::Name, SortDirection::Asc);
        assert_eq!(state.next_direction(SortColumn::Name), SortDirection::Desc);
        assert_eq!(state.next_direction(SortColumn::Batch), SortDirection::Asc);

        state.set(SortColumn::Name, SortDirection::Desc);
        assert_eq!(state.next_direction(SortColumn::Name), SortDirection::Asc);
    }

    #[test]
    fn test_roster_click_header_round_trip() {
        let mut roster = Roster::new(sample_companies(), &[]);

        assert_eq!(roster.click_header(SortColumn::Name), SortDirection::Asc);
        let ascending = roster.visible().to_vec();

        assert_eq!(roster.click_header(SortColumn::Name), SortDirection::Desc);
        assert_eq!(roster.click_header(SortColumn::Name), SortDirection::Asc);
        assert_eq!(roster.visible(), ascending.as_slice());

        // New column resets to ascending
        roster.click_header(SortColumn::Name);
        assert_eq!(roster.click_header(SortColumn::Batch), SortDirection::Asc);
        assert_eq!(roster.sort_state().column(), Some(SortColumn::Batch));
    }

    #[test]
    fn test_roster_search_reapplies_sort() {
        let founders = vec![
            Founder::new("Al", "Acme"),
            Founder::new("Zed", "Zeta"),
            Founder::new("Zoe", "Zeta"),
        ];
        let mut roster = Roster::new(sample_companies(), &founders);

        roster.click_header(SortColumn::Founders);
        roster.click_header(SortColumn::Founders);
        roster.set_search("e");

        let visible = names(roster.visible());
        assert_eq!(visible, vec!["Zeta", "Acme", "beta labs", "Delta\nNew York, NY, USA"]);

        roster.set_search("zeta");
        assert_eq!(names(roster.visible()), vec!["Zeta"]);

        roster.set_search("");
        assert_eq!(roster.visible().len(), 4);
        assert_eq!(roster.visible()[0].name, "Zeta");
    }

    #[test]
    fn test_roster_sort_leaves_all_untouched() {
        let mut roster = Roster::new(sample_companies(), &[]);
        roster.click_header(SortColumn::Name);

        assert_eq!(names(roster.all()), names(&sample_companies()));

        roster.apply_sort(SortColumn::Name, SortDirection::Desc, SortTarget::All);
        assert_eq!(roster.all()[0].name, "Zeta");
    }

    #[test]
    fn test_roster_reset_and_find() {
        let mut roster = Roster::new(sample_companies(), &[Founder::new("Al", "Acme")]);
        roster.click_header(SortColumn::Name);
        roster.set_search("zeta");
        roster.reset();

        assert_eq!(roster.sort_state(), SortState::default());
        assert_eq!(roster.search(), "");
        assert_eq!(roster.visible().len(), 4);
        assert_eq!(roster.find(1).map(|c| c.founders.len()), Some(1));
        assert!(roster.find(99).is_none());
    }

    #[test]
    fn test_roster_from_enriched() {
        let mut acme = Company::new(1, "Acme", None);
        acme.founders.push(Founder::new("Al", "Acme"));

        let roster = Roster::from_enriched(vec![acme]);
        assert_eq!(roster.join_outcome().matched, 1);
        assert_eq!(roster.unmatched_founders(), 0);
    }
}
