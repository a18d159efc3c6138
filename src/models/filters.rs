use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// Result ordering requested from the catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "popularity.desc")]
    Popularity,
    #[serde(rename = "vote_average.desc")]
    Rating,
}

impl SortOrder {
    /// Value of the catalog's `sort_by` parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "popularity.desc",
            SortOrder::Rating => "vote_average.desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Popularity => "Popularity",
            SortOrder::Rating => "Rating",
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "popularity" | "popularity.desc" => Ok(SortOrder::Popularity),
            "rating" | "vote_average.desc" => Ok(SortOrder::Rating),
            other => Err(AppError::InvalidInput(format!("Unknown sort order: {}", other))),
        }
    }
}

/// Latest decade a `TimePeriod` may start at (release years are four digits)
const MAX_DECADE: i32 = 9990;

/// A decade bucket such as "2010s"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimePeriod {
    decade: i32,
}

impl TimePeriod {
    pub fn new(decade: i32) -> Result<Self, AppError> {
        if !(0..=MAX_DECADE).contains(&decade) || decade % 10 != 0 {
            return Err(AppError::InvalidInput(format!(
                "Decade must be a multiple of ten between 0 and {}, got {}",
                MAX_DECADE, decade
            )));
        }
        Ok(Self { decade })
    }

    /// Buckets offered by the filter picker, newest first
    pub fn standard() -> Vec<TimePeriod> {
        [2020, 2010, 2000, 1990]
            .into_iter()
            .map(|decade| TimePeriod { decade })
            .collect()
    }

    pub fn decade(&self) -> i32 {
        self.decade
    }

    /// Inclusive release-date range covered by the decade
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        // Decades are bounded to 0..=9990, well inside chrono's year range.
        let start = NaiveDate::from_ymd_opt(self.decade, 1, 1).unwrap_or(NaiveDate::MIN);
        let end = NaiveDate::from_ymd_opt(self.decade + 9, 12, 31).unwrap_or(NaiveDate::MAX);
        (start, end)
    }
}

impl Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.decade)
    }
}

impl FromStr for TimePeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_suffix('s').ok_or_else(|| {
            AppError::InvalidInput(format!("Time period must look like \"2010s\", got {:?}", s))
        })?;
        let decade = digits
            .parse::<i32>()
            .map_err(|_| AppError::InvalidInput(format!("Invalid time period: {:?}", s)))?;
        TimePeriod::new(decade)
    }
}

impl TryFrom<String> for TimePeriod {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimePeriod> for String {
    fn from(period: TimePeriod) -> Self {
        period.to_string()
    }
}

/// One user selection inside the filter picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacetSelection {
    /// Genre id, as the catalog's string form (e.g. "28")
    Category(String),
    TimePeriod(TimePeriod),
    Sort(SortOrder),
}

/// Filter facets applied to catalog queries.
///
/// `sort` always holds exactly one value. Categories and time periods behave
/// as sets but keep insertion order, since the catalog query joins
/// categories in order and honors only the first time period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawFilterSet")]
pub struct FilterSet {
    categories: Vec<String>,
    time_periods: Vec<TimePeriod>,
    sort: SortOrder,
}

/// Decoded form of a `FilterSet`, before duplicates are dropped
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFilterSet {
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    time_periods: Vec<TimePeriod>,
    #[serde(default)]
    sort: SortOrder,
}

impl From<RawFilterSet> for FilterSet {
    fn from(raw: RawFilterSet) -> Self {
        let filters = raw
            .categories
            .into_iter()
            .fold(FilterSet::new(), |set, genre| set.with_category(genre));
        raw.time_periods
            .into_iter()
            .fold(filters, FilterSet::with_time_period)
            .with_sort(raw.sort)
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, genre_id: impl Into<String>) -> Self {
        let genre_id = genre_id.into();
        if !self.categories.contains(&genre_id) {
            self.categories.push(genre_id);
        }
        self
    }

    pub fn with_time_period(mut self, period: TimePeriod) -> Self {
        if !self.time_periods.contains(&period) {
            self.time_periods.push(period);
        }
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn time_periods(&self) -> &[TimePeriod] {
        &self.time_periods
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// The only time period the catalog query honors
    pub fn active_time_period(&self) -> Option<TimePeriod> {
        self.time_periods.first().copied()
    }

    pub fn is_selected(&self, selection: &FacetSelection) -> bool {
        match selection {
            FacetSelection::Category(id) => self.categories.contains(id),
            FacetSelection::TimePeriod(period) => self.time_periods.contains(period),
            FacetSelection::Sort(sort) => self.sort == *sort,
        }
    }

    /// Replaces the sort selection, or flips membership for the other facets
    pub fn toggle(&mut self, selection: FacetSelection) {
        match selection {
            FacetSelection::Sort(sort) => self.sort = sort,
            FacetSelection::Category(id) => toggle_member(&mut self.categories, id),
            FacetSelection::TimePeriod(period) => toggle_member(&mut self.time_periods, period),
        }
    }
}

fn toggle_member<T: PartialEq>(members: &mut Vec<T>, value: T) {
    if let Some(index) = members.iter().position(|m| *m == value) {
        members.remove(index);
    } else {
        members.push(value);
    }
}
