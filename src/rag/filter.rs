//! Structured search filters and their translation to metadata filters.
//!
//! Callers describe a search with a [`SearchFilters`] value (optional date
//! bounds, a category allow-list, and a scope). [`SearchFilters::to_metadata_filter`]
//! collapses it into the [`MetadataFilter`] the index understands, or `None`
//! when nothing constrains the search.
//!
//! Documents are expected to carry `date` as an ISO `YYYY-MM-DD` string and
//! `category` as a string. ISO dates order correctly as strings.

use chrono::{Duration, Local, NaiveDate};
use recall_vector::{FilterCondition, MetadataFilter, MetadataValue};
use serde::{Deserialize, Serialize};

/// Metadata key holding the document date.
pub const DATE_KEY: &str = "date";
/// Metadata key holding the document category.
pub const CATEGORY_KEY: &str = "category";
/// Days covered by [`SearchScope::Recent`].
pub const RECENT_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    #[default]
    All,
    /// Only documents dated within the last 30 days.
    Recent,
    /// Only documents in the allow-listed categories.
    Category,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub scope: SearchScope,
}

impl SearchFilters {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn recent() -> Self {
        Self {
            scope: SearchScope::Recent,
            ..Self::default()
        }
    }

    pub fn categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            scope: SearchScope::Category,
            ..Self::default()
        }
    }

    pub fn with_date_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_range = DateRange { start, end };
        self
    }

    /// Translate using today's local date.
    pub fn to_metadata_filter(&self) -> Option<MetadataFilter> {
        self.to_metadata_filter_at(Local::now().date_naive())
    }

    /// Translate relative to `today`.
    ///
    /// Date bounds apply in every scope. `Recent` adds a lower bound of
    /// `today - 30 days`, which tightens but never loosens an explicit start.
    /// Categories apply only in `Category` scope; an empty allow-list adds
    /// nothing. An empty result is `None`.
    pub fn to_metadata_filter_at(&self, today: NaiveDate) -> Option<MetadataFilter> {
        let mut filter = MetadataFilter::new();

        let mut start = self.date_range.start;
        if self.scope == SearchScope::Recent {
            let recent_start = today - Duration::days(RECENT_DAYS);
            start = Some(start.map_or(recent_start, |s| s.max(recent_start)));
        }

        if let Some(start) = start {
            filter = filter.with(DATE_KEY, FilterCondition::Gte(iso(start)));
        }
        if let Some(end) = self.date_range.end {
            filter = filter.with(DATE_KEY, FilterCondition::Lte(iso(end)));
        }

        if self.scope == SearchScope::Category {
            match self.categories.as_slice() {
                [] => {}
                [only] => filter = filter.equals(CATEGORY_KEY, only.as_str()),
                many => {
                    let allowed = many.iter().map(|c| MetadataValue::from(c.as_str())).collect();
                    filter = filter.with(CATEGORY_KEY, FilterCondition::In(allowed));
                }
            }
        }

        if filter.is_empty() {
            None
        } else {
            Some(filter)
        }
    }
}

fn iso(date: NaiveDate) -> MetadataValue {
    MetadataValue::String(date.format("%Y-%m-%d").to_string())
}
