// 🔎 Query Pipeline - filter → sort → paginate over a store snapshot
//
// Stages run in a fixed order and each one is only active when its
// parameter is present:
//   1. free-text search   (addresses + names, any match)
//   2. gender             (exact, ignoring case)
//   3. date range         (one event inside [start, end])
//   4. countries          (any address country in the set)
//   5. sort               (createdDate only; unknown fields keep order)
//   6. pagination         (1-based page numbers)
//
// The pipeline owns the snapshot it is given and never touches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Entity;

pub const DEFAULT_PAGE_SIZE: u32 = 3;

// ============================================================================
// SORTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedDate,
}

impl SortField {
    /// Case-insensitive field lookup; None for fields that cannot be sorted on
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "createddate" => Some(SortField::CreatedDate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Only "desc" (any case) sorts descending
    pub fn parse(order: &str) -> Self {
        if order.eq_ignore_ascii_case("desc") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

// ============================================================================
// QUERY
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    pub search: Option<String>,
    pub gender: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub countries: Vec<String>,
    pub page_number: u32,
    pub page_size: u32,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl Default for EntityQuery {
    fn default() -> Self {
        EntityQuery {
            search: None,
            gender: None,
            start_date: None,
            end_date: None,
            countries: Vec::new(),
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            sort_order: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub total_items: usize,
    pub page_size: u32,
    pub current_page: u32,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPage {
    pub metadata: PageMetadata,
    pub results: Vec<Entity>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl EntityQuery {
    /// Run every active stage over `snapshot`
    pub fn apply(&self, snapshot: Vec<Entity>) -> QueryPage {
        let mut matched = self.filter(snapshot);
        self.sort(&mut matched);
        self.paginate(matched)
    }

    /// Stages 1-4
    pub fn filter(&self, snapshot: Vec<Entity>) -> Vec<Entity> {
        let mut entities = snapshot;

        if let Some(search) = non_empty(&self.search) {
            let needle = search.to_lowercase();
            entities.retain(|e| e.matches_text(&needle));
        }

        if let Some(gender) = non_empty(&self.gender) {
            entities.retain(|e| e.has_gender(gender));
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            entities.retain(|e| e.has_event_between(self.start_date, self.end_date));
        }

        if !self.countries.is_empty() {
            let wanted: Vec<String> = self.countries.iter().map(|c| c.to_lowercase()).collect();
            entities.retain(|e| e.has_country_in(&wanted));
        }

        entities
    }

    /// Stage 5 - stable, so ties keep their filtered order
    pub fn sort(&self, entities: &mut [Entity]) {
        let Some(field) = self.sort_by.as_deref().and_then(SortField::parse) else {
            return;
        };
        let order = self
            .sort_order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default();

        match (field, order) {
            (SortField::CreatedDate, SortOrder::Ascending) => {
                entities.sort_by_key(|e| e.created_date())
            }
            (SortField::CreatedDate, SortOrder::Descending) => {
                entities.sort_by(|a, b| b.created_date().cmp(&a.created_date()))
            }
        }
    }

    /// Stage 6
    pub fn paginate(&self, entities: Vec<Entity>) -> QueryPage {
        let total_items = entities.len();
        let page_size = self.page_size as usize;

        let total_pages = if page_size == 0 {
            0
        } else {
            total_items.div_ceil(page_size)
        };

        let results = match self.page_number {
            0 => Vec::new(),
            page => {
                let skip = (page as usize - 1).saturating_mul(page_size);
                entities.into_iter().skip(skip).take(page_size).collect()
            }
        };

        QueryPage {
            metadata: PageMetadata {
                total_items,
                page_size: self.page_size,
                current_page: self.page_number,
                total_pages,
            },
            results,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
