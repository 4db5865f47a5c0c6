// 📇 Entity details - addresses, names and dated events
//
// Every text field is optional on the wire; a missing field and an explicit
// null both deserialize to None.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// ADDRESS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub address_line: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl Address {
    pub fn new(address_line: &str, city: &str, country: &str) -> Self {
        Address {
            address_line: Some(address_line.to_string()),
            city: Some(city.to_string()),
            country: Some(country.to_string()),
        }
    }
}

// ============================================================================
// NAME
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Name {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub surname: Option<String>,
}

impl Name {
    pub fn new(first_name: &str, middle_name: &str, surname: &str) -> Self {
        Name {
            first_name: Some(first_name.to_string()),
            middle_name: Some(middle_name.to_string()),
            surname: Some(surname.to_string()),
        }
    }

    /// All present name parts, in first/middle/surname order
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        [&self.first_name, &self.middle_name, &self.surname]
            .into_iter()
            .filter_map(|part| part.as_deref())
    }
}

// ============================================================================
// EVENT DATE
// ============================================================================

/// A labelled point in time in the person's life (birth, graduation, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDate {
    #[serde(default)]
    pub date_type: Option<String>,

    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub date_of_event: DateTime<Utc>,
}

impl EventDate {
    pub fn new(date_type: &str, date_of_event: DateTime<Utc>) -> Self {
        EventDate {
            date_type: Some(date_type.to_string()),
            date_of_event,
        }
    }
}

/// Deserialize a sequence, mapping an explicit `null` to an empty Vec.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
