// 👤 Entity - a person record with addresses, names and dated events
//
// Identity: `id` (UUID v4 unless the client supplies one) - never changes
// Values:   gender, deceased flag, addresses, names, dates - replaced wholesale on update
// Time:     `created_date` - set once at construction, never mutated

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::details::{null_as_empty, Address, EventDate, Name};

fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// An explicit `null` id is treated like a missing one.
fn id_or_new<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(new_entity_id))
}

// ============================================================================
// ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Stable identity - NEVER changes once stored
    #[serde(default = "new_entity_id", deserialize_with = "id_or_new")]
    pub id: String,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default)]
    pub deceased: bool,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub addresses: Vec<Address>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub names: Vec<Name>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub dates: Vec<EventDate>,

    /// Client payloads cannot set this; it is stamped on deserialization.
    #[serde(skip_deserializing, default = "Utc::now")]
    created_date: DateTime<Utc>,
}

impl Entity {
    /// Create an empty entity with a fresh UUID
    pub fn new() -> Self {
        Self::created_at(Utc::now())
    }

    /// Create an empty entity with a fresh UUID and an explicit creation time
    pub fn created_at(created_date: DateTime<Utc>) -> Self {
        Entity {
            id: new_entity_id(),
            gender: None,
            deceased: false,
            addresses: Vec::new(),
            names: Vec::new(),
            dates: Vec::new(),
            created_date,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    pub fn with_name(mut self, name: Name) -> Self {
        self.names.push(name);
        self
    }

    pub fn with_date(mut self, date: EventDate) -> Self {
        self.dates.push(date);
        self
    }

    pub fn created_date(&self) -> DateTime<Utc> {
        self.created_date
    }

    /// Assign a UUID when the payload carried an empty id
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = new_entity_id();
        }
    }

    /// Carry the creation time of the stored version over to a replacement
    pub(crate) fn inherit_created_date(&mut self, stored: &Entity) {
        self.created_date = stored.created_date;
    }

    // ========================================================================
    // MATCHING (used by the query pipeline)
    // ========================================================================

    /// Case-insensitive substring match against every address country and
    /// line and every name part. `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        let contains = |field: &str| field.to_lowercase().contains(needle);

        let in_addresses = self.addresses.iter().any(|address| {
            [&address.country, &address.address_line]
                .into_iter()
                .flatten()
                .any(|field| contains(field.as_str()))
        });

        in_addresses || self.names.iter().any(|name| name.parts().any(|part| contains(part)))
    }

    /// Case-insensitive exact gender match
    pub fn has_gender(&self, gender: &str) -> bool {
        self.gender
            .as_deref()
            .is_some_and(|own| own.to_lowercase() == gender.to_lowercase())
    }

    /// True when one single event lies inside the (inclusive) bounds
    pub fn has_event_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> bool {
        self.dates.iter().any(|date| {
            let when = date.date_of_event;
            start.map_or(true, |start| when >= start) && end.map_or(true, |end| when <= end)
        })
    }

    /// True when any address country equals (ignoring case) any of `countries`.
    /// `countries` must already be lowercase.
    pub fn has_country_in(&self, countries: &[String]) -> bool {
        self.addresses.iter().any(|address| {
            address.country.as_deref().is_some_and(|country| {
                let country = country.to_lowercase();
                countries.iter().any(|wanted| *wanted == country)
            })
        })
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn john_doe() -> Entity {
        Entity::new()
            .with_id("1")
            .with_gender("Male")
            .with_address(Address::new("123 Main Street", "Cityville", "Countryland"))
            .with_address(Address::new("456 Elm Street", "Townsville", "Countryland"))
            .with_name(Name::new("John", "Robert", "Doe"))
            .with_date(EventDate::new(
                "Birth",
                Utc.with_ymd_and_hms(1980, 5, 15, 0, 0, 0).unwrap(),
            ))
            .with_date(EventDate::new(
                "Graduation",
                Utc.with_ymd_and_hms(2000, 6, 30, 0, 0, 0).unwrap(),
            ))
    }

    #[test]
    fn test_new_entity_has_identity_and_empty_collections() {
        let entity = Entity::new();

        assert!(!entity.id.is_empty());
        assert!(uuid::Uuid::parse_str(&entity.id).is_ok());
        assert!(entity.addresses.is_empty());
        assert!(entity.names.is_empty());
        assert!(entity.dates.is_empty());
        assert!(!entity.deceased);
    }

    #[test]
    fn test_deserialize_normalizes_null_collections() {
        let entity: Entity = serde_json::from_str(
            r#"{"id": "7", "addresses": null, "names": null, "gender": "Female"}"#,
        )
        .unwrap();

        assert_eq!(entity.id, "7");
        assert!(entity.addresses.is_empty());
        assert!(entity.names.is_empty());
        assert!(entity.dates.is_empty());
        assert_eq!(entity.gender.as_deref(), Some("Female"));
    }

    #[test]
    fn test_deserialize_assigns_missing_id() {
        let a: Entity = serde_json::from_str("{}").unwrap();
        let b: Entity = serde_json::from_str("{}").unwrap();

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_deserialize_assigns_null_id() {
        let entity: Entity = serde_json::from_str(r#"{"id": null, "gender": "Male"}"#).unwrap();

        assert!(uuid::Uuid::parse_str(&entity.id).is_ok());
        assert_eq!(entity.gender.as_deref(), Some("Male"));
    }

    #[test]
    fn test_created_date_is_not_client_settable() {
        let before = Utc::now();
        let entity: Entity =
            serde_json::from_str(r#"{"id": "1", "createdDate": "1999-01-01T00:00:00Z"}"#).unwrap();

        assert!(entity.created_date() >= before);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(john_doe()).unwrap();

        assert_eq!(json["addresses"][0]["addressLine"], "123 Main Street");
        assert_eq!(json["names"][0]["firstName"], "John");
        assert_eq!(json["dates"][1]["dateType"], "Graduation");
        assert!(json["createdDate"].is_string());
        assert_eq!(json["deceased"], false);
    }

    #[test]
    fn test_ensure_id_replaces_blank() {
        let mut entity = Entity::new().with_id("  ");
        entity.ensure_id();
        assert!(!entity.id.trim().is_empty());

        let mut kept = Entity::new().with_id("abc");
        kept.ensure_id();
        assert_eq!(kept.id, "abc");
    }

    #[test]
    fn test_matches_text_across_addresses_and_names() {
        let entity = john_doe();

        assert!(entity.matches_text("countryland"));
        assert!(entity.matches_text("elm"));
        assert!(entity.matches_text("rob"));
        assert!(entity.matches_text("doe"));
        // City is not searchable
        assert!(!entity.matches_text("townsville"));
        assert!(!entity.matches_text("smith"));
    }

    #[test]
    fn test_has_gender_ignores_case() {
        let entity = john_doe();

        assert!(entity.has_gender("male"));
        assert!(entity.has_gender("MALE"));
        assert!(!entity.has_gender("female"));
        assert!(!Entity::new().has_gender("male"));
    }

    #[test]
    fn test_has_event_between_requires_single_event_in_range() {
        let entity = john_doe();
        let at = |y, m, d| Some(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap());

        assert!(entity.has_event_between(at(1980, 1, 1), at(1980, 12, 31)));
        assert!(entity.has_event_between(at(2000, 6, 30), None));
        assert!(entity.has_event_between(None, at(1980, 5, 15)));
        // Birth is before the window, graduation after it
        assert!(!entity.has_event_between(at(1990, 1, 1), at(1995, 1, 1)));
        assert!(!Entity::new().has_event_between(None, at(2100, 1, 1)));
    }

    #[test]
    fn test_has_country_in() {
        let entity = john_doe();

        assert!(entity.has_country_in(&["nowhere".to_string(), "countryland".to_string()]));
        assert!(!entity.has_country_in(&["country".to_string()]));
        assert!(!Entity::new().has_country_in(&["countryland".to_string()]));
    }
}
