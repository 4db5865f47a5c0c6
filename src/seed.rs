// 🌱 Seed data - random demo entities for a freshly started server

use chrono::{Duration, Utc};
use rand::Rng;
use tracing::warn;

use crate::entities::{Address, Entity, EventDate, Name};
use crate::store::EntityStore;

/// Build one random entity with 1-3 addresses, dates and names
pub fn generate_entity<R: Rng + ?Sized>(rng: &mut R) -> Entity {
    let mut entity = Entity::new().with_gender(if rng.gen_bool(0.5) { "Male" } else { "Female" });
    entity.deceased = rng.gen_bool(0.5);

    for i in 1..=rng.gen_range(1..4) {
        entity = entity.with_address(Address::new(
            &format!("Address {i}"),
            &format!("City {i}"),
            &format!("Country {i}"),
        ));
    }

    let now = Utc::now();
    for i in 1..=rng.gen_range(1..4) {
        let offset = Duration::days(rng.gen_range(-365..365));
        entity = entity.with_date(EventDate::new(&format!("DateType {i}"), now + offset));
    }

    for i in 1..=rng.gen_range(1..4) {
        entity = entity.with_name(Name::new(
            &format!("FirstName {i}"),
            &format!("MiddleName {i}"),
            &format!("Surname {i}"),
        ));
    }

    entity
}

/// Insert `count` random entities, returning how many were stored
pub fn populate(store: &EntityStore, count: usize) -> usize {
    let mut rng = rand::thread_rng();
    let mut stored = 0;

    for _ in 0..count {
        match store.create(generate_entity(&mut rng)) {
            Ok(_) => stored += 1,
            Err(e) => warn!("Skipping seed entity: {}", e),
        }
    }

    stored
}
