// Entity Models
//
// An entity is a person record:
// - Stable identity (id) that NEVER changes
// - Values (gender, addresses, names, dates) replaced wholesale on update
// - Creation time stamped once

pub mod details;
pub mod entity;

pub use details::{Address, EventDate, Name};
pub use entity::Entity;
