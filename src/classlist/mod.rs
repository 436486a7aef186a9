//! # Named collections
//!
//! A [`ClassList`] is an ordered, homogeneous collection of records with
//! case-insensitive name addressing. It is the building block of every
//! collection held by a [`Project`](crate::project::Project).
//!
//! ## Key Features
//!
//! - **Name addressing**: `list["Bilayer Heads"]` instead of tracking positions
//!   that move on insert/remove
//! - **Kind enforcement**: every record in a list has the same kind, fixed by
//!   the first record inserted or declared up front
//! - **Unique names**: names are unique ignoring case, checked against the
//!   combined result of every bulk operation
//! - **Rebuild on update**: `set_fields` reconstructs the record so its own
//!   invariants are checked again
//!
//! ## Example Usage
//!
//! ```rust
//! use ratapi_rs::classlist::ClassList;
//! use ratapi_rs::models::Parameter;
//!
//! let mut params = ClassList::new();
//! params
//!     .append(Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap())
//!     .unwrap();
//! params
//!     .append_fields(serde_json::json!({"min": 1.0, "value": 2.0, "max": 3.0})
//!         .as_object()
//!         .unwrap()
//!         .clone())
//!     .unwrap();
//!
//! assert_eq!(params.get_names(), vec!["Oxide Thickness", "New Parameter 1"]);
//! assert_eq!(params.index("oxide thickness", true).unwrap(), 1);
//! ```

pub mod collection;
pub mod record;

#[cfg(test)]
mod tests;

pub use collection::{ClassList, CollectionError};
pub use record::{names_match, Fields, Record};
