pub mod secure_compare;

pub use secure_compare::{matches_any, secrets_match};
