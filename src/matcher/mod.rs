//! Identifier pattern matching for change and snapshot listings.

mod wildcard;

pub use wildcard::{Matcher, PatternError};
