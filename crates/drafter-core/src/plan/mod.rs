//! Plan drafting: complexity tiers, the plan record, and the generator.

pub mod generate;
pub mod types;

pub use generate::generate;
pub use types::{Complexity, ComplexityParseError, Plan};
