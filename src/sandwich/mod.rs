pub mod builder;
pub mod calculator;
pub mod filter;

pub use builder::{BundleBuilder, BundleSettings};
pub use calculator::SandwichCalculator;
pub use filter::OpportunityFilter;
