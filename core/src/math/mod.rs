pub mod bounds;
pub mod stats;

pub use bounds::ValueRange;
pub use stats::StatsHelper;
