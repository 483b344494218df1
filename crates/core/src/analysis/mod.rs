pub mod confidence;
pub mod merge;
pub mod table;
pub mod trend;

pub use confidence::{classify, BadgeColor, DisplayBadge};
pub use merge::{merge, overview, MergedSeriesPoint, SeriesOverview};
pub use trend::{compute_trend, TrendCalculator, TrendDirection, TrendResult};
