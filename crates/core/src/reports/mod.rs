//! P&L reporting: period resolution, report assembly, and caching.

pub mod cache;
pub mod period;
pub mod pnl;

pub use cache::ReportCache;
pub use period::{PeriodRange, resolve_period};
pub use pnl::{BreakdownKind, CategoryBreakdown, CategorySum, PnLReport, build_report};
