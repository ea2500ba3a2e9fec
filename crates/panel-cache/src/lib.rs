//! # Panel Cache
//!
//! 增量面板快取：期間／實體對帳、快取控制器與鍵控註冊表

pub mod plan;
pub mod reconcile;
pub mod registry;
pub mod source;

// Re-export 主要類型
pub use plan::{plan_fetches, CachePolicy, FetchStep, FetchTag, GrowthHandling};
pub use reconcile::{reconcile_entities, reconcile_period, EntityDelta, PeriodDelta};
pub use registry::SourceRegistry;
pub use source::{CacheState, CachedSource, PanelSource};
