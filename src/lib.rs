//! # Panel
//!
//! 增量面板資料快取引擎：記住已抓取的實體集合與期間，
//! 重複請求只補抓缺漏的切片。

pub use panel_cache::*;
pub use panel_core::*;
