//! # Panel Core
//!
//! 面板資料核心模型與類型定義

pub mod entities;
pub mod frame;
pub mod params;
pub mod period;

// Re-export 主要類型
pub use entities::EntitySet;
pub use frame::{Panel, PanelKey};
pub use params::{deep_update, fingerprint};
pub use period::Period;

/// 面板快取錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("無效的期間: {0}")]
    InvalidPeriod(String),

    #[error("請求格式錯誤: {0}")]
    MalformedRequest(String),

    #[error("快取策略不支援該增量請求: {0}")]
    UnsupportedGrowth(String),

    #[error("參數指紋無法序列化: {0}")]
    Identity(String),

    #[error("資料抓取失敗: {0}")]
    Fetch(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PanelError>;
