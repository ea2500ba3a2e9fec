//! 期間模型（含頭尾的日期區間）

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{PanelError, Result};

/// 期間：起始日到結束日的連續區間（含頭尾）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    /// 起始日
    pub start: NaiveDate,
    /// 結束日（含）
    pub end: NaiveDate,
}

impl Period {
    /// 創建新的期間（起始日不得晚於結束日）
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(PanelError::InvalidPeriod(format!(
                "起始日 {} 晚於結束日 {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// 兩個期間的凸包（聯集的最小涵蓋區間）
    pub fn hull(self, other: Period) -> Period {
        Period {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// 檢查日期是否落在期間內
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// 檢查是否完整涵蓋另一個期間
    pub fn contains_period(&self, other: &Period) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// 期間天數（含頭尾）
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// 逐日迭代
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", self.start, self.end)
    }
}
