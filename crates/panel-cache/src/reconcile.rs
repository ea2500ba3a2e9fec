//! 期間與實體集合的增量對帳（純函數，無 I/O、不碰共享狀態）

use panel_core::{EntitySet, Period, Result};

/// 期間對帳結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodDelta {
    /// 增量區段（0 到 2 段，彼此不重疊，依時間排序）
    pub incremental: Vec<Period>,
    /// 對帳後的總期間（已快取與請求期間的凸包）
    pub total: Option<Period>,
}

impl PeriodDelta {
    /// 是否有期間增量
    pub fn has_incremental(&self) -> bool {
        !self.incremental.is_empty()
    }
}

/// 計算已快取期間與請求期間的增量與總期間
///
/// 向左成長產生 (total.start, current.start) 區段，向右成長產生
/// (current.end, total.end) 區段；雙向成長時兩段同時回傳，
/// 聯集恰好涵蓋 total 中 current 未涵蓋的部分。
/// 每段與既有快取共用一個邊界日；合併採既有儲存格優先，
/// 邊界日不會被覆蓋。
pub fn reconcile_period(current: Option<Period>, requested: Option<Period>) -> PeriodDelta {
    let requested = match requested {
        None => {
            return PeriodDelta {
                incremental: Vec::new(),
                total: current,
            }
        }
        Some(p) => p,
    };
    let current = match current {
        None => {
            return PeriodDelta {
                incremental: vec![requested],
                total: Some(requested),
            }
        }
        Some(p) => p,
    };

    let total = current.hull(requested);
    let mut incremental = Vec::new();
    if total.start < current.start {
        incremental.push(Period {
            start: total.start,
            end: current.start,
        });
    }
    if total.end > current.end {
        incremental.push(Period {
            start: current.end,
            end: total.end,
        });
    }

    PeriodDelta {
        incremental,
        total: Some(total),
    }
}

/// 實體集合對帳結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDelta {
    /// 增量實體（無新增時為 None）
    ///
    /// 以「缺漏元組出現過的值」逐層級彙整而成，可能涵蓋超出
    /// 缺漏元組的組合；合併採既有儲存格優先，重複抓取無害。
    pub incremental: Option<EntitySet>,
    /// 縮減標記：請求集合未涵蓋總集合時為 true
    ///
    /// 快取不逐出已抓取的實體，此標記僅提示縮減請求被部分忽略。
    pub decremental: bool,
    /// 逐層級聯集後的總集合
    pub total: EntitySet,
}

/// 計算已快取實體與請求實體的增量、縮減標記與總集合
///
/// 層級名稱不一致視為請求格式錯誤。成員檢查走逐層級的
/// `contains_tuple`，不展開 current／requested 的笛卡兒積，
/// 結果與完整展開後過濾一致。
pub fn reconcile_entities(
    current: Option<&EntitySet>,
    requested: &EntitySet,
) -> Result<EntityDelta> {
    let current = match current {
        None => {
            return Ok(EntityDelta {
                incremental: Some(requested.clone()),
                decremental: false,
                total: requested.clone(),
            })
        }
        Some(c) => c,
    };

    let total = current.union(requested)?;

    let mut incremental_values: Vec<Vec<String>> = vec![Vec::new(); total.num_levels()];
    let mut any_incremental = false;
    let mut decremental = false;

    for tuple in total.tuples() {
        if !current.contains_tuple(&tuple) {
            any_incremental = true;
            for (i, value) in tuple.iter().enumerate() {
                if !incremental_values[i].contains(value) {
                    incremental_values[i].push(value.clone());
                }
            }
        }
        if !requested.contains_tuple(&tuple) {
            decremental = true;
        }
    }

    let incremental = if any_incremental {
        let mut set = EntitySet::new();
        for (name, values) in total.level_names().into_iter().zip(incremental_values) {
            set.insert_level(name, values);
        }
        Some(set)
    } else {
        None
    };

    Ok(EntityDelta {
        incremental,
        decremental,
        total,
    })
}
