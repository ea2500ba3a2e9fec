//! 增量抓取決策表
//!
//! 把「策略 × 增量狀態 → 抓取步驟」的分派攤平成一張可單獨
//! 測試的決策表，取代巢狀條件分支。

use panel_core::{PanelError, Result};
use serde::{Deserialize, Serialize};

/// 抓取呼叫的標記（說明抓取屬於哪一種情境）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTag {
    /// 首次抓取
    Initial,
    /// 橫斷面增量
    IncrementalXs,
    /// 時間序列增量
    IncrementalTs,
    /// 全量重抓
    Total,
}

impl std::fmt::Display for FetchTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FetchTag::Initial => "INITIAL",
            FetchTag::IncrementalXs => "INCREMENTAL XS",
            FetchTag::IncrementalTs => "INCREMENTAL TS",
            FetchTag::Total => "TOTAL",
        };
        write!(f, "{}", name)
    }
}

/// 超出策略的增量請求處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthHandling {
    /// 靜默忽略（沿用舊行為：回傳的面板不涵蓋新增範圍）
    Ignore,
    /// 回報 UnsupportedGrowth 錯誤
    Error,
    /// 退回全量重抓
    Refetch,
}

/// 快取策略（建構時固定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// 橫斷面是否可增量擴充
    pub xs_appendable: bool,
    /// 時間序列是否可增量擴充
    pub ts_appendable: bool,
    /// 超出策略的增量請求處理方式
    pub on_unsupported_growth: GrowthHandling,
}

impl CachePolicy {
    /// 創建新的快取策略（超出策略的增量預設靜默忽略）
    pub fn new(xs_appendable: bool, ts_appendable: bool) -> Self {
        Self {
            xs_appendable,
            ts_appendable,
            on_unsupported_growth: GrowthHandling::Ignore,
        }
    }

    /// 建構器模式：設置超出策略的增量處理方式
    pub fn with_growth_handling(mut self, handling: GrowthHandling) -> Self {
        self.on_unsupported_growth = handling;
        self
    }
}

impl Default for CachePolicy {
    /// 預設兩個維度皆不可增量（保守策略）
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// 單一抓取步驟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    /// 以既有快取期間抓取新實體
    AppendXs,
    /// 以總實體集合抓取各個新期間區段
    AppendTs,
    /// 以總實體 × 總期間全量重抓並整批取代
    Refetch,
}

/// 依策略與增量狀態決定抓取步驟
///
/// 決策表以 (xs 可增量, ts 可增量, 有實體增量, 有期間增量) 為鍵：
/// - (true,  true) ：實體與期間增量各自成一步，可同時出現
/// - (true,  false)：僅在期間無成長時服務實體增量
/// - (false, true) ：僅在實體完全吻合（無增量也無縮減標記）時服務期間增量
/// - (false, false)：一律全量重抓
///
/// 任何未被步驟涵蓋的增量依 `GrowthHandling` 處理。
pub fn plan_fetches(
    policy: CachePolicy,
    has_inc_entities: bool,
    has_dec_entities: bool,
    has_inc_period: bool,
) -> Result<Vec<FetchStep>> {
    let mut steps = Vec::new();

    match (policy.xs_appendable, policy.ts_appendable) {
        (true, true) => {
            if has_inc_entities {
                steps.push(FetchStep::AppendXs);
            }
            if has_inc_period {
                steps.push(FetchStep::AppendTs);
            }
        }
        (true, false) => {
            if !has_inc_period && has_inc_entities {
                steps.push(FetchStep::AppendXs);
            }
        }
        (false, true) => {
            if !has_inc_entities && !has_dec_entities && has_inc_period {
                steps.push(FetchStep::AppendTs);
            }
        }
        (false, false) => {
            steps.push(FetchStep::Refetch);
        }
    }

    let entities_covered = steps
        .iter()
        .any(|s| matches!(s, FetchStep::AppendXs | FetchStep::Refetch));
    let period_covered = steps
        .iter()
        .any(|s| matches!(s, FetchStep::AppendTs | FetchStep::Refetch));
    let unserviced =
        (has_inc_entities && !entities_covered) || (has_inc_period && !period_covered);

    if unserviced {
        match policy.on_unsupported_growth {
            GrowthHandling::Ignore => {}
            GrowthHandling::Error => {
                return Err(PanelError::UnsupportedGrowth(format!(
                    "策略 xs={} ts={} 無法服務該請求（實體增量: {}，期間增量: {}）",
                    policy.xs_appendable, policy.ts_appendable, has_inc_entities, has_inc_period
                )));
            }
            GrowthHandling::Refetch => {
                return Ok(vec![FetchStep::Refetch]);
            }
        }
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// 決策表逐列驗證（Ignore 模式）
    #[rstest]
    // (true, true)：實體與期間增量各自成一步，可同時出現
    #[case::both_no_delta(true, true, false, false, false, vec![])]
    #[case::both_xs_growth(true, true, true, false, false, vec![FetchStep::AppendXs])]
    #[case::both_ts_growth(true, true, false, false, true, vec![FetchStep::AppendTs])]
    #[case::both_dual_growth(true, true, true, false, true, vec![FetchStep::AppendXs, FetchStep::AppendTs])]
    // (true, false)：期間成長時整個請求都不服務（連實體增量也不抓）
    #[case::xs_only_served(true, false, true, false, false, vec![FetchStep::AppendXs])]
    #[case::xs_only_blocked_by_period(true, false, true, false, true, vec![])]
    #[case::xs_only_period_ignored(true, false, false, false, true, vec![])]
    // (false, true)：實體有任何變動（增量或縮減標記）就不服務
    #[case::ts_only_served(false, true, false, false, true, vec![FetchStep::AppendTs])]
    #[case::ts_only_blocked_by_inc(false, true, true, false, true, vec![])]
    #[case::ts_only_blocked_by_dec(false, true, false, true, true, vec![])]
    #[case::ts_only_entity_ignored(false, true, true, false, false, vec![])]
    // (false, false)：即使請求與快取完全吻合，也一律全量重抓
    #[case::none_exact_match(false, false, false, false, false, vec![FetchStep::Refetch])]
    #[case::none_with_growth(false, false, true, false, true, vec![FetchStep::Refetch])]
    fn test_decision_table(
        #[case] xs: bool,
        #[case] ts: bool,
        #[case] inc_ent: bool,
        #[case] dec_ent: bool,
        #[case] inc_per: bool,
        #[case] expected: Vec<FetchStep>,
    ) {
        let steps = plan_fetches(CachePolicy::new(xs, ts), inc_ent, dec_ent, inc_per).unwrap();
        assert_eq!(steps, expected);
    }

    #[test]
    fn test_growth_handling_error() {
        let policy = CachePolicy::new(true, false).with_growth_handling(GrowthHandling::Error);

        let result = plan_fetches(policy, false, false, true);
        assert!(matches!(
            result,
            Err(panel_core::PanelError::UnsupportedGrowth(_))
        ));

        // 策略內的請求不受影響
        assert_eq!(
            plan_fetches(policy, true, false, false).unwrap(),
            vec![FetchStep::AppendXs]
        );
    }

    #[test]
    fn test_growth_handling_refetch() {
        let policy = CachePolicy::new(true, false).with_growth_handling(GrowthHandling::Refetch);

        assert_eq!(
            plan_fetches(policy, true, false, true).unwrap(),
            vec![FetchStep::Refetch]
        );
    }

    #[test]
    fn test_decision_table_exhaustive_ignore() {
        // 16 種組合下，Ignore 模式不得回報錯誤
        for xs in [false, true] {
            for ts in [false, true] {
                for inc_ent in [false, true] {
                    for inc_per in [false, true] {
                        let steps =
                            plan_fetches(CachePolicy::new(xs, ts), inc_ent, false, inc_per);
                        assert!(steps.is_ok(), "xs={} ts={} 組合不應失敗", xs, ts);
                    }
                }
            }
        }
    }

    #[test]
    fn test_fetch_tag_display() {
        assert_eq!(FetchTag::Initial.to_string(), "INITIAL");
        assert_eq!(FetchTag::IncrementalXs.to_string(), "INCREMENTAL XS");
        assert_eq!(FetchTag::IncrementalTs.to_string(), "INCREMENTAL TS");
        assert_eq!(FetchTag::Total.to_string(), "TOTAL");
    }
}
