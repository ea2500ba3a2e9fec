//! 具記憶的面板資料來源（快取控制器）

use panel_core::{EntitySet, Panel, Period, Result};

use crate::plan::{plan_fetches, CachePolicy, FetchStep, FetchTag};
use crate::reconcile::{reconcile_entities, reconcile_period};

/// 抽象抓取操作：快取唯一的 I/O 邊界
///
/// 實作必須對相同輸入回傳確定性的結果，且回傳的面板必須
/// 恰好涵蓋請求的實體 × 期間（多出的儲存格雖可容忍，但會
/// 遮蔽後續的增量缺口，應避免）。`tag` 僅為觀測用途，
/// 實作可自由忽略。
pub trait PanelSource {
    /// 抓取指定實體集合與期間的面板資料
    fn execute(
        &mut self,
        tag: FetchTag,
        entities: Option<&EntitySet>,
        period: Option<Period>,
    ) -> Result<Panel>;
}

/// 快取狀態（由單一控制器獨佔持有）
///
/// 不變量：value 為空 ⇔ entities 與 period 皆為空；一旦非空，
/// entities 與 period 永遠是歷來已接受請求的上集（逐層級聯集
/// 與期間凸包單調成長）。
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    value: Option<Panel>,
    entities: Option<EntitySet>,
    period: Option<Period>,
}

impl CacheState {
    /// 已快取的面板
    pub fn value(&self) -> Option<&Panel> {
        self.value.as_ref()
    }

    /// 已涵蓋的實體集合
    pub fn entities(&self) -> Option<&EntitySet> {
        self.entities.as_ref()
    }

    /// 已涵蓋的期間
    pub fn period(&self) -> Option<Period> {
        self.period
    }

    /// 是否尚未有任何資料
    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    fn clear(&mut self) {
        self.value = None;
        self.entities = None;
        self.period = None;
    }
}

/// 具快取的面板資料來源
///
/// 記住已經抓取過的實體集合與期間；重複請求只對缺漏的部分
/// 發出增量抓取，再合併進既有面板。`&mut self` 介面強制
/// 單寫者模型；跨執行緒共用時請經由 `SourceRegistry` 的
/// Mutex 取用，讓同一實例上的請求自然序列化。
pub struct CachedSource<S: PanelSource> {
    source: S,
    policy: CachePolicy,
    state: CacheState,
}

impl<S: PanelSource> CachedSource<S> {
    /// 創建新的快取來源（初始狀態為空）
    pub fn new(source: S, policy: CachePolicy) -> Self {
        Self {
            source,
            policy,
            state: CacheState::default(),
        }
    }

    /// 快取策略
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// 快取狀態（唯讀）
    pub fn state(&self) -> &CacheState {
        &self.state
    }

    /// 內部來源（唯讀）
    pub fn source(&self) -> &S {
        &self.source
    }

    /// 清空快取狀態；下一次請求視同首次請求
    pub fn reset(&mut self) {
        tracing::info!("重設快取狀態");
        self.state.clear();
    }

    /// 請求面板資料
    ///
    /// 回傳累積面板的複本（不裁切至請求子集；需要子集時可
    /// 再呼叫 `Panel::subset`）。任何抓取失敗都會原樣傳回
    /// 呼叫端，且快取狀態完全不變（原子提交）。
    pub fn request(
        &mut self,
        entities: Option<&EntitySet>,
        period: Option<Period>,
    ) -> Result<Panel> {
        match self.state.value.clone() {
            None => self.initial_request(entities, period),
            Some(value) => self.incremental_request(value, entities, period),
        }
    }

    /// 首次請求：全量抓取並記錄涵蓋範圍
    fn initial_request(
        &mut self,
        entities: Option<&EntitySet>,
        period: Option<Period>,
    ) -> Result<Panel> {
        tracing::info!(
            "首次請求：實體層級 {:?}，期間 {}",
            entities.map(|e| e.level_names()),
            describe_period(period)
        );

        let value = self.wrapped_execute(FetchTag::Initial, entities, period)?;
        self.state.entities = entities.cloned();
        self.state.period = period;
        self.state.value = Some(value.clone());
        Ok(value)
    }

    /// 後續請求：對帳、決策、增量抓取、合併
    fn incremental_request(
        &mut self,
        mut value: Panel,
        entities: Option<&EntitySet>,
        period: Option<Period>,
    ) -> Result<Panel> {
        let period_delta = reconcile_period(self.state.period, period);
        let (inc_entities, dec_entities, total_entities) = match entities {
            Some(requested) => {
                let delta = reconcile_entities(self.state.entities.as_ref(), requested)?;
                (delta.incremental, delta.decremental, Some(delta.total))
            }
            // 請求未指定實體：視為沿用既有實體集合
            None => (None, false, self.state.entities.clone()),
        };

        tracing::debug!(
            "對帳結果：實體增量 {:?}，縮減標記 {}，期間增量 {:?}",
            inc_entities.as_ref().map(|e| e.level_names()),
            dec_entities,
            period_delta.incremental
        );

        let steps = plan_fetches(
            self.policy,
            inc_entities.is_some(),
            dec_entities,
            period_delta.has_incremental(),
        )?;
        tracing::debug!("抓取步驟: {:?}", steps);

        // 先完成所有抓取，全部成功後才合併與更新涵蓋範圍；
        // 中途失敗時快取狀態保持原樣
        let mut xs_batches = Vec::new();
        let mut ts_batches = Vec::new();
        let mut refetched: Option<Panel> = None;

        for step in &steps {
            match step {
                FetchStep::AppendXs => {
                    let batch = self.wrapped_execute(
                        FetchTag::IncrementalXs,
                        inc_entities.as_ref(),
                        self.state.period,
                    )?;
                    xs_batches.push(batch);
                }
                FetchStep::AppendTs => {
                    for segment in &period_delta.incremental {
                        let batch = self.wrapped_execute(
                            FetchTag::IncrementalTs,
                            total_entities.as_ref(),
                            Some(*segment),
                        )?;
                        ts_batches.push(batch);
                    }
                }
                FetchStep::Refetch => {
                    refetched = Some(self.wrapped_execute(
                        FetchTag::Total,
                        total_entities.as_ref(),
                        period_delta.total,
                    )?);
                }
            }
        }

        if let Some(panel) = refetched {
            value = panel;
            self.state.entities = total_entities;
            self.state.period = period_delta.total;
        } else {
            if !xs_batches.is_empty() {
                for batch in xs_batches {
                    value.merge_keep_existing(batch)?;
                }
                self.state.entities = total_entities.clone();
            }
            if !ts_batches.is_empty() {
                for batch in ts_batches {
                    value.merge_keep_existing(batch)?;
                }
                self.state.period = period_delta.total;
            }
        }

        self.state.value = Some(value.clone());
        Ok(value)
    }

    fn wrapped_execute(
        &mut self,
        tag: FetchTag,
        entities: Option<&EntitySet>,
        period: Option<Period>,
    ) -> Result<Panel> {
        tracing::info!(
            "EXEC {}：實體 {} 組，期間 {}",
            tag,
            entities.map(|e| e.num_tuples()).unwrap_or(0),
            describe_period(period)
        );
        self.source.execute(tag, entities, period)
    }
}

fn describe_period(period: Option<Period>) -> String {
    match period {
        Some(p) => p.to_string(),
        None => "（無）".to_string(),
    }
}
