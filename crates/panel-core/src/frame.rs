//! 面板資料表（稀疏，多層級實體 × 日期）

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{EntitySet, PanelError, Period, Result};

/// 面板儲存格的複合鍵：實體元組 × 日期
///
/// 實體元組的值依層級正規順序（層級名稱排序）排列。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelKey {
    /// 實體元組
    pub entity: Vec<String>,
    /// 日期
    pub date: NaiveDate,
}

/// 稀疏面板資料表
///
/// 列索引為實體元組與日期的複合鍵，不要求所有儲存格都有值。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    /// 層級名稱（正規順序）
    levels: Vec<String>,
    /// 儲存格
    cells: BTreeMap<PanelKey, Decimal>,
}

impl Panel {
    /// 創建空面板
    pub fn new(levels: Vec<String>) -> Self {
        Self {
            levels,
            cells: BTreeMap::new(),
        }
    }

    /// 依實體集合的層級建立空面板
    pub fn for_entities(entities: &EntitySet) -> Self {
        Self::new(entities.level_names().into_iter().map(String::from).collect())
    }

    /// 依實體 × 期間的完整笛卡兒積填滿面板
    pub fn filled<F>(entities: &EntitySet, period: Period, cell: F) -> Self
    where
        F: Fn(&[String], NaiveDate) -> Decimal,
    {
        let mut panel = Self::for_entities(entities);
        for tuple in entities.tuples() {
            for date in period.days() {
                let value = cell(&tuple, date);
                panel.cells.insert(
                    PanelKey {
                        entity: tuple.clone(),
                        date,
                    },
                    value,
                );
            }
        }
        panel
    }

    /// 層級名稱
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// 寫入儲存格（實體元組長度必須符合層級數）
    pub fn insert(&mut self, entity: Vec<String>, date: NaiveDate, value: Decimal) -> Result<()> {
        if entity.len() != self.levels.len() {
            return Err(PanelError::MalformedRequest(format!(
                "實體元組長度 {} 與層級數 {} 不符",
                entity.len(),
                self.levels.len()
            )));
        }
        self.cells.insert(PanelKey { entity, date }, value);
        Ok(())
    }

    /// 讀取儲存格
    pub fn get(&self, entity: &[String], date: NaiveDate) -> Option<Decimal> {
        let key = PanelKey {
            entity: entity.to_vec(),
            date,
        };
        self.cells.get(&key).copied()
    }

    /// 儲存格數量
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// 是否沒有任何儲存格
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 以「既有儲存格優先」的方式合併另一個面板
    ///
    /// 對應 pandas combine_first 的語義：已存在的儲存格不被覆蓋，
    /// 只填補缺漏的儲存格。兩個面板的層級必須一致。
    pub fn merge_keep_existing(&mut self, other: Panel) -> Result<()> {
        if self.levels != other.levels {
            return Err(PanelError::MalformedRequest(format!(
                "面板層級不一致: {:?} vs {:?}",
                self.levels, other.levels
            )));
        }
        for (key, value) in other.cells {
            self.cells.entry(key).or_insert(value);
        }
        Ok(())
    }

    /// 取子集（依實體集合與期間過濾；None 表示該維度不過濾）
    pub fn subset(&self, entities: Option<&EntitySet>, period: Option<Period>) -> Panel {
        let wanted: Option<HashSet<Vec<String>>> =
            entities.map(|e| e.tuples().into_iter().collect());

        let cells = self
            .cells
            .iter()
            .filter(|(key, _)| {
                if let Some(period) = period {
                    if !period.contains(key.date) {
                        return false;
                    }
                }
                if let Some(wanted) = &wanted {
                    if !wanted.contains(&key.entity) {
                        return false;
                    }
                }
                true
            })
            .map(|(key, value)| (key.clone(), *value))
            .collect();

        Panel {
            levels: self.levels.clone(),
            cells,
        }
    }

    /// 涵蓋的日期（排序去重）
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.cells.keys().map(|k| k.date).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// 迭代儲存格
    pub fn iter(&self) -> impl Iterator<Item = (&PanelKey, &Decimal)> {
        self.cells.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sectors(values: &[&str]) -> EntitySet {
        EntitySet::new().with_level("sector", values.iter().copied())
    }

    #[test]
    fn test_insert_and_get() {
        let mut panel = Panel::new(vec!["sector".to_string()]);
        panel
            .insert(vec!["A".to_string()], date(2020, 1, 1), Decimal::from(42))
            .unwrap();

        assert_eq!(
            panel.get(&["A".to_string()], date(2020, 1, 1)),
            Some(Decimal::from(42))
        );
        assert_eq!(panel.get(&["B".to_string()], date(2020, 1, 1)), None);
    }

    #[test]
    fn test_insert_arity_check() {
        let mut panel = Panel::new(vec!["sector".to_string(), "region".to_string()]);
        let result = panel.insert(vec!["A".to_string()], date(2020, 1, 1), Decimal::ONE);
        assert!(result.is_err());
    }

    #[test]
    fn test_filled_covers_cross_product() {
        let entities = sectors(&["A", "B"]);
        let period = Period::new(date(2020, 1, 1), date(2020, 1, 3)).unwrap();

        let panel = Panel::filled(&entities, period, |_, _| Decimal::ONE);
        assert_eq!(panel.len(), 6); // 2 實體 × 3 天
    }

    #[test]
    fn test_merge_keep_existing() {
        let entities = sectors(&["A"]);
        let period = Period::new(date(2020, 1, 1), date(2020, 1, 2)).unwrap();

        let mut base = Panel::filled(&entities, period, |_, _| Decimal::from(1));
        let overlap_period = Period::new(date(2020, 1, 2), date(2020, 1, 3)).unwrap();
        let incoming = Panel::filled(&entities, overlap_period, |_, _| Decimal::from(9));

        base.merge_keep_existing(incoming).unwrap();

        // 既有儲存格優先：1/2 仍是舊值，1/3 為新值
        assert_eq!(panel_value(&base, "A", date(2020, 1, 2)), Decimal::from(1));
        assert_eq!(panel_value(&base, "A", date(2020, 1, 3)), Decimal::from(9));
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn test_merge_level_mismatch() {
        let mut base = Panel::new(vec!["sector".to_string()]);
        let other = Panel::new(vec!["country".to_string()]);
        assert!(base.merge_keep_existing(other).is_err());
    }

    #[test]
    fn test_subset() {
        let entities = sectors(&["A", "B"]);
        let period = Period::new(date(2020, 1, 1), date(2020, 1, 10)).unwrap();
        let panel = Panel::filled(&entities, period, |_, _| Decimal::ONE);

        let sub_period = Period::new(date(2020, 1, 3), date(2020, 1, 5)).unwrap();
        let sub = panel.subset(Some(&sectors(&["A"])), Some(sub_period));

        assert_eq!(sub.len(), 3);
        assert!(sub.get(&["A".to_string()], date(2020, 1, 3)).is_some());
        assert!(sub.get(&["B".to_string()], date(2020, 1, 3)).is_none());
        assert!(sub.get(&["A".to_string()], date(2020, 1, 6)).is_none());
    }

    #[test]
    fn test_dates() {
        let entities = sectors(&["A"]);
        let period = Period::new(date(2020, 1, 1), date(2020, 1, 3)).unwrap();
        let panel = Panel::filled(&entities, period, |_, _| Decimal::ONE);

        assert_eq!(
            panel.dates(),
            vec![date(2020, 1, 1), date(2020, 1, 2), date(2020, 1, 3)]
        );
    }

    fn panel_value(panel: &Panel, entity: &str, date: NaiveDate) -> Decimal {
        panel.get(&[entity.to_string()], date).unwrap()
    }
}
