//! 實體集合模型（多層級橫斷面鍵）

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{PanelError, Result};

/// 實體集合：層級名稱 → 有序且不重複的值序列
///
/// 完整的實體空間為所有層級值的笛卡兒積。
/// 使用 BTreeMap 讓層級順序具正規性（依名稱排序），
/// 同層級的兩個集合可直接逐層級做聯集與差集比較。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    levels: BTreeMap<String, Vec<String>>,
}

impl EntitySet {
    /// 創建空的實體集合
    pub fn new() -> Self {
        Self {
            levels: BTreeMap::new(),
        }
    }

    /// 建構器模式：加入一個層級
    pub fn with_level<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert_level(name, values);
        self
    }

    /// 加入或取代一個層級（值自動去重，保留首次出現順序）
    pub fn insert_level<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut distinct: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }
        self.levels.insert(name.into(), distinct);
    }

    /// 層級名稱（正規順序）
    pub fn level_names(&self) -> Vec<&str> {
        self.levels.keys().map(|k| k.as_str()).collect()
    }

    /// 取得某層級的值序列
    pub fn values(&self, level: &str) -> Option<&[String]> {
        self.levels.get(level).map(|v| v.as_slice())
    }

    /// 層級數
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// 是否沒有任何層級
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// 實體元組總數（笛卡兒積大小）
    pub fn num_tuples(&self) -> usize {
        if self.levels.is_empty() {
            return 0;
        }
        self.levels.values().map(|v| v.len()).product()
    }

    /// 檢查層級名稱是否與另一集合一致
    pub fn same_levels(&self, other: &EntitySet) -> bool {
        self.levels.len() == other.levels.len()
            && self.levels.keys().zip(other.levels.keys()).all(|(a, b)| a == b)
    }

    /// 笛卡兒積展開為實體元組（值依層級正規順序排列）
    pub fn tuples(&self) -> Vec<Vec<String>> {
        if self.levels.is_empty() {
            return Vec::new();
        }
        let mut acc: Vec<Vec<String>> = vec![Vec::new()];
        for values in self.levels.values() {
            let mut next = Vec::with_capacity(acc.len() * values.len());
            for prefix in &acc {
                for value in values {
                    let mut tuple = prefix.clone();
                    tuple.push(value.clone());
                    next.push(tuple);
                }
            }
            acc = next;
        }
        acc
    }

    /// 檢查實體元組是否屬於本集合的笛卡兒積
    ///
    /// 元組屬於笛卡兒積 ⇔ 長度符合層級數，且每個值都出現在
    /// 對應層級的值序列中；不需要實際展開笛卡兒積。
    pub fn contains_tuple(&self, tuple: &[String]) -> bool {
        if self.levels.is_empty() || tuple.len() != self.levels.len() {
            return false;
        }
        self.levels
            .values()
            .zip(tuple)
            .all(|(values, value)| values.contains(value))
    }

    /// 逐層級聯集：保留自身的值順序，再附加對方的新值
    ///
    /// 兩個集合的層級名稱必須一致，否則視為請求格式錯誤。
    pub fn union(&self, other: &EntitySet) -> Result<EntitySet> {
        if !self.same_levels(other) {
            return Err(PanelError::MalformedRequest(format!(
                "層級不一致: {:?} vs {:?}",
                self.level_names(),
                other.level_names()
            )));
        }

        let mut result = EntitySet::new();
        for (name, values) in &self.levels {
            let mut merged = values.clone();
            for value in &other.levels[name] {
                if !merged.contains(value) {
                    merged.push(value.clone());
                }
            }
            result.levels.insert(name.clone(), merged);
        }
        Ok(result)
    }

    /// 迭代各層級
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.levels.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
