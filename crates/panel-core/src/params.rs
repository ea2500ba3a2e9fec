//! 參數處理：遞迴合併與正規指紋

use serde::Serialize;
use serde_json::Value;

use crate::{PanelError, Result};

/// 遞迴合併參數（覆寫值優先）
///
/// 兩邊皆為物件時逐鍵遞迴合併；其他情況一律以覆寫值取代。
pub fn deep_update(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_update(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, _) => *slot = overrides.clone(),
    }
}

/// 計算參數的正規指紋
///
/// 指紋為鍵值排序後的 JSON 字串，與欄位宣告順序無關；
/// 相同語義的參數必得相同指紋。序列化失敗視為身份錯誤，
/// 應於建構期即回報，而非等到請求時。
pub fn fingerprint<T: Serialize>(params: &T) -> Result<String> {
    let value =
        serde_json::to_value(params).map_err(|e| PanelError::Identity(e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| PanelError::Identity(e.to_string()))
}
