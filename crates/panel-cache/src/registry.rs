//! 鍵控單例註冊表（多例模式）
//!
//! 以正規化參數指紋為鍵的實例註冊表：相同參數保證對應同一個
//! 實例，不同參數彼此獨立。取代「每次呼叫動態建子類」的做法，
//! 改為單一鎖保護的指紋 → 實例映射。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use panel_core::{fingerprint, Result};

/// 以參數指紋為鍵的實例註冊表
///
/// 每個實例包在自己的 Mutex 中，跨執行緒取用時同一實例上的
/// 請求自然序列化（單寫者模型）；不同指紋的實例可完全並行。
pub struct SourceRegistry<T> {
    instances: Mutex<HashMap<String, Arc<Mutex<T>>>>,
}

impl<T> SourceRegistry<T> {
    /// 創建空的註冊表
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// 取得或創建參數對應的實例
    ///
    /// 註冊表鎖在建構期間持續持有，保證每個指紋至多建構一次；
    /// build 失敗時錯誤原樣傳回，不留下任何實例。
    /// 參數無法序列化（指紋算不出來）於此處即回報，
    /// 不會等到請求時才失敗。
    pub fn get_or_create<P, F>(&self, params: &P, build: F) -> Result<Arc<Mutex<T>>>
    where
        P: Serialize,
        F: FnOnce() -> Result<T>,
    {
        let key = fingerprint(params)?;
        let mut instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = instances.get(&key) {
            tracing::debug!("註冊表命中: {}", key);
            return Ok(Arc::clone(existing));
        }

        tracing::debug!("註冊表未命中，建構新實例: {}", key);
        let instance = Arc::new(Mutex::new(build()?));
        instances.insert(key, Arc::clone(&instance));
        Ok(instance)
    }

    /// 檢查參數對應的實例是否已註冊
    pub fn contains<P: Serialize>(&self, params: &P) -> Result<bool> {
        let key = fingerprint(params)?;
        let instances = self.instances.lock().unwrap_or_else(|e| e.into_inner());
        Ok(instances.contains_key(&key))
    }

    /// 已註冊的實例數
    pub fn len(&self) -> usize {
        self.instances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// 是否沒有任何實例
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空註冊表（既有的 Arc 參考不受影響）
    pub fn clear(&self) {
        self.instances
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

impl<T> Default for SourceRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
