//! 发送状态回写

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::store::ReEngagementStore;

/// 记录通知已发送
pub struct StateUpdater<'a> {
    store: &'a dyn ReEngagementStore,
}

impl<'a> StateUpdater<'a> {
    pub fn new(store: &'a dyn ReEngagementStore) -> Self {
        Self { store }
    }

    /// 回写失败只记日志，返回是否写入成功
    ///
    /// 通知已经发出，丢失时间戳最多导致下次多发一条。
    pub async fn record_sent(&self, user_id: &str, at: DateTime<Utc>) -> bool {
        match self.store.update_last_re_engagement_sent(user_id, at).await {
            Ok(()) => {
                debug!(user_id = %user_id, sent_at = %at, "Recorded last_re_engagement_sent");
                true
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Error updating last_re_engagement_sent");
                false
            }
        }
    }
}
