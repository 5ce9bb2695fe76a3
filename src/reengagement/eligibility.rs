//! 候选用户筛选

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::GlobalError;
use crate::models::UserProfile;
use crate::store::ReEngagementStore;

/// 一次调用的时间窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityWindow {
    pub now: DateTime<Utc>,
    pub inactivity: Duration,
    pub cooldown: Duration,
}

impl EligibilityWindow {
    pub fn new(now: DateTime<Utc>, inactivity: Duration, cooldown: Duration) -> Self {
        Self {
            now,
            inactivity,
            cooldown,
        }
    }

    /// 最近活跃早于此时间才算不活跃
    pub fn inactive_before(&self) -> DateTime<Utc> {
        self.now - self.inactivity
    }

    /// 上次通知早于此时间才可再次发送
    pub fn cooldown_before(&self) -> DateTime<Utc> {
        self.now - self.cooldown
    }

    /// 判断用户是否满足筛选条件
    ///
    /// 没有活跃记录的用户不入选（与 SQL 中 `NULL < x` 为假一致）。
    pub fn admits(&self, user: &UserProfile) -> bool {
        if !user.re_engagement_enabled {
            return false;
        }

        let inactive = matches!(user.last_app_activity, Some(at) if at < self.inactive_before());
        let cooled_down = match user.last_re_engagement_sent {
            None => true,
            Some(at) => at < self.cooldown_before(),
        };

        inactive && cooled_down
    }
}

/// 候选用户筛选器
pub struct EligibilitySelector<'a> {
    store: &'a dyn ReEngagementStore,
}

impl<'a> EligibilitySelector<'a> {
    pub fn new(store: &'a dyn ReEngagementStore) -> Self {
        Self { store }
    }

    /// 查询失败属于全局错误，整个调用中止
    pub async fn select(&self, window: &EligibilityWindow) -> Result<Vec<UserProfile>, GlobalError> {
        let users = self
            .store
            .select_eligible_users(window)
            .await
            .map_err(GlobalError::Eligibility)?;

        info!(
            count = users.len(),
            inactive_before = %window.inactive_before(),
            cooldown_before = %window.cooldown_before(),
            "Found inactive users"
        );
        Ok(users)
    }
}
