//! 通知分发器 - 每个用户最多发送一次，不重试

use std::sync::Arc;

use tracing::info;

use crate::error::DispatchError;
use crate::push::{DispatchAck, PushNotification, PushSender};

/// 分发结果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// 平台已受理
    Sent(DispatchAck),
    /// dry-run 模式，未实际发送
    DryRun,
}

/// 通知分发器
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: Arc<dyn PushSender>,
    /// 是否为 dry-run 模式
    dry_run: bool,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn PushSender>) -> Self {
        Self {
            sender,
            dry_run: false,
        }
    }

    /// 设置 dry-run 模式
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn sender_name(&self) -> &str {
        self.sender.name()
    }

    pub async fn dispatch(
        &self,
        notification: &PushNotification,
    ) -> Result<DispatchOutcome, DispatchError> {
        if self.dry_run {
            info!(
                user_id = %notification.target_user_id,
                chat_id = %notification.data.chat_id,
                body = %notification.body,
                "[DRY-RUN] Would send re-engagement notification"
            );
            return Ok(DispatchOutcome::DryRun);
        }

        let ack = self.sender.send(notification).await?;
        info!(
            channel = self.sender.name(),
            user_id = %notification.target_user_id,
            chat_id = %notification.data.chat_id,
            notification_id = ack.id.as_deref().unwrap_or("-"),
            recipients = ack.recipients.unwrap_or(0),
            "Sent re-engagement notification"
        );
        Ok(DispatchOutcome::Sent(ack))
    }
}
