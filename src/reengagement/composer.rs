//! 通知文案 - 从固定模板中随机选一条

use std::sync::Arc;

use rand::Rng;

use crate::models::SelectedChat;
use crate::push::PushNotification;

/// 文案模板：聊天名 → 正文
pub type Template = fn(&str) -> String;

/// 模板列表（顺序固定）
pub const TEMPLATES: &[Template] = &[continue_conversation, waiting_for_you, misses_you, pick_up];

fn continue_conversation(name: &str) -> String {
    format!("Continue your conversation with {}", name)
}

fn waiting_for_you(name: &str) -> String {
    format!("{} is waiting for you!", name)
}

fn misses_you(name: &str) -> String {
    format!("It's been a while! {} misses you", name)
}

fn pick_up(name: &str) -> String {
    format!("Pick up where you left off with {}", name)
}

/// 模板选择器
pub trait TemplatePicker: Send + Sync {
    /// 返回 `[0, len)` 内的下标，`len` 总是大于 0
    fn pick(&self, len: usize) -> usize;
}

/// 均匀随机选择
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl TemplatePicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// 固定下标，测试用
#[derive(Debug, Default)]
pub struct FixedPicker(pub usize);

impl TemplatePicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}

/// 渲染全部模板（预览用）
pub fn render_all(chat_name: &str) -> Vec<String> {
    TEMPLATES.iter().map(|t| t(chat_name)).collect()
}

/// 通知组装器
#[derive(Clone)]
pub struct MessageComposer {
    heading: String,
    picker: Arc<dyn TemplatePicker>,
}

impl MessageComposer {
    pub fn new(heading: impl Into<String>, picker: Arc<dyn TemplatePicker>) -> Self {
        Self {
            heading: heading.into(),
            picker,
        }
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    /// 只渲染正文
    pub fn render(&self, chat_name: &str) -> String {
        let index = self.picker.pick(TEMPLATES.len()).min(TEMPLATES.len() - 1);
        TEMPLATES[index](chat_name)
    }

    /// 组装完整通知
    pub fn compose(&self, user_id: &str, chat: &SelectedChat) -> PushNotification {
        PushNotification::re_engagement(
            user_id,
            self.heading.clone(),
            self.render(&chat.name),
            chat.id.clone(),
            chat.name.clone(),
        )
    }
}
