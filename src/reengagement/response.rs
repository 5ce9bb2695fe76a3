//! 调用响应 - HTTP 和 CLI 共用的 JSON 结构

use serde::Serialize;

use super::pipeline::{BatchResult, NotificationOutcome};
use crate::error::GlobalError;

/// 统计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    pub total: usize,
    pub successful: usize,
    pub errors: usize,
}

/// 调用响应
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvocationResponse {
    /// 处理了至少一个候选用户
    Processed {
        success: bool,
        message: String,
        stats: BatchStats,
        results: Vec<NotificationOutcome>,
        #[serde(rename = "dryRun", skip_serializing_if = "std::ops::Not::not")]
        dry_run: bool,
    },
    /// 没有候选用户
    Empty {
        success: bool,
        message: String,
        #[serde(rename = "usersProcessed")]
        users_processed: usize,
    },
    /// 全局失败
    Failed { success: bool, error: String },
}

impl InvocationResponse {
    pub fn from_batch(batch: BatchResult) -> Self {
        if batch.total_candidates == 0 {
            return Self::Empty {
                success: true,
                message: "No inactive users found".to_string(),
                users_processed: 0,
            };
        }

        Self::Processed {
            success: true,
            message: format!("Processed {} inactive users", batch.total_candidates),
            stats: BatchStats {
                total: batch.total_candidates,
                successful: batch.success_count,
                errors: batch.error_count,
            },
            results: batch.outcomes,
            dry_run: batch.dry_run,
        }
    }

    pub fn from_error(err: &GlobalError) -> Self {
        Self::Failed {
            success: false,
            error: err.to_string(),
        }
    }

    pub fn from_result(result: Result<BatchResult, GlobalError>) -> Self {
        match result {
            Ok(batch) => Self::from_batch(batch),
            Err(e) => Self::from_error(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// HTTP 状态码
    pub fn status_code(&self) -> u16 {
        if self.is_success() {
            200
        } else {
            500
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use serde_json::json;

    #[test]
    fn test_empty_batch() {
        let response = InvocationResponse::from_batch(BatchResult::default());
        assert_eq!(response.status_code(), 200);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"success": true, "message": "No inactive users found", "usersProcessed": 0})
        );
    }

    #[test]
    fn test_processed_batch() {
        let batch = BatchResult {
            total_candidates: 2,
            success_count: 1,
            error_count: 1,
            outcomes: vec![
                NotificationOutcome::succeeded("a"),
                NotificationOutcome::failed("b", "No chats found"),
            ],
            dry_run: false,
        };
        let response = InvocationResponse::from_batch(batch);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "success": true,
                "message": "Processed 2 inactive users",
                "stats": {"total": 2, "successful": 1, "errors": 1},
                "results": [
                    {"userId": "a", "success": true},
                    {"userId": "b", "success": false, "error": "No chats found"}
                ]
            })
        );
    }

    #[test]
    fn test_dry_run_flag() {
        let batch = BatchResult {
            total_candidates: 1,
            success_count: 1,
            outcomes: vec![NotificationOutcome::succeeded("a")],
            dry_run: true,
            ..Default::default()
        };
        let json = serde_json::to_value(InvocationResponse::from_batch(batch)).unwrap();
        assert_eq!(json["dryRun"], json!(true));
    }

    #[test]
    fn test_global_failure() {
        let response = InvocationResponse::from_error(&ConfigError::OneSignalMissing.into());
        assert_eq!(response.status_code(), 500);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], json!(false));
        assert!(json["error"].as_str().unwrap().starts_with("Missing OneSignal configuration"));
    }
}
