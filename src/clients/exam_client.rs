//! 考试 API 客户端
//!
//! 封装所有与考试后端相关的调用逻辑：
//! 按分类拉取题目、提交答案换取成绩
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, SubmissionError};
use crate::models::{AnswerRecord, CategoryPayload, RawQuestion, SubmissionPayload, TestResult};

/// 评分后端（提交答案换取成绩的能力契约）
///
/// 拆成 trait 是为了让编排层不关心成绩从哪里来
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn submit(
        &self,
        session_id: &str,
        answers: &[AnswerRecord],
    ) -> Result<TestResult, SubmissionError>;
}

/// 分类接口的响应包装
#[derive(Debug, Deserialize)]
struct CategoryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Vec<RawQuestion>,
}

/// 提交接口的响应包装
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    success: bool,
    data: Option<TestResult>,
    #[serde(default)]
    message: Option<String>,
}

/// 考试 API 客户端
pub struct ExamClient {
    http: Client,
    base_url: String,
}

impl ExamClient {
    /// 创建新的考试客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Other(format!("HTTP客户端初始化失败: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.exam_api_base_url.clone(),
        })
    }

    /// 拉取单个分类的题目
    ///
    /// 任何失败（网络、状态码、解析）都折叠成不可用的分类结果，
    /// 由序列器按 0 道题处理，绝不让单个分类拖垮整场考试
    pub async fn fetch_category(&self, category_key: &str) -> CategoryPayload {
        let url = format!("{}/api/questions/{}", self.base_url, category_key);
        debug!("🔍 拉取分类: {}", url);

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("⚠️ 分类 {} 请求失败: {}", category_key, e);
                return CategoryPayload::unavailable(category_key);
            }
        };

        if !response.status().is_success() {
            warn!(
                "⚠️ 分类 {} 返回状态码 {}",
                category_key,
                response.status()
            );
            return CategoryPayload::unavailable(category_key);
        }

        match response.json::<CategoryResponse>().await {
            Ok(body) if body.success => CategoryPayload {
                category: category_key.to_string(),
                success: true,
                data: body.data,
            },
            Ok(_) => {
                warn!("⚠️ 分类 {} 返回 success=false", category_key);
                CategoryPayload::unavailable(category_key)
            }
            Err(e) => {
                warn!("⚠️ 分类 {} 响应解析失败: {}", category_key, e);
                CategoryPayload::unavailable(category_key)
            }
        }
    }

    /// 并发拉取全部分类
    ///
    /// 返回顺序与传入的分类键顺序一致（这个顺序就是考试顺序）
    pub async fn fetch_all_categories(&self, category_keys: &[&str]) -> Vec<CategoryPayload> {
        info!("📥 并发拉取 {} 个分类...", category_keys.len());

        let fetches = category_keys.iter().map(|key| self.fetch_category(key));
        let payloads = join_all(fetches).await;

        let available = payloads.iter().filter(|p| p.success).count();
        info!("✓ 分类拉取完成: {}/{} 可用", available, category_keys.len());
        payloads
    }
}

#[async_trait]
impl ScoringBackend for ExamClient {
    /// 提交整场答案并等待评分
    ///
    /// 失败直接上抛，由调用方决定是否手动重试；这里绝不自动重试
    async fn submit(
        &self,
        session_id: &str,
        answers: &[AnswerRecord],
    ) -> Result<TestResult, SubmissionError> {
        let endpoint = format!("{}/api/calculate-result", self.base_url);
        let payload = SubmissionPayload {
            session_id,
            answers,
        };

        info!("📤 提交答案: {} 条记录 → {}", answers.len(), endpoint);

        let response = self
            .http
            .post(&endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SubmissionError::RequestFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubmissionError::BadResponse {
                endpoint,
                status: Some(status.as_u16()),
                message: None,
            });
        }

        let body: SubmitResponse =
            response
                .json()
                .await
                .map_err(|e| SubmissionError::JsonParseFailed {
                    source: Box::new(e),
                })?;

        match body {
            SubmitResponse {
                success: true,
                data: Some(result),
                ..
            } => {
                info!("✅ 评分完成: {}", result);
                Ok(result)
            }
            SubmitResponse { message, .. } => Err(SubmissionError::BadResponse {
                endpoint,
                status: Some(status.as_u16()),
                message,
            }),
        }
    }
}
