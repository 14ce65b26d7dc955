//! 本地题目文件加载器
//!
//! 离线排练模式：从 TOML 文件加载一套按分类组织的题目，
//! 结构与后端分类接口保持一致

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::question::{CategoryPayload, RawQuestion};

/// 一套本地题目
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionFixture {
    pub title: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub categories: Vec<FixtureCategory>,
}

/// 本地题目中的一个分类
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureCategory {
    /// 后端分类键（如 readAloudQuestions）
    pub key: String,
    #[serde(default)]
    pub questions: Vec<RawQuestion>,
}

impl QuestionFixture {
    /// 转换为序列器的输入（分类顺序保持文件内顺序）
    pub fn into_payloads(self) -> Vec<CategoryPayload> {
        self.categories
            .into_iter()
            .map(|c| CategoryPayload {
                category: c.key,
                success: true,
                data: c.questions,
            })
            .collect()
    }
}

/// 从 TOML 文件加载一套题目
pub async fn load_fixture(path: &Path) -> Result<QuestionFixture> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", path.display()))?;

    let fixture: QuestionFixture = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", path.display()))?;

    Ok(fixture)
}

/// 从文件夹中加载所有 TOML 题目文件
pub async fn load_all_fixtures(folder_path: &str) -> Result<Vec<QuestionFixture>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut fixtures = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_fixture(&path).await {
                Ok(fixture) => {
                    let question_count: usize =
                        fixture.categories.iter().map(|c| c.questions.len()).sum();
                    tracing::info!("成功加载 {} 个题目", question_count);
                    fixtures.push(fixture);
                }
                Err(e) => {
                    tracing::warn!("加载文件失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(fixtures)
}
