//! 题目数据模型
//!
//! Question 在序列化阶段构造一次，之后不再变更

use serde::{Deserialize, Serialize};

use crate::models::task_type::TaskType;

/// 后端返回的原始题目记录
///
/// 各字段是否出现取决于题型，序列器按题型挑选需要的字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    /// 朗读/阅读原文
    #[serde(default)]
    pub text: Option<String>,

    /// 写作题的阅读材料
    #[serde(default)]
    pub paragraph: Option<String>,

    /// 听力题干
    #[serde(default)]
    pub question: Option<String>,

    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,

    #[serde(rename = "audioUrl", default)]
    pub audio_url: Option<String>,

    /// 听力原文（填空题中以 __ 标记空位）
    #[serde(default)]
    pub transcript: Option<String>,

    #[serde(default)]
    pub options: Vec<String>,

    /// 排序题的段落列表
    #[serde(default)]
    pub paragraphs: Vec<String>,

    /// 后端对作答窗口的覆盖值（秒）
    #[serde(rename = "answerTime", default)]
    pub answer_time: Option<u32>,

    #[serde(default)]
    pub difficulty: Option<String>,
}

/// 单个分类的拉取结果
///
/// 拉取失败或 success=false 的分类贡献 0 道题目，不算硬错误
#[derive(Debug, Clone)]
pub struct CategoryPayload {
    /// 后端分类键（如 readAloudQuestions）
    pub category: String,
    pub success: bool,
    pub data: Vec<RawQuestion>,
}

impl CategoryPayload {
    /// 创建一个失败/空的分类结果
    pub fn unavailable(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            success: false,
            data: Vec::new(),
        }
    }
}

/// 题目刺激材料
///
/// 文本、图片、音频各字段是否出现由题型决定
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Stimulus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// 填空题原文（含 __ 空位标记）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// 排序题的段落列表
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<String>,
    /// 填空题的空位数量（由序列器从原文推导）
    #[serde(default)]
    pub blank_count: usize,
}

/// 本题的时间计划
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TimingPlan {
    /// 准备时长（秒）；None 表示没有独立准备阶段
    pub prep_secs: Option<u32>,
    /// 作答窗口（秒）
    pub response_secs: u32,
}

/// 题目（不可变记录）
///
/// 由序列器构造一次，id 在一场考试内唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub task_type: TaskType,
    pub title: String,
    pub stimulus: Stimulus,
    pub timing: TimingPlan,
}

impl Question {
    /// 题干预览（用于日志，最多 60 个字符）
    pub fn stem_preview(&self) -> String {
        let stem = self
            .stimulus
            .text
            .as_deref()
            .or(self.stimulus.question_text())
            .unwrap_or(&self.title);
        if stem.chars().count() > 60 {
            stem.chars().take(60).collect::<String>() + "..."
        } else {
            stem.to_string()
        }
    }
}

impl Stimulus {
    fn question_text(&self) -> Option<&str> {
        self.transcript.as_deref()
    }
}

impl std::fmt::Display for Question {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[题目 {} · {}]", self.id, self.task_type)
    }
}
