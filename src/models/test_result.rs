//! 成绩数据模型
//!
//! 结果由后端评分服务计算，引擎收到后视为不透明数据，只负责展示

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::answer::AnswerRecord;

/// 提交载荷：一场考试只提交一次
#[derive(Debug, Serialize)]
pub struct SubmissionPayload<'a> {
    #[serde(rename = "sessionId")]
    pub session_id: &'a str,
    pub answers: &'a [AnswerRecord],
}

/// 分技能得分
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SectionScores {
    #[serde(default)]
    pub fluency: u32,
    #[serde(default)]
    pub pronunciation: u32,
    #[serde(default)]
    pub content: u32,
    #[serde(default)]
    pub grammar: u32,
}

/// 单题评分明细
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnalysis {
    #[serde(rename = "questionId", default)]
    pub question_id: String,
    #[serde(rename = "type", default)]
    pub task_type: String,
    pub score: u32,
    #[serde(rename = "userTranscript", default)]
    pub user_transcript: Option<String>,
}

/// 一场考试的成绩单
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    #[serde(rename = "overallScore")]
    pub overall_score: u32,
    #[serde(rename = "sectionScores", default)]
    pub section_scores: SectionScores,
    #[serde(rename = "detailedAnalysis", default)]
    pub detailed_analysis: Vec<QuestionAnalysis>,
    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for TestResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "总分 {}/90 (流利度 {} · 发音 {} · 内容 {})",
            self.overall_score,
            self.section_scores.fluency,
            self.section_scores.pronunciation,
            self.section_scores.content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_roundtrips_with_timestamp() {
        let json = serde_json::json!({
            "overallScore": 72,
            "sectionScores": { "fluency": 68, "pronunciation": 74 },
            "createdAt": "2026-08-23T10:00:00Z"
        });

        let result: TestResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.overall_score, 72);
        assert_eq!(result.created_at.to_rfc3339(), "2026-08-23T10:00:00+00:00");

        // 落盘展示时时间戳必须能序列化回去
        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["createdAt"], "2026-08-23T10:00:00Z");
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let json = serde_json::json!({ "overallScore": 50 });

        let result: TestResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.section_scores.fluency, 0);
        assert!(result.detailed_analysis.is_empty());
    }
}
