//! 题目序列器 - 服务层
//!
//! 把各分类的拉取结果压平成一条固定的考试序列：
//! 分类顺序在前，分类内顺序在后，构造完成后不再变更
//!
//! 职责：
//! - 分类键 → 题型 的解析（未知分类跳过，不算错误）
//! - 原始记录 → Question 的转换（含时间计划与空位推导）
//! - 失败的分类贡献 0 道题目

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::SequenceError;
use crate::models::{CategoryPayload, Question, RawQuestion, Stimulus, TaskType, TimingPlan};

/// 填空题原文中的空位标记（连续两个以上下划线）
fn blank_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_{2,}").unwrap())
}

/// 把分类拉取结果压平成考试序列
///
/// 传入的分类顺序就是考试顺序；整场一道题都没有时返回 `Empty`
pub fn build_sequence(payloads: Vec<CategoryPayload>) -> Result<Vec<Question>, SequenceError> {
    let mut questions = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for payload in payloads {
        let Some(task_type) = TaskType::from_category_key(&payload.category) else {
            warn!("⚠️ 未知分类键，已跳过: {}", payload.category);
            continue;
        };

        if !payload.success {
            warn!("⚠️ 分类 {} 拉取失败，按 0 道题处理", payload.category);
            continue;
        }

        let mut count = 0usize;
        for raw in payload.data {
            if !seen_ids.insert(raw.id.clone()) {
                warn!("⚠️ 重复题目 id，已跳过: {}", raw.id);
                continue;
            }
            questions.push(convert(raw, task_type, count));
            count += 1;
        }
        info!("✓ 分类 {} 贡献 {} 道题目", payload.category, count);
    }

    if questions.is_empty() {
        return Err(SequenceError::Empty);
    }

    info!("📋 考试序列构建完成，共 {} 道题目", questions.len());
    Ok(questions)
}

/// 原始记录 → 题目
///
/// 作答窗口优先取后端的 answerTime 覆盖值，否则用题型默认值
fn convert(raw: RawQuestion, task_type: TaskType, index_in_category: usize) -> Question {
    let profile = task_type.profile();

    let timing = TimingPlan {
        prep_secs: profile.prep_secs,
        response_secs: raw.answer_time.unwrap_or(profile.response_secs),
    };

    let blank_count = raw
        .transcript
        .as_deref()
        .map(|t| blank_marker().find_iter(t).count())
        .unwrap_or(0);

    let title = raw
        .title
        .unwrap_or_else(|| format!("{} #{}", task_type.name(), index_in_category + 1));

    Question {
        id: raw.id,
        task_type,
        title,
        stimulus: Stimulus {
            text: raw.text.or(raw.paragraph).or(raw.question),
            image_url: raw.image_url,
            audio_url: raw.audio_url,
            transcript: raw.transcript,
            options: raw.options,
            paragraphs: raw.paragraphs,
            blank_count,
        },
        timing,
    }
}
