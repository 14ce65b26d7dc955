//! 答案模型与答案累加器
//!
//! 答案按题目 id 记录；题目一旦推进过去便不可重答（没有回退导航）

use std::collections::BTreeMap;

use base64::Engine as _;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// 录音结果
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAudio {
    /// 音频数据（编码由录音设备决定）
    pub data: Vec<u8>,
    /// 录音时长（秒）
    pub duration_secs: u32,
    pub mime_type: String,
}

/// 单题答案
///
/// 形态由题型决定；`NoAnswer` 是显式的"未作答"哨兵值，
/// 保证每个到达 FINISHED 的题目都有且只有一条记录
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// 录音作答
    Audio(RecordedAudio),
    /// 自由文本
    Text(String),
    /// 单选
    Choice(String),
    /// 多选 / 点选单词
    Selection(Vec<String>),
    /// 填空（空位序号 → 填入内容）
    Blanks(BTreeMap<usize, String>),
    /// 段落排序（原始段落下标的新顺序）
    Ordering(Vec<usize>),
    /// 未作答
    NoAnswer,
}

impl Answer {
    /// 是否为未作答哨兵
    pub fn is_empty(&self) -> bool {
        matches!(self, Answer::NoAnswer)
    }

    /// 答案种类（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            Answer::Audio(_) => "audio",
            Answer::Text(_) => "text",
            Answer::Choice(_) => "choice",
            Answer::Selection(_) => "selection",
            Answer::Blanks(_) => "blanks",
            Answer::Ordering(_) => "ordering",
            Answer::NoAnswer => "no_answer",
        }
    }
}

// 提交载荷里音频走 base64，其余形态原样进 JSON
impl Serialize for Answer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Answer::Audio(audio) => {
                let mut s = serializer.serialize_struct("Answer", 4)?;
                s.serialize_field("kind", "audio")?;
                s.serialize_field(
                    "audioBase64",
                    &base64::engine::general_purpose::STANDARD.encode(&audio.data),
                )?;
                s.serialize_field("durationSecs", &audio.duration_secs)?;
                s.serialize_field("mimeType", &audio.mime_type)?;
                s.end()
            }
            Answer::Text(text) => {
                let mut s = serializer.serialize_struct("Answer", 2)?;
                s.serialize_field("kind", "text")?;
                s.serialize_field("text", text)?;
                s.end()
            }
            Answer::Choice(choice) => {
                let mut s = serializer.serialize_struct("Answer", 2)?;
                s.serialize_field("kind", "choice")?;
                s.serialize_field("choice", choice)?;
                s.end()
            }
            Answer::Selection(items) => {
                let mut s = serializer.serialize_struct("Answer", 2)?;
                s.serialize_field("kind", "selection")?;
                s.serialize_field("selection", items)?;
                s.end()
            }
            Answer::Blanks(blanks) => {
                let mut s = serializer.serialize_struct("Answer", 2)?;
                s.serialize_field("kind", "blanks")?;
                s.serialize_field("blanks", blanks)?;
                s.end()
            }
            Answer::Ordering(order) => {
                let mut s = serializer.serialize_struct("Answer", 2)?;
                s.serialize_field("kind", "ordering")?;
                s.serialize_field("ordering", order)?;
                s.end()
            }
            Answer::NoAnswer => {
                let mut s = serializer.serialize_struct("Answer", 1)?;
                s.serialize_field("kind", "no_answer")?;
                s.end()
            }
        }
    }
}

/// 一条已记录的答案
#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    #[serde(rename = "questionId")]
    pub question_id: String,
    pub answer: Answer,
}

/// 答案累加器
///
/// 按题目 id 记录答案，`all()` 按序列顺序（即插入顺序）返回
#[derive(Debug, Default)]
pub struct AnswerSet {
    records: Vec<AnswerRecord>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录答案（同一题目重复记录时覆盖旧值）
    pub fn record(&mut self, question_id: impl Into<String>, answer: Answer) {
        let question_id = question_id.into();
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.question_id == question_id)
        {
            existing.answer = answer;
        } else {
            self.records.push(AnswerRecord {
                question_id,
                answer,
            });
        }
    }

    /// 是否已有该题目的记录
    pub fn contains(&self, question_id: &str) -> bool {
        self.records.iter().any(|r| r.question_id == question_id)
    }

    /// 按序列顺序返回全部记录
    pub fn all(&self) -> &[AnswerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
