//! 题型定义
//!
//! 题型是一个封闭枚举：状态机通过查表（而不是继承体系）获得
//! 每种题型的准备/作答时长、是否有听力原声播放阶段、作答方式等行为差异

use serde::{Deserialize, Serialize};

/// 考试分部
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    /// 口语
    Speaking,
    /// 写作
    Writing,
    /// 阅读
    Reading,
    /// 听力
    Listening,
}

impl Section {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Section::Speaking => "Speaking",
            Section::Writing => "Writing",
            Section::Reading => "Reading",
            Section::Listening => "Listening",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 题型枚举（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    // ---- 口语 ----
    ReadAloud,
    RepeatSentence,
    DescribeImage,
    ReTellLecture,
    AnswerShortQuestion,
    // ---- 写作 ----
    SummarizeWrittenText,
    WriteEssay,
    // ---- 阅读 ----
    ReadingReorder,
    // ---- 听力 ----
    SummarizeSpokenText,
    MultipleChoiceSingle,
    MultipleChoiceMultiple,
    FillInBlanksListening,
    HighlightCorrectSummary,
    SelectMissingWord,
    HighlightIncorrectWords,
    WriteFromDictation,
}

/// 作答方式
///
/// 决定 CAPTURING_RESPONSE 阶段的行为：
/// 录音题占用麦克风并计时，其余题型持续接收草稿值直到提交或超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// 录音作答（口语题）
    AudioCapture,
    /// 自由文本
    FreeText,
    /// 单选
    SingleChoice,
    /// 多选
    MultiChoice,
    /// 填空（按空位序号）
    Blanks,
    /// 点选单词（听力 HIW）
    WordSelection,
    /// 段落排序
    Ordering,
}

/// 题型行为配置
///
/// 全部是策略常量，不做计算
#[derive(Debug, Clone, Copy)]
pub struct TaskProfile {
    /// 准备时长（秒）；None 表示该题型没有独立准备阶段
    pub prep_secs: Option<u32>,
    /// 作答窗口（秒）
    pub response_secs: u32,
    /// 是否有"播放原声"阶段（播放完成事件驱动，不走计时器）
    pub has_stimulus_playback: bool,
    /// 作答方式
    pub response_mode: ResponseMode,
    /// 是否允许作答中途主动停止（仅口语题）
    pub allows_early_stop: bool,
    /// 是否允许跳过准备阶段（视为立即到期）
    pub allows_skip_prep: bool,
}

/// 后端分类键 → 题型 的静态映射
///
/// 键名与后端返回的分类字段保持一致
pub static CATEGORY_TASK_TYPES: phf::Map<&'static str, TaskType> = phf::phf_map! {
    "readAloudQuestions" => TaskType::ReadAloud,
    "repeatSentenceQuestions" => TaskType::RepeatSentence,
    "describeImageQuestions" => TaskType::DescribeImage,
    "reTellLectureQuestions" => TaskType::ReTellLecture,
    "answerShortQuestions" => TaskType::AnswerShortQuestion,
    "summarizeWrittenText" => TaskType::SummarizeWrittenText,
    "writeEssay" => TaskType::WriteEssay,
    "readingReorder" => TaskType::ReadingReorder,
    "summarizeSpokenTextQuestions" => TaskType::SummarizeSpokenText,
    "multipleChoiceSingle" => TaskType::MultipleChoiceSingle,
    "multipleChoiceMultiple" => TaskType::MultipleChoiceMultiple,
    "fillInTheBlanks" => TaskType::FillInBlanksListening,
    "highlightCorrectSummary" => TaskType::HighlightCorrectSummary,
    "selectMissingWord" => TaskType::SelectMissingWord,
    "highLightIncorrectWords" => TaskType::HighlightIncorrectWords,
    "writeFromDictation" => TaskType::WriteFromDictation,
};

/// 整场考试的标准分类顺序（口语 → 写作 → 阅读 → 听力）
///
/// phf 映射本身无序，按后端拉取时用这份顺序
pub const CATEGORY_ORDER: &[&str] = &[
    "readAloudQuestions",
    "repeatSentenceQuestions",
    "describeImageQuestions",
    "reTellLectureQuestions",
    "answerShortQuestions",
    "summarizeWrittenText",
    "writeEssay",
    "readingReorder",
    "summarizeSpokenTextQuestions",
    "multipleChoiceSingle",
    "multipleChoiceMultiple",
    "fillInTheBlanks",
    "highlightCorrectSummary",
    "selectMissingWord",
    "highLightIncorrectWords",
    "writeFromDictation",
];

impl TaskType {
    /// 获取题型行为配置（查表，策略常量）
    pub fn profile(self) -> TaskProfile {
        use ResponseMode::*;
        match self {
            TaskType::ReadAloud => TaskProfile {
                prep_secs: Some(40),
                response_secs: 40,
                has_stimulus_playback: false,
                response_mode: AudioCapture,
                allows_early_stop: true,
                allows_skip_prep: true,
            },
            TaskType::RepeatSentence => TaskProfile {
                prep_secs: Some(3),
                response_secs: 15,
                has_stimulus_playback: true,
                response_mode: AudioCapture,
                allows_early_stop: true,
                allows_skip_prep: true,
            },
            TaskType::DescribeImage => TaskProfile {
                prep_secs: Some(25),
                response_secs: 40,
                has_stimulus_playback: false,
                response_mode: AudioCapture,
                allows_early_stop: true,
                allows_skip_prep: true,
            },
            TaskType::ReTellLecture => TaskProfile {
                prep_secs: Some(10),
                response_secs: 40,
                has_stimulus_playback: true,
                response_mode: AudioCapture,
                allows_early_stop: true,
                allows_skip_prep: true,
            },
            TaskType::AnswerShortQuestion => TaskProfile {
                prep_secs: Some(3),
                response_secs: 10,
                has_stimulus_playback: true,
                response_mode: AudioCapture,
                allows_early_stop: true,
                allows_skip_prep: true,
            },
            TaskType::SummarizeWrittenText => TaskProfile {
                prep_secs: None,
                response_secs: 600,
                has_stimulus_playback: false,
                response_mode: FreeText,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::WriteEssay => TaskProfile {
                prep_secs: None,
                response_secs: 600,
                has_stimulus_playback: false,
                response_mode: FreeText,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::ReadingReorder => TaskProfile {
                prep_secs: None,
                response_secs: 150,
                has_stimulus_playback: false,
                response_mode: Ordering,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::SummarizeSpokenText => TaskProfile {
                prep_secs: Some(5),
                response_secs: 600,
                has_stimulus_playback: true,
                response_mode: FreeText,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::MultipleChoiceSingle => TaskProfile {
                prep_secs: Some(3),
                response_secs: 90,
                has_stimulus_playback: true,
                response_mode: SingleChoice,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::MultipleChoiceMultiple => TaskProfile {
                prep_secs: Some(3),
                response_secs: 90,
                has_stimulus_playback: true,
                response_mode: MultiChoice,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::FillInBlanksListening => TaskProfile {
                prep_secs: Some(3),
                response_secs: 120,
                has_stimulus_playback: true,
                response_mode: Blanks,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::HighlightCorrectSummary => TaskProfile {
                prep_secs: Some(3),
                response_secs: 90,
                has_stimulus_playback: true,
                response_mode: SingleChoice,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::SelectMissingWord => TaskProfile {
                prep_secs: Some(3),
                response_secs: 60,
                has_stimulus_playback: true,
                response_mode: SingleChoice,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::HighlightIncorrectWords => TaskProfile {
                prep_secs: Some(3),
                response_secs: 120,
                has_stimulus_playback: true,
                response_mode: WordSelection,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
            TaskType::WriteFromDictation => TaskProfile {
                prep_secs: Some(3),
                response_secs: 60,
                has_stimulus_playback: true,
                response_mode: FreeText,
                allows_early_stop: false,
                allows_skip_prep: false,
            },
        }
    }

    /// 获取所属分部
    pub fn section(self) -> Section {
        match self {
            TaskType::ReadAloud
            | TaskType::RepeatSentence
            | TaskType::DescribeImage
            | TaskType::ReTellLecture
            | TaskType::AnswerShortQuestion => Section::Speaking,
            TaskType::SummarizeWrittenText | TaskType::WriteEssay => Section::Writing,
            TaskType::ReadingReorder => Section::Reading,
            TaskType::SummarizeSpokenText
            | TaskType::MultipleChoiceSingle
            | TaskType::MultipleChoiceMultiple
            | TaskType::FillInBlanksListening
            | TaskType::HighlightCorrectSummary
            | TaskType::SelectMissingWord
            | TaskType::HighlightIncorrectWords
            | TaskType::WriteFromDictation => Section::Listening,
        }
    }

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            TaskType::ReadAloud => "READ_ALOUD",
            TaskType::RepeatSentence => "REPEAT_SENTENCE",
            TaskType::DescribeImage => "DESCRIBE_IMAGE",
            TaskType::ReTellLecture => "RE_TELL_LECTURE",
            TaskType::AnswerShortQuestion => "ANSWER_SHORT_QUESTION",
            TaskType::SummarizeWrittenText => "SUMMARIZE_WRITTEN_TEXT",
            TaskType::WriteEssay => "WRITE_ESSAY",
            TaskType::ReadingReorder => "READING_REORDER",
            TaskType::SummarizeSpokenText => "SUMMARIZE_SPOKEN_TEXT",
            TaskType::MultipleChoiceSingle => "MULTIPLE_CHOICE_SINGLE",
            TaskType::MultipleChoiceMultiple => "MULTIPLE_CHOICE_MULTIPLE",
            TaskType::FillInBlanksListening => "FILL_IN_BLANKS_LISTENING",
            TaskType::HighlightCorrectSummary => "HIGHLIGHT_CORRECT_SUMMARY",
            TaskType::SelectMissingWord => "SELECT_MISSING_WORD",
            TaskType::HighlightIncorrectWords => "HIGHLIGHT_INCORRECT_WORDS",
            TaskType::WriteFromDictation => "WRITE_FROM_DICTATION",
        }
    }

    /// 从后端分类键解析题型
    pub fn from_category_key(key: &str) -> Option<Self> {
        CATEGORY_TASK_TYPES.get(key).copied()
    }

    /// 是否为录音作答题型
    pub fn is_speaking(self) -> bool {
        matches!(self.profile().response_mode, ResponseMode::AudioCapture)
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
