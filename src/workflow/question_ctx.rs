//! 题目作答上下文与会话可观测状态
//!
//! 封装"我正在作答第几题"这一信息，以及外部观察者可见的
//! 阶段快照和外部输入命令的定义

use std::fmt::Display;

use crate::models::Answer;

/// 单题作答上下文
#[derive(Debug, Clone)]
pub struct QuestionCtx {
    /// 会话ID
    pub session_id: String,

    /// 题目在序列中的索引（从1开始，仅用于日志显示）
    pub question_index: usize,

    /// 序列总题数
    pub total_questions: usize,
}

impl QuestionCtx {
    pub fn new(session_id: String, question_index: usize, total_questions: usize) -> Self {
        Self {
            session_id,
            question_index,
            total_questions,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话#{} 题目 {}/{}]",
            self.session_id, self.question_index, self.total_questions
        )
    }
}

/// 题目作答阶段
///
/// 单题内的推进只能单向：Preparing → PlayingStimulus → CapturingResponse → Finished
/// （没有对应阶段的题型直接跳到下一个）；Idle / Completed 是会话级的两端状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 会话尚未开始
    Idle,
    /// 准备阶段（倒计时）
    Preparing,
    /// 播放原声（播放完成事件驱动，不走计时器）
    PlayingStimulus,
    /// 作答窗口（倒计时）
    CapturingResponse,
    /// 本题结束
    Finished,
    /// 全部题目作答完毕，等待成绩
    AwaitingResult,
    /// 整场考试结束
    Completed,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Preparing => "PREPARING",
            Phase::PlayingStimulus => "PLAYING_STIMULUS",
            Phase::CapturingResponse => "CAPTURING_RESPONSE",
            Phase::Finished => "FINISHED",
            Phase::AwaitingResult => "AWAITING_RESULT",
            Phase::Completed => "COMPLETED",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 会话状态快照（通过 watch 广播给外部观察者）
///
/// 剩余秒数只用于展示，阶段推进从不依赖它
#[derive(Debug, Clone)]
pub struct SessionView {
    pub question_index: usize,
    pub total_questions: usize,
    pub question_id: String,
    pub phase: Phase,
    pub remaining_secs: u32,
}

impl SessionView {
    /// 会话启动前的初始快照
    pub fn idle(total_questions: usize) -> Self {
        Self {
            question_index: 0,
            total_questions,
            question_id: String::new(),
            phase: Phase::Idle,
            remaining_secs: 0,
        }
    }
}

/// 外部输入命令（考生操作）
///
/// 不合法的命令（错误的阶段、不支持的题型）被忽略而不是报错，
/// 考试节奏由时钟主导，外部输入只能在允许的点位干预
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// 跳过准备阶段（仅允许的题型）
    SkipPrep,
    /// 提前结束作答（仅口语题）
    StopResponse,
    /// 更新作答草稿（非录音题）
    UpdateDraft(Answer),
    /// 确认当前草稿并进入下一题（非录音题）
    CommitResponse,
    /// 中止整场考试
    AbortSession,
}
