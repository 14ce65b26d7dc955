//! # Mock Test Engine
//!
//! 一个用于限时多阶段模拟考试的会话引擎
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `CaptureManager` - 唯一的录音槽位 owner，提供 acquire/release 能力
//! - `StimulusPlayer` - 音频播放能力（播放完成事件驱动）
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不编排流程
//! - `PhaseTimer` - 单阶段倒计时（到期信号最多触发一次）
//! - `build_sequence` - 分类结果 → 固定考试序列
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整作答流程
//! - `QuestionCtx` - 上下文封装（session_id + question_index）
//! - `QuestionFlow` - 阶段推进（准备 → 原声 → 作答 → 结束）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session` - 会话控制器，遍历题目序列并提交成绩
//!
//! ## 模块结构

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ExamClient, ScoringBackend};
pub use config::{Config, QuestionSource};
pub use error::{AppError, AppResult};
pub use infrastructure::{CaptureManager, StimulusPlayer};
pub use models::{Answer, AnswerSet, Question, TaskType, TestResult};
pub use orchestrator::{ExamSession, SessionHandles, SessionOutcome};
pub use services::{build_sequence, PhaseTimer};
pub use workflow::{FlowOutcome, Phase, QuestionCtx, QuestionFlow, SessionCommand, SessionView};
