//! 考试会话控制器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责推进一整场考试，是会话级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **遍历题目**：顺序循环处理 `Vec<Question>`，没有回退导航
//! 2. **流程调度**：创建并复用 `QuestionFlow`
//! 3. **答案累加**：每道到达结束的题目恰好记录一条答案
//! 4. **成绩提交**：最后一题结束后提交一次，失败只留手动重试入口
//! 5. **统计输出**：记录已作答/未作答数量

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::clients::ScoringBackend;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{CaptureManager, RecordingDevice, StimulusPlayer};
use crate::models::{AnswerSet, Question, TestResult};
use crate::workflow::{FlowOutcome, Phase, QuestionCtx, QuestionFlow, SessionCommand, SessionView};

/// 会话结束方式
#[derive(Debug)]
pub enum SessionOutcome {
    /// 全部题目作答完毕且成绩已拿到
    Completed(TestResult),
    /// 全部题目作答完毕但提交失败，答案已保留，可调用 retry_submission
    SubmissionFailed(AppError),
    /// 考试被中止，不提交
    Aborted,
}

/// 会话外部句柄
///
/// 命令入口和状态出口，交给外部观察者（UI、测试）
pub struct SessionHandles {
    pub commands: mpsc::Sender<SessionCommand>,
    pub view: watch::Receiver<SessionView>,
}

/// 作答统计
#[derive(Debug, Default)]
pub struct SessionStats {
    pub answered: usize,
    pub unanswered: usize,
}

/// 考试会话控制器
///
/// 持有录音槽位和答案累加器；同一时刻只有一道题在作答
pub struct ExamSession {
    session_id: String,
    questions: Vec<Question>,
    answers: AnswerSet,
    capture: CaptureManager,
    player: Arc<dyn StimulusPlayer>,
    backend: Arc<dyn ScoringBackend>,
    flow: QuestionFlow,
    commands: mpsc::Receiver<SessionCommand>,
    view_tx: watch::Sender<SessionView>,
    result: Option<TestResult>,
    all_answered: bool,
}

impl ExamSession {
    /// 创建新的考试会话
    ///
    /// 题目序列必须来自序列器（非空、顺序已固定）
    pub fn new(
        config: &Config,
        session_id: impl Into<String>,
        questions: Vec<Question>,
        device: Arc<dyn RecordingDevice>,
        player: Arc<dyn StimulusPlayer>,
        backend: Arc<dyn ScoringBackend>,
    ) -> (Self, SessionHandles) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(SessionView::idle(questions.len()));

        let session = Self {
            session_id: session_id.into(),
            questions,
            answers: AnswerSet::new(),
            capture: CaptureManager::new(device),
            player,
            backend,
            flow: QuestionFlow::new(config),
            commands: cmd_rx,
            view_tx,
            result: None,
            all_answered: false,
        };

        let handles = SessionHandles {
            commands: cmd_tx,
            view: view_rx,
        };

        (session, handles)
    }

    /// 推进整场考试直到结束
    pub async fn run(&mut self) -> AppResult<SessionOutcome> {
        let total = self.questions.len();
        log_session_start(&self.session_id, total);

        for index in 0..total {
            let question = self.questions[index].clone();
            let ctx = QuestionCtx::new(self.session_id.clone(), index + 1, total);
            log_question_start(&ctx);

            let player = Arc::clone(&self.player);
            let outcome = self
                .flow
                .run(
                    &question,
                    &ctx,
                    &mut self.capture,
                    player.as_ref(),
                    &mut self.commands,
                    &self.view_tx,
                )
                .await?;

            match outcome {
                FlowOutcome::Answered(answer) => {
                    self.answers.record(&question.id, answer);
                }
                FlowOutcome::Aborted => {
                    warn!("[会话#{}] 🛑 考试被中止，不提交", self.session_id);
                    self.publish_session_phase(Phase::Completed);
                    return Ok(SessionOutcome::Aborted);
                }
            }
        }
        self.all_answered = true;

        log_session_answered(&self.session_id, &self.stats(), total);

        // ========== 提交成绩（一场只提交一次） ==========
        self.publish_session_phase(Phase::AwaitingResult);
        match self.submit_once().await {
            Ok(result) => Ok(SessionOutcome::Completed(result)),
            Err(e) => {
                error!("[会话#{}] ❌ 成绩提交失败: {}", self.session_id, e);
                Ok(SessionOutcome::SubmissionFailed(e))
            }
        }
    }

    /// 手动重试提交
    ///
    /// 只允许在全部题目作答完毕后调用；已有成绩时直接返回缓存值
    pub async fn retry_submission(&mut self) -> AppResult<TestResult> {
        if !self.all_answered {
            return Err(AppError::Other(
                "考试尚未结束，不能提交成绩".to_string(),
            ));
        }
        self.submit_once().await
    }

    /// 已拿到的成绩（如果有）
    pub fn result(&self) -> Option<&TestResult> {
        self.result.as_ref()
    }

    /// 当前作答统计
    pub fn stats(&self) -> SessionStats {
        let mut stats = SessionStats::default();
        for record in self.answers.all() {
            if record.answer.is_empty() {
                stats.unanswered += 1;
            } else {
                stats.answered += 1;
            }
        }
        stats
    }

    async fn submit_once(&mut self) -> AppResult<TestResult> {
        // 重复提交会导致成绩重复计入，已有成绩时绝不再发请求
        if let Some(result) = &self.result {
            return Ok(result.clone());
        }

        let result = self
            .backend
            .submit(&self.session_id, self.answers.all())
            .await?;

        info!("[会话#{}] 📊 成绩: {}", self.session_id, result);
        self.result = Some(result.clone());
        self.publish_session_phase(Phase::Completed);
        Ok(result)
    }

    fn publish_session_phase(&self, phase: Phase) {
        let total = self.questions.len();
        let _ = self.view_tx.send(SessionView {
            question_index: total,
            total_questions: total,
            question_id: String::new(),
            phase,
            remaining_secs: 0,
        });
    }
}

// ========== 日志辅助函数 ==========

fn log_session_start(session_id: &str, total: usize) {
    info!("[会话#{}] 开始考试", session_id);
    info!("[会话#{}] 题目总数: {}", session_id, total);
}

fn log_question_start(ctx: &QuestionCtx) {
    info!("\n{} {}", ctx, "─".repeat(30));
}

fn log_session_answered(session_id: &str, stats: &SessionStats, total: usize) {
    info!(
        "[会话#{}] 作答统计: 已作答 {}, 未作答 {}, 总计 {}",
        session_id, stats.answered, stats.unanswered, total
    );
    info!("\n[会话#{}] ✅ 全部题目作答完毕\n", session_id);
}
