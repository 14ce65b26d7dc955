//! 单题作答流程 - 流程层
//!
//! 核心职责：定义"一道题"从准备到收卷的完整推进
//!
//! 流程顺序：
//! 1. PREPARING（有准备时长的题型）
//! 2. PLAYING_STIMULUS（有原声的题型，播放完成事件驱动）
//! 3. CAPTURING_RESPONSE（计时器与外部命令赛跑）
//! 4. FINISHED（收集答案，清理计时器与录音句柄）
//!
//! 任何退出路径（自然到期、提前停止、整场中止）都走同一个清理序列；
//! 清理是同步且幂等的

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{CaptureHandle, CaptureManager, StimulusPlayer};
use crate::models::{Answer, Question, ResponseMode};
use crate::services::PhaseTimer;
use crate::workflow::question_ctx::{Phase, QuestionCtx, SessionCommand, SessionView};

/// 单题流程的结果
#[derive(Debug)]
pub enum FlowOutcome {
    /// 本题结束，携带收集到的答案（可能是未作答哨兵）
    Answered(Answer),
    /// 整场考试被中止
    Aborted,
}

/// 作答窗口的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseExit {
    TimedOut,
    StoppedEarly,
    Committed,
}

/// 单题作答流程
///
/// - 编排单题的阶段推进
/// - 不持有任何资源（录音槽位以 `&mut` 借入）
/// - 不认识题目序列，一次只看一道题
pub struct QuestionFlow {
    verbose_logging: bool,
}

impl QuestionFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            verbose_logging: config.verbose_logging,
        }
    }

    pub async fn run(
        &self,
        question: &Question,
        ctx: &QuestionCtx,
        capture: &mut CaptureManager,
        player: &dyn StimulusPlayer,
        commands: &mut mpsc::Receiver<SessionCommand>,
        view: &watch::Sender<SessionView>,
    ) -> AppResult<FlowOutcome> {
        let profile = question.task_type.profile();

        info!(
            "{} ▶️ {} 开始作答: {}",
            ctx,
            question.task_type,
            question.stem_preview()
        );

        // ========== 阶段 1: PREPARING ==========
        if let Some(prep_secs) = question.timing.prep_secs {
            publish(view, ctx, question, Phase::Preparing, prep_secs);
            let mut timer = PhaseTimer::start(prep_secs);
            let mut ticks = timer.subscribe();

            loop {
                tokio::select! {
                    _ = timer.expired() => {
                        debug!("{} 准备时间到", ctx);
                        break;
                    }
                    changed = ticks.changed() => {
                        if changed.is_ok() {
                            publish(view, ctx, question, Phase::Preparing, *ticks.borrow());
                        }
                    }
                    cmd = commands.recv() => match cmd {
                        Some(SessionCommand::SkipPrep) if profile.allows_skip_prep => {
                            info!("{} ⏭️ 跳过准备阶段", ctx);
                            break;
                        }
                        Some(SessionCommand::AbortSession) | None => {
                            timer.cancel();
                            return Ok(FlowOutcome::Aborted);
                        }
                        Some(other) => {
                            debug!("{} 准备阶段忽略命令: {:?}", ctx, other);
                        }
                    }
                }
            }
            timer.cancel();
        }

        // ========== 阶段 2: PLAYING_STIMULUS ==========
        if profile.has_stimulus_playback {
            match &question.stimulus.audio_url {
                Some(url) => {
                    publish(view, ctx, question, Phase::PlayingStimulus, 0);
                    let play = player.play(url);
                    tokio::pin!(play);

                    loop {
                        tokio::select! {
                            result = &mut play => {
                                match result {
                                    Ok(()) => debug!("{} 🔊 原声播放完毕", ctx),
                                    // 播放失败不终止考试，直接进入作答
                                    Err(e) => warn!("{} ⚠️ 原声播放失败，直接进入作答: {}", ctx, e),
                                }
                                break;
                            }
                            cmd = commands.recv() => match cmd {
                                Some(SessionCommand::AbortSession) | None => {
                                    return Ok(FlowOutcome::Aborted);
                                }
                                Some(other) => {
                                    debug!("{} 播放阶段忽略命令: {:?}", ctx, other);
                                }
                            }
                        }
                    }
                }
                None => {
                    warn!("{} ⚠️ 题目缺少音频地址，跳过原声阶段", ctx);
                }
            }
        }

        // ========== 阶段 3: CAPTURING_RESPONSE ==========
        let response_secs = question.timing.response_secs;
        publish(view, ctx, question, Phase::CapturingResponse, response_secs);

        let mut timer = PhaseTimer::start(response_secs);
        let mut ticks = timer.subscribe();

        let mut handle: Option<CaptureHandle> = None;
        if profile.response_mode == ResponseMode::AudioCapture {
            match capture.acquire().await {
                Ok(h) => handle = Some(h),
                // 麦克风不可用对考试非致命，本题按未作答处理
                Err(e) => warn!("{} ⚠️ 录音不可用，本题按未作答处理: {}", ctx, e),
            }
        }

        let mut draft: Option<Answer> = None;
        let exit = loop {
            tokio::select! {
                _ = timer.expired() => break ResponseExit::TimedOut,
                changed = ticks.changed() => {
                    if changed.is_ok() {
                        publish(view, ctx, question, Phase::CapturingResponse, *ticks.borrow());
                    }
                }
                cmd = commands.recv() => match cmd {
                    Some(SessionCommand::StopResponse) if profile.allows_early_stop => {
                        break ResponseExit::StoppedEarly;
                    }
                    Some(SessionCommand::UpdateDraft(answer))
                        if profile.response_mode != ResponseMode::AudioCapture =>
                    {
                        if self.verbose_logging {
                            debug!("{} ✏️ 草稿更新: {}", ctx, answer.kind());
                        }
                        draft = Some(answer);
                    }
                    Some(SessionCommand::CommitResponse)
                        if profile.response_mode != ResponseMode::AudioCapture =>
                    {
                        break ResponseExit::Committed;
                    }
                    Some(SessionCommand::AbortSession) | None => {
                        timer.cancel();
                        capture.discard(handle.take());
                        return Ok(FlowOutcome::Aborted);
                    }
                    Some(other) => {
                        debug!("{} 作答阶段忽略命令: {:?}", ctx, other);
                    }
                }
            }
        };
        timer.cancel();

        // ========== 阶段 4: FINISHED ==========
        let answer = if profile.response_mode == ResponseMode::AudioCapture {
            match handle.take() {
                Some(h) => Answer::Audio(capture.release(h)),
                None => Answer::NoAnswer,
            }
        } else {
            draft.filter(|a| !a.is_empty()).unwrap_or(Answer::NoAnswer)
        };

        publish(view, ctx, question, Phase::Finished, 0);
        info!(
            "{} ✅ 本题结束 ({:?}，答案: {})",
            ctx,
            exit,
            answer.kind()
        );

        Ok(FlowOutcome::Answered(answer))
    }
}

/// 广播阶段快照（没有观察者时静默丢弃）
fn publish(
    view: &watch::Sender<SessionView>,
    ctx: &QuestionCtx,
    question: &Question,
    phase: Phase,
    remaining_secs: u32,
) {
    let _ = view.send(SessionView {
        question_index: ctx.question_index,
        total_questions: ctx.total_questions,
        question_id: question.id.clone(),
        phase,
        remaining_secs,
    });
}
