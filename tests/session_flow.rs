//! 整场考试会话的端到端测试
//!
//! 全部在暂停时钟上运行（tokio start_paused），真实时长的考试
//! 在测试里瞬间完成，时间断言仍然精确到秒

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::watch;
use tokio::time::Instant;

use mock_test_engine::clients::ScoringBackend;
use mock_test_engine::error::SubmissionError;
use mock_test_engine::infrastructure::{SimulatedMicMode, SimulatedMicrophone, SimulatedSpeaker};
use mock_test_engine::models::{
    Answer, AnswerRecord, CategoryPayload, Question, RawQuestion, SectionScores, TestResult,
};
use mock_test_engine::workflow::{Phase, SessionCommand, SessionView};
use mock_test_engine::{build_sequence, Config, ExamSession, SessionOutcome};

/// 记录提交次数和最后一次载荷的假评分后端
struct FakeBackend {
    calls: AtomicUsize,
    fail_first: bool,
    last_answers: Mutex<Vec<AnswerRecord>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first: false,
            last_answers: Mutex::new(Vec::new()),
        }
    }

    fn failing_first() -> Self {
        Self {
            fail_first: true,
            ..Self::new()
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answers(&self) -> Vec<AnswerRecord> {
        self.last_answers.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoringBackend for FakeBackend {
    async fn submit(
        &self,
        _session_id: &str,
        answers: &[AnswerRecord],
    ) -> Result<TestResult, SubmissionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_answers.lock().unwrap() = answers.to_vec();

        if self.fail_first && call == 0 {
            return Err(SubmissionError::BadResponse {
                endpoint: "fake".to_string(),
                status: Some(500),
                message: Some("评分服务暂时不可用".to_string()),
            });
        }

        Ok(TestResult {
            overall_score: 65,
            section_scores: SectionScores::default(),
            detailed_analysis: Vec::new(),
            created_at: Utc::now(),
        })
    }
}

fn raw(fields: serde_json::Value) -> RawQuestion {
    serde_json::from_value(fields).unwrap()
}

fn category(key: &str, questions: Vec<RawQuestion>) -> CategoryPayload {
    CategoryPayload {
        category: key.to_string(),
        success: true,
        data: questions,
    }
}

fn read_aloud(id: &str) -> CategoryPayload {
    category(
        "readAloudQuestions",
        vec![raw(json!({ "_id": id, "text": "Yellow is the most optimistic color." }))],
    )
}

fn repeat_sentence(id: &str, audio_url: &str) -> CategoryPayload {
    category(
        "repeatSentenceQuestions",
        vec![raw(json!({ "_id": id, "audioUrl": audio_url }))],
    )
}

struct Harness {
    mic: Arc<SimulatedMicrophone>,
    backend: Arc<FakeBackend>,
    commands: tokio::sync::mpsc::Sender<SessionCommand>,
    view: watch::Receiver<SessionView>,
    task: tokio::task::JoinHandle<(ExamSession, SessionOutcome)>,
}

fn spawn_session(
    payloads: Vec<CategoryPayload>,
    speaker: SimulatedSpeaker,
    backend: FakeBackend,
) -> Harness {
    let config = Config::default();
    let questions: Vec<Question> = build_sequence(payloads).unwrap();
    let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::Normal));
    let backend = Arc::new(backend);

    let (mut session, handles) = ExamSession::new(
        &config,
        "it-session",
        questions,
        mic.clone(),
        Arc::new(speaker),
        backend.clone(),
    );

    let task = tokio::spawn(async move {
        let outcome = session.run().await.unwrap();
        (session, outcome)
    });

    Harness {
        mic,
        backend,
        commands: handles.commands,
        view: handles.view,
        task,
    }
}

async fn wait_for_phase(view: &mut watch::Receiver<SessionView>, phase: Phase) {
    loop {
        if view.borrow().phase == phase {
            return;
        }
        view.changed().await.expect("会话在到达目标阶段前结束了");
    }
}

// ========== 属性：每道题恰好一条答案记录，提交恰好一次 ==========

#[tokio::test(start_paused = true)]
async fn every_question_yields_exactly_one_record_and_one_submission() {
    let payloads = vec![
        read_aloud("ra1"),
        category(
            "writeEssay",
            vec![raw(json!({ "_id": "we1", "paragraph": "Discuss the role of technology." }))],
        ),
    ];
    let harness = spawn_session(
        payloads,
        SimulatedSpeaker::new(Duration::from_secs(2)),
        FakeBackend::new(),
    );

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    assert_eq!(harness.backend.call_count(), 1);
    let answers = harness.backend.answers();
    assert_eq!(answers.len(), 2);
    assert_eq!(answers[0].question_id, "ra1");
    assert!(matches!(answers[0].answer, Answer::Audio(_)));
    // 写作题没有任何草稿输入，按未作答哨兵记录
    assert_eq!(answers[1].question_id, "we1");
    assert_eq!(answers[1].answer, Answer::NoAnswer);
}

// ========== 属性：全程最多一个活跃录音句柄 ==========

#[tokio::test(start_paused = true)]
async fn capture_slot_never_exceeds_one_across_speaking_questions() {
    let payloads = vec![
        category(
            "readAloudQuestions",
            vec![
                raw(json!({ "_id": "ra1", "text": "First passage." })),
                raw(json!({ "_id": "ra2", "text": "Second passage." })),
            ],
        ),
        repeat_sentence("rs1", "rs1.mp3"),
    ];
    let harness = spawn_session(
        payloads,
        SimulatedSpeaker::new(Duration::from_secs(3)),
        FakeBackend::new(),
    );

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    assert_eq!(harness.mic.max_concurrent_streams(), 1);
    assert_eq!(harness.mic.open_stream_count(), 0);
}

// ========== 属性：阶段推进单向，不回退 ==========

#[tokio::test(start_paused = true)]
async fn phases_advance_monotonically_within_a_question() {
    fn rank(phase: Phase) -> u8 {
        match phase {
            Phase::Idle => 0,
            Phase::Preparing => 1,
            Phase::PlayingStimulus => 2,
            Phase::CapturingResponse => 3,
            Phase::Finished => 4,
            Phase::AwaitingResult => 5,
            Phase::Completed => 6,
        }
    }

    let harness = spawn_session(
        vec![repeat_sentence("rs1", "rs1.mp3")],
        SimulatedSpeaker::new(Duration::from_secs(4)),
        FakeBackend::new(),
    );

    let mut view = harness.view.clone();
    let mut ranks = vec![rank(view.borrow().phase)];
    while view.changed().await.is_ok() {
        let phase = view.borrow().phase;
        ranks.push(rank(phase));
        if phase == Phase::Completed {
            break;
        }
    }

    let mut sorted = ranks.clone();
    sorted.sort_unstable();
    assert_eq!(ranks, sorted, "阶段顺序出现了回退: {:?}", ranks);

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));
}

// ========== 时间线：朗读题 40 秒准备 + 40 秒作答，无原声阶段 ==========

#[tokio::test(start_paused = true)]
async fn read_aloud_timeline_finishes_at_eighty_seconds() {
    let started = Instant::now();
    let harness = spawn_session(
        vec![read_aloud("ra1")],
        SimulatedSpeaker::new(Duration::from_secs(2)),
        FakeBackend::new(),
    );

    let mut view = harness.view.clone();
    wait_for_phase(&mut view, Phase::CapturingResponse).await;
    let at_capture = started.elapsed();

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    // 准备直接进入作答（没有原声阶段），t=40 开始作答，t=80 结束
    assert!(at_capture >= Duration::from_secs(40) && at_capture < Duration::from_secs(41));
    let total = started.elapsed();
    assert!(total >= Duration::from_secs(80) && total < Duration::from_secs(81));
}

// ========== 时间线：跟读题作答由播放完成事件驱动，不走计时器 ==========

#[tokio::test(start_paused = true)]
async fn repeat_sentence_capture_starts_when_playback_completes() {
    let started = Instant::now();
    let speaker = SimulatedSpeaker::new(Duration::from_secs(2))
        .with_clip("rs1.mp3", Duration::from_secs(6));
    let harness = spawn_session(
        vec![repeat_sentence("rs1", "rs1.mp3")],
        speaker,
        FakeBackend::new(),
    );

    let mut view = harness.view.clone();
    wait_for_phase(&mut view, Phase::PlayingStimulus).await;
    let at_playback = started.elapsed();

    wait_for_phase(&mut view, Phase::CapturingResponse).await;
    let at_capture = started.elapsed();

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    // 准备 3 秒，原声 6 秒：t=3 开始播放，t=9 进入作答
    assert!(at_playback >= Duration::from_secs(3) && at_playback < Duration::from_secs(4));
    assert!(at_capture >= Duration::from_secs(9) && at_capture < Duration::from_secs(10));
}

// ========== 属性：口语题可提前停止，窗口提前结束 ==========

#[tokio::test(start_paused = true)]
async fn stop_response_ends_speaking_window_early() {
    let started = Instant::now();
    let harness = spawn_session(
        vec![read_aloud("ra1")],
        SimulatedSpeaker::new(Duration::from_secs(2)),
        FakeBackend::new(),
    );

    let mut view = harness.view.clone();
    wait_for_phase(&mut view, Phase::CapturingResponse).await;
    harness
        .commands
        .send(SessionCommand::StopResponse)
        .await
        .unwrap();

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    // 准备 40 秒走满，40 秒的作答窗口被提前掐断
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(40));
    assert!(elapsed < Duration::from_secs(50), "实际耗时 {:?}", elapsed);
}

// ========== 属性：不允许的题型忽略跳过准备命令 ==========

#[tokio::test(start_paused = true)]
async fn skip_prep_is_ignored_for_listening_questions() {
    let started = Instant::now();
    let harness = spawn_session(
        vec![category(
            "multipleChoiceSingle",
            vec![raw(json!({
                "_id": "mcs1",
                "audioUrl": "mcs1.mp3",
                "options": ["A", "B", "C"]
            }))],
        )],
        SimulatedSpeaker::new(Duration::from_secs(6)),
        FakeBackend::new(),
    );

    // 命令在准备阶段就位，但听力题不允许跳过准备
    harness
        .commands
        .send(SessionCommand::SkipPrep)
        .await
        .unwrap();

    let mut view = harness.view.clone();
    wait_for_phase(&mut view, Phase::CapturingResponse).await;
    harness
        .commands
        .send(SessionCommand::UpdateDraft(Answer::Choice("B".to_string())))
        .await
        .unwrap();
    harness
        .commands
        .send(SessionCommand::CommitResponse)
        .await
        .unwrap();

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    // 3 秒准备 + 6 秒原声必须走满
    assert!(started.elapsed() >= Duration::from_secs(9));

    let answers = harness.backend.answers();
    assert_eq!(answers[0].answer, Answer::Choice("B".to_string()));
}

// ========== 属性：草稿以最后一次更新为准 ==========

#[tokio::test(start_paused = true)]
async fn latest_draft_wins_on_commit() {
    let harness = spawn_session(
        vec![category(
            "writeEssay",
            vec![raw(json!({ "_id": "we1", "paragraph": "Topic." }))],
        )],
        SimulatedSpeaker::new(Duration::from_secs(1)),
        FakeBackend::new(),
    );

    let mut view = harness.view.clone();
    wait_for_phase(&mut view, Phase::CapturingResponse).await;
    for text in ["first draft", "second draft", "final essay"] {
        harness
            .commands
            .send(SessionCommand::UpdateDraft(Answer::Text(text.to_string())))
            .await
            .unwrap();
    }
    harness
        .commands
        .send(SessionCommand::CommitResponse)
        .await
        .unwrap();

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    let answers = harness.backend.answers();
    assert_eq!(answers[0].answer, Answer::Text("final essay".to_string()));
}

// ========== 属性：中止会话不提交，资源全部释放 ==========

#[tokio::test(start_paused = true)]
async fn abort_during_capture_skips_submission_and_frees_resources() {
    let harness = spawn_session(
        vec![read_aloud("ra1"), read_aloud("ra2")],
        SimulatedSpeaker::new(Duration::from_secs(2)),
        FakeBackend::new(),
    );

    let mut view = harness.view.clone();
    wait_for_phase(&mut view, Phase::CapturingResponse).await;
    harness
        .commands
        .send(SessionCommand::AbortSession)
        .await
        .unwrap();

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Aborted));

    assert_eq!(harness.backend.call_count(), 0);
    assert_eq!(harness.mic.open_stream_count(), 0);
}

// ========== 属性：会话任务被直接销毁也不留下活跃音轨 ==========

#[tokio::test(start_paused = true)]
async fn killed_session_task_frees_capture_stream() {
    let harness = spawn_session(
        vec![read_aloud("ra1")],
        SimulatedSpeaker::new(Duration::from_secs(2)),
        FakeBackend::new(),
    );

    let mut view = harness.view.clone();
    wait_for_phase(&mut view, Phase::CapturingResponse).await;
    assert_eq!(harness.mic.open_stream_count(), 1);

    // 不走 AbortSession 命令，直接销毁整个会话任务
    harness.task.abort();
    let _ = harness.task.await;

    assert_eq!(harness.mic.open_stream_count(), 0);
    assert_eq!(harness.backend.call_count(), 0);
}

// ========== 属性：原声播放失败视为立即完成，考试不被卡死 ==========

#[tokio::test(start_paused = true)]
async fn playback_failure_still_reaches_response_window() {
    let speaker = SimulatedSpeaker::new(Duration::from_secs(2)).with_failure("broken.mp3");
    let harness = spawn_session(
        vec![repeat_sentence("rs1", "broken.mp3")],
        speaker,
        FakeBackend::new(),
    );

    let (_, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    let answers = harness.backend.answers();
    match &answers[0].answer {
        Answer::Audio(audio) => {
            // 作答窗口完整走满 15 秒
            assert_eq!(audio.duration_secs, 15);
        }
        other => panic!("期望录音答案，实际是 {:?}", other),
    }
}

// ========== 属性：提交失败只留手动重试入口，成绩拿到后不再请求 ==========

#[tokio::test(start_paused = true)]
async fn failed_submission_supports_manual_retry_exactly_once() {
    let harness = spawn_session(
        vec![read_aloud("ra1")],
        SimulatedSpeaker::new(Duration::from_secs(1)),
        FakeBackend::failing_first(),
    );

    let (mut session, outcome) = harness.task.await.unwrap();
    assert!(matches!(outcome, SessionOutcome::SubmissionFailed(_)));
    assert_eq!(harness.backend.call_count(), 1);

    let result = session.retry_submission().await.unwrap();
    assert_eq!(result.overall_score, 65);
    assert_eq!(harness.backend.call_count(), 2);

    // 已有成绩，再次重试直接返回缓存值，不发请求
    let cached = session.retry_submission().await.unwrap();
    assert_eq!(cached.overall_score, 65);
    assert_eq!(harness.backend.call_count(), 2);
}

// ========== 属性：录音设备被拒绝时考试继续，按未作答记录 ==========

#[tokio::test(start_paused = true)]
async fn denied_microphone_records_no_answer_and_continues() {
    let config = Config::default();
    let questions = build_sequence(vec![read_aloud("ra1")]).unwrap();
    let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::DenyPermission));
    let backend = Arc::new(FakeBackend::new());

    let (mut session, _handles) = ExamSession::new(
        &config,
        "it-session",
        questions,
        mic,
        Arc::new(SimulatedSpeaker::new(Duration::from_secs(1))),
        backend.clone(),
    );

    let outcome = session.run().await.unwrap();
    assert!(matches!(outcome, SessionOutcome::Completed(_)));

    let answers = backend.answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].answer, Answer::NoAnswer);
}
