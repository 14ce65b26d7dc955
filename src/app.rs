//! 应用入口逻辑
//!
//! 两种题目来源：本地 TOML 题目文件（离线排练）或按分类从
//! 考试后端拉取（联机排练）。两条路径共用同一套会话流程：
//! 模拟麦克风和模拟播放器跑完整场考试，最后向评分后端提交一次

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::clients::ExamClient;
use crate::config::{Config, QuestionSource};
use crate::infrastructure::{SimulatedMicMode, SimulatedMicrophone, SimulatedSpeaker};
use crate::models::{load_all_fixtures, CategoryPayload, Question, CATEGORY_ORDER};
use crate::orchestrator::{ExamSession, SessionOutcome};
use crate::services::build_sequence;
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        log_startup(&config);
        Ok(Self { config })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        match self.config.question_source {
            QuestionSource::Fixtures => self.run_from_fixtures().await,
            QuestionSource::Http => self.run_from_backend().await,
        }
    }

    /// 离线模式：每个题目文件跑一场
    async fn run_from_fixtures(&self) -> Result<()> {
        info!("\n📁 正在扫描本地题目文件...");
        let fixtures = load_all_fixtures(&self.config.fixture_folder).await?;

        if fixtures.is_empty() {
            warn!("⚠️ 没有找到题目文件，程序结束");
            return Ok(());
        }

        let total = fixtures.len();
        info!("✓ 找到 {} 套题目\n", total);

        let mut completed = 0usize;
        for (index, fixture) in fixtures.into_iter().enumerate() {
            log_rehearsal_start(index + 1, total, &fixture.title);

            let session_id = fixture
                .session_id
                .clone()
                .unwrap_or_else(|| format!("rehearsal-{}", chrono::Utc::now().timestamp()));

            match self
                .run_one_session(index + 1, session_id, fixture.into_payloads())
                .await
            {
                Ok(true) => completed += 1,
                Ok(false) => {}
                Err(e) => error!("[排练 {}] ❌ 会话失败: {}", index + 1, e),
            }
        }

        print_final_stats(completed, total, &self.config.output_log_file);
        Ok(())
    }

    /// 联机模式：按标准分类顺序从后端拉题，跑一场
    async fn run_from_backend(&self) -> Result<()> {
        info!("\n📥 正在从后端拉取题目: {}", self.config.exam_api_base_url);
        let client = ExamClient::new(&self.config)?;
        let payloads = client.fetch_all_categories(CATEGORY_ORDER).await;

        if payloads.iter().all(|p| p.data.is_empty()) {
            warn!("⚠️ 后端没有返回任何题目，程序结束");
            return Ok(());
        }

        log_rehearsal_start(1, 1, "后端题库");
        let session_id = format!("exam-{}", chrono::Utc::now().timestamp());

        let completed = match self.run_one_session(1, session_id, payloads).await {
            Ok(got_result) => usize::from(got_result),
            Err(e) => {
                error!("[排练 1] ❌ 会话失败: {}", e);
                0
            }
        };

        print_final_stats(completed, 1, &self.config.output_log_file);
        Ok(())
    }

    /// 跑完一场考试，返回是否拿到成绩
    async fn run_one_session(
        &self,
        rehearsal_index: usize,
        session_id: String,
        payloads: Vec<CategoryPayload>,
    ) -> Result<bool> {
        let questions = build_sequence(payloads)?;
        let questions = scale_timings(questions, self.config.rehearsal_time_scale);

        let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::Normal));
        let speaker = Arc::new(SimulatedSpeaker::new(Duration::from_secs(
            (5 / self.config.rehearsal_time_scale.max(1) as u64).max(1),
        )));
        let backend = Arc::new(ExamClient::new(&self.config)?);

        let (mut session, _handles) = ExamSession::new(
            &self.config,
            session_id,
            questions,
            mic,
            speaker,
            backend,
        );

        match session.run().await? {
            SessionOutcome::Completed(result) => {
                info!("[排练 {}] 🎉 {}", rehearsal_index, result);
                Ok(true)
            }
            SessionOutcome::SubmissionFailed(e) => {
                warn!(
                    "[排练 {}] ⚠️ 作答完毕但评分不可用: {}",
                    rehearsal_index, e
                );
                Ok(false)
            }
            SessionOutcome::Aborted => {
                warn!("[排练 {}] 🛑 会话被中止", rehearsal_index);
                Ok(false)
            }
        }
    }
}

/// 按倍率压缩题目时长（排练模式专用，至少保留 1 秒）
fn scale_timings(questions: Vec<Question>, scale: u32) -> Vec<Question> {
    if scale <= 1 {
        return questions;
    }
    questions
        .into_iter()
        .map(|mut q| {
            q.timing.prep_secs = q.timing.prep_secs.map(|s| (s / scale).max(1));
            q.timing.response_secs = (q.timing.response_secs / scale).max(1);
            q
        })
        .collect()
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 排练模式");
    info!(
        "📋 题目来源: {}",
        match config.question_source {
            QuestionSource::Fixtures => "本地题目文件",
            QuestionSource::Http => "考试后端",
        }
    );
    info!("📊 时间压缩倍率: {}x", config.rehearsal_time_scale);
    info!("{}", "=".repeat(60));
}

fn log_rehearsal_start(index: usize, total: usize, title: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始第 {}/{} 套题目: {}", index, total, title);
    info!("{}", "=".repeat(60));
}

fn print_final_stats(completed: usize, total: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部排练完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 拿到成绩: {}/{}", completed, total);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}
