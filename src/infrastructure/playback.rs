//! 音频播放 - 基础设施层
//!
//! 职责：
//! - 播放题目的提示音频，并在自然播放结束时返回
//! - 不认识阶段状态机；"播放完毕后进入作答"由工作流层编排

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use crate::error::PlaybackError;

/// 音频播放器（外部协作方的接口契约）
///
/// `play` 在音频自然播放结束后才返回；播放被取消时调用方直接丢弃
/// 这个 future 即可，实现方不得在丢弃后继续占用输出设备
#[async_trait]
pub trait StimulusPlayer: Send + Sync {
    async fn play(&self, url: &str) -> Result<(), PlaybackError>;
}

/// 模拟播放器（排练模式与测试用）
///
/// 按登记的片段时长休眠，未登记的 URL 使用默认时长
pub struct SimulatedSpeaker {
    clips: HashMap<String, Duration>,
    default_clip: Duration,
    fail_urls: HashSet<String>,
}

impl SimulatedSpeaker {
    pub fn new(default_clip: Duration) -> Self {
        Self {
            clips: HashMap::new(),
            default_clip,
            fail_urls: HashSet::new(),
        }
    }

    /// 登记某个 URL 的片段时长
    pub fn with_clip(mut self, url: &str, duration: Duration) -> Self {
        self.clips.insert(url.to_string(), duration);
        self
    }

    /// 让某个 URL 播放失败（模拟加载错误）
    pub fn with_failure(mut self, url: &str) -> Self {
        self.fail_urls.insert(url.to_string());
        self
    }
}

#[async_trait]
impl StimulusPlayer for SimulatedSpeaker {
    async fn play(&self, url: &str) -> Result<(), PlaybackError> {
        if self.fail_urls.contains(url) {
            return Err(PlaybackError::PlayFailed {
                url: url.to_string(),
                detail: "模拟加载失败".to_string(),
            });
        }

        let duration = self.clips.get(url).copied().unwrap_or(self.default_clip);
        debug!("🔊 播放音频: {} ({:?})", url, duration);
        sleep(duration).await;
        Ok(())
    }
}
