//! 录音资源管理 - 基础设施层
//!
//! 持有唯一的麦克风输入流槽位，只暴露 acquire / release 能力
//!
//! 职责：
//! - 维护"全局最多一个活跃录音句柄"这一核心不变量
//! - 不认识 Question / 阶段状态机
//! - 不处理业务流程

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::error::CaptureError;
use crate::models::RecordedAudio;

/// 录音设备（外部协作方的接口契约）
///
/// 平台实现负责真正的"获取输入流"；引擎只依赖这一契约
#[async_trait]
pub trait RecordingDevice: Send + Sync {
    /// 请求独占的输入流
    async fn open_stream(&self) -> Result<Box<dyn InputStream>, CaptureError>;
}

/// 活跃的输入流
///
/// 契约："停止所有音轨并交出已捕获的音频"；stop 必须是同步的，
/// 这样清理路径（包括外部中止）不需要等待任何挂起点
pub trait InputStream: Send {
    fn stop(self: Box<Self>) -> RecordedAudio;
}

/// 活跃的录音句柄
///
/// 同一时刻整场考试最多存在一个实例；句柄被直接丢弃时
/// （比如整个会话任务被 abort），Drop 负责停掉音轨
pub struct CaptureHandle {
    stream: Option<Box<dyn InputStream>>,
    started_at: Instant,
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.stop();
            debug!("🎙️ 录音句柄随任务销毁，音轨已停止");
        }
    }
}

/// 录音资源管理器（单槽位）
///
/// 由会话控制器持有，以 `&mut` 借给当前活跃的阶段状态机，
/// 使"最多一个活跃句柄"在构造上可检查
pub struct CaptureManager {
    device: Arc<dyn RecordingDevice>,
    live: bool,
}

impl CaptureManager {
    pub fn new(device: Arc<dyn RecordingDevice>) -> Self {
        Self {
            device,
            live: false,
        }
    }

    /// 获取独占的录音句柄并开始录音
    ///
    /// # 错误
    /// - `PermissionDenied` / `DeviceUnavailable`：平台拒绝，对考试非致命
    /// - `AlreadyLive`：已有活跃句柄，属于调用方的时序错误，防御性拒绝
    pub async fn acquire(&mut self) -> Result<CaptureHandle, CaptureError> {
        if self.live {
            return Err(CaptureError::AlreadyLive);
        }

        let stream = self.device.open_stream().await?;
        self.live = true;
        debug!("🎙️ 录音句柄已获取");

        Ok(CaptureHandle {
            stream: Some(stream),
            started_at: Instant::now(),
        })
    }

    /// 停止录音、释放句柄并取回录音结果
    pub fn release(&mut self, mut handle: CaptureHandle) -> RecordedAudio {
        let elapsed = handle.started_at.elapsed();
        let mut audio = match handle.stream.take() {
            Some(stream) => stream.stop(),
            // 流只会在 Drop 里被取走，正常释放路径到不了这里
            None => RecordedAudio {
                data: Vec::new(),
                duration_secs: 0,
                mime_type: "audio/wav".to_string(),
            },
        };
        audio.duration_secs = elapsed.as_secs() as u32;
        self.live = false;
        debug!("🎙️ 录音句柄已释放 (时长 {}s)", audio.duration_secs);
        audio
    }

    /// 丢弃句柄（不保留录音结果）；传入 None 时安全无操作
    ///
    /// 清理路径专用：重复调用不会二次释放
    pub fn discard(&mut self, handle: Option<CaptureHandle>) {
        if let Some(handle) = handle {
            let _ = self.release(handle);
        }
    }

    /// 当前是否有活跃句柄
    pub fn is_live(&self) -> bool {
        self.live
    }
}

// ========== 模拟设备（排练模式与测试用） ==========

/// 模拟麦克风的行为模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedMicMode {
    /// 正常录音
    Normal,
    /// 模拟权限被拒绝
    DenyPermission,
    /// 模拟没有可用设备
    NoDevice,
}

/// 模拟麦克风
///
/// 同时统计并发流数量，供"最多一个活跃句柄"的属性测试使用
pub struct SimulatedMicrophone {
    mode: SimulatedMicMode,
    open_streams: Arc<AtomicUsize>,
    max_concurrent: Arc<AtomicUsize>,
}

impl SimulatedMicrophone {
    pub fn new(mode: SimulatedMicMode) -> Self {
        Self {
            mode,
            open_streams: Arc::new(AtomicUsize::new(0)),
            max_concurrent: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 历史上同时打开过的最大流数量
    pub fn max_concurrent_streams(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }

    /// 当前打开的流数量
    pub fn open_stream_count(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

struct SimulatedStream {
    open_streams: Arc<AtomicUsize>,
}

impl InputStream for SimulatedStream {
    fn stop(self: Box<Self>) -> RecordedAudio {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
        RecordedAudio {
            data: vec![0x52, 0x49, 0x46, 0x46], // 占位音频头
            duration_secs: 0,
            mime_type: "audio/wav".to_string(),
        }
    }
}

#[async_trait]
impl RecordingDevice for SimulatedMicrophone {
    async fn open_stream(&self) -> Result<Box<dyn InputStream>, CaptureError> {
        match self.mode {
            SimulatedMicMode::DenyPermission => Err(CaptureError::PermissionDenied),
            SimulatedMicMode::NoDevice => Err(CaptureError::DeviceUnavailable {
                detail: "未检测到输入设备".to_string(),
            }),
            SimulatedMicMode::Normal => {
                let now = self.open_streams.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_concurrent.fetch_max(now, Ordering::SeqCst);
                Ok(Box::new(SimulatedStream {
                    open_streams: self.open_streams.clone(),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_rejects_second_handle() {
        let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::Normal));
        let mut manager = CaptureManager::new(mic.clone());

        let handle = manager.acquire().await.unwrap();
        let second = manager.acquire().await;
        assert!(matches!(second, Err(CaptureError::AlreadyLive)));

        manager.discard(Some(handle));
        assert!(!manager.is_live());
        assert_eq!(mic.open_stream_count(), 0);
    }

    #[tokio::test]
    async fn release_then_acquire_again_succeeds() {
        let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::Normal));
        let mut manager = CaptureManager::new(mic.clone());

        let first = manager.acquire().await.unwrap();
        let _ = manager.release(first);
        let second = manager.acquire().await;
        assert!(second.is_ok());
        manager.discard(second.ok());

        assert_eq!(mic.max_concurrent_streams(), 1);
    }

    #[tokio::test]
    async fn discard_none_is_safe_twice() {
        let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::Normal));
        let mut manager = CaptureManager::new(mic);

        // 清理路径可能被调用两次（显式退出 + 组件销毁）
        manager.discard(None);
        manager.discard(None);
        assert!(!manager.is_live());
    }

    #[tokio::test]
    async fn dropped_handle_stops_the_stream() {
        let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::Normal));
        let mut manager = CaptureManager::new(mic.clone());

        // 句柄未经 release 直接被丢弃（比如持有它的任务被销毁）
        let handle = manager.acquire().await.unwrap();
        drop(handle);

        assert_eq!(mic.open_stream_count(), 0);
    }

    #[tokio::test]
    async fn denied_permission_propagates() {
        let mic = Arc::new(SimulatedMicrophone::new(SimulatedMicMode::DenyPermission));
        let mut manager = CaptureManager::new(mic);

        let result = manager.acquire().await;
        assert!(matches!(result, Err(CaptureError::PermissionDenied)));
        // 失败的获取不得占用槽位
        assert!(!manager.is_live());
    }
}
