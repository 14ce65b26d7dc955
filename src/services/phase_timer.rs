//! 阶段计时器 - 服务层
//!
//! 一个阶段一个计时器：后台任务按秒倒数，通过 watch 广播剩余秒数，
//! 倒数到 0 时通过 oneshot 发出唯一一次到期信号
//!
//! 设计要点：
//! - 到期信号走 oneshot，"最多触发一次"在构造上成立
//! - watch 上的剩余秒数只用于展示，阶段推进从不依赖它
//! - cancel 之后计时器永远不会再到期（等待方转为永久挂起）

use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::trace;

/// 单个阶段的倒计时
pub struct PhaseTimer {
    task: JoinHandle<()>,
    ticks: watch::Receiver<u32>,
    expiry: Option<oneshot::Receiver<()>>,
    cancelled: bool,
}

impl PhaseTimer {
    /// 启动倒计时；`total_secs` 为 0 时立即到期
    pub fn start(total_secs: u32) -> Self {
        let (tick_tx, tick_rx) = watch::channel(total_secs);
        let (expiry_tx, expiry_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut remaining = total_secs;
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval 的第一次 tick 立即返回
            ticker.tick().await;

            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                trace!("⏱️ 剩余 {}s", remaining);
                let _ = tick_tx.send(remaining);
            }
            let _ = expiry_tx.send(());
        });

        Self {
            task,
            ticks: tick_rx,
            expiry: Some(expiry_rx),
            cancelled: false,
        }
    }

    /// 当前剩余秒数（仅供展示）
    pub fn remaining(&self) -> u32 {
        *self.ticks.borrow()
    }

    /// 订阅剩余秒数的变更
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.ticks.clone()
    }

    /// 等待计时器自然到期
    ///
    /// cancel 之后这个 future 永远不会完成，调用方的 select 分支
    /// 因此天然失效，不需要额外的"已取消"判断
    pub async fn expired(&mut self) {
        if !self.cancelled {
            if let Some(rx) = self.expiry.as_mut() {
                if rx.await.is_ok() {
                    return;
                }
            }
        }
        std::future::pending::<()>().await
    }

    /// 取消倒计时（幂等）
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.task.abort();
        self.expiry = None;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
