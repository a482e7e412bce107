//! 快照校验调度器
//!
//! 周期性地用事件日志重放每个活跃会话，与存储的快照比对 checksum。
//! 发现漂移只记录告警，不自动修复。

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::manager::{ManagerError, SessionsManager};
use super::sync::SyncService;

/// 一轮校验的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub checked: usize,
    /// 快照与重放结果不一致的会话
    pub drifted: Vec<String>,
}

#[derive(Clone)]
pub struct VerifyScheduler {
    manager: SessionsManager,
    sync: SyncService,
    interval: Duration,
    shutdown: CancellationToken,
}

impl VerifyScheduler {
    pub fn new(manager: SessionsManager, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            sync: SyncService::new(manager.clone()),
            manager,
            interval,
            shutdown,
        }
    }

    /// 主循环：按周期触发，收到 shutdown 即退出
    pub async fn run(self) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Verify scheduler started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Verify scheduler received shutdown signal");
                    return;
                }
            }

            let this = self.clone();
            match tokio::task::spawn_blocking(move || this.verify_once()).await {
                Ok(Ok(report)) if report.drifted.is_empty() => {
                    tracing::debug!(checked = report.checked, "Snapshot verification OK");
                }
                Ok(Ok(report)) => {
                    tracing::warn!(
                        checked = report.checked,
                        drifted = ?report.drifted,
                        "Snapshot verification found drift"
                    );
                }
                Ok(Err(e)) => tracing::error!("Snapshot verification failed: {}", e),
                Err(e) => tracing::error!("Snapshot verification task failed: {}", e),
            }
        }
    }

    /// 校验所有活跃会话 (阻塞)
    pub fn verify_once(&self) -> Result<VerifyReport, ManagerError> {
        let active = self.manager.storage().get_active_sessions()?;

        let mut report = VerifyReport::default();
        for session in active {
            if self.shutdown.is_cancelled() {
                break;
            }
            report.checked += 1;
            if !self.sync.verify_snapshot(&session.session_id)? {
                report.drifted.push(session.session_id);
            }
        }
        Ok(report)
    }
}
