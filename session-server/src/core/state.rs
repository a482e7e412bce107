use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, Result, ServerError};
use crate::realtime::{ReconcilerRegistry, StorageSliceSource};
use crate::sessions::{
    ChangeFeed, SessionStorage, SessionsManager, SyncService, TransferCoordinator, VerifyScheduler,
};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是廉价克隆的句柄 (内部 Arc)，可以直接作为 axum State。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | sessions | SessionsManager | 命令处理与事件存储 |
/// | feed | ChangeFeed | 按范围过滤的变更通知 |
/// | transfers | TransferCoordinator | 换桌 / 并桌 |
/// | sync | SyncService | 断线重连同步 |
/// | reconcilers | ReconcilerRegistry | 每个订阅范围一个协调任务 |
/// | shutdown | CancellationToken | 全局关闭信号 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 会话管理器
    pub sessions: SessionsManager,
    /// 变更通知源
    pub feed: ChangeFeed,
    /// 换桌 / 并桌协调器
    pub transfers: TransferCoordinator,
    /// 重连同步服务
    pub sync: SyncService,
    /// 实时协调任务注册表
    pub reconcilers: ReconcilerRegistry,
    /// 全局关闭信号
    pub shutdown: CancellationToken,
    /// 启动时间 (用于 uptime)
    pub started_at: Instant,
}

impl ServerState {
    /// 基于已打开的管理器构造状态
    ///
    /// 测试中配合临时目录使用
    pub fn new(config: Config, sessions: SessionsManager) -> Self {
        let shutdown = CancellationToken::new();
        let feed = ChangeFeed::new(sessions.clone());
        let source = Arc::new(StorageSliceSource::new(sessions.clone()));
        let reconcilers = ReconcilerRegistry::new(feed.clone(), source, shutdown.child_token());

        Self {
            config,
            transfers: TransferCoordinator::new(sessions.clone()),
            sync: SyncService::new(sessions.clone()),
            feed,
            reconcilers,
            sessions,
            shutdown,
            started_at: Instant::now(),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录
    /// 2. 会话数据库 (work_dir/sessions.redb)
    /// 3. 各服务句柄
    pub fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir().map_err(ServerError::WorkDir)?;

        let db_path = config.database_path();
        let storage = SessionStorage::open(&db_path).map_err(|e| ServerError::Storage(e.into()))?;
        let stats = storage
            .get_stats()
            .map_err(|e| ServerError::Storage(e.into()))?;
        tracing::info!(
            path = %db_path.display(),
            events = stats.event_count,
            active_sessions = stats.active_session_count,
            "Session storage opened"
        );

        let sessions = SessionsManager::with_storage(storage, config.event_channel_capacity);
        Ok(Self::new(config.clone(), sessions))
    }

    /// 启动后台任务
    ///
    /// 启动的任务：
    /// - 快照校验 (VerifyScheduler)，`verify_interval_secs == 0` 时跳过
    /// - 空闲协调任务回收，`reconciler_idle_secs == 0` 时跳过
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new(self.shutdown.child_token());

        if self.config.verify_interval_secs > 0 {
            let scheduler = VerifyScheduler::new(
                self.sessions.clone(),
                Duration::from_secs(self.config.verify_interval_secs),
                tasks.shutdown_token(),
            );
            tasks.spawn("snapshot_verifier", scheduler.run());
        }

        if self.config.reconciler_idle_secs > 0 {
            let reaper = self.reconcilers.clone().run_reaper(
                Duration::from_secs(self.config.reconciler_idle_secs),
                tasks.shutdown_token(),
            );
            tasks.spawn("reconciler_reaper", reaper);
        }

        tracing::info!("Background tasks registered: {}", tasks.len());
        tasks
    }

    /// 运行时间 (秒)
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
