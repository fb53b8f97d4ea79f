// ==========================================
// 酒店前台预订系统 - 可用性引擎
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - 3. 可用性判定
// 红线1: 禁止双重预订
// ==========================================
// 职责: 在既有占用区间集合上判定候选窗口能否落位
// 输入: 候选时间窗 + 占用区间集合 (由调用方在写锁事务内加载)
// 输出: AvailabilityDecision (可订 / 冲突+最早可订时间)
// 红线: 判定为纯计算,不读写库; 快照一致性由调用方的事务保证
// 约束: 缓冲小时数在进入写锁事务之前读取,事务内不再触碰配置存储
// ==========================================

use crate::config::ConfigManager;
use crate::engine::overlap::{BookedInterval, OverlapCore};
use chrono::NaiveDateTime;
use std::error::Error;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// AvailabilityDecision - 可用性判定结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum AvailabilityDecision {
    /// 候选窗口可预订
    Ok,
    /// 与既有预订冲突,ready_at 为最早可订时间
    Conflict { ready_at: NaiveDateTime },
}

impl AvailabilityDecision {
    /// 判断是否可预订
    pub fn is_ok(&self) -> bool {
        matches!(self, AvailabilityDecision::Ok)
    }
}

// ==========================================
// AvailabilityEngine - 可用性引擎
// ==========================================
pub struct AvailabilityEngine {
    config: Arc<ConfigManager>,
}

impl AvailabilityEngine {
    /// 创建新的 AvailabilityEngine 实例
    ///
    /// # 参数
    /// - config: 配置读取器（提供清洁缓冲小时数）
    pub fn new(config: Arc<ConfigManager>) -> Self {
        Self { config }
    }

    /// 读取当前生效的清洁缓冲小时数
    ///
    /// 调用时机: 开启写锁事务之前（配置与业务共用连接时,
    /// 事务内读取会自死锁）
    pub fn buffer_hours(&self) -> Result<i64, Box<dyn Error>> {
        self.config.buffer_hours()
    }

    /// 判定候选窗口能否落位
    ///
    /// # 参数
    /// - candidate_start / candidate_end: 候选时间窗
    /// - blocking: 同一房间的占用区间集合
    ///   (占用状态: PENDING/CONFIRMED/CHECKED_IN/CHECKED_OUT,
    ///    更新场景下已剔除自身)
    /// - buffer_hours: 清洁缓冲小时数（事务外经 buffer_hours() 取得）
    ///
    /// # 一致性
    /// - 判定本身是纯计算; 防止并发双订依赖调用方在
    ///   同一写锁事务内完成"加载区间 → 判定 → 写入"
    #[instrument(skip(self, blocking), fields(blocking_count = blocking.len()))]
    pub fn check(
        &self,
        candidate_start: NaiveDateTime,
        candidate_end: NaiveDateTime,
        blocking: &[BookedInterval],
        buffer_hours: i64,
    ) -> AvailabilityDecision {
        match OverlapCore::conflicting_ready_time(
            candidate_start,
            candidate_end,
            blocking,
            buffer_hours,
        ) {
            Some(ready_at) => {
                tracing::debug!(
                    "候选窗口冲突: [{} ~ {}), 最早可订时间 {}",
                    candidate_start,
                    candidate_end,
                    ready_at
                );
                AvailabilityDecision::Conflict { ready_at }
            }
            None => AvailabilityDecision::Ok,
        }
    }
}
