// ==========================================
// 酒店前台预订系统 - 核心库
// ==========================================
// 依据: FrontDesk_Master_Spec.md - 系统宪法
// 技术栈: Rust + SQLite
// 系统定位: 预订生命周期与可用性引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ReservationStatus, RoomStatus};

// 领域实体
pub use domain::{
    ActionLog, ActionType, CheckInRecord, CheckOutRecord, Payment, Reservation,
    ReservationServiceLine, Room, RoomCategory, ServiceItem,
};

// 引擎
pub use engine::{
    AvailabilityDecision, AvailabilityEngine, BookedInterval, NoOpNotifier, NotificationKind,
    OptionalNotifier, OverlapCore, ReservationNotifier, ReservationSnapshot, TransitionCore,
    TransitionDenied, TransitionPlan, TransitionStep,
};

// API
pub use api::{ApiError, ApiResult, FrontDeskApi, ReservationApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "酒店前台预订系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
