// ==========================================
// 酒店前台预订系统 - 引擎层
// ==========================================
// 依据: FrontDesk_Engine_Specs.md
// 职责: 业务规则（区间冲突、可用性、状态迁移、通知接缝）
// 红线: 引擎不直接写库,落库由 API 层在事务内完成
// ==========================================

pub mod availability;
pub mod notifier;
pub mod overlap;
pub mod transition;

// 重导出核心类型
pub use availability::{AvailabilityDecision, AvailabilityEngine};
pub use notifier::{
    NoOpNotifier, NotificationKind, OptionalNotifier, ReservationNotifier, ReservationSnapshot,
};
pub use overlap::{BookedInterval, OverlapCore};
pub use transition::{TransitionCore, TransitionDenied, TransitionPlan, TransitionStep};
