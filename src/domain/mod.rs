// ==========================================
// 酒店前台预订系统 - 领域层
// ==========================================
// 职责: 实体定义与封闭状态类型,不含任何 I/O
// ==========================================

pub mod action_log;
pub mod records;
pub mod reservation;
pub mod room;
pub mod types;

// 重导出核心实体
pub use action_log::{ActionLog, ActionType};
pub use records::{CheckInRecord, CheckOutRecord, Payment};
pub use reservation::{Reservation, ReservationServiceLine, ServiceItem};
pub use room::{Room, RoomCategory};
pub use types::{ReservationStatus, RoomStatus};
