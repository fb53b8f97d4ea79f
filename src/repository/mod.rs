// ==========================================
// 酒店前台预订系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约束: 跨表事务由 API 层开启,仓储提供 *_tx 函数在事务内执行
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod record_repo;
pub mod reservation_repo;
pub mod room_repo;
pub mod service_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use record_repo::{CheckRecordRepository, PaymentRepository};
pub use reservation_repo::ReservationRepository;
pub use room_repo::RoomRepository;
pub use service_repo::ServiceCatalogRepository;
