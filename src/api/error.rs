// ==========================================
// 酒店前台预订系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换仓储/引擎错误为用户友好的错误
// 红线: 每种拒绝必须具体、可操作（哪个字段、为什么、何时可订）
// ==========================================

use crate::engine::transition::TransitionDenied;
use crate::repository::error::RepositoryError;
use chrono::NaiveDateTime;
use thiserror::Error;

/// API层错误类型
///
/// 所有业务拒绝在任何写入发生之前检出,整个操作原子放弃
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    /// 红线1: 禁止双重预订。携带房间与最早可订时间,原样呈现给用户
    #[error("房间冲突: room_id={room_id}, 最早可订时间 {ready_at}")]
    AvailabilityConflict {
        room_id: String,
        ready_at: NaiveDateTime,
    },

    /// 红线4: 状态机封闭
    #[error("无效的状态迁移: 当前状态{from}不允许执行{action}")]
    InvalidStateTransition { from: String, action: String },

    /// 红线3: 全额支付。携带应付金额用于展示
    #[error("支付金额不足: 应付{due:.2}, 实付{offered:.2}")]
    InsufficientPayment { due: f64, offered: f64 },

    /// 房间维修停用
    #[error("房间维修停用,无法办理入住: room_id={room_id}")]
    RoomUnavailable { room_id: String },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    /// 瞬时存储故障（写锁竞争/超时），调用方可整体重试
    #[error("存储瞬时故障(可整体重试): {0}")]
    TransientStoreFailure(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 瞬时错误: 可整体重试
            RepositoryError::Busy(msg) => ApiError::TransientStoreFailure(msg),

            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::InternalError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// rusqlite 错误统一先归类到仓储层,再转换为 API 层错误
impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::from(RepositoryError::from(err))
    }
}

// ==========================================
// 从 TransitionDenied 转换
// 目的: 状态迁移核心的拒绝原样映射为可区分的 API 错误
// ==========================================
impl From<TransitionDenied> for ApiError {
    fn from(denied: TransitionDenied) -> Self {
        match denied {
            TransitionDenied::WrongStatus { from, action } => ApiError::InvalidStateTransition {
                from: from.to_string(),
                action: action.to_string(),
            },
            TransitionDenied::InsufficientPayment { due, offered } => {
                ApiError::InsufficientPayment { due, offered }
            }
            TransitionDenied::RoomUnderMaintenance { room_id } => {
                ApiError::RoomUnavailable { room_id }
            }
            TransitionDenied::EmptyRemarks => {
                ApiError::InvalidInput("退房备注不能为空".to_string())
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_maps_to_transient() {
        let repo_err = RepositoryError::Busy("database is locked".to_string());
        let api_err: ApiError = repo_err.into();
        assert!(matches!(api_err, ApiError::TransientStoreFailure(_)));
    }

    #[test]
    fn test_not_found_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Reservation".to_string(),
            id: "R001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Reservation"));
                assert!(msg.contains("R001"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_transition_denied_conversion() {
        let api_err: ApiError = TransitionDenied::InsufficientPayment {
            due: 3000.0,
            offered: 2999.0,
        }
        .into();
        match api_err {
            ApiError::InsufficientPayment { due, offered } => {
                assert_eq!(due, 3000.0);
                assert_eq!(offered, 2999.0);
            }
            _ => panic!("Expected InsufficientPayment"),
        }

        let api_err: ApiError = TransitionDenied::RoomUnderMaintenance {
            room_id: "RM001".to_string(),
        }
        .into();
        assert!(matches!(api_err, ApiError::RoomUnavailable { .. }));
    }
}
