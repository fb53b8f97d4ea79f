// ==========================================
// 酒店前台预订系统 - 请求校验
// ==========================================
// 职责: 预订请求的字段校验与时间戳归一化
// 红线: 所有校验在任何写入之前完成
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use chrono::{NaiveDateTime, Timelike};

// ==========================================
// ReservationValidator - 预订请求校验器
// ==========================================
pub struct ReservationValidator;

impl ReservationValidator {
    /// 时间戳归一化: 截断到整分钟
    ///
    /// # 规则
    /// - 存储精度为分钟级,秒与亚秒一律截断
    pub fn normalize_minute(ts: NaiveDateTime) -> NaiveDateTime {
        ts.with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(ts)
    }

    /// 校验时间窗
    ///
    /// # 规则
    /// - check_in_at < check_out_at (归一化后判定)
    pub fn validate_window(
        check_in_at: NaiveDateTime,
        check_out_at: NaiveDateTime,
    ) -> ApiResult<()> {
        if check_in_at >= check_out_at {
            return Err(ApiError::InvalidInput(format!(
                "入住时间必须早于退房时间: check_in_at={}, check_out_at={}",
                check_in_at, check_out_at
            )));
        }
        Ok(())
    }

    /// 校验住客信息
    pub fn validate_guest(guest_name: &str, guest_contact: &str) -> ApiResult<()> {
        if guest_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("住客姓名不能为空".to_string()));
        }
        if guest_contact.trim().is_empty() {
            return Err(ApiError::InvalidInput("联系方式不能为空".to_string()));
        }
        Ok(())
    }

    /// 校验入住人数
    ///
    /// # 参数
    /// - party_size: 请求人数
    /// - capacity: 房型可住人数
    pub fn validate_party_size(party_size: i32, capacity: i32) -> ApiResult<()> {
        if party_size < 1 {
            return Err(ApiError::InvalidInput(format!(
                "入住人数必须大于0: party_size={}",
                party_size
            )));
        }
        if party_size > capacity {
            return Err(ApiError::InvalidInput(format!(
                "入住人数超过房型可住人数: party_size={}, capacity={}",
                party_size, capacity
            )));
        }
        Ok(())
    }

    /// 校验服务明细数量
    pub fn validate_service_quantity(service_id: &str, quantity: i32) -> ApiResult<()> {
        if quantity < 1 {
            return Err(ApiError::InvalidInput(format!(
                "服务数量必须大于0: service_id={}, quantity={}",
                service_id, quantity
            )));
        }
        Ok(())
    }
}
