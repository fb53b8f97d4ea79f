// ==========================================
// 酒店前台预订系统 - 入住/退房凭据模型
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - payment / check_in_record / check_out_record 表
// 红线5: 凭据与状态翻转同事务写入,要么全部成功要么全部回滚
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// Payment - 支付记录
// ==========================================
// 红线3: 入住时一次性全额支付,不建模分次/部分支付
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,      // 支付ID
    pub reservation_id: String,  // 关联预订
    pub amount: f64,             // 支付金额
    pub staff_id: String,        // 经办员工
    pub paid_at: NaiveDateTime,  // 支付时间
}

impl Payment {
    /// 创建新的支付记录
    pub fn new(reservation_id: &str, amount: f64, staff_id: &str, paid_at: NaiveDateTime) -> Self {
        Self {
            payment_id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            amount,
            staff_id: staff_id.to_string(),
            paid_at,
        }
    }
}

// ==========================================
// CheckInRecord - 入住凭据
// ==========================================
// 每个预订恰好产生一次（reservation_id 唯一约束兜底）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRecord {
    pub record_id: String,           // 凭据ID
    pub reservation_id: String,      // 关联预订
    pub payment_id: String,          // 关联支付
    pub staff_id: String,            // 经办员工
    pub checked_in_at: NaiveDateTime, // 入住时间
}

impl CheckInRecord {
    /// 创建新的入住凭据
    pub fn new(
        reservation_id: &str,
        payment_id: &str,
        staff_id: &str,
        checked_in_at: NaiveDateTime,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            payment_id: payment_id.to_string(),
            staff_id: staff_id.to_string(),
            checked_in_at,
        }
    }
}

// ==========================================
// CheckOutRecord - 退房凭据
// ==========================================
// remarks 必填: 房况备注是清洁/维修工单的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutRecord {
    pub record_id: String,            // 凭据ID
    pub reservation_id: String,       // 关联预订
    pub staff_id: String,             // 经办员工
    pub remarks: String,              // 退房备注
    pub checked_out_at: NaiveDateTime, // 退房时间
}

impl CheckOutRecord {
    /// 创建新的退房凭据
    pub fn new(
        reservation_id: &str,
        staff_id: &str,
        remarks: &str,
        checked_out_at: NaiveDateTime,
    ) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            staff_id: staff_id.to_string(),
            remarks: remarks.to_string(),
            checked_out_at,
        }
    }
}
