// ==========================================
// 酒店前台预订系统 - 预订领域模型
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - reservation / reservation_service_line 表
// 红线: check_in_at < check_out_at 为硬性不变量
// ==========================================

use crate::domain::types::ReservationStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Reservation - 预订
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,        // 预订ID (对外可见的不透明ID)
    pub room_id: String,               // 关联客房
    pub guest_name: String,            // 住客姓名
    pub guest_contact: String,         // 联系方式
    pub party_size: i32,               // 入住人数
    pub check_in_at: NaiveDateTime,    // 预定入住时间
    pub check_out_at: NaiveDateTime,   // 预定退房时间
    pub status: ReservationStatus,     // 预订状态
    pub amount: f64,                   // 应付金额 (房费+服务费, 创建/更新时快照)
    pub user_id: Option<String>,       // 下单用户 (前台代客预订时为None)
    pub created_at: NaiveDateTime,     // 创建时间
}

impl Reservation {
    /// 校验时间窗不变量
    ///
    /// # 规则
    /// - check_in_at < check_out_at,相等或倒置均视为非法
    pub fn has_valid_window(&self) -> bool {
        self.check_in_at < self.check_out_at
    }

    /// 计算间夜数（不足一晚按一晚计）
    pub fn nights(&self) -> i64 {
        let hours = (self.check_out_at - self.check_in_at).num_hours();
        ((hours + 23) / 24).max(1)
    }

    /// 判断是否占用房间日历
    pub fn is_blocking(&self) -> bool {
        self.status.is_blocking()
    }
}

// ==========================================
// ReservationServiceLine - 预订服务明细
// ==========================================
// line_total 为挂接时的 价格×数量 快照,之后目录调价不回溯
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationServiceLine {
    pub reservation_id: String, // 关联预订
    pub service_id: String,     // 关联服务项目
    pub quantity: i32,          // 数量
    pub line_total: f64,        // 明细金额快照
}

// ==========================================
// ServiceItem - 服务目录项
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItem {
    pub service_id: String,   // 服务ID
    pub service_name: String, // 服务名称
    pub price: f64,           // 当前单价
}
