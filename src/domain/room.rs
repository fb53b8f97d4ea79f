// ==========================================
// 酒店前台预订系统 - 客房领域模型
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - room / room_category 表
// ==========================================

use crate::domain::types::RoomStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// RoomCategory - 房型
// ==========================================
// 价格与可住人数挂在房型上,预订金额在创建/更新时快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCategory {
    pub category_id: String,   // 房型ID
    pub category_name: String, // 房型名称
    pub price: f64,            // 每晚价格
    pub capacity: i32,         // 可住人数
}

// ==========================================
// Room - 客房
// ==========================================
// status 仅由可用性/入住/退房组件写入（运维视角房态）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,     // 客房ID
    pub room_no: String,     // 房号
    pub category_id: String, // 关联房型
    pub status: RoomStatus,  // 房态
}

impl Room {
    /// 判断是否允许接待新预订落位（维修停用的房间不可排入住）
    pub fn accepts_check_in(&self) -> bool {
        !self.status.is_under_maintenance()
    }
}
