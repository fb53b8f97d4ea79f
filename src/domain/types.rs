// ==========================================
// 酒店前台预订系统 - 领域类型定义
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - 0.1 状态机体系
// 红线4: 状态机封闭 - 状态只能是枚举成员,禁止自由字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 预订状态 (Reservation Status)
// ==========================================
// 状态机:
//   PENDING --(verify)--> CONFIRMED
//   PENDING|CONFIRMED --(cancel)--> CANCELLED
//   PENDING|CONFIRMED --(check-in)--> CHECKED_IN
//   CHECKED_IN --(check-out)--> CHECKED_OUT
// 终态: CANCELLED / CHECKED_OUT
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,    // 待确认
    Confirmed,  // 已确认
    Cancelled,  // 已取消
    CheckedIn,  // 已入住
    CheckedOut, // 已退房
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReservationStatus {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::CheckedIn => "CHECKED_IN",
            ReservationStatus::CheckedOut => "CHECKED_OUT",
        }
    }

    /// 从字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(ReservationStatus::Pending),
            "CONFIRMED" => Some(ReservationStatus::Confirmed),
            "CANCELLED" => Some(ReservationStatus::Cancelled),
            "CHECKED_IN" => Some(ReservationStatus::CheckedIn),
            "CHECKED_OUT" => Some(ReservationStatus::CheckedOut),
            _ => None,
        }
    }

    /// 判断是否占用房间日历（红线1: 禁止双重预订）
    ///
    /// # 规则
    /// - PENDING/CONFIRMED/CHECKED_IN/CHECKED_OUT 均占用有效区间
    /// - CHECKED_OUT 仍然占用: 退房后清洁缓冲期内房间不可预订
    /// - 仅 CANCELLED 释放日历
    pub fn is_blocking(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled)
    }

    /// 判断是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::CheckedOut
        )
    }

    /// 判断是否可以取消（入住前任意时刻）
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        )
    }

    /// 判断是否可以办理入住
    pub fn can_check_in(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        )
    }

    /// 判断是否可以办理退房
    pub fn can_check_out(&self) -> bool {
        matches!(self, ReservationStatus::CheckedIn)
    }
}

// ==========================================
// 客房状态 (Room Status)
// ==========================================
// 运维视角的房态,与预订区间的时间性占用解耦:
// 退房后 room.status 立即回到 AVAILABLE,
// 但可用性引擎在清洁缓冲期结束前仍然阻断该区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Available,   // 可用
    Booked,      // 已预订
    Occupied,    // 入住中
    Unavailable, // 维修停用
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RoomStatus {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "AVAILABLE",
            RoomStatus::Booked => "BOOKED",
            RoomStatus::Occupied => "OCCUPIED",
            RoomStatus::Unavailable => "UNAVAILABLE",
        }
    }

    /// 从字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "AVAILABLE" => Some(RoomStatus::Available),
            "BOOKED" => Some(RoomStatus::Booked),
            "OCCUPIED" => Some(RoomStatus::Occupied),
            "UNAVAILABLE" => Some(RoomStatus::Unavailable),
            _ => None,
        }
    }

    /// 判断是否处于维修停用状态（入住闸口之一）
    pub fn is_under_maintenance(&self) -> bool {
        matches!(self, RoomStatus::Unavailable)
    }
}
