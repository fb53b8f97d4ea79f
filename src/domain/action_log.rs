// ==========================================
// 酒店前台预订系统 - 操作日志领域模型
// ==========================================
// 依据: FrontDesk_Master_Spec.md - 审计要求
// 红线: 所有写操作必须记录操作人与结果
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 用途: 审计追踪（谁在何时对哪个预订做了什么）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,              // 日志ID
    pub reservation_id: Option<String>, // 关联预订 (房态维护等操作可为None)
    pub action_type: String,            // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,       // 操作时间戳
    pub actor: String,                  // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,         // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateReservation,  // 创建预订
    UpdateReservation,  // 修改预订
    ConfirmReservation, // 确认预订
    CancelReservation,  // 取消预订
    DeleteReservation,  // 删除预订
    CheckIn,            // 办理入住
    CheckOut,           // 办理退房
    RoomMaintenance,    // 房态维护
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateReservation => "CreateReservation",
            ActionType::UpdateReservation => "UpdateReservation",
            ActionType::ConfirmReservation => "ConfirmReservation",
            ActionType::CancelReservation => "CancelReservation",
            ActionType::DeleteReservation => "DeleteReservation",
            ActionType::CheckIn => "CheckIn",
            ActionType::CheckOut => "CheckOut",
            ActionType::RoomMaintenance => "RoomMaintenance",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreateReservation" => Some(ActionType::CreateReservation),
            "UpdateReservation" => Some(ActionType::UpdateReservation),
            "ConfirmReservation" => Some(ActionType::ConfirmReservation),
            "CancelReservation" => Some(ActionType::CancelReservation),
            "DeleteReservation" => Some(ActionType::DeleteReservation),
            "CheckIn" => Some(ActionType::CheckIn),
            "CheckOut" => Some(ActionType::CheckOut),
            "RoomMaintenance" => Some(ActionType::RoomMaintenance),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志
    pub fn new(
        reservation_id: Option<String>,
        action_type: ActionType,
        actor: &str,
        action_ts: NaiveDateTime,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            reservation_id,
            action_type: action_type.as_str().to_string(),
            action_ts,
            actor: actor.to_string(),
            payload_json: None,
            detail: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}
