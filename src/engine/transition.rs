// ==========================================
// 酒店前台预订系统 - 状态迁移规划核心 纯函数库
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - 4. 预订状态机
// 职责: 将一次状态迁移展开为显式副作用清单
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================
// 说明: reservation.status 与 room.status 是两个独立字段,
// 二者的同步规则集中在这里产出（副作用清单）,
// 执行层只需按序落库,保证同步逻辑单点可测
// ==========================================

use crate::domain::reservation::Reservation;
use crate::domain::room::Room;
use crate::domain::types::{ReservationStatus, RoomStatus};
use thiserror::Error;

// ==========================================
// TransitionStep - 迁移副作用
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionStep {
    /// 创建支付记录
    CreatePayment { amount: f64 },
    /// 创建入住凭据（引用本次支付）
    CreateCheckInRecord,
    /// 创建退房凭据
    CreateCheckOutRecord { remarks: String },
    /// 翻转预订状态
    SetReservationStatus(ReservationStatus),
    /// 翻转房态
    SetRoomStatus(RoomStatus),
}

// ==========================================
// TransitionPlan - 迁移计划
// ==========================================
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub steps: Vec<TransitionStep>, // 按执行顺序排列的副作用
    pub reasons: Vec<String>,       // 决策原因 (可解释性)
}

// ==========================================
// TransitionDenied - 迁移拒绝原因
// ==========================================
// 每种拒绝必须可区分,禁止笼统的"操作失败"
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionDenied {
    #[error("无效的状态迁移: 当前状态{from}不允许执行{action}")]
    WrongStatus {
        from: ReservationStatus,
        action: &'static str,
    },

    #[error("支付金额不足: 应付{due:.2}, 实付{offered:.2}")]
    InsufficientPayment { due: f64, offered: f64 },

    #[error("房间维修停用: room_id={room_id}")]
    RoomUnderMaintenance { room_id: String },

    #[error("退房备注不能为空")]
    EmptyRemarks,
}

// ==========================================
// TransitionCore - 纯函数工具类
// ==========================================
pub struct TransitionCore;

impl TransitionCore {
    /// 规划入住迁移
    ///
    /// # 规则 (按序校验)
    /// 1. 红线3: payment_amount >= reservation.amount,差一分也拒绝
    /// 2. 预订状态必须 ∈ {PENDING, CONFIRMED}
    /// 3. 房间维修停用 (UNAVAILABLE) 时拒绝
    ///
    /// # 副作用清单 (按序执行)
    /// 1. 创建支付记录
    /// 2. 创建入住凭据
    /// 3. 预订状态 → CHECKED_IN
    /// 4. 房态 → OCCUPIED
    pub fn plan_check_in(
        reservation: &Reservation,
        room: &Room,
        payment_amount: f64,
    ) -> Result<TransitionPlan, TransitionDenied> {
        // 规则 1: 全额支付
        if payment_amount < reservation.amount {
            return Err(TransitionDenied::InsufficientPayment {
                due: reservation.amount,
                offered: payment_amount,
            });
        }

        // 规则 2: 状态闸口
        if !reservation.status.can_check_in() {
            return Err(TransitionDenied::WrongStatus {
                from: reservation.status,
                action: "check-in",
            });
        }

        // 规则 3: 维修停用闸口
        if room.status.is_under_maintenance() {
            return Err(TransitionDenied::RoomUnderMaintenance {
                room_id: room.room_id.clone(),
            });
        }

        let reasons = vec![
            format!(
                "CHECK_IN: payment {:.2} covers due {:.2}",
                payment_amount, reservation.amount
            ),
            format!("CHECK_IN: status {} eligible", reservation.status),
        ];

        Ok(TransitionPlan {
            steps: vec![
                TransitionStep::CreatePayment {
                    amount: payment_amount,
                },
                TransitionStep::CreateCheckInRecord,
                TransitionStep::SetReservationStatus(ReservationStatus::CheckedIn),
                TransitionStep::SetRoomStatus(RoomStatus::Occupied),
            ],
            reasons,
        })
    }

    /// 规划退房迁移
    ///
    /// # 规则
    /// 1. 预订状态必须为 CHECKED_IN (严格闸口)
    /// 2. remarks 去除空白后必须非空
    ///
    /// # 副作用清单
    /// 1. 创建退房凭据
    /// 2. 预订状态 → CHECKED_OUT
    /// 3. 房态 → AVAILABLE
    ///    (运维视角立即放回; 清洁缓冲期内的时间性阻断
    ///     由可用性引擎基于预订区间推导,与房态解耦)
    pub fn plan_check_out(
        reservation: &Reservation,
        remarks: &str,
    ) -> Result<TransitionPlan, TransitionDenied> {
        if !reservation.status.can_check_out() {
            return Err(TransitionDenied::WrongStatus {
                from: reservation.status,
                action: "check-out",
            });
        }

        let trimmed = remarks.trim();
        if trimmed.is_empty() {
            return Err(TransitionDenied::EmptyRemarks);
        }

        Ok(TransitionPlan {
            steps: vec![
                TransitionStep::CreateCheckOutRecord {
                    remarks: trimmed.to_string(),
                },
                TransitionStep::SetReservationStatus(ReservationStatus::CheckedOut),
                TransitionStep::SetRoomStatus(RoomStatus::Available),
            ],
            reasons: vec![format!(
                "CHECK_OUT: status {} eligible",
                reservation.status
            )],
        })
    }

    /// 规划确认迁移 (外部邮件验证完成后的回调动作)
    ///
    /// # 规则
    /// - 仅 PENDING 可确认
    pub fn plan_confirm(reservation: &Reservation) -> Result<TransitionPlan, TransitionDenied> {
        if reservation.status != ReservationStatus::Pending {
            return Err(TransitionDenied::WrongStatus {
                from: reservation.status,
                action: "confirm",
            });
        }

        Ok(TransitionPlan {
            steps: vec![TransitionStep::SetReservationStatus(
                ReservationStatus::Confirmed,
            )],
            reasons: vec!["CONFIRM: pending reservation verified".to_string()],
        })
    }

    /// 规划取消迁移
    ///
    /// # 规则
    /// - 仅 PENDING/CONFIRMED 可取消（入住后不可取消）
    ///
    /// # 参数
    /// - room_has_other_blocking: 同房间是否仍有其他占用预订
    ///   (无其他占用且房态为 BOOKED 时,连带放回 AVAILABLE;
    ///    OCCUPIED/UNAVAILABLE 永不在此处触碰)
    pub fn plan_cancel(
        reservation: &Reservation,
        room: &Room,
        room_has_other_blocking: bool,
    ) -> Result<TransitionPlan, TransitionDenied> {
        if !reservation.status.can_cancel() {
            return Err(TransitionDenied::WrongStatus {
                from: reservation.status,
                action: "cancel",
            });
        }

        let mut steps = vec![TransitionStep::SetReservationStatus(
            ReservationStatus::Cancelled,
        )];
        let mut reasons = vec![format!("CANCEL: status {} eligible", reservation.status)];

        if room.status == RoomStatus::Booked && !room_has_other_blocking {
            steps.push(TransitionStep::SetRoomStatus(RoomStatus::Available));
            reasons.push("CANCEL: no other blocking reservation, room released".to_string());
        }

        Ok(TransitionPlan { steps, reasons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn reservation(status: ReservationStatus, amount: f64) -> Reservation {
        Reservation {
            reservation_id: "R001".to_string(),
            room_id: "RM001".to_string(),
            guest_name: "李四".to_string(),
            guest_contact: "guest@example.com".to_string(),
            party_size: 2,
            check_in_at: dt(2024, 6, 1, 14, 0),
            check_out_at: dt(2024, 6, 2, 12, 0),
            status,
            amount,
            user_id: None,
            created_at: dt(2024, 5, 30, 9, 0),
        }
    }

    fn room(status: RoomStatus) -> Room {
        Room {
            room_id: "RM001".to_string(),
            room_no: "201".to_string(),
            category_id: "C001".to_string(),
            status,
        }
    }

    // ==========================================
    // 测试 1: 入住规划
    // ==========================================

    #[test]
    fn test_plan_check_in_full_payment() {
        let r = reservation(ReservationStatus::Confirmed, 3000.0);
        let plan =
            TransitionCore::plan_check_in(&r, &room(RoomStatus::Booked), 3000.0).unwrap();

        assert_eq!(
            plan.steps,
            vec![
                TransitionStep::CreatePayment { amount: 3000.0 },
                TransitionStep::CreateCheckInRecord,
                TransitionStep::SetReservationStatus(ReservationStatus::CheckedIn),
                TransitionStep::SetRoomStatus(RoomStatus::Occupied),
            ]
        );
    }

    #[test]
    fn test_plan_check_in_rejects_partial_payment() {
        // 红线3: 差一分也拒绝
        let r = reservation(ReservationStatus::Confirmed, 3000.0);
        let denied =
            TransitionCore::plan_check_in(&r, &room(RoomStatus::Booked), 2999.99).unwrap_err();

        assert_eq!(
            denied,
            TransitionDenied::InsufficientPayment {
                due: 3000.0,
                offered: 2999.99
            }
        );
    }

    #[test]
    fn test_plan_check_in_accepts_overpayment() {
        let r = reservation(ReservationStatus::Pending, 3000.0);
        let plan =
            TransitionCore::plan_check_in(&r, &room(RoomStatus::Available), 3500.0).unwrap();
        assert!(plan
            .steps
            .contains(&TransitionStep::CreatePayment { amount: 3500.0 }));
    }

    #[test]
    fn test_plan_check_in_rejects_wrong_status() {
        for status in [
            ReservationStatus::Cancelled,
            ReservationStatus::CheckedIn,
            ReservationStatus::CheckedOut,
        ] {
            let r = reservation(status, 3000.0);
            let denied =
                TransitionCore::plan_check_in(&r, &room(RoomStatus::Booked), 3000.0).unwrap_err();
            assert!(matches!(denied, TransitionDenied::WrongStatus { .. }));
        }
    }

    #[test]
    fn test_plan_check_in_rejects_maintenance_room() {
        let r = reservation(ReservationStatus::Confirmed, 3000.0);
        let denied =
            TransitionCore::plan_check_in(&r, &room(RoomStatus::Unavailable), 3000.0).unwrap_err();

        assert_eq!(
            denied,
            TransitionDenied::RoomUnderMaintenance {
                room_id: "RM001".to_string()
            }
        );
    }

    // ==========================================
    // 测试 2: 退房规划
    // ==========================================

    #[test]
    fn test_plan_check_out_happy_path() {
        let r = reservation(ReservationStatus::CheckedIn, 3000.0);
        let plan = TransitionCore::plan_check_out(&r, "  房况正常  ").unwrap();

        assert_eq!(
            plan.steps,
            vec![
                TransitionStep::CreateCheckOutRecord {
                    remarks: "房况正常".to_string()
                },
                TransitionStep::SetReservationStatus(ReservationStatus::CheckedOut),
                TransitionStep::SetRoomStatus(RoomStatus::Available),
            ]
        );
    }

    #[test]
    fn test_plan_check_out_requires_checked_in() {
        for status in [
            ReservationStatus::Pending,
            ReservationStatus::Confirmed,
            ReservationStatus::Cancelled,
            ReservationStatus::CheckedOut,
        ] {
            let r = reservation(status, 3000.0);
            let denied = TransitionCore::plan_check_out(&r, "正常").unwrap_err();
            assert!(matches!(denied, TransitionDenied::WrongStatus { .. }));
        }
    }

    #[test]
    fn test_plan_check_out_requires_remarks() {
        let r = reservation(ReservationStatus::CheckedIn, 3000.0);
        let denied = TransitionCore::plan_check_out(&r, "   ").unwrap_err();
        assert_eq!(denied, TransitionDenied::EmptyRemarks);
    }

    // ==========================================
    // 测试 3: 确认与取消规划
    // ==========================================

    #[test]
    fn test_plan_confirm_only_from_pending() {
        let r = reservation(ReservationStatus::Pending, 3000.0);
        let plan = TransitionCore::plan_confirm(&r).unwrap();
        assert_eq!(
            plan.steps,
            vec![TransitionStep::SetReservationStatus(
                ReservationStatus::Confirmed
            )]
        );

        let r = reservation(ReservationStatus::Confirmed, 3000.0);
        assert!(TransitionCore::plan_confirm(&r).is_err());
    }

    #[test]
    fn test_plan_cancel_releases_room_when_last_blocking() {
        let r = reservation(ReservationStatus::Confirmed, 3000.0);
        let plan = TransitionCore::plan_cancel(&r, &room(RoomStatus::Booked), false).unwrap();

        assert_eq!(
            plan.steps,
            vec![
                TransitionStep::SetReservationStatus(ReservationStatus::Cancelled),
                TransitionStep::SetRoomStatus(RoomStatus::Available),
            ]
        );
    }

    #[test]
    fn test_plan_cancel_keeps_room_when_others_remain() {
        let r = reservation(ReservationStatus::Pending, 3000.0);
        let plan = TransitionCore::plan_cancel(&r, &room(RoomStatus::Booked), true).unwrap();

        assert_eq!(
            plan.steps,
            vec![TransitionStep::SetReservationStatus(
                ReservationStatus::Cancelled
            )]
        );
    }

    #[test]
    fn test_plan_cancel_never_touches_occupied_room() {
        // 同房间另一预订已入住,房态 OCCUPIED,取消本预订不得触碰房态
        let r = reservation(ReservationStatus::Confirmed, 3000.0);
        let plan = TransitionCore::plan_cancel(&r, &room(RoomStatus::Occupied), false).unwrap();

        assert!(!plan
            .steps
            .iter()
            .any(|s| matches!(s, TransitionStep::SetRoomStatus(_))));
    }

    #[test]
    fn test_plan_cancel_rejects_after_check_in() {
        let r = reservation(ReservationStatus::CheckedIn, 3000.0);
        let denied =
            TransitionCore::plan_cancel(&r, &room(RoomStatus::Occupied), false).unwrap_err();
        assert!(matches!(denied, TransitionDenied::WrongStatus { .. }));
    }
}
