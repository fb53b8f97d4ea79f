// ==========================================
// 酒店前台预订系统 - 前台入住/退房 API
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - 5. 入住/退房处理
// 红线3: 全额支付才能入住
// 红线5: 支付/凭据/状态翻转五笔写入同事务,要么全部成功要么全部回滚
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::ReservationValidator;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::records::{CheckInRecord, CheckOutRecord, Payment};
use crate::domain::reservation::Reservation;
use crate::domain::room::Room;
use crate::domain::types::RoomStatus;
use crate::engine::transition::{TransitionCore, TransitionStep};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::record_repo::{CheckRecordRepository, PaymentRepository};
use crate::repository::reservation_repo::ReservationRepository;
use crate::repository::room_repo::RoomRepository;

// ==========================================
// FrontDeskApi - 前台操作 API
// ==========================================

/// 前台操作API
///
/// 职责：
/// 1. 办理入住（全额支付校验 + 凭据 + 状态翻转,单事务）
/// 2. 办理退房（凭据 + 状态翻转,单事务）
/// 3. 房态维护（维修停用/恢复）
pub struct FrontDeskApi {
    conn: Arc<Mutex<Connection>>,
    reservation_repo: Arc<ReservationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl FrontDeskApi {
    /// 创建新的FrontDeskApi实例
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        reservation_repo: Arc<ReservationRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            conn,
            reservation_repo,
            action_log_repo,
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> ApiResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::InternalError(format!("锁获取失败: {}", e)))
    }

    // ==========================================
    // 办理入住
    // ==========================================

    /// 办理入住
    ///
    /// # 规则（迁移核心按序校验,拒绝可区分）
    /// 1. 红线3: payment_amount >= 应付金额,差一分也拒绝
    /// 2. 预订状态 ∈ {PENDING, CONFIRMED}
    /// 3. 房间非维修停用
    ///
    /// # 事务（红线5: 全部成功或全部回滚）
    /// 1. 创建支付记录
    /// 2. 创建入住凭据（引用支付）
    /// 3. 预订状态 → CHECKED_IN
    /// 4. 房态 → OCCUPIED
    ///
    /// # 并发
    /// - 写锁事务内重读预订行,并发的入住/取消在此串行化
    pub fn check_in(
        &self,
        reservation_id: &str,
        payment_amount: f64,
        staff_id: &str,
    ) -> ApiResult<Reservation> {
        if staff_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("经办员工不能为空".to_string()));
        }

        let checked_in = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // 写锁下重读,避免基于过期快照判定
            let mut reservation = ReservationRepository::find_by_id_tx(&tx, reservation_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
                })?;
            let room = RoomRepository::find_by_id_tx(&tx, &reservation.room_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Room(id={})不存在", reservation.room_id))
                })?;

            let plan = TransitionCore::plan_check_in(&reservation, &room, payment_amount)?;
            Self::execute_plan_tx(&tx, &mut reservation, &plan.steps, staff_id)?;

            tx.commit()?;
            reservation
        };

        self.log_action(
            ActionLog::new(
                Some(reservation_id.to_string()),
                ActionType::CheckIn,
                staff_id,
                Utc::now().naive_utc(),
            )
            .with_payload(&serde_json::json!({
                "payment_amount": payment_amount,
                "due_amount": checked_in.amount,
                "room_id": checked_in.room_id,
            }))
            .with_detail(format!("办理入住: {}", checked_in.guest_name)),
        );

        Ok(checked_in)
    }

    // ==========================================
    // 办理退房
    // ==========================================

    /// 办理退房
    ///
    /// # 规则
    /// 1. 预订状态必须为 CHECKED_IN（严格闸口）
    /// 2. remarks 必填
    ///
    /// # 事务
    /// 1. 创建退房凭据
    /// 2. 预订状态 → CHECKED_OUT
    /// 3. 房态 → AVAILABLE
    ///
    /// # 说明
    /// - 房态立即放回 AVAILABLE 属运维视角;
    ///   可用性引擎依预订区间在 check_out_at + buffer 前继续阻断,
    ///   两者有意解耦
    pub fn check_out(
        &self,
        reservation_id: &str,
        remarks: &str,
        staff_id: &str,
    ) -> ApiResult<Reservation> {
        if staff_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("经办员工不能为空".to_string()));
        }

        let checked_out = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut reservation = ReservationRepository::find_by_id_tx(&tx, reservation_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
                })?;

            let plan = TransitionCore::plan_check_out(&reservation, remarks)?;
            Self::execute_plan_tx(&tx, &mut reservation, &plan.steps, staff_id)?;

            tx.commit()?;
            reservation
        };

        self.log_action(
            ActionLog::new(
                Some(reservation_id.to_string()),
                ActionType::CheckOut,
                staff_id,
                Utc::now().naive_utc(),
            )
            .with_payload(&serde_json::json!({
                "remarks": remarks.trim(),
                "room_id": checked_out.room_id,
            }))
            .with_detail(format!("办理退房: {}", checked_out.guest_name)),
        );

        Ok(checked_out)
    }

    // ==========================================
    // 房态维护
    // ==========================================

    /// 维修停用/恢复房间
    ///
    /// # 规则
    /// - 入住中(OCCUPIED)的房间不可停用
    /// - 恢复时放回 AVAILABLE
    pub fn set_room_maintenance(
        &self,
        room_id: &str,
        under_maintenance: bool,
        actor: &str,
    ) -> ApiResult<Room> {
        let updated = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut room = RoomRepository::find_by_id_tx(&tx, room_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Room(id={})不存在", room_id)))?;

            if under_maintenance && room.status == RoomStatus::Occupied {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "入住中的房间不可停用: room_id={}",
                    room_id
                )));
            }

            let target = if under_maintenance {
                RoomStatus::Unavailable
            } else {
                RoomStatus::Available
            };

            RoomRepository::update_status_tx(&tx, room_id, target)?;
            room.status = target;

            tx.commit()?;
            room
        };

        self.log_action(
            ActionLog::new(None, ActionType::RoomMaintenance, actor, Utc::now().naive_utc())
                .with_payload(&serde_json::json!({
                    "room_id": room_id,
                    "under_maintenance": under_maintenance,
                }))
                .with_detail(format!("房态维护: {} → {}", room_id, updated.status)),
        );

        Ok(updated)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 按序执行迁移副作用清单
    ///
    /// 入住凭据必须引用同一事务内刚创建的支付记录
    fn execute_plan_tx(
        tx: &Transaction,
        reservation: &mut Reservation,
        steps: &[TransitionStep],
        staff_id: &str,
    ) -> ApiResult<()> {
        let now = ReservationValidator::normalize_minute(Utc::now().naive_utc());
        let mut payment_id: Option<String> = None;

        for step in steps {
            match step {
                TransitionStep::CreatePayment { amount } => {
                    let payment =
                        Payment::new(&reservation.reservation_id, *amount, staff_id, now);
                    PaymentRepository::insert_tx(tx, &payment)?;
                    payment_id = Some(payment.payment_id);
                }
                TransitionStep::CreateCheckInRecord => {
                    let payment_id = payment_id.as_deref().ok_or_else(|| {
                        ApiError::InternalError(
                            "入住凭据必须在支付记录之后创建".to_string(),
                        )
                    })?;
                    let record =
                        CheckInRecord::new(&reservation.reservation_id, payment_id, staff_id, now);
                    CheckRecordRepository::insert_check_in_tx(tx, &record)?;
                }
                TransitionStep::CreateCheckOutRecord { remarks } => {
                    let record =
                        CheckOutRecord::new(&reservation.reservation_id, staff_id, remarks, now);
                    CheckRecordRepository::insert_check_out_tx(tx, &record)?;
                }
                TransitionStep::SetReservationStatus(status) => {
                    ReservationRepository::set_status_tx(tx, &reservation.reservation_id, *status)?;
                    reservation.status = *status;
                }
                TransitionStep::SetRoomStatus(status) => {
                    RoomRepository::update_status_tx(tx, &reservation.room_id, *status)?;
                }
            }
        }

        Ok(())
    }

    /// 审计日志写入失败只告警,不影响业务结果
    fn log_action(&self, log: ActionLog) {
        if let Err(e) = self.action_log_repo.insert(&log) {
            tracing::warn!("记录操作日志失败: {}", e);
        }
    }
}

/// 供测试/上层探查的辅助查询
impl FrontDeskApi {
    /// 查询预订
    pub fn get_reservation(&self, reservation_id: &str) -> ApiResult<Reservation> {
        self.reservation_repo
            .find_by_id(reservation_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
            })
    }
}
