// ==========================================
// 酒店前台预订系统 - 预订生命周期 API
// ==========================================
// 依据: FrontDesk_Engine_Specs.md - 4. 预订状态机
// 职责: 预订创建、更新、确认、取消、删除与可用性探查
// 红线1: 禁止双重预订 - 检查与写入在同一写锁事务内完成
// 红线5: 事务原子性 - 任何业务拒绝发生时整体放弃,零部分写入
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::ReservationValidator;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::reservation::{Reservation, ReservationServiceLine};
use crate::domain::room::Room;
use crate::domain::types::{ReservationStatus, RoomStatus};
use crate::engine::availability::{AvailabilityDecision, AvailabilityEngine};
use crate::engine::notifier::{
    NotificationKind, OptionalNotifier, ReservationNotifier, ReservationSnapshot,
};
use crate::engine::transition::{TransitionCore, TransitionStep};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::reservation_repo::ReservationRepository;
use crate::repository::room_repo::RoomRepository;
use crate::repository::service_repo::ServiceCatalogRepository;

// ==========================================
// 请求 DTO
// ==========================================

/// 服务明细请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLineRequest {
    pub service_id: String,
    pub quantity: i32,
}

/// 预订请求（创建/更新共用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub room_id: String,
    pub guest_name: String,
    pub guest_contact: String,
    pub party_size: i32,
    pub check_in_at: NaiveDateTime,
    pub check_out_at: NaiveDateTime,
    pub services: Vec<ServiceLineRequest>,
    pub user_id: Option<String>,
    /// 创建时的初始状态（仅允许 PENDING/CONFIRMED,前台代客预订可直接确认）
    pub initial_status: Option<ReservationStatus>,
}

// ==========================================
// ReservationApi - 预订生命周期 API
// ==========================================

/// 预订生命周期API
///
/// 职责：
/// 1. 创建预订（可用性检查 + 金额快照 + 服务明细挂接）
/// 2. 更新预订（剔除自身的可用性复检 + 明细全量替换）
/// 3. 确认/取消/删除
/// 4. 可用性探查
pub struct ReservationApi {
    conn: Arc<Mutex<Connection>>,
    reservation_repo: Arc<ReservationRepository>,
    room_repo: Arc<RoomRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    availability_engine: Arc<AvailabilityEngine>,
    // 通知发送器（依赖倒置：邮件网关在外层实现）
    notifier: OptionalNotifier,
}

impl ReservationApi {
    /// 创建新的ReservationApi实例
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        reservation_repo: Arc<ReservationRepository>,
        room_repo: Arc<RoomRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        availability_engine: Arc<AvailabilityEngine>,
        notifier: Option<Arc<dyn ReservationNotifier>>,
    ) -> Self {
        let notifier = match notifier {
            Some(n) => OptionalNotifier::with_notifier(n),
            None => OptionalNotifier::none(),
        };

        Self {
            conn,
            reservation_repo,
            room_repo,
            action_log_repo,
            availability_engine,
            notifier,
        }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> ApiResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::InternalError(format!("锁获取失败: {}", e)))
    }

    // ==========================================
    // 创建预订
    // ==========================================

    /// 创建预订
    ///
    /// # 流程
    /// 1. 字段校验 + 时间戳归一化（整分钟）
    /// 2. 写锁事务内: 加载房间/房型 → 可用性检查（不剔除） →
    ///    金额快照（间夜×房价 + 服务明细） → 插入预订与明细 → 提交
    /// 3. 提交后: 记审计日志、尽力发送确认通知（失败只告警）
    ///
    /// # 返回
    /// - Ok(Reservation): 新建预订
    /// - Err(ApiError::AvailabilityConflict): 冲突,携带最早可订时间
    pub async fn create_reservation(&self, req: ReservationRequest) -> ApiResult<Reservation> {
        let check_in_at = ReservationValidator::normalize_minute(req.check_in_at);
        let check_out_at = ReservationValidator::normalize_minute(req.check_out_at);

        ReservationValidator::validate_guest(&req.guest_name, &req.guest_contact)?;
        ReservationValidator::validate_window(check_in_at, check_out_at)?;

        let status = match req.initial_status {
            None => ReservationStatus::Pending,
            Some(s @ (ReservationStatus::Pending | ReservationStatus::Confirmed)) => s,
            Some(other) => {
                return Err(ApiError::InvalidInput(format!(
                    "初始状态仅允许PENDING/CONFIRMED: {}",
                    other
                )))
            }
        };

        // 缓冲小时数在进入写锁事务之前读取（配置与业务共用连接）
        let buffer_hours = self
            .availability_engine
            .buffer_hours()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let reservation = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // 1. 加载房间与房型
            let room = RoomRepository::find_by_id_tx(&tx, &req.room_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Room(id={})不存在", req.room_id)))?;
            let category =
                RoomRepository::find_category_tx(&tx, &room.category_id)?.ok_or_else(|| {
                    ApiError::NotFound(format!("RoomCategory(id={})不存在", room.category_id))
                })?;

            ReservationValidator::validate_party_size(req.party_size, category.capacity)?;

            // 2. 可用性检查（红线1: 与写入同一写锁事务）
            let blocking =
                ReservationRepository::find_blocking_intervals_tx(&tx, &req.room_id, None)?;
            if let AvailabilityDecision::Conflict { ready_at } =
                self.availability_engine
                    .check(check_in_at, check_out_at, &blocking, buffer_hours)
            {
                return Err(ApiError::AvailabilityConflict {
                    room_id: req.room_id.clone(),
                    ready_at,
                });
            }

            // 3. 金额快照: 间夜×房价 + 服务明细（挂接时价格×数量）
            let reservation_id = uuid::Uuid::new_v4().to_string();
            let mut reservation = Reservation {
                reservation_id: reservation_id.clone(),
                room_id: req.room_id.clone(),
                guest_name: req.guest_name.trim().to_string(),
                guest_contact: req.guest_contact.trim().to_string(),
                party_size: req.party_size,
                check_in_at,
                check_out_at,
                status,
                amount: 0.0,
                user_id: req.user_id.clone(),
                created_at: ReservationValidator::normalize_minute(Utc::now().naive_utc()),
            };

            let lines = Self::capture_service_lines(&tx, &reservation_id, &req.services)?;
            let service_total: f64 = lines.iter().map(|l| l.line_total).sum();
            reservation.amount = reservation.nights() as f64 * category.price + service_total;

            // 4. 落库
            ReservationRepository::insert_tx(&tx, &reservation)?;
            ReservationRepository::replace_service_lines_tx(&tx, &reservation_id, &lines)?;

            // 房态: 空闲房间落位后转 BOOKED（运维视角）
            if room.status == RoomStatus::Available {
                RoomRepository::update_status_tx(&tx, &room.room_id, RoomStatus::Booked)?;
            }

            tx.commit()?;
            reservation
        };

        self.log_action(
            ActionLog::new(
                Some(reservation.reservation_id.clone()),
                ActionType::CreateReservation,
                reservation.user_id.as_deref().unwrap_or("front-desk"),
                Utc::now().naive_utc(),
            )
            .with_payload(&serde_json::json!({
                "room_id": reservation.room_id,
                "check_in_at": reservation.check_in_at,
                "check_out_at": reservation.check_out_at,
                "amount": reservation.amount,
            }))
            .with_detail(format!(
                "创建预订: {} {}间夜",
                reservation.guest_name,
                reservation.nights()
            )),
        );

        // 提交后尽力发送确认通知,失败绝不回滚/上抛
        self.notifier
            .notify_best_effort(
                NotificationKind::BookingConfirmation,
                &ReservationSnapshot::from(&reservation),
            )
            .await;

        Ok(reservation)
    }

    // ==========================================
    // 更新预订
    // ==========================================

    /// 更新预订
    ///
    /// # 流程
    /// 1. 字段校验 + 归一化
    /// 2. 写锁事务内: 重读预订（仅 PENDING/CONFIRMED 可更新） →
    ///    剔除自身的可用性复检 → 服务明细全量替换（按当前目录价重新快照） →
    ///    金额重算 → 提交
    ///
    /// # 返回
    /// - Ok(Reservation): 更新后的预订
    pub fn update_reservation(
        &self,
        reservation_id: &str,
        req: ReservationRequest,
    ) -> ApiResult<Reservation> {
        let check_in_at = ReservationValidator::normalize_minute(req.check_in_at);
        let check_out_at = ReservationValidator::normalize_minute(req.check_out_at);

        ReservationValidator::validate_guest(&req.guest_name, &req.guest_contact)?;
        ReservationValidator::validate_window(check_in_at, check_out_at)?;

        let buffer_hours = self
            .availability_engine
            .buffer_hours()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let updated = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing = ReservationRepository::find_by_id_tx(&tx, reservation_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
                })?;

            // 入住后/终态预订不可再改
            if !matches!(
                existing.status,
                ReservationStatus::Pending | ReservationStatus::Confirmed
            ) {
                return Err(ApiError::InvalidStateTransition {
                    from: existing.status.to_string(),
                    action: "update".to_string(),
                });
            }

            let room = RoomRepository::find_by_id_tx(&tx, &req.room_id)?
                .ok_or_else(|| ApiError::NotFound(format!("Room(id={})不存在", req.room_id)))?;
            let category =
                RoomRepository::find_category_tx(&tx, &room.category_id)?.ok_or_else(|| {
                    ApiError::NotFound(format!("RoomCategory(id={})不存在", room.category_id))
                })?;

            ReservationValidator::validate_party_size(req.party_size, category.capacity)?;

            // 可用性复检: 剔除自身,避免与旧时间窗自冲突
            let blocking = ReservationRepository::find_blocking_intervals_tx(
                &tx,
                &req.room_id,
                Some(reservation_id),
            )?;
            if let AvailabilityDecision::Conflict { ready_at } =
                self.availability_engine
                    .check(check_in_at, check_out_at, &blocking, buffer_hours)
            {
                return Err(ApiError::AvailabilityConflict {
                    room_id: req.room_id.clone(),
                    ready_at,
                });
            }

            // 服务明细全量替换,按当前目录价重新快照
            let lines = Self::capture_service_lines(&tx, reservation_id, &req.services)?;
            let service_total: f64 = lines.iter().map(|l| l.line_total).sum();

            let mut updated = Reservation {
                room_id: req.room_id.clone(),
                guest_name: req.guest_name.trim().to_string(),
                guest_contact: req.guest_contact.trim().to_string(),
                party_size: req.party_size,
                check_in_at,
                check_out_at,
                ..existing.clone()
            };
            updated.amount = updated.nights() as f64 * category.price + service_total;

            ReservationRepository::update_fields_tx(&tx, &updated)?;
            ReservationRepository::replace_service_lines_tx(&tx, reservation_id, &lines)?;

            // 换房时维护两侧房态
            if existing.room_id != req.room_id {
                Self::release_room_if_idle_tx(&tx, &existing.room_id, reservation_id)?;
                if room.status == RoomStatus::Available {
                    RoomRepository::update_status_tx(&tx, &room.room_id, RoomStatus::Booked)?;
                }
            }

            tx.commit()?;
            updated
        };

        self.log_action(
            ActionLog::new(
                Some(reservation_id.to_string()),
                ActionType::UpdateReservation,
                updated.user_id.as_deref().unwrap_or("front-desk"),
                Utc::now().naive_utc(),
            )
            .with_payload(&serde_json::json!({
                "room_id": updated.room_id,
                "check_in_at": updated.check_in_at,
                "check_out_at": updated.check_out_at,
                "amount": updated.amount,
            }))
            .with_detail("修改预订".to_string()),
        );

        Ok(updated)
    }

    // ==========================================
    // 确认 / 取消 / 删除
    // ==========================================

    /// 确认预订（外部邮件验证完成后的回调）
    pub fn confirm_reservation(&self, reservation_id: &str, actor: &str) -> ApiResult<Reservation> {
        let confirmed = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut reservation = ReservationRepository::find_by_id_tx(&tx, reservation_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
                })?;

            let plan = TransitionCore::plan_confirm(&reservation)?;
            Self::apply_status_steps_tx(&tx, &mut reservation, &plan.steps)?;

            tx.commit()?;
            reservation
        };

        self.log_action(
            ActionLog::new(
                Some(reservation_id.to_string()),
                ActionType::ConfirmReservation,
                actor,
                Utc::now().naive_utc(),
            )
            .with_detail("确认预订".to_string()),
        );

        Ok(confirmed)
    }

    /// 取消预订
    ///
    /// # 规则
    /// - 仅 PENDING/CONFIRMED 可取消
    /// - 同房间无其他占用预订时,BOOKED 房态连带放回 AVAILABLE
    /// - 提交后尽力发送取消通知
    pub async fn cancel_reservation(
        &self,
        reservation_id: &str,
        actor: &str,
    ) -> ApiResult<Reservation> {
        let cancelled = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut reservation = ReservationRepository::find_by_id_tx(&tx, reservation_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
                })?;
            let room = RoomRepository::find_by_id_tx(&tx, &reservation.room_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Room(id={})不存在", reservation.room_id))
                })?;

            let others = ReservationRepository::find_blocking_intervals_tx(
                &tx,
                &reservation.room_id,
                Some(reservation_id),
            )?;

            let plan = TransitionCore::plan_cancel(&reservation, &room, !others.is_empty())?;
            Self::apply_status_steps_tx(&tx, &mut reservation, &plan.steps)?;

            tx.commit()?;
            reservation
        };

        self.log_action(
            ActionLog::new(
                Some(reservation_id.to_string()),
                ActionType::CancelReservation,
                actor,
                Utc::now().naive_utc(),
            )
            .with_detail(format!("取消预订: {}", cancelled.guest_name)),
        );

        self.notifier
            .notify_best_effort(
                NotificationKind::BookingCancelled,
                &ReservationSnapshot::from(&cancelled),
            )
            .await;

        Ok(cancelled)
    }

    /// 删除预订
    ///
    /// # 规则
    /// - 入住中/已退房的预订不可删除
    ///   (前者住客在店,后者挂有支付与凭据,且缓冲期内仍占用日历)
    /// - 先卸载服务明细再删除预订行,保持引用完整性
    pub fn delete_reservation(&self, reservation_id: &str, actor: &str) -> ApiResult<()> {
        let deleted = {
            let mut conn = self.get_conn()?;
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let reservation = ReservationRepository::find_by_id_tx(&tx, reservation_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
                })?;

            if matches!(
                reservation.status,
                ReservationStatus::CheckedIn | ReservationStatus::CheckedOut
            ) {
                return Err(ApiError::InvalidStateTransition {
                    from: reservation.status.to_string(),
                    action: "delete".to_string(),
                });
            }

            // 先卸明细,再删主行
            ReservationRepository::delete_service_lines_tx(&tx, reservation_id)?;
            ReservationRepository::delete_tx(&tx, reservation_id)?;

            Self::release_room_if_idle_tx(&tx, &reservation.room_id, reservation_id)?;

            tx.commit()?;
            reservation
        };

        self.log_action(
            ActionLog::new(
                Some(reservation_id.to_string()),
                ActionType::DeleteReservation,
                actor,
                Utc::now().naive_utc(),
            )
            .with_payload(&serde_json::json!({
                "room_id": deleted.room_id,
                "status_at_delete": deleted.status,
                "guest_name": deleted.guest_name,
            }))
            .with_detail("删除预订".to_string()),
        );

        Ok(())
    }

    // ==========================================
    // 可用性探查
    // ==========================================

    /// 可用性探查（只读,幂等）
    ///
    /// # 返回
    /// - Ok(()): 时间窗可预订
    /// - Err(ApiError::AvailabilityConflict): 冲突,携带最早可订时间
    pub fn check_availability(
        &self,
        room_id: &str,
        check_in_at: NaiveDateTime,
        check_out_at: NaiveDateTime,
        exclude_reservation_id: Option<&str>,
    ) -> ApiResult<()> {
        let check_in_at = ReservationValidator::normalize_minute(check_in_at);
        let check_out_at = ReservationValidator::normalize_minute(check_out_at);
        ReservationValidator::validate_window(check_in_at, check_out_at)?;

        let buffer_hours = self
            .availability_engine
            .buffer_hours()
            .map_err(|e| ApiError::InternalError(e.to_string()))?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if RoomRepository::find_by_id_tx(&tx, room_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Room(id={})不存在", room_id)));
        }

        let blocking = ReservationRepository::find_blocking_intervals_tx(
            &tx,
            room_id,
            exclude_reservation_id,
        )?;

        match self
            .availability_engine
            .check(check_in_at, check_out_at, &blocking, buffer_hours)
        {
            AvailabilityDecision::Ok => Ok(()),
            AvailabilityDecision::Conflict { ready_at } => Err(ApiError::AvailabilityConflict {
                room_id: room_id.to_string(),
                ready_at,
            }),
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 在事务内按当前目录价捕捉服务明细快照
    fn capture_service_lines(
        tx: &Transaction,
        reservation_id: &str,
        requests: &[ServiceLineRequest],
    ) -> ApiResult<Vec<ReservationServiceLine>> {
        let mut lines = Vec::with_capacity(requests.len());

        for req in requests {
            ReservationValidator::validate_service_quantity(&req.service_id, req.quantity)?;

            let item = ServiceCatalogRepository::find_by_id_tx(tx, &req.service_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("ServiceItem(id={})不存在", req.service_id))
                })?;

            lines.push(ReservationServiceLine {
                reservation_id: reservation_id.to_string(),
                service_id: req.service_id.clone(),
                quantity: req.quantity,
                line_total: item.price * req.quantity as f64,
            });
        }

        Ok(lines)
    }

    /// 执行状态翻转类副作用（确认/取消共用）
    fn apply_status_steps_tx(
        tx: &Transaction,
        reservation: &mut Reservation,
        steps: &[TransitionStep],
    ) -> ApiResult<()> {
        for step in steps {
            match step {
                TransitionStep::SetReservationStatus(status) => {
                    ReservationRepository::set_status_tx(tx, &reservation.reservation_id, *status)?;
                    reservation.status = *status;
                }
                TransitionStep::SetRoomStatus(status) => {
                    RoomRepository::update_status_tx(tx, &reservation.room_id, *status)?;
                }
                other => {
                    return Err(ApiError::InternalError(format!(
                        "生命周期操作不支持的副作用: {:?}",
                        other
                    )))
                }
            }
        }
        Ok(())
    }

    /// 同房间已无其他占用预订时,把 BOOKED 房态放回 AVAILABLE
    ///
    /// OCCUPIED/UNAVAILABLE 不在此处触碰: 前者由退房流程管理,后者属运维
    fn release_room_if_idle_tx(
        tx: &Transaction,
        room_id: &str,
        exclude_reservation_id: &str,
    ) -> ApiResult<()> {
        let room = match RoomRepository::find_by_id_tx(tx, room_id)? {
            Some(r) => r,
            None => return Ok(()),
        };

        if room.status != RoomStatus::Booked {
            return Ok(());
        }

        let others = ReservationRepository::find_blocking_intervals_tx(
            tx,
            room_id,
            Some(exclude_reservation_id),
        )?;
        if others.is_empty() {
            RoomRepository::update_status_tx(tx, room_id, RoomStatus::Available)?;
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

/// 供测试/上层探查的房态辅助查询
impl ReservationApi {
    /// 查询预订（含服务明细）
    pub fn get_reservation(
        &self,
        reservation_id: &str,
    ) -> ApiResult<(Reservation, Vec<ReservationServiceLine>)> {
        let reservation = self
            .reservation_repo
            .find_by_id(reservation_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Reservation(id={})不存在", reservation_id))
            })?;
        let lines = self.reservation_repo.find_service_lines(reservation_id)?;
        Ok((reservation, lines))
    }

    /// 查询房间
    pub fn get_room(&self, room_id: &str) -> ApiResult<Room> {
        self.room_repo
            .find_by_id(room_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Room(id={})不存在", room_id)))
    }
}
