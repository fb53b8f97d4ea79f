// ==========================================
// 预订生命周期 API 集成测试
// ==========================================
// 职责: 验证创建/更新/确认/取消/删除与金额快照、通知隔离
// ==========================================


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hotel_frontdesk::api::ApiError;
use hotel_frontdesk::domain::types::{ReservationStatus, RoomStatus};
use hotel_frontdesk::engine::{NotificationKind, ReservationNotifier, ReservationSnapshot};

use test_helpers::{
    dt, request, request_with_services, seed_basic, setup_env, setup_env_with_notifier,
};

// ==========================================
// 测试 1: 创建与金额快照
// ==========================================

#[tokio::test]
async fn test_create_captures_amount_snapshot() {
    let env = setup_env();
    seed_basic(&env);

    // 两晚×3000 + 早餐180×2 + 接机450×1 = 6810
    let created = env
        .reservation_api
        .create_reservation(request_with_services(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 3, 12, 0),
            vec![("S001", 2), ("S002", 1)],
        ))
        .await
        .unwrap();

    assert_eq!(created.status, ReservationStatus::Pending);
    assert!((created.amount - 6810.0).abs() < f64::EPSILON);

    let (_reservation, lines) = env
        .reservation_api
        .get_reservation(&created.reservation_id)
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert!((lines[0].line_total - 360.0).abs() < f64::EPSILON); // S001: 180×2
    assert!((lines[1].line_total - 450.0).abs() < f64::EPSILON); // S002: 450×1

    // 空闲客房落位后转 BOOKED
    let room = env.reservation_api.get_room("RM201").unwrap();
    assert_eq!(room.status, RoomStatus::Booked);
}

#[tokio::test]
async fn test_create_normalizes_timestamps_to_minute() {
    let env = setup_env();
    seed_basic(&env);

    let mut req = request("RM201", dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0));
    req.check_in_at = req.check_in_at + chrono::Duration::seconds(42);
    req.check_out_at = req.check_out_at + chrono::Duration::seconds(59);

    let created = env.reservation_api.create_reservation(req).await.unwrap();
    assert_eq!(created.check_in_at, dt(2024, 6, 1, 14, 0));
    assert_eq!(created.check_out_at, dt(2024, 6, 2, 12, 0));
}

#[tokio::test]
async fn test_create_rejects_invalid_input() {
    let env = setup_env();
    seed_basic(&env);

    // 时间窗倒置
    let err = env
        .reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 2, 12, 0),
            dt(2024, 6, 1, 14, 0),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 人数超过房型可住人数
    let mut req = request("RM201", dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0));
    req.party_size = 5;
    let err = env.reservation_api.create_reservation(req).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 客房不存在
    let err = env
        .reservation_api
        .create_reservation(request(
            "NO_SUCH_ROOM",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 任何拒绝都不留下部分写入
    assert!(env.reservation_repo.list_by_room("RM201").unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejects_conflict_without_partial_writes() {
    let env = setup_env();
    seed_basic(&env);

    env.reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
        ))
        .await
        .unwrap();

    // 重叠窗口带服务明细,拒绝后明细不得残留
    let err = env
        .reservation_api
        .create_reservation(request_with_services(
            "RM201",
            dt(2024, 6, 1, 20, 0),
            dt(2024, 6, 2, 10, 0),
            vec![("S001", 1)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AvailabilityConflict { .. }));

    assert_eq!(env.reservation_repo.list_by_room("RM201").unwrap().len(), 1);
}

// ==========================================
// 测试 2: 更新与明细全量替换
// ==========================================

#[tokio::test]
async fn test_update_replaces_service_lines_at_current_price() {
    let env = setup_env();
    seed_basic(&env);

    let created = env
        .reservation_api
        .create_reservation(request_with_services(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
            vec![("S001", 2)], // 早餐 180×2 = 360
        ))
        .await
        .unwrap();
    assert!((created.amount - 3360.0).abs() < f64::EPSILON);

    // 目录调价: 早餐 180 → 200
    env.service_repo.update_price("S001", 200.0).unwrap();

    // 更新全量替换明细,按当前目录价重新快照: 一晚3000 + 200×1 + 450×1
    let updated = env
        .reservation_api
        .update_reservation(
            &created.reservation_id,
            request_with_services(
                "RM201",
                dt(2024, 6, 1, 14, 0),
                dt(2024, 6, 2, 12, 0),
                vec![("S001", 1), ("S002", 1)],
            ),
        )
        .unwrap();
    assert!((updated.amount - 3650.0).abs() < f64::EPSILON);

    let (_reservation, lines) = env
        .reservation_api
        .get_reservation(&created.reservation_id)
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert!((lines[0].line_total - 200.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_update_can_move_to_other_room() {
    let env = setup_env();
    seed_basic(&env);

    let created = env
        .reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
        ))
        .await
        .unwrap();

    let updated = env
        .reservation_api
        .update_reservation(
            &created.reservation_id,
            request("RM202", dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0)),
        )
        .unwrap();
    assert_eq!(updated.room_id, "RM202");

    // 原房间放回 AVAILABLE,新房间转 BOOKED
    assert_eq!(
        env.reservation_api.get_room("RM201").unwrap().status,
        RoomStatus::Available
    );
    assert_eq!(
        env.reservation_api.get_room("RM202").unwrap().status,
        RoomStatus::Booked
    );
}

#[tokio::test]
async fn test_update_rejected_for_terminal_status() {
    let env = setup_env();
    seed_basic(&env);

    let created = env
        .reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
        ))
        .await
        .unwrap();

    env.reservation_api
        .cancel_reservation(&created.reservation_id, "staff-7")
        .await
        .unwrap();

    let err = env
        .reservation_api
        .update_reservation(
            &created.reservation_id,
            request("RM201", dt(2024, 6, 5, 14, 0), dt(2024, 6, 6, 12, 0)),
        )
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
}

// ==========================================
// 测试 3: 确认 / 取消 / 删除
// ==========================================

#[tokio::test]
async fn test_confirm_then_cancel_releases_room() {
    let env = setup_env();
    seed_basic(&env);

    let created = env
        .reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
        ))
        .await
        .unwrap();

    let confirmed = env
        .reservation_api
        .confirm_reservation(&created.reservation_id, "guest")
        .unwrap();
    assert_eq!(confirmed.status, ReservationStatus::Confirmed);

    // 已确认不可重复确认
    let err = env
        .reservation_api
        .confirm_reservation(&created.reservation_id, "guest")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

    let cancelled = env
        .reservation_api
        .cancel_reservation(&created.reservation_id, "staff-7")
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);

    // 取消后释放日历与房态
    assert_eq!(
        env.reservation_api.get_room("RM201").unwrap().status,
        RoomStatus::Available
    );
    env.reservation_api
        .check_availability("RM201", dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0), None)
        .unwrap();
}

#[tokio::test]
async fn test_cancel_keeps_room_booked_when_others_remain() {
    let env = setup_env();
    seed_basic(&env);

    let first = env
        .reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
        ))
        .await
        .unwrap();
    env.reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 5, 14, 0),
            dt(2024, 6, 6, 12, 0),
        ))
        .await
        .unwrap();

    env.reservation_api
        .cancel_reservation(&first.reservation_id, "staff-7")
        .await
        .unwrap();

    // 同房间仍有另一条占用预订,房态保持 BOOKED
    assert_eq!(
        env.reservation_api.get_room("RM201").unwrap().status,
        RoomStatus::Booked
    );
}

#[tokio::test]
async fn test_delete_detaches_service_lines_first() {
    let env = setup_env();
    seed_basic(&env);

    let created = env
        .reservation_api
        .create_reservation(request_with_services(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
            vec![("S001", 1)],
        ))
        .await
        .unwrap();

    env.reservation_api
        .delete_reservation(&created.reservation_id, "staff-7")
        .unwrap();

    // 主行与明细都已删除
    let err = env
        .reservation_api
        .get_reservation(&created.reservation_id)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert!(env
        .reservation_repo
        .find_service_lines(&created.reservation_id)
        .unwrap()
        .is_empty());

    // 审计日志记录了操作人
    let logs = env
        .action_log_repo
        .list_by_reservation(&created.reservation_id)
        .unwrap();
    assert!(logs.iter().any(|l| l.action_type == "DeleteReservation" && l.actor == "staff-7"));
}

// ==========================================
// 测试 4: 通知隔离（失败只告警,不影响预订）
// ==========================================

/// 总是失败的通知发送器
struct AlwaysFailingNotifier {
    attempts: AtomicUsize,
}

#[async_trait]
impl ReservationNotifier for AlwaysFailingNotifier {
    async fn send(
        &self,
        _kind: NotificationKind,
        _snapshot: &ReservationSnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err("邮件网关不可用".into())
    }
}

#[tokio::test]
async fn test_notification_failure_never_fails_booking() {
    let failing = Arc::new(AlwaysFailingNotifier {
        attempts: AtomicUsize::new(0),
    });
    let env = setup_env_with_notifier(Some(failing.clone()));
    seed_basic(&env);

    // 创建成功,尽管确认邮件发送失败
    let created = env
        .reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 1, 14, 0),
            dt(2024, 6, 2, 12, 0),
        ))
        .await
        .unwrap();
    assert_eq!(failing.attempts.load(Ordering::SeqCst), 1);

    // 预订已持久化
    let (persisted, _) = env
        .reservation_api
        .get_reservation(&created.reservation_id)
        .unwrap();
    assert_eq!(persisted.status, ReservationStatus::Pending);

    // 取消同样成功,取消邮件失败同样被吞掉
    let cancelled = env
        .reservation_api
        .cancel_reservation(&created.reservation_id, "staff-7")
        .await
        .unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(failing.attempts.load(Ordering::SeqCst), 2);
}
