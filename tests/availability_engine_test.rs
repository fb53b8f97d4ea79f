// ==========================================
// 可用性引擎集成测试
// ==========================================
// 职责: 验证缓冲期边界、探查幂等性、更新自排除与并发串行化
// ==========================================


use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use hotel_frontdesk::api::{ApiError, ReservationApi};
use hotel_frontdesk::config::ConfigManager;
use hotel_frontdesk::db::open_sqlite_connection;
use hotel_frontdesk::domain::types::ReservationStatus;
use hotel_frontdesk::engine::AvailabilityEngine;
use hotel_frontdesk::repository::{
    ActionLogRepository, ReservationRepository, RoomRepository,
};

use test_helpers::{dt, request, seed_basic, setup_env};

// ==========================================
// 测试 1: 缓冲期边界（通过 API 全链路）
// ==========================================

#[tokio::test]
async fn test_buffer_boundary_through_api() {
    let env = setup_env();
    seed_basic(&env);

    // 既有预订: 6/1 14:00 → 6/2 12:00,缓冲3小时 ⇒ 阻断至 6/2 15:00
    let mut req = request("RM201", dt(2024, 6, 1, 14, 0), dt(2024, 6, 2, 12, 0));
    req.initial_status = Some(ReservationStatus::Confirmed);
    env.reservation_api.create_reservation(req).await.unwrap();

    // 缓冲期内的请求被拒,错误携带最早可订时间 15:00
    let err = env
        .reservation_api
        .check_availability("RM201", dt(2024, 6, 2, 14, 0), dt(2024, 6, 2, 16, 0), None)
        .unwrap_err();
    match err {
        ApiError::AvailabilityConflict { room_id, ready_at } => {
            assert_eq!(room_id, "RM201");
            assert_eq!(ready_at, dt(2024, 6, 2, 15, 0));
        }
        other => panic!("Expected AvailabilityConflict, got {:?}", other),
    }

    // 恰好从缓冲结束时刻开始的请求成功
    env.reservation_api
        .check_availability("RM201", dt(2024, 6, 2, 15, 0), dt(2024, 6, 2, 17, 0), None)
        .unwrap();

    let second = env
        .reservation_api
        .create_reservation(request(
            "RM201",
            dt(2024, 6, 2, 15, 0),
            dt(2024, 6, 2, 17, 0),
        ))
        .await
        .unwrap();
    assert_eq!(second.status, ReservationStatus::Pending);

    // 另一间客房不受影响
    env.reservation_api
        .check_availability("RM202", dt(2024, 6, 2, 14, 0), dt(2024, 6, 2, 16, 0), None)
        .unwrap();
}

// ==========================================
// 测试 2: 探查幂等性
// ==========================================

#[tokio::test]
async fn test_probe_is_idempotent_without_writes() {
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

    let probe = || {
        env.reservation_api.check_availability(
            "RM201",
            dt(2024, 6, 2, 13, 0),
            dt(2024, 6, 2, 14, 0),
            None,
        )
    };

    let first = probe();
    let second = probe();

    // 两次结果一致,且都携带同一 ready_at
    match (first.unwrap_err(), second.unwrap_err()) {
        (
            ApiError::AvailabilityConflict { ready_at: a, .. },
            ApiError::AvailabilityConflict { ready_at: b, .. },
        ) => assert_eq!(a, b),
        _ => panic!("Expected two identical AvailabilityConflict"),
    }
}

// ==========================================
// 测试 3: 更新自排除
// ==========================================

#[tokio::test]
async fn test_update_excludes_own_interval() {
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

    // 新窗口与自身旧窗口重叠,但剔除自身后不构成冲突
    let updated = env
        .reservation_api
        .update_reservation(
            &created.reservation_id,
            request("RM201", dt(2024, 6, 1, 15, 0), dt(2024, 6, 2, 13, 0)),
        )
        .unwrap();

    assert_eq!(updated.check_in_at, dt(2024, 6, 1, 15, 0));
    assert_eq!(updated.check_out_at, dt(2024, 6, 2, 13, 0));

    // 探查接口同样支持剔除自身
    env.reservation_api
        .check_availability(
            "RM201",
            dt(2024, 6, 1, 16, 0),
            dt(2024, 6, 2, 11, 0),
            Some(&created.reservation_id),
        )
        .unwrap();
}

// ==========================================
// 测试 4: 并发创建串行化（红线1）
// ==========================================

/// 基于独立连接构建 ReservationApi,模拟两个并发请求处理单元
fn build_api_over_new_connection(db_path: &str) -> ReservationApi {
    let conn = Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()));
    let config = Arc::new(ConfigManager::from_connection(conn.clone()).unwrap());

    ReservationApi::new(
        conn.clone(),
        Arc::new(ReservationRepository::new(conn.clone())),
        Arc::new(RoomRepository::new(conn.clone())),
        Arc::new(ActionLogRepository::new(conn)),
        Arc::new(AvailabilityEngine::new(config)),
        None,
    )
}

#[test]
fn test_concurrent_creates_serialize_second_rejected() {
    let env = setup_env();
    seed_basic(&env);
    let db_path = env.db_path.clone();

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();

    for _ in 0..2 {
        let db_path = db_path.clone();
        let barrier = barrier.clone();

        handles.push(thread::spawn(move || {
            let api = build_api_over_new_connection(&db_path);
            let rt = tokio::runtime::Runtime::new().unwrap();

            // 两个线程同时发起重叠窗口的创建请求
            barrier.wait();
            rt.block_on(api.create_reservation(request(
                "RM201",
                dt(2024, 6, 1, 14, 0),
                dt(2024, 6, 2, 12, 0),
            )))
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    let conflict_count = results
        .iter()
        .filter(|r| matches!(r, Err(ApiError::AvailabilityConflict { .. })))
        .count();

    // 恰好一个成功,另一个观察到先提交者并被拒绝
    assert_eq!(ok_count, 1, "exactly one create must win: {:?}", results);
    assert_eq!(conflict_count, 1, "loser must see conflict: {:?}", results);

    // 库里只有一条占用预订
    let reservations = env.reservation_repo.list_by_room("RM201").unwrap();
    assert_eq!(reservations.len(), 1);
}
