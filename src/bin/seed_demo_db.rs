// ==========================================
// 酒店前台预订系统 - 演示库重置与造数
// ==========================================
// 用法: seed_demo_db <db_path>
// 职责: 重建演示数据库,铺底房型/客房/服务目录,并创建一条已确认预订
// ==========================================

use chrono::{Duration, Utc};
use rusqlite::Connection;
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use hotel_frontdesk::api::{ReservationApi, ReservationRequest, ServiceLineRequest};
use hotel_frontdesk::config::ConfigManager;
use hotel_frontdesk::db::{init_schema, open_sqlite_connection};
use hotel_frontdesk::domain::room::{Room, RoomCategory};
use hotel_frontdesk::domain::reservation::ServiceItem;
use hotel_frontdesk::domain::types::{ReservationStatus, RoomStatus};
use hotel_frontdesk::engine::AvailabilityEngine;
use hotel_frontdesk::repository::{
    ActionLogRepository, ReservationRepository, RoomRepository, ServiceCatalogRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    hotel_frontdesk::logging::init();

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "frontdesk_demo.db".to_string());

    reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    let conn = Arc::new(Mutex::new(conn));
    seed_rooms_and_services(conn.clone())?;
    seed_demo_reservation(conn.clone()).await?;
    print_quick_counts(conn)?;

    tracing::info!("演示库就绪: {}", db_path);
    Ok(())
}

/// 删除旧库文件（含 WAL 附属文件）
fn reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    for suffix in ["", "-wal", "-shm"] {
        let path = format!("{}{}", db_path, suffix);
        if Path::new(&path).exists() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// 铺底房型/客房/服务目录
fn seed_rooms_and_services(conn: Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let room_repo = RoomRepository::new(conn.clone());
    let service_repo = ServiceCatalogRepository::new(conn);

    let categories = [
        ("C001", "标准双床房", 3000.0, 2),
        ("C002", "大床房", 3600.0, 2),
        ("C003", "家庭套房", 5200.0, 4),
    ];
    for (id, name, price, capacity) in categories {
        room_repo.insert_category(&RoomCategory {
            category_id: id.to_string(),
            category_name: name.to_string(),
            price,
            capacity,
        })?;
    }

    for (room_id, room_no, category_id) in [
        ("RM201", "201", "C001"),
        ("RM202", "202", "C001"),
        ("RM301", "301", "C002"),
        ("RM401", "401", "C003"),
    ] {
        room_repo.insert(&Room {
            room_id: room_id.to_string(),
            room_no: room_no.to_string(),
            category_id: category_id.to_string(),
            status: RoomStatus::Available,
        })?;
    }

    for (service_id, name, price) in [
        ("S001", "早餐", 180.0),
        ("S002", "接机", 450.0),
        ("S003", "洗衣", 120.0),
    ] {
        service_repo.insert(&ServiceItem {
            service_id: service_id.to_string(),
            service_name: name.to_string(),
            price,
        })?;
    }

    Ok(())
}

/// 创建一条已确认的演示预订（明天入住,住两晚,含早餐）
async fn seed_demo_reservation(conn: Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let config = Arc::new(ConfigManager::from_connection(conn.clone())?);
    let api = ReservationApi::new(
        conn.clone(),
        Arc::new(ReservationRepository::new(conn.clone())),
        Arc::new(RoomRepository::new(conn.clone())),
        Arc::new(ActionLogRepository::new(conn)),
        Arc::new(AvailabilityEngine::new(config)),
        None,
    );

    let check_in_at = Utc::now().naive_utc() + Duration::days(1);
    let reservation = api
        .create_reservation(ReservationRequest {
            room_id: "RM201".to_string(),
            guest_name: "示例住客".to_string(),
            guest_contact: "demo@example.com".to_string(),
            party_size: 2,
            check_in_at,
            check_out_at: check_in_at + Duration::days(2),
            services: vec![ServiceLineRequest {
                service_id: "S001".to_string(),
                quantity: 2,
            }],
            user_id: None,
            initial_status: Some(ReservationStatus::Confirmed),
        })
        .await?;

    tracing::info!(
        "演示预订已创建: reservation_id={}, amount={:.2}",
        reservation.reservation_id,
        reservation.amount
    );
    Ok(())
}

/// 打印各表行数,便于快速核对
fn print_quick_counts(conn: Arc<Mutex<Connection>>) -> Result<(), Box<dyn Error>> {
    let conn = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

    for table in [
        "room_category",
        "room",
        "service_catalog",
        "reservation",
        "reservation_service_line",
        "action_log",
    ] {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        tracing::info!("{}: {} rows", table, count);
    }

    Ok(())
}
