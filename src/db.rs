// ==========================================
// 酒店前台预订系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 统一建库入口（init_schema），保证测试库与演示库结构一致
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：版本号用于提示/告警（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库结构
///
/// # 表清单
/// - room_category / room: 房型与客房
/// - service_catalog: 附加服务目录
/// - reservation / reservation_service_line: 预订与服务明细
/// - payment / check_in_record / check_out_record: 入住结账凭据
/// - action_log: 操作审计
/// - config_kv / schema_version: 配置与版本
///
/// # 约束
/// - check_in_record / check_out_record 对 reservation_id 唯一，
///   保证每个预订最多产生一次入住/退房凭据
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS room_category (
            category_id TEXT PRIMARY KEY,
            category_name TEXT NOT NULL,
            price REAL NOT NULL,
            capacity INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS room (
            room_id TEXT PRIMARY KEY,
            room_no TEXT NOT NULL UNIQUE,
            category_id TEXT NOT NULL REFERENCES room_category(category_id),
            status TEXT NOT NULL DEFAULT 'AVAILABLE'
        );

        CREATE TABLE IF NOT EXISTS service_catalog (
            service_id TEXT PRIMARY KEY,
            service_name TEXT NOT NULL,
            price REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reservation (
            reservation_id TEXT PRIMARY KEY,
            room_id TEXT NOT NULL REFERENCES room(room_id),
            guest_name TEXT NOT NULL,
            guest_contact TEXT NOT NULL,
            party_size INTEGER NOT NULL,
            check_in_at TEXT NOT NULL,
            check_out_at TEXT NOT NULL,
            status TEXT NOT NULL,
            amount REAL NOT NULL,
            user_id TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_reservation_room ON reservation(room_id, status);

        CREATE TABLE IF NOT EXISTS reservation_service_line (
            reservation_id TEXT NOT NULL REFERENCES reservation(reservation_id),
            service_id TEXT NOT NULL REFERENCES service_catalog(service_id),
            quantity INTEGER NOT NULL,
            line_total REAL NOT NULL,
            PRIMARY KEY (reservation_id, service_id)
        );

        CREATE TABLE IF NOT EXISTS payment (
            payment_id TEXT PRIMARY KEY,
            reservation_id TEXT NOT NULL REFERENCES reservation(reservation_id),
            amount REAL NOT NULL,
            staff_id TEXT NOT NULL,
            paid_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS check_in_record (
            record_id TEXT PRIMARY KEY,
            reservation_id TEXT NOT NULL UNIQUE REFERENCES reservation(reservation_id),
            payment_id TEXT NOT NULL REFERENCES payment(payment_id),
            staff_id TEXT NOT NULL,
            checked_in_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS check_out_record (
            record_id TEXT PRIMARY KEY,
            reservation_id TEXT NOT NULL UNIQUE REFERENCES reservation(reservation_id),
            staff_id TEXT NOT NULL,
            remarks TEXT NOT NULL,
            checked_out_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            reservation_id TEXT,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            detail TEXT
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}
