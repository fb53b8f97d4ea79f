// ==========================================
// 酒店前台预订系统 - 预订仓储
// ==========================================
// 职责: reservation / reservation_service_line 表数据访问
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::domain::reservation::{Reservation, ReservationServiceLine};
use crate::domain::types::ReservationStatus;
use crate::engine::overlap::BookedInterval;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

/// 时间戳统一存储格式（分钟级及以上精度）
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_ts(ts: NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub(crate) fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ==========================================
// ReservationRepository - 预订仓储
// ==========================================
pub struct ReservationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationRepository {
    /// 创建新的ReservationRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按reservation_id查询预订
    pub fn find_by_id(&self, reservation_id: &str) -> RepositoryResult<Option<Reservation>> {
        let conn = self.get_conn()?;
        Self::query_by_id(&conn, reservation_id)
    }

    /// 事务内按reservation_id查询预订
    ///
    /// 入住/退房等检查-写入流程必须使用本方法在写锁事务内重读,
    /// 避免基于过期快照做状态判定
    pub fn find_by_id_tx(
        tx: &Transaction,
        reservation_id: &str,
    ) -> RepositoryResult<Option<Reservation>> {
        Self::query_by_id(tx, reservation_id)
    }

    /// 按客房查询预订列表（创建时间降序）
    pub fn list_by_room(&self, room_id: &str) -> RepositoryResult<Vec<Reservation>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT reservation_id, room_id, guest_name, guest_contact, party_size,
                      check_in_at, check_out_at, status, amount, user_id, created_at
               FROM reservation
               WHERE room_id = ?
               ORDER BY created_at DESC"#,
        )?;

        let reservations = stmt
            .query_map(params![room_id], Self::map_row)?
            .collect::<Result<Vec<Reservation>, _>>()?;

        Ok(reservations)
    }

    /// 事务内插入预订
    pub fn insert_tx(tx: &Transaction, reservation: &Reservation) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO reservation (
                reservation_id, room_id, guest_name, guest_contact, party_size,
                check_in_at, check_out_at, status, amount, user_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &reservation.reservation_id,
                &reservation.room_id,
                &reservation.guest_name,
                &reservation.guest_contact,
                reservation.party_size,
                format_ts(reservation.check_in_at),
                format_ts(reservation.check_out_at),
                reservation.status.to_db_str(),
                reservation.amount,
                &reservation.user_id,
                format_ts(reservation.created_at),
            ],
        )?;

        Ok(())
    }

    /// 事务内更新预订主体字段
    ///
    /// 说明: status 不在此处更新,状态翻转走 set_status_tx,
    /// 保证状态机出口唯一
    pub fn update_fields_tx(tx: &Transaction, reservation: &Reservation) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"UPDATE reservation
               SET room_id = ?, guest_name = ?, guest_contact = ?, party_size = ?,
                   check_in_at = ?, check_out_at = ?, amount = ?
               WHERE reservation_id = ?"#,
            params![
                &reservation.room_id,
                &reservation.guest_name,
                &reservation.guest_contact,
                reservation.party_size,
                format_ts(reservation.check_in_at),
                format_ts(reservation.check_out_at),
                reservation.amount,
                &reservation.reservation_id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Reservation".to_string(),
                id: reservation.reservation_id.to_string(),
            });
        }

        Ok(())
    }

    /// 事务内翻转预订状态
    pub fn set_status_tx(
        tx: &Transaction,
        reservation_id: &str,
        status: ReservationStatus,
    ) -> RepositoryResult<()> {
        let affected = tx.execute(
            "UPDATE reservation SET status = ? WHERE reservation_id = ?",
            params![status.to_db_str(), reservation_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Reservation".to_string(),
                id: reservation_id.to_string(),
            });
        }

        Ok(())
    }

    /// 事务内删除预订行
    ///
    /// 约束: 调用方必须先 delete_service_lines_tx,保持引用完整性
    pub fn delete_tx(tx: &Transaction, reservation_id: &str) -> RepositoryResult<()> {
        let affected = tx.execute(
            "DELETE FROM reservation WHERE reservation_id = ?",
            params![reservation_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Reservation".to_string(),
                id: reservation_id.to_string(),
            });
        }

        Ok(())
    }

    /// 事务内查询同房间的占用区间集合
    ///
    /// # 参数
    /// - room_id: 客房ID
    /// - exclude_reservation_id: 更新场景下剔除自身,避免自冲突
    ///
    /// # 占用状态
    /// - PENDING / CONFIRMED / CHECKED_IN / CHECKED_OUT
    ///   (CHECKED_OUT 在清洁缓冲期内仍占用日历)
    pub fn find_blocking_intervals_tx(
        tx: &Transaction,
        room_id: &str,
        exclude_reservation_id: Option<&str>,
    ) -> RepositoryResult<Vec<BookedInterval>> {
        let mut stmt = tx.prepare(
            r#"SELECT reservation_id, check_in_at, check_out_at
               FROM reservation
               WHERE room_id = ?1
                 AND status IN ('PENDING', 'CONFIRMED', 'CHECKED_IN', 'CHECKED_OUT')
                 AND (?2 IS NULL OR reservation_id <> ?2)
               ORDER BY check_in_at ASC"#,
        )?;

        let intervals = stmt
            .query_map(params![room_id, exclude_reservation_id], |row| {
                let check_in_raw: String = row.get(1)?;
                let check_out_raw: String = row.get(2)?;
                Ok(BookedInterval {
                    reservation_id: row.get(0)?,
                    check_in_at: parse_ts(1, &check_in_raw)?,
                    check_out_at: parse_ts(2, &check_out_raw)?,
                })
            })?
            .collect::<Result<Vec<BookedInterval>, _>>()?;

        Ok(intervals)
    }

    // ==========================================
    // 服务明细
    // ==========================================

    /// 事务内整体替换服务明细集合
    ///
    /// 更新语义: 先清空后重建,新增/删除/改量统一收敛为一次全量替换
    pub fn replace_service_lines_tx(
        tx: &Transaction,
        reservation_id: &str,
        lines: &[ReservationServiceLine],
    ) -> RepositoryResult<()> {
        Self::delete_service_lines_tx(tx, reservation_id)?;

        let mut stmt = tx.prepare(
            r#"INSERT INTO reservation_service_line
               (reservation_id, service_id, quantity, line_total)
               VALUES (?, ?, ?, ?)"#,
        )?;

        for line in lines {
            stmt.execute(params![
                reservation_id,
                &line.service_id,
                line.quantity,
                line.line_total,
            ])?;
        }

        Ok(())
    }

    /// 事务内清空服务明细
    pub fn delete_service_lines_tx(tx: &Transaction, reservation_id: &str) -> RepositoryResult<()> {
        tx.execute(
            "DELETE FROM reservation_service_line WHERE reservation_id = ?",
            params![reservation_id],
        )?;
        Ok(())
    }

    /// 查询预订的服务明细
    pub fn find_service_lines(
        &self,
        reservation_id: &str,
    ) -> RepositoryResult<Vec<ReservationServiceLine>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT reservation_id, service_id, quantity, line_total
               FROM reservation_service_line
               WHERE reservation_id = ?
               ORDER BY service_id ASC"#,
        )?;

        let lines = stmt
            .query_map(params![reservation_id], |row| {
                Ok(ReservationServiceLine {
                    reservation_id: row.get(0)?,
                    service_id: row.get(1)?,
                    quantity: row.get(2)?,
                    line_total: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<ReservationServiceLine>, _>>()?;

        Ok(lines)
    }

    // ==========================================
    // 内部查询/映射
    // ==========================================

    fn query_by_id(
        conn: &Connection,
        reservation_id: &str,
    ) -> RepositoryResult<Option<Reservation>> {
        match conn.query_row(
            r#"SELECT reservation_id, room_id, guest_name, guest_contact, party_size,
                      check_in_at, check_out_at, status, amount, user_id, created_at
               FROM reservation
               WHERE reservation_id = ?"#,
            params![reservation_id],
            Self::map_row,
        ) {
            Ok(reservation) => Ok(Some(reservation)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 映射数据库行到Reservation对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Reservation> {
        let check_in_raw: String = row.get(5)?;
        let check_out_raw: String = row.get(6)?;
        let status_raw: String = row.get(7)?;
        let created_raw: String = row.get(10)?;

        let status = ReservationStatus::from_db_str(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                format!("非法预订状态: {}", status_raw).into(),
            )
        })?;

        Ok(Reservation {
            reservation_id: row.get(0)?,
            room_id: row.get(1)?,
            guest_name: row.get(2)?,
            guest_contact: row.get(3)?,
            party_size: row.get(4)?,
            check_in_at: parse_ts(5, &check_in_raw)?,
            check_out_at: parse_ts(6, &check_out_raw)?,
            status,
            amount: row.get(8)?,
            user_id: row.get(9)?,
            created_at: parse_ts(10, &created_raw)?,
        })
    }
}
