// ==========================================
// 酒店前台预订系统 - 支付与入住/退房凭据仓储
// ==========================================
// 职责: payment / check_in_record / check_out_record 表数据访问
// 约束: 凭据表对 reservation_id 唯一,重复写入由约束兜底
// ==========================================

use crate::domain::records::{CheckInRecord, CheckOutRecord, Payment};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::reservation_repo::{format_ts, parse_ts};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// PaymentRepository - 支付仓储
// ==========================================
pub struct PaymentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PaymentRepository {
    /// 创建新的PaymentRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 事务内插入支付记录
    pub fn insert_tx(tx: &Transaction, payment: &Payment) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO payment (payment_id, reservation_id, amount, staff_id, paid_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &payment.payment_id,
                &payment.reservation_id,
                payment.amount,
                &payment.staff_id,
                format_ts(payment.paid_at),
            ],
        )?;

        Ok(())
    }

    /// 查询预订的支付记录
    pub fn find_by_reservation(&self, reservation_id: &str) -> RepositoryResult<Vec<Payment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT payment_id, reservation_id, amount, staff_id, paid_at
               FROM payment
               WHERE reservation_id = ?
               ORDER BY paid_at ASC"#,
        )?;

        let payments = stmt
            .query_map(params![reservation_id], |row| {
                let paid_raw: String = row.get(4)?;
                Ok(Payment {
                    payment_id: row.get(0)?,
                    reservation_id: row.get(1)?,
                    amount: row.get(2)?,
                    staff_id: row.get(3)?,
                    paid_at: parse_ts(4, &paid_raw)?,
                })
            })?
            .collect::<Result<Vec<Payment>, _>>()?;

        Ok(payments)
    }
}

// ==========================================
// CheckRecordRepository - 入住/退房凭据仓储
// ==========================================
pub struct CheckRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CheckRecordRepository {
    /// 创建新的CheckRecordRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 事务内插入入住凭据
    pub fn insert_check_in_tx(tx: &Transaction, record: &CheckInRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO check_in_record
               (record_id, reservation_id, payment_id, staff_id, checked_in_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &record.record_id,
                &record.reservation_id,
                &record.payment_id,
                &record.staff_id,
                format_ts(record.checked_in_at),
            ],
        )?;

        Ok(())
    }

    /// 事务内插入退房凭据
    pub fn insert_check_out_tx(tx: &Transaction, record: &CheckOutRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"INSERT INTO check_out_record
               (record_id, reservation_id, staff_id, remarks, checked_out_at)
               VALUES (?, ?, ?, ?, ?)"#,
            params![
                &record.record_id,
                &record.reservation_id,
                &record.staff_id,
                &record.remarks,
                format_ts(record.checked_out_at),
            ],
        )?;

        Ok(())
    }

    /// 查询预订的入住凭据
    pub fn find_check_in(&self, reservation_id: &str) -> RepositoryResult<Option<CheckInRecord>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT record_id, reservation_id, payment_id, staff_id, checked_in_at
               FROM check_in_record
               WHERE reservation_id = ?"#,
            params![reservation_id],
            |row| {
                let checked_raw: String = row.get(4)?;
                Ok(CheckInRecord {
                    record_id: row.get(0)?,
                    reservation_id: row.get(1)?,
                    payment_id: row.get(2)?,
                    staff_id: row.get(3)?,
                    checked_in_at: parse_ts(4, &checked_raw)?,
                })
            },
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询预订的退房凭据
    pub fn find_check_out(&self, reservation_id: &str) -> RepositoryResult<Option<CheckOutRecord>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT record_id, reservation_id, staff_id, remarks, checked_out_at
               FROM check_out_record
               WHERE reservation_id = ?"#,
            params![reservation_id],
            |row| {
                let checked_raw: String = row.get(4)?;
                Ok(CheckOutRecord {
                    record_id: row.get(0)?,
                    reservation_id: row.get(1)?,
                    staff_id: row.get(2)?,
                    remarks: row.get(3)?,
                    checked_out_at: parse_ts(4, &checked_raw)?,
                })
            },
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
