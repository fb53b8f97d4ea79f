// ==========================================
// 酒店前台预订系统 - 操作日志仓储
// ==========================================
// 职责: action_log 表数据访问
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::reservation_repo::{format_ts, parse_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的ActionLogRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入操作日志
    ///
    /// 说明: 审计日志在业务事务提交后写入,写入失败由调用方告警,
    /// 不得影响已提交的业务结果
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO action_log
               (action_id, reservation_id, action_type, action_ts, actor, payload_json, detail)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &log.action_id,
                &log.reservation_id,
                &log.action_type,
                format_ts(log.action_ts),
                &log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                &log.detail,
            ],
        )?;

        Ok(())
    }

    /// 查询最近的操作日志
    pub fn list_recent(&self, limit: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, reservation_id, action_type, action_ts, actor, payload_json, detail
               FROM action_log
               ORDER BY action_ts DESC
               LIMIT ?"#,
        )?;

        let logs = stmt
            .query_map(params![limit], |row| {
                let ts_raw: String = row.get(3)?;
                let payload_raw: Option<String> = row.get(5)?;
                Ok(ActionLog {
                    action_id: row.get(0)?,
                    reservation_id: row.get(1)?,
                    action_type: row.get(2)?,
                    action_ts: parse_ts(3, &ts_raw)?,
                    actor: row.get(4)?,
                    payload_json: payload_raw.and_then(|s| serde_json::from_str(&s).ok()),
                    detail: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<ActionLog>, _>>()?;

        Ok(logs)
    }

    /// 查询某预订的操作轨迹（时间升序）
    pub fn list_by_reservation(&self, reservation_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT action_id, reservation_id, action_type, action_ts, actor, payload_json, detail
               FROM action_log
               WHERE reservation_id = ?
               ORDER BY action_ts ASC"#,
        )?;

        let logs = stmt
            .query_map(params![reservation_id], |row| {
                let ts_raw: String = row.get(3)?;
                let payload_raw: Option<String> = row.get(5)?;
                Ok(ActionLog {
                    action_id: row.get(0)?,
                    reservation_id: row.get(1)?,
                    action_type: row.get(2)?,
                    action_ts: parse_ts(3, &ts_raw)?,
                    actor: row.get(4)?,
                    payload_json: payload_raw.and_then(|s| serde_json::from_str(&s).ok()),
                    detail: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<ActionLog>, _>>()?;

        Ok(logs)
    }
}
