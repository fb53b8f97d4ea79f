// ==========================================
// 酒店前台预订系统 - 客房仓储
// ==========================================
// 职责: room / room_category 表数据访问
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::room::{Room, RoomCategory};
use crate::domain::types::RoomStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// RoomRepository - 客房仓储
// ==========================================
pub struct RoomRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RoomRepository {
    /// 创建新的RoomRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建房型
    pub fn insert_category(&self, category: &RoomCategory) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO room_category (category_id, category_name, price, capacity)
               VALUES (?, ?, ?, ?)"#,
            params![
                &category.category_id,
                &category.category_name,
                category.price,
                category.capacity,
            ],
        )?;

        Ok(())
    }

    /// 创建客房
    pub fn insert(&self, room: &Room) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO room (room_id, room_no, category_id, status)
               VALUES (?, ?, ?, ?)"#,
            params![
                &room.room_id,
                &room.room_no,
                &room.category_id,
                room.status.to_db_str(),
            ],
        )?;

        Ok(())
    }

    /// 按room_id查询客房
    pub fn find_by_id(&self, room_id: &str) -> RepositoryResult<Option<Room>> {
        let conn = self.get_conn()?;
        Self::query_room(&conn, room_id)
    }

    /// 事务内按room_id查询客房
    pub fn find_by_id_tx(tx: &Transaction, room_id: &str) -> RepositoryResult<Option<Room>> {
        Self::query_room(tx, room_id)
    }

    /// 按category_id查询房型
    pub fn find_category(&self, category_id: &str) -> RepositoryResult<Option<RoomCategory>> {
        let conn = self.get_conn()?;
        Self::query_category(&conn, category_id)
    }

    /// 事务内按category_id查询房型
    pub fn find_category_tx(
        tx: &Transaction,
        category_id: &str,
    ) -> RepositoryResult<Option<RoomCategory>> {
        Self::query_category(tx, category_id)
    }

    /// 查询所有客房（按房号排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Room>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT room_id, room_no, category_id, status
               FROM room
               ORDER BY room_no ASC"#,
        )?;

        let rooms = stmt
            .query_map([], Self::map_room)?
            .collect::<Result<Vec<Room>, _>>()?;

        Ok(rooms)
    }

    /// 事务内更新房态
    ///
    /// # 返回
    /// - Ok(()): 更新成功
    /// - Err(NotFound): room_id不存在
    pub fn update_status_tx(
        tx: &Transaction,
        room_id: &str,
        status: RoomStatus,
    ) -> RepositoryResult<()> {
        let affected = tx.execute(
            "UPDATE room SET status = ? WHERE room_id = ?",
            params![status.to_db_str(), room_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Room".to_string(),
                id: room_id.to_string(),
            });
        }

        Ok(())
    }

    // ==========================================
    // 内部查询/映射
    // ==========================================

    fn query_room(conn: &Connection, room_id: &str) -> RepositoryResult<Option<Room>> {
        match conn.query_row(
            r#"SELECT room_id, room_no, category_id, status
               FROM room
               WHERE room_id = ?"#,
            params![room_id],
            Self::map_room,
        ) {
            Ok(room) => Ok(Some(room)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn query_category(
        conn: &Connection,
        category_id: &str,
    ) -> RepositoryResult<Option<RoomCategory>> {
        match conn.query_row(
            r#"SELECT category_id, category_name, price, capacity
               FROM room_category
               WHERE category_id = ?"#,
            params![category_id],
            |row| {
                Ok(RoomCategory {
                    category_id: row.get(0)?,
                    category_name: row.get(1)?,
                    price: row.get(2)?,
                    capacity: row.get(3)?,
                })
            },
        ) {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 映射数据库行到Room对象
    fn map_room(row: &rusqlite::Row) -> rusqlite::Result<Room> {
        let status_raw: String = row.get(3)?;
        let status = RoomStatus::from_db_str(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("非法房态: {}", status_raw).into(),
            )
        })?;

        Ok(Room {
            room_id: row.get(0)?,
            room_no: row.get(1)?,
            category_id: row.get(2)?,
            status,
        })
    }
}
