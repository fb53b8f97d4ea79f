// ==========================================
// 酒店前台预订系统 - 服务目录仓储
// ==========================================
// 职责: service_catalog 表数据访问
// ==========================================

use crate::domain::reservation::ServiceItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};

// ==========================================
// ServiceCatalogRepository - 服务目录仓储
// ==========================================
pub struct ServiceCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ServiceCatalogRepository {
    /// 创建新的ServiceCatalogRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建服务项目
    pub fn insert(&self, item: &ServiceItem) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO service_catalog (service_id, service_name, price)
               VALUES (?, ?, ?)"#,
            params![&item.service_id, &item.service_name, item.price],
        )?;

        Ok(())
    }

    /// 更新服务单价（目录调价不回溯已捕捉的明细金额）
    pub fn update_price(&self, service_id: &str, price: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE service_catalog SET price = ? WHERE service_id = ?",
            params![price, service_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ServiceItem".to_string(),
                id: service_id.to_string(),
            });
        }

        Ok(())
    }

    /// 按service_id查询服务项目
    pub fn find_by_id(&self, service_id: &str) -> RepositoryResult<Option<ServiceItem>> {
        let conn = self.get_conn()?;
        Self::query_by_id(&conn, service_id)
    }

    /// 事务内按service_id查询服务项目
    ///
    /// 挂接明细时必须在事务内取当前单价做快照
    pub fn find_by_id_tx(tx: &Transaction, service_id: &str) -> RepositoryResult<Option<ServiceItem>> {
        Self::query_by_id(tx, service_id)
    }

    /// 查询全部服务项目
    pub fn list_all(&self) -> RepositoryResult<Vec<ServiceItem>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT service_id, service_name, price
               FROM service_catalog
               ORDER BY service_id ASC"#,
        )?;

        let items = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<ServiceItem>, _>>()?;

        Ok(items)
    }

    fn query_by_id(conn: &Connection, service_id: &str) -> RepositoryResult<Option<ServiceItem>> {
        match conn.query_row(
            r#"SELECT service_id, service_name, price
               FROM service_catalog
               WHERE service_id = ?"#,
            params![service_id],
            Self::map_row,
        ) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ServiceItem> {
        Ok(ServiceItem {
            service_id: row.get(0)?,
            service_name: row.get(1)?,
            price: row.get(2)?,
        })
    }
}
