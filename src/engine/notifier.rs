// ==========================================
// 酒店前台预订系统 - 通知发送 trait
// ==========================================
// 职责: 定义预订通知发送 trait，实现依赖倒置
// 说明: 引擎层定义 trait，邮件/短信适配器在外层实现
// 红线: 通知失败只记日志，绝不回滚已提交的预订事务
// ==========================================

use crate::domain::reservation::Reservation;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 通知类型
// ==========================================

/// 预订通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// 预订确认邮件
    BookingConfirmation,
    /// 预订取消邮件
    BookingCancelled,
}

impl NotificationKind {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::BookingConfirmation => "BookingConfirmation",
            NotificationKind::BookingCancelled => "BookingCancelled",
        }
    }
}

/// 预订快照
///
/// 通知发送只依赖快照,不回读数据库:
/// 事务提交后预订行可能已被后续操作修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationSnapshot {
    pub reservation_id: String,
    pub room_id: String,
    pub guest_name: String,
    pub guest_contact: String,
    pub check_in_at: NaiveDateTime,
    pub check_out_at: NaiveDateTime,
    pub amount: f64,
}

impl From<&Reservation> for ReservationSnapshot {
    fn from(r: &Reservation) -> Self {
        Self {
            reservation_id: r.reservation_id.clone(),
            room_id: r.room_id.clone(),
            guest_name: r.guest_name.clone(),
            guest_contact: r.guest_contact.clone(),
            check_in_at: r.check_in_at,
            check_out_at: r.check_out_at,
            amount: r.amount,
        }
    }
}

// ==========================================
// 通知发送 Trait
// ==========================================

/// 预订通知发送者 Trait
///
/// 引擎层定义，外层（邮件网关等）实现
/// 幂等性不做保证也不做要求
#[async_trait]
pub trait ReservationNotifier: Send + Sync {
    /// 发送预订通知
    ///
    /// # 参数
    /// - kind: 通知类型
    /// - snapshot: 预订快照
    async fn send(
        &self,
        kind: NotificationKind,
        snapshot: &ReservationSnapshot,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作通知发送者
///
/// 用于不需要通知的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl ReservationNotifier for NoOpNotifier {
    async fn send(
        &self,
        kind: NotificationKind,
        snapshot: &ReservationSnapshot,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpNotifier: 跳过通知发送 - reservation_id={}, kind={}",
            snapshot.reservation_id,
            kind.as_str()
        );
        Ok(())
    }
}

/// 可选的通知发送者包装
///
/// 简化 Option<Arc<dyn ReservationNotifier>> 的使用,
/// 并统一"尽力而为"语义: 发送在事务提交之后进行,失败仅告警
pub struct OptionalNotifier {
    inner: Option<Arc<dyn ReservationNotifier>>,
}

impl OptionalNotifier {
    /// 创建带发送者的实例
    pub fn with_notifier(notifier: Arc<dyn ReservationNotifier>) -> Self {
        Self {
            inner: Some(notifier),
        }
    }

    /// 创建空实例（不发送通知）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 检查是否配置了发送者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    /// 尽力而为地发送通知
    ///
    /// # 约束
    /// - 必须在事务提交之后调用
    /// - 发送失败记录 warn 日志,不向调用方传播
    pub async fn notify_best_effort(&self, kind: NotificationKind, snapshot: &ReservationSnapshot) {
        let Some(notifier) = &self.inner else {
            tracing::debug!(
                "OptionalNotifier: 未配置发送者，跳过通知 - reservation_id={}, kind={}",
                snapshot.reservation_id,
                kind.as_str()
            );
            return;
        };

        if let Err(e) = notifier.send(kind, snapshot).await {
            tracing::warn!(
                "通知发送失败(不影响预订): reservation_id={}, kind={}, error={}",
                snapshot.reservation_id,
                kind.as_str(),
                e
            );
        }
    }
}

impl Default for OptionalNotifier {
    fn default() -> Self {
        Self::none()
    }
}
