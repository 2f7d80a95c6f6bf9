//! 消息总线核心实现
//!
//! # 消息流
//!
//! ```text
//! OrderService ──▶ publish() ──▶ broadcast::Sender ──▶ MessageHandler
//! ```
//!
//! publish 是 fire-and-forget：单次发送尝试，不等待消费确认，
//! 失败以 `Err` 返回由调用方决定是否致命。

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::BusMessage;
use crate::AppError;

/// 消息总线配置
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// broadcast 通道容量 (默认 1024)
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// 消息总线 - 负责事件的发布与订阅
#[derive(Debug)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
    shutdown_token: CancellationToken,
}

impl MessageBus {
    /// 创建默认配置的消息总线
    pub fn new() -> Self {
        Self::from_config(BusConfig::default())
    }

    /// 从配置创建消息总线
    pub fn from_config(config: BusConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// 发布消息到所有订阅者
    ///
    /// 无订阅者时 broadcast 返回错误，由调用方决定是否忽略。
    pub fn publish(&self, msg: BusMessage) -> Result<(), AppError> {
        self.tx
            .send(msg)
            .map(|_| ())
            .map_err(|e| AppError::internal(format!("Publish failed: {e}")))
    }

    /// 订阅消息
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    /// 获取关闭令牌 (用于监控关闭信号)
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// 优雅关闭消息总线
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{EventType, OrderCreatedPayload};

    #[tokio::test]
    async fn test_publish_and_subscribe() {
        let bus = MessageBus::new();
        let mut rx = bus.subscribe();

        let payload = OrderCreatedPayload {
            id: "order-1".to_string(),
            items: vec![],
        };
        bus.publish(BusMessage::order_created(&payload)).unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type, EventType::OrderCreated);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_errors() {
        let bus = MessageBus::new();
        let payload = OrderCreatedPayload {
            id: "order-1".to_string(),
            items: vec![],
        };

        // No receiver exists, publish surfaces the failure to the caller
        assert!(bus.publish(BusMessage::order_created(&payload)).is_err());
    }
}
