//! 消息总线消息类型定义
//!
//! 订单创建与异步处理之间的解耦通道。进程内传输，
//! 投递语义为每次 publish 一次发送尝试，失败由调用方决定策略。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub mod bus;
pub mod handler;
pub mod processor;

pub use bus::{BusConfig, MessageBus};
pub use handler::MessageHandler;
pub use processor::{MessageProcessor, OrderCreatedProcessor, ProcessResult};

use crate::db::models::OrderItem;

/// 消息总线事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// 订单已创建
    OrderCreated = 0,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::OrderCreated => write!(f, "order_created"),
        }
    }
}

/// 订单创建事件载荷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedPayload {
    pub id: String,
    pub items: Vec<OrderItem>,
}

/// 消息总线消息体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            payload,
        }
    }

    /// 创建订单创建事件消息
    pub fn order_created(payload: &OrderCreatedPayload) -> Self {
        Self::new(
            EventType::OrderCreated,
            serde_json::to_vec(payload).expect("Failed to serialize order_created payload"),
        )
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_created_round_trip() {
        let payload = OrderCreatedPayload {
            id: "order-1".to_string(),
            items: vec![OrderItem {
                name: "Widget".to_string(),
                quantity: 2,
                price: 9.99,
            }],
        };

        let msg = BusMessage::order_created(&payload);
        assert_eq!(msg.event_type, EventType::OrderCreated);
        assert!(!msg.request_id.is_nil());

        let parsed: OrderCreatedPayload = msg.parse_payload().unwrap();
        assert_eq!(parsed.id, "order-1");
        assert_eq!(parsed.items.len(), 1);
    }
}
