//! Message Processors
//!
//! Pluggable per-event-type processing, dispatched by the
//! [`MessageHandler`](super::MessageHandler).

use async_trait::async_trait;

use super::{BusMessage, EventType, OrderCreatedPayload};
use crate::AppError;
use crate::orders::ProcessingService;

/// Outcome of processing a single message
#[derive(Debug)]
pub enum ProcessResult {
    /// Processed successfully
    Success { message: String },
    /// Intentionally not processed
    Skipped { reason: String },
    /// Permanently failed — do not retry
    Failed { reason: String },
    /// Transient failure — retry with backoff
    Retry { reason: String },
}

/// A processor bound to one event type
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    /// The event type this processor handles
    fn event_type(&self) -> EventType;

    /// Maximum retry attempts before the message is dropped
    fn max_retries(&self) -> u32 {
        3
    }

    /// Base delay for exponential backoff (milliseconds)
    fn retry_delay_ms(&self) -> u64 {
        500
    }

    /// Process a single message
    async fn process(&self, msg: &BusMessage) -> Result<ProcessResult, AppError>;
}

/// Drives order processing off `order_created` events
pub struct OrderCreatedProcessor {
    processing: ProcessingService,
}

impl OrderCreatedProcessor {
    pub fn new(processing: ProcessingService) -> Self {
        Self { processing }
    }
}

#[async_trait]
impl MessageProcessor for OrderCreatedProcessor {
    fn event_type(&self) -> EventType {
        EventType::OrderCreated
    }

    async fn process(&self, msg: &BusMessage) -> Result<ProcessResult, AppError> {
        let payload: OrderCreatedPayload = msg
            .parse_payload()
            .map_err(|e| AppError::invalid(format!("Malformed order_created payload: {e}")))?;

        match self.processing.process_order(&payload.id).await {
            Ok(()) => Ok(ProcessResult::Success {
                message: format!("Order {} processed", payload.id),
            }),
            // An order deleted or never persisted cannot succeed later
            Err(AppError::NotFound(reason)) => Ok(ProcessResult::Failed { reason }),
            // Lost CAS races and transient storage errors are worth retrying
            Err(e) => Ok(ProcessResult::Retry {
                reason: e.to_string(),
            }),
        }
    }
}
