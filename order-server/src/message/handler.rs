//! Message Handler for server-side message processing
//!
//! The MessageHandler subscribes to the message bus and dispatches each
//! message to the processor registered for its event type.
//!
//! Features:
//! - Pluggable processors for different message types
//! - Automatic retries with exponential backoff
//! - Permanently failed messages are logged as dead letters; the order
//!   itself stays in whatever state processing left it

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::processor::{MessageProcessor, ProcessResult};
use super::{BusMessage, OrderCreatedProcessor};
use crate::AppError;
use crate::core::ServerState;

/// Server-side message handler
pub struct MessageHandler {
    receiver: broadcast::Receiver<BusMessage>,
    shutdown_token: CancellationToken,
    processors: HashMap<super::EventType, Arc<dyn MessageProcessor>>,
}

impl MessageHandler {
    /// Create a new message handler
    pub fn new(
        receiver: broadcast::Receiver<BusMessage>,
        shutdown_token: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            shutdown_token,
            processors: HashMap::new(),
        }
    }

    /// Register a processor for a specific event type
    pub fn register_processor(mut self, processor: Arc<dyn MessageProcessor>) -> Self {
        let event_type = processor.event_type();
        self.processors.insert(event_type, processor);
        self
    }

    /// Create a handler with the default processors
    pub fn with_default_processors(
        receiver: broadcast::Receiver<BusMessage>,
        shutdown_token: CancellationToken,
        state: &ServerState,
    ) -> Self {
        Self::new(receiver, shutdown_token)
            .register_processor(Arc::new(OrderCreatedProcessor::new(state.processing.clone())))
    }

    /// Start processing messages
    ///
    /// This is a long-running task that should be spawned in the background.
    pub async fn run(mut self) {
        tracing::info!("Message handler started");

        loop {
            tokio::select! {
                // Listen for shutdown signal
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Message handler shutting down");
                    break;
                }

                // Receive messages from bus
                msg_result = self.receiver.recv() => {
                    match msg_result {
                        Ok(msg) => {
                            if let Err(e) = self.handle_message(&msg).await {
                                tracing::error!("Failed to handle message: {}", e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("Message handler lagged, skipped {} messages", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Message handler stopped");
    }

    /// Handle a single message
    async fn handle_message(&self, msg: &BusMessage) -> Result<(), AppError> {
        match self.processors.get(&msg.event_type) {
            Some(processor) => self.process_with_retry(msg, processor.clone()).await,
            None => {
                tracing::warn!(
                    event_type = %msg.event_type,
                    "No processor registered for event type"
                );
                Ok(())
            }
        }
    }

    /// Process message with automatic retry
    async fn process_with_retry(
        &self,
        msg: &BusMessage,
        processor: Arc<dyn MessageProcessor>,
    ) -> Result<(), AppError> {
        let max_retries = processor.max_retries();
        let base_delay = processor.retry_delay_ms();
        let mut retry_count = 0u32;

        loop {
            match processor.process(msg).await {
                Ok(ProcessResult::Success { message }) => {
                    tracing::info!(
                        event_type = %msg.event_type,
                        result = %message,
                        "Message processed successfully"
                    );
                    return Ok(());
                }
                Ok(ProcessResult::Skipped { reason }) => {
                    tracing::info!(
                        event_type = %msg.event_type,
                        reason = %reason,
                        "Message skipped"
                    );
                    return Ok(());
                }
                Ok(ProcessResult::Failed { reason }) => {
                    self.log_dead_letter(msg, &reason);
                    return Err(AppError::internal(format!("Processing failed: {reason}")));
                }
                Ok(ProcessResult::Retry { reason }) => {
                    retry_count += 1;
                    if retry_count > max_retries {
                        self.log_dead_letter(msg, &reason);
                        return Err(AppError::internal(format!(
                            "Max retries exceeded: {reason}"
                        )));
                    }

                    // Exponential backoff
                    let delay = base_delay * 2_u64.pow(retry_count - 1);
                    tracing::warn!(
                        event_type = %msg.event_type,
                        retry_count = %retry_count,
                        delay_ms = %delay,
                        reason = %reason,
                        "Retrying message processing"
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                }
                Err(e) => {
                    // Processor-level error (e.g. malformed payload): not retriable
                    self.log_dead_letter(msg, &e.to_string());
                    return Err(e);
                }
            }
        }
    }

    /// Record a permanently failed message
    fn log_dead_letter(&self, msg: &BusMessage, reason: &str) {
        tracing::error!(
            event_type = %msg.event_type,
            request_id = %msg.request_id,
            reason = %reason,
            payload_len = %msg.payload.len(),
            "Message processing failed permanently"
        );
    }
}
