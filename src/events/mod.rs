use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// The events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Document events
    DocumentCreated {
        document_id: Uuid,
        kind: String,
    },
    DocumentUpdated {
        document_id: Uuid,
        kind: String,
    },
    DocumentDeleted {
        document_id: Uuid,
        kind: String,
    },
    OrderLineStatusChanged {
        document_id: Uuid,
        line_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),
    WholesalerCreated(Uuid),
    WholesalerUpdated(Uuid),
    WholesalerDeleted(Uuid),

    // Gold rate events
    GoldRateRecorded {
        rate_id: Uuid,
        rate: Decimal,
    },
    GoldRateUpdated(Uuid),
    GoldRateDeleted(Uuid),

    // User and access events
    UserCreated(Uuid),
    UserUpdated(Uuid),
    UserDeleted(Uuid),
    RoleCreated(Uuid),
    RoleUpdated(Uuid),
    RoleDeleted(Uuid),
    UserLoggedIn(Uuid),
    TokenRefreshed(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

// Processes incoming events. Runs until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::DocumentCreated { document_id, kind } => {
                if let Err(e) = handle_document_created(document_id, &kind).await {
                    error!(
                        "Failed to handle document created event: document_id={}, error={}",
                        document_id, e
                    );
                }
            }
            Event::OrderLineStatusChanged {
                document_id,
                line_id,
                old_status,
                new_status,
            } => {
                if let Err(e) =
                    handle_order_line_status_changed(document_id, line_id, &old_status, &new_status)
                        .await
                {
                    error!(
                        "Failed to handle line status change: document_id={}, error={}",
                        document_id, e
                    );
                }
            }
            Event::GoldRateRecorded { rate_id, rate } => {
                info!("Gold rate recorded: id={}, rate={}", rate_id, rate);
            }
            Event::UserLoggedIn(user_id) => {
                info!("User logged in: {}", user_id);
            }
            Event::TokenRefreshed(user_id) => {
                info!("Token refreshed for user: {}", user_id);
            }
            _ => {
                info!("No specific handler for event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events

async fn handle_document_created(document_id: Uuid, kind: &str) -> Result<(), String> {
    info!(
        "Processing document created event for {} document {}",
        kind, document_id
    );

    // Hook for follow-up workflows (e.g. printing, stock sync)
    Ok(())
}

async fn handle_order_line_status_changed(
    document_id: Uuid,
    line_id: Uuid,
    old_status: &str,
    new_status: &str,
) -> Result<(), String> {
    info!(
        "Order line {} of document {} moved {} -> {}",
        line_id, document_id, old_status, new_status
    );

    if new_status == "HandedOut" {
        info!(
            "Line {} handed out to customer; order {} may be ready to close",
            line_id, document_id
        );
    }

    Ok(())
}
