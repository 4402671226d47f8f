use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the services after successful mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Registry events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Assignment lifecycle events
    AssignmentCreated {
        assignment_id: Uuid,
        product_id: Uuid,
        employee_id: Uuid,
    },
    AssignmentClosed {
        assignment_id: Uuid,
        product_id: Uuid,
        status: String,
        returned_at: DateTime<Utc>,
    },

    // Directory events
    BranchCreated(Uuid),
    CategoryCreated(Uuid),
    DepartmentCreated(Uuid),
    EmployeeCreated(Uuid),

    // Account events
    UserRegistered(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
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

    /// Sends an event, logging instead of failing when the processor is gone.
    /// Event delivery is observability, not part of a mutation's outcome.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("Dropped event {:?}: {}", event, e);
        }
    }
}

/// Background loop draining the event channel.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::AssignmentCreated {
                assignment_id,
                product_id,
                employee_id,
            } => {
                info!(
                    assignment_id = %assignment_id,
                    product_id = %product_id,
                    employee_id = %employee_id,
                    "Product assigned"
                );
            }
            Event::AssignmentClosed {
                assignment_id,
                product_id,
                status,
                ..
            } => {
                info!(
                    assignment_id = %assignment_id,
                    product_id = %product_id,
                    status = %status,
                    "Assignment closed"
                );
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event channel closed; stopping event processing loop");
}
