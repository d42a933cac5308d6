use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the booking core.
///
/// Consumers in this crate only log; delivery of user-facing notifications
/// is an external collaborator fed by the same stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ItemCreated(Uuid),
    BookingSubmitted {
        request_id: Uuid,
        user_id: Uuid,
        line_count: usize,
    },
    ReservationApproved {
        reservation_id: Uuid,
        item_id: Uuid,
    },
    ReservationRejected {
        reservation_id: Uuid,
        item_id: Uuid,
        reason: String,
    },
    ReservationReturned {
        reservation_id: Uuid,
        item_id: Uuid,
    },
    ReservationWithdrawn {
        reservation_id: Uuid,
        item_id: Uuid,
        user_id: Uuid,
    },
    RequestWithdrawn {
        request_id: Uuid,
        user_id: Uuid,
        line_count: usize,
    },
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

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

    /// Sends an event, logging instead of failing when the consumer is gone.
    /// Mutations must not be rolled back because the event channel closed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event delivery failed: {}", e);
        }
    }
}

/// Consumes domain events and logs them.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::ItemCreated(id) => info!(item_id = %id, "Item created"),
            Event::BookingSubmitted {
                request_id,
                user_id,
                line_count,
            } => info!(
                request_id = %request_id,
                user_id = %user_id,
                line_count = line_count,
                "Booking request submitted"
            ),
            Event::ReservationApproved {
                reservation_id,
                item_id,
            } => info!(reservation_id = %reservation_id, item_id = %item_id, "Reservation approved"),
            Event::ReservationRejected {
                reservation_id,
                item_id,
                reason,
            } => info!(
                reservation_id = %reservation_id,
                item_id = %item_id,
                reason = %reason,
                "Reservation rejected"
            ),
            Event::ReservationReturned {
                reservation_id,
                item_id,
            } => info!(reservation_id = %reservation_id, item_id = %item_id, "Reservation returned"),
            Event::ReservationWithdrawn {
                reservation_id,
                item_id,
                user_id,
            } => info!(
                reservation_id = %reservation_id,
                item_id = %item_id,
                user_id = %user_id,
                "Reservation withdrawn"
            ),
            Event::RequestWithdrawn {
                request_id,
                user_id,
                line_count,
            } => info!(
                request_id = %request_id,
                user_id = %user_id,
                line_count = line_count,
                "Booking request withdrawn"
            ),
            Event::Generic { message, .. } => info!("{}", message),
        }
    }
    info!("Event channel closed; event processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_or_log_survives_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);

        // Must not panic or error out.
        sender.send_or_log(Event::ItemCreated(Uuid::new_v4())).await;
        assert!(sender.send(Event::ItemCreated(Uuid::new_v4())).await.is_err());
    }

    #[tokio::test]
    async fn events_round_trip_through_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        let request_id = Uuid::new_v4();
        sender
            .send(Event::BookingSubmitted {
                request_id,
                user_id: Uuid::new_v4(),
                line_count: 2,
            })
            .await
            .unwrap();

        match rx.recv().await {
            Some(Event::BookingSubmitted {
                request_id: got, ..
            }) => assert_eq!(got, request_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
