pub mod availability;
pub mod booking;
pub mod cart;
pub mod inventory;
pub mod lifecycle;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::cache::AvailabilityCache;
use crate::config::AppConfig;
use crate::events::EventSender;

/// All services wired together over one database handle and one shared
/// availability cache, cloned into every handler.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: inventory::InventoryService,
    pub availability: availability::AvailabilityService,
    pub booking: booking::BookingService,
    pub lifecycle: lifecycle::ReservationLifecycleService,
    pub cart: cart::CartService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender, config: &AppConfig) -> Self {
        let cache = AvailabilityCache::new();
        let availability = availability::AvailabilityService::new(db.clone(), cache);

        Self {
            inventory: inventory::InventoryService::new(db.clone(), event_sender.clone()),
            booking: booking::BookingService::new(
                db.clone(),
                availability.clone(),
                event_sender.clone(),
                config.booking_horizon_days,
            ),
            lifecycle: lifecycle::ReservationLifecycleService::new(
                db,
                availability.clone(),
                event_sender,
            ),
            cart: cart::CartService::new(availability.clone(), config.cart_capacity),
            availability,
        }
    }
}
