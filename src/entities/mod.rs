pub mod booking_request;
pub mod item;
pub mod reservation;

pub use booking_request::Entity as BookingRequest;
pub use item::Entity as Item;
pub use reservation::Entity as Reservation;
