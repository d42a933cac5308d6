pub mod approvals;
pub mod bookings;
pub mod carts;
pub mod common;
pub mod items;
