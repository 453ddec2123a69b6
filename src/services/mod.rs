pub mod availability;
pub mod bookings;
pub mod cars;
pub mod customers;
pub mod payments;
pub mod users;
