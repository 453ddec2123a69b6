pub mod booking;
pub mod car;
pub mod car_feature;
pub mod car_feature_assignment;
pub mod car_media;
pub mod customer;
pub mod user;
