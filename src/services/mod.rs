pub mod assistant;
pub mod cart;
pub mod dashboard;
pub mod feed;
pub mod inventory;
pub mod notification;
pub mod sales;
