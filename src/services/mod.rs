pub mod activity;
pub mod contracts;
pub mod files;
pub mod payouts;
pub mod phases;
pub mod subscriptions;
pub mod summary;
