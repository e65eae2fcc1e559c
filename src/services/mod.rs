pub mod advertisement;
pub mod auth;
pub mod booking;
pub mod calendar;
pub mod catalog;
pub mod directory;
pub mod payment;
pub mod refunds;
pub mod reporting;
pub mod scheduling;
pub mod tracking;
