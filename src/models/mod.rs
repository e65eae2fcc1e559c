pub mod advertisement;
pub mod blank;
pub mod booking;
pub mod catalog;
pub mod invoice;
pub mod report;
pub mod tracking;
pub mod user;

pub use advertisement::{AdStatus, Advertisement, Placement};
pub use booking::{Booking, BookingStatus, CreateBooking, UpdateBooking};
pub use catalog::{Service, ServicePackage, TimeSlot};
pub use invoice::{Invoice, InvoiceOwner, InvoiceStatus, Payment, PaymentMethod, Refund, RefundStatus};
pub use report::{Report, ReportType};
pub use tracking::{BookingHistory, ServiceTracking, TrackingStatus};
pub use user::{Advertiser, Claims, Customer, Role, Technician, Vehicle};
