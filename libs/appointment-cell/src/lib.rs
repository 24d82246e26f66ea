pub mod handlers;
pub mod router;
pub mod models;
pub mod services;

pub use models::*;
pub use router::appointment_routes;
pub use services::booking::AppointmentBookingService;
pub use services::notification::{
    build_notifier, BookingConfirmation, BookingNotifier, LogOnlyNotifier, MailRelayNotifier,
    NotificationError,
};
pub use services::resolver::AvailabilityResolver;
