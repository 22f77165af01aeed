pub mod availability;
pub mod booking;
pub mod court;
pub mod interval;
pub mod opening_hours;
pub mod slot;
pub mod wizard;

pub use availability::{AvailabilityWindow, BookedInterval, DayAvailability};
pub use booking::{
    Booking, BookingDraft, GuestDetails, PaymentMethod, PaymentStatus, PaymentUpdate,
};
pub use court::{AllocationType, Court};
pub use interval::{adjacency_tolerance, adjacent, overlaps, TimeInterval};
pub use opening_hours::OpeningHours;
pub use slot::CandidateSlot;
pub use wizard::WizardStep;
