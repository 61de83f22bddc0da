pub mod checkin;
pub mod event;
pub mod payment;
pub mod reservation;
pub mod table;

pub use checkin::CheckIn;
pub use event::{Event, EventStatus};
pub use payment::{Payment, VerifyStatus};
pub use reservation::{Reservation, ReservationStatus};
pub use table::{Table, TableStatus};
