pub mod capacity;
pub mod cleanup;
pub mod events;
pub mod payments;
pub mod reservations;
pub mod slips;
