pub mod order;
pub mod seat;
pub mod venue;

pub use order::Order;
pub use seat::{SeatId, SeatIdError, SeatState, SeatStatus};
pub use venue::{Section, Venue, VenueError, VenueLayout};
