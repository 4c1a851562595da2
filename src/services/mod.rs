pub mod cleanup;
pub mod hub;
pub mod reservation;
pub mod seats;

pub use cleanup::{CleanupService, CleanupStats};
pub use hub::{BroadcastHub, ConnectionId, HubHandle, ObserverConnection};
pub use reservation::{PurchaseReceipt, ReleaseOutcome, ReservationCoordinator};
pub use seats::SeatStateAggregator;
