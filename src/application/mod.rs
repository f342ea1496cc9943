pub mod events;
pub mod inventory;
pub mod payments;
pub mod ports;
pub mod queries;
pub mod reservations;

// Re-export key types for convenience
pub use events::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use inventory::{InventoryService, NewTicketType};
pub use payments::PaymentService;
pub use ports::{GatewayError, PaymentGateway, PaymentIntent};
pub use queries::{PageRequest, QueryService};
pub use reservations::{
    start_hold_expiry_task, LineRequest, ReservationCoordinator, ReservationRequest,
    SharedTicketTypeLocks, TicketTypeLocks,
};
