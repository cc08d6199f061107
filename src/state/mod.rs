//! State management module
//!
//! This module holds client-side state: reactive stores owned by services,
//! the persisted session, the payment flow and teardown signals

pub mod lifecycle;
pub mod payment_flow;
pub mod session;
pub mod store;

// Re-export commonly used state components
pub use lifecycle::{Teardown, TeardownSignal};
pub use payment_flow::{PaymentFlow, PaymentFlowState};
pub use session::{KeyValueStorage, SessionKeys, SessionStore};
pub use store::Store;
