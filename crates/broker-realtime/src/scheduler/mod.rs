//! Request admission, subscription bookkeeping and notification diffing.

pub mod dispatch;
pub mod scheduler;
pub mod table;

pub use dispatch::{Delivery, GateDispatcher};
pub use scheduler::Scheduler;
pub use table::{Subscription, SubscriptionTable};
