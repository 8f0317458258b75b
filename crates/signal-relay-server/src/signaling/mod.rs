//! Publisher/subscriber negotiation: identity directory, message routing and
//! disconnect cleanup.

pub mod directory;
pub mod lifecycle;
pub mod router;

pub use directory::PublisherDirectory;
pub use lifecycle::LifecycleManager;
pub use router::NegotiationRouter;
