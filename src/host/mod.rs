//! Host-side components (spec §4.6–§4.8): the command channel, the
//! state mirror kept current by the receive task, and the tracking
//! loop built on top of both.

pub mod channel;
pub mod math;
pub mod mirror;
pub mod pid;
pub mod receiver;
pub mod sender;
pub mod tracker;

pub use channel::CommandChannel;
pub use mirror::StateMirror;
pub use tracker::TrackingController;
