pub mod scheduler;
pub mod transport;

pub use scheduler::ScheduledJob;
pub use transport::Messenger;
