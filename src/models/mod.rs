pub mod request_status;

pub use request_status::{LifecycleAction, RequestStatus};
