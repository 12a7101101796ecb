pub mod error;
pub mod types;

pub use error::{AttendanceError, AttendanceResult};
pub use types::{AttendanceRecord, LogType, ServiceInfo};
