pub mod access_event;
pub mod memory_event;
pub mod notification;
pub mod system_stats;
pub mod version;

pub use access_event::{AccessEvent, AccessType};
pub use memory_event::{EventType, MemoryEvent};
pub use notification::{Notification, NotificationType};
pub use system_stats::evidence_weight;
pub use version::{ChangeType, VersionSnapshot};
