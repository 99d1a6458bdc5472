pub mod arbiter;
pub mod dispatch;
pub mod index;
pub mod propagation;
pub mod queue;
pub mod storage;

pub use arbiter::{ThesisArbiter, ThesisVerdict};
pub use dispatch::EventDispatcher;
pub use index::{Embedder, IndexStore};
pub use propagation::{ShockPropagator, ShockResult};
pub use queue::{ConditionEmbedding, ExposureJob, ExposureQueue};
pub use storage::EntityStore;
