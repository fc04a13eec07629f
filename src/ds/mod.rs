pub mod ghost_list;
pub mod queue;
pub mod slot_arena;

pub use ghost_list::GhostList;
pub use queue::{Queue, QueueIter};
pub use slot_arena::{SlotArena, SlotId};
