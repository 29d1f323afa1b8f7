pub mod spill_queue;
pub mod spill_store;

pub use spill_queue::SpillQueue;
