//! Service layer
//!
//! Services contain the business logic of the runner: sequencing the
//! pipeline steps, buffering step logs and recording finished runs.
//!
//! Services with more than one plausible backend are trait-based to enable
//! testing and dependency injection.

mod history;
mod log_buffer;
mod sequencer;

// Re-export traits
pub use history::RunHistory;
pub use log_buffer::LogBufferService;

// Re-export implementations
pub use history::JsonlHistory;
pub use log_buffer::InMemoryLogBuffer;
pub use sequencer::Sequencer;
