pub mod check_result;
pub mod event;
pub mod response;

// Re-exports for convenience
pub use check_result::*;
pub use event::*;
pub use response::*;
