//! Command implementations.

mod history;
mod run;
mod serve;
mod status;
mod sync;

pub use history::execute_history;
pub use run::execute_run;
pub use serve::execute_serve;
pub use status::execute_status;
pub use sync::execute_sync;
