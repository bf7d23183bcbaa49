//! Cycle handlers - apportionment preview and lifecycle commands.

mod close_cycle;
mod create_cycle;
mod delete_cycle;
mod list_cycle_history;
mod preview_apportionment;
mod progress_loader;

pub use close_cycle::{CloseCycleCommand, CloseCycleError, CloseCycleHandler, CloseCycleResult};
pub use create_cycle::{
    CreateCycleCommand, CreateCycleError, CreateCycleHandler, CreateCycleResult, CycleItemSpec,
};
pub use delete_cycle::{DeleteCycleCommand, DeleteCycleError, DeleteCycleHandler};
pub use list_cycle_history::{
    CycleHistoryView, ListCycleHistoryError, ListCycleHistoryHandler, ListCycleHistoryQuery,
};
pub use preview_apportionment::{
    PreviewApportionmentError, PreviewApportionmentHandler, PreviewApportionmentQuery,
};

pub(crate) use progress_loader::load_cycle_progress;
