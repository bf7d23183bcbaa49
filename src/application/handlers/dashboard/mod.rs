//! Dashboard handlers.

mod get_dashboard;

pub use get_dashboard::{
    ActiveCycleView, DashboardView, GetDashboardError, GetDashboardHandler, GetDashboardQuery,
};
