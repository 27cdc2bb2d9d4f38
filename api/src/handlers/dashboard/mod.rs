// Dashboard handlers module

mod planning_view;
mod shared_utils;
mod stats;

pub use planning_view::planning_page;
pub use stats::{dashboard_index, dashboard_summary};
