// Repository layer for database operations

pub mod agent;
pub mod holiday;
pub mod queries;
pub mod shift_override;

pub use agent::{AgentFilter, AgentRepository};
pub use holiday::HolidayRepository;
pub use shift_override::OverrideRepository;
