// SQL query constants for repositories
// Centralizes repeated SELECT column lists

/// SQL query fragments for agents table
pub mod agent_queries {
    /// All columns for agents table
    pub const SELECT_ALL_COLUMNS: &str =
        "code, last_name, first_name, group_code, entry_date, exit_date, status";
}

/// SQL query fragments for planning (override) table
pub mod planning_queries {
    /// All columns for planning table
    pub const SELECT_ALL_COLUMNS: &str = "agent_code, date, shift, origin";
}

/// SQL query fragments for holidays table
pub mod holiday_queries {
    /// All columns for holidays table
    pub const SELECT_ALL_COLUMNS: &str = "date, description";
}
