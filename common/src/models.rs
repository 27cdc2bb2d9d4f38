use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

lazy_static::lazy_static! {
    static ref AGENT_CODE_PATTERN: regex::Regex =
        regex::Regex::new(r"^[A-Z0-9_-]{1,32}$").expect("agent code pattern is valid");
}

/// Normalize a raw agent code (trimmed, upper-cased) and check its format
pub fn normalize_agent_code(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(ValidationError::MissingField("code".to_string()));
    }
    if !AGENT_CODE_PATTERN.is_match(&code) {
        return Err(ValidationError::InvalidFieldValue {
            field: "code".to_string(),
            reason: format!(
                "'{}' must be 1-32 characters of A-Z, 0-9, '_' or '-'",
                code
            ),
        });
    }
    Ok(code)
}

/// Normalize a rotation group code (trimmed, upper-cased)
pub fn normalize_group_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

// ============================================================================
// Shift Models
// ============================================================================

/// ShiftSymbol is the resolved assignment of one agent on one day
///
/// `Shift1`..`Shift3` and `Rest` are the only values the rotation cycle
/// produces. The absence codes can only come from overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ShiftSymbol {
    Shift1,
    Shift2,
    Shift3,
    Rest,
    Leave,
    Sickness,
    Absence,
}

impl ShiftSymbol {
    /// Symbols a rotation cycle may contain
    pub const CYCLE_SYMBOLS: [ShiftSymbol; 4] = [
        ShiftSymbol::Shift1,
        ShiftSymbol::Shift2,
        ShiftSymbol::Shift3,
        ShiftSymbol::Rest,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ShiftSymbol::Shift1 => "1",
            ShiftSymbol::Shift2 => "2",
            ShiftSymbol::Shift3 => "3",
            ShiftSymbol::Rest => "R",
            ShiftSymbol::Leave => "C",
            ShiftSymbol::Sickness => "M",
            ShiftSymbol::Absence => "A",
        }
    }

    pub fn is_cycle_symbol(&self) -> bool {
        Self::CYCLE_SYMBOLS.contains(self)
    }

    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            ShiftSymbol::Leave | ShiftSymbol::Sickness | ShiftSymbol::Absence
        )
    }

    pub fn is_working(&self) -> bool {
        matches!(
            self,
            ShiftSymbol::Shift1 | ShiftSymbol::Shift2 | ShiftSymbol::Shift3
        )
    }
}

impl fmt::Display for ShiftSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ShiftSymbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1" => Ok(ShiftSymbol::Shift1),
            "2" => Ok(ShiftSymbol::Shift2),
            "3" => Ok(ShiftSymbol::Shift3),
            "R" => Ok(ShiftSymbol::Rest),
            "C" => Ok(ShiftSymbol::Leave),
            "M" => Ok(ShiftSymbol::Sickness),
            "A" => Ok(ShiftSymbol::Absence),
            other => Err(ValidationError::InvalidFieldValue {
                field: "shift".to_string(),
                reason: format!("unknown shift code '{}'", other),
            }),
        }
    }
}

impl TryFrom<String> for ShiftSymbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ShiftSymbol> for String {
    fn from(symbol: ShiftSymbol) -> Self {
        symbol.code().to_string()
    }
}

/// Absence kinds that can be recorded against an agent for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsenceKind {
    #[serde(rename = "C")]
    Leave,
    #[serde(rename = "M")]
    Sickness,
    #[serde(rename = "A")]
    Unjustified,
}

impl From<AbsenceKind> for ShiftSymbol {
    fn from(kind: AbsenceKind) -> Self {
        match kind {
            AbsenceKind::Leave => ShiftSymbol::Leave,
            AbsenceKind::Sickness => ShiftSymbol::Sickness,
            AbsenceKind::Unjustified => ShiftSymbol::Absence,
        }
    }
}

// ============================================================================
// Agent Models
// ============================================================================

/// AgentStatus tracks the one-way active -> inactive lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Inactive,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Inactive => "inactive",
        }
    }
}

impl TryFrom<String> for AgentStatus {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(AgentStatus::Active),
            "inactive" => Ok(AgentStatus::Inactive),
            other => Err(ValidationError::InvalidFieldValue {
                field: "status".to_string(),
                reason: format!("unknown agent status '{}'", other),
            }),
        }
    }
}

/// Agent is a rostered employee assigned to one rotation group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub code: String,
    pub last_name: String,
    pub first_name: String,
    pub group_code: String,
    pub entry_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: AgentStatus,
}

impl Agent {
    /// Create a new active agent
    pub fn new(
        code: impl Into<String>,
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        group_code: impl Into<String>,
        entry_date: NaiveDate,
    ) -> Self {
        Self {
            code: code.into(),
            last_name: last_name.into(),
            first_name: first_name.into(),
            group_code: group_code.into(),
            entry_date,
            exit_date: None,
            status: AgentStatus::Active,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active && self.exit_date.is_none()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            code: self.code.clone(),
            group_code: self.group_code.clone(),
            entry_date: self.entry_date,
            exit_date: self.exit_date,
        }
    }
}

/// The part of an agent record the rotation needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub code: String,
    pub group_code: String,
    pub entry_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
}

impl AgentSnapshot {
    /// Membership window is `[entry_date, exit_date)`
    pub fn is_member_on(&self, date: NaiveDate) -> bool {
        self.entry_date <= date && self.exit_date.map_or(true, |exit| exit > date)
    }
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        agent.snapshot()
    }
}

// ============================================================================
// Override Models
// ============================================================================

/// Where an override came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideOrigin {
    Manual,
    System,
}

impl OverrideOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideOrigin::Manual => "manual",
            OverrideOrigin::System => "system",
        }
    }
}

impl TryFrom<String> for OverrideOrigin {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "manual" => Ok(OverrideOrigin::Manual),
            "system" => Ok(OverrideOrigin::System),
            other => Err(ValidationError::InvalidFieldValue {
                field: "origin".to_string(),
                reason: format!("unknown override origin '{}'", other),
            }),
        }
    }
}

/// ShiftOverride is a recorded assignment that supersedes the cycle value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShiftOverride {
    pub agent_code: String,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub shift: ShiftSymbol,
    #[sqlx(try_from = "String")]
    pub origin: OverrideOrigin,
}

impl ShiftOverride {
    pub fn manual(agent_code: impl Into<String>, date: NaiveDate, shift: ShiftSymbol) -> Self {
        Self {
            agent_code: agent_code.into(),
            date,
            shift,
            origin: OverrideOrigin::Manual,
        }
    }
}

/// Overrides keyed by (agent code, date)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideMap {
    entries: HashMap<(String, NaiveDate), (ShiftSymbol, OverrideOrigin)>,
}

impl OverrideMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an override, replacing any previous value for the same key
    pub fn insert(&mut self, value: ShiftOverride) {
        self.entries
            .insert((value.agent_code, value.date), (value.shift, value.origin));
    }

    pub fn get(&self, agent_code: &str, date: NaiveDate) -> Option<(ShiftSymbol, OverrideOrigin)> {
        self.entries.get(&(agent_code.to_string(), date)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ShiftOverride> for OverrideMap {
    fn from_iter<I: IntoIterator<Item = ShiftOverride>>(iter: I) -> Self {
        let mut map = OverrideMap::new();
        for value in iter {
            map.insert(value);
        }
        map
    }
}

// ============================================================================
// Planning Models
// ============================================================================

/// Where a planning entry's shift came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Cycle,
    Manual,
    System,
}

impl From<OverrideOrigin> for EntrySource {
    fn from(origin: OverrideOrigin) -> Self {
        match origin {
            OverrideOrigin::Manual => EntrySource::Manual,
            OverrideOrigin::System => EntrySource::System,
        }
    }
}

/// PlanningEntry is the resolved shift of one agent on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningEntry {
    pub agent_code: String,
    pub group_code: String,
    pub date: NaiveDate,
    pub shift: ShiftSymbol,
    pub source: EntrySource,
}

/// RotationGroup is a cohort of agents sharing one phase offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationGroup {
    pub code: String,
    pub offset: u32,
}

/// Holiday is a public holiday shown on the planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Holiday {
    pub date: NaiveDate,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_shift_symbol_codes_parse_back() {
        for symbol in [
            ShiftSymbol::Shift1,
            ShiftSymbol::Shift2,
            ShiftSymbol::Shift3,
            ShiftSymbol::Rest,
            ShiftSymbol::Leave,
            ShiftSymbol::Sickness,
            ShiftSymbol::Absence,
        ] {
            assert_eq!(symbol.code().parse::<ShiftSymbol>().unwrap(), symbol);
        }
        assert_eq!("r".parse::<ShiftSymbol>().unwrap(), ShiftSymbol::Rest);
        assert!("X".parse::<ShiftSymbol>().is_err());
    }

    #[test]
    fn test_shift_symbol_serializes_as_code() {
        let json = serde_json::to_string(&ShiftSymbol::Rest).unwrap();
        assert_eq!(json, "\"R\"");
        let parsed: ShiftSymbol = serde_json::from_str("\"2\"").unwrap();
        assert_eq!(parsed, ShiftSymbol::Shift2);
    }

    #[test]
    fn test_cycle_and_absence_classification() {
        assert!(ShiftSymbol::Rest.is_cycle_symbol());
        assert!(!ShiftSymbol::Rest.is_working());
        assert!(ShiftSymbol::Leave.is_absence());
        assert!(!ShiftSymbol::Leave.is_cycle_symbol());
        assert_eq!(ShiftSymbol::from(AbsenceKind::Unjustified), ShiftSymbol::Absence);
    }

    #[test]
    fn test_normalize_agent_code() {
        assert_eq!(normalize_agent_code(" ag001 ").unwrap(), "AG001");
        assert!(matches!(
            normalize_agent_code("   "),
            Err(ValidationError::MissingField(_))
        ));
        assert!(normalize_agent_code("AG 001").is_err());
    }

    #[test]
    fn test_membership_window_excludes_exit_date() {
        let mut agent = Agent::new("AG001", "Dupont", "Jean", "A", date(2025, 11, 10));
        agent.exit_date = Some(date(2025, 11, 20));
        let snapshot = agent.snapshot();

        assert!(!snapshot.is_member_on(date(2025, 11, 9)));
        assert!(snapshot.is_member_on(date(2025, 11, 10)));
        assert!(snapshot.is_member_on(date(2025, 11, 19)));
        assert!(!snapshot.is_member_on(date(2025, 11, 20)));
    }

    #[test]
    fn test_override_map_last_write_wins() {
        let day = date(2025, 11, 3);
        let map: OverrideMap = vec![
            ShiftOverride::manual("AG001", day, ShiftSymbol::Shift1),
            ShiftOverride::manual("AG001", day, ShiftSymbol::Sickness),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get("AG001", day),
            Some((ShiftSymbol::Sickness, OverrideOrigin::Manual))
        );
        assert_eq!(map.get("AG002", day), None);
    }

    #[test]
    fn test_agent_full_name_and_status() {
        let agent = Agent::new("AG002", "Martin", "Pierre", "B", date(2025, 11, 1));
        assert_eq!(agent.full_name(), "Martin Pierre");
        assert!(agent.is_active());
        assert_eq!(AgentStatus::try_from("inactive".to_string()).unwrap(), AgentStatus::Inactive);
    }
}
