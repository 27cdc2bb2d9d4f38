// Shift rotation module
//
// Resolves the shift dictated by the rotation cycle for a (group, date) pair
// and projects a full month of planning entries for a roster.
//
// Day index 0 of the cycle is the anchor date. A group's phase offset shifts
// its position in the cycle: position = floor_mod(days_since_anchor + offset, len).

use crate::errors::RotationError;
use crate::models::{
    normalize_group_code, AgentSnapshot, EntrySource, OverrideMap, PlanningEntry, RotationGroup,
    ShiftSymbol,
};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashSet};

/// Reference rotation: two days of each working shift, then two rest days
pub const REFERENCE_CYCLE: [ShiftSymbol; 8] = [
    ShiftSymbol::Shift1,
    ShiftSymbol::Shift1,
    ShiftSymbol::Shift2,
    ShiftSymbol::Shift2,
    ShiftSymbol::Shift3,
    ShiftSymbol::Shift3,
    ShiftSymbol::Rest,
    ShiftSymbol::Rest,
];

/// Reference phase offsets per group
pub const REFERENCE_GROUPS: [(&str, u32); 5] = [("A", 0), ("B", 2), ("C", 4), ("D", 6), ("E", 0)];

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

/// Floored (Euclidean) modulo: the result is always in `[0, modulus)`
///
/// # Panics
/// Panics if `modulus` is zero.
#[inline]
pub fn floor_mod(value: i64, modulus: i64) -> i64 {
    value.rem_euclid(modulus)
}

fn validate_month_year(month: u32, year: i32) -> Result<NaiveDate, RotationError> {
    if !(1..=12).contains(&month) {
        return Err(RotationError::InvalidMonth(month));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(RotationError::InvalidYear(year));
    }
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(RotationError::InvalidYear(year))
}

/// Number of days in a month, leap years included
pub fn days_in_month(month: u32, year: i32) -> Result<u32, RotationError> {
    let first = validate_month_year(month, year)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or(RotationError::InvalidYear(year))?;

    Ok((next_first - first).num_days() as u32)
}

/// Every date of a month, in order
pub fn month_days(month: u32, year: i32) -> Result<Vec<NaiveDate>, RotationError> {
    let first = validate_month_year(month, year)?;
    let count = days_in_month(month, year)?;
    Ok(first.iter_days().take(count as usize).collect())
}

/// An immutable, non-empty sequence of cycle symbols
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    symbols: Vec<ShiftSymbol>,
}

impl Cycle {
    pub fn new(symbols: Vec<ShiftSymbol>) -> Result<Self, RotationError> {
        if symbols.is_empty() {
            return Err(RotationError::InvalidConfiguration(
                "rotation cycle cannot be empty".to_string(),
            ));
        }
        if let Some(bad) = symbols.iter().find(|s| !s.is_cycle_symbol()) {
            return Err(RotationError::InvalidConfiguration(format!(
                "'{}' is an absence code and cannot appear in the rotation cycle",
                bad
            )));
        }
        Ok(Self { symbols })
    }

    pub fn reference() -> Self {
        Self {
            symbols: REFERENCE_CYCLE.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[ShiftSymbol] {
        &self.symbols
    }

    /// Symbol at a day position, wrapping with floored modulo
    pub fn symbol_at(&self, position: i64) -> ShiftSymbol {
        let index = floor_mod(position, self.symbols.len() as i64) as usize;
        self.symbols[index]
    }
}

/// The rotation rule: a shared cycle plus the phase offset of every group
///
/// The anchor date is not part of this value; callers pass it
/// with every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rotation {
    cycle: Cycle,
    groups: BTreeMap<String, u32>,
    fallback_offset: Option<u32>,
}

impl Rotation {
    /// Build a rotation, validating every offset against the cycle length
    pub fn new<I, S>(
        cycle: Cycle,
        groups: I,
        fallback_offset: Option<u32>,
    ) -> Result<Self, RotationError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let cycle_len = cycle.len() as u32;
        let mut table = BTreeMap::new();

        for (code, offset) in groups {
            let code = normalize_group_code(code.as_ref());
            if code.is_empty() {
                return Err(RotationError::InvalidConfiguration(
                    "rotation group code cannot be empty".to_string(),
                ));
            }
            if offset >= cycle_len {
                return Err(RotationError::InvalidConfiguration(format!(
                    "offset {} of group {} must be less than the cycle length {}",
                    offset, code, cycle_len
                )));
            }
            if table.insert(code.clone(), offset).is_some() {
                return Err(RotationError::InvalidConfiguration(format!(
                    "rotation group {} is defined twice",
                    code
                )));
            }
        }

        if table.is_empty() {
            return Err(RotationError::InvalidConfiguration(
                "at least one rotation group is required".to_string(),
            ));
        }

        if let Some(offset) = fallback_offset {
            if offset >= cycle_len {
                return Err(RotationError::InvalidConfiguration(format!(
                    "fallback offset {} must be less than the cycle length {}",
                    offset, cycle_len
                )));
            }
        }

        Ok(Self {
            cycle,
            groups: table,
            fallback_offset,
        })
    }

    /// The reference 8-day rotation with groups A-E
    pub fn reference() -> Self {
        Self {
            cycle: Cycle::reference(),
            groups: REFERENCE_GROUPS
                .iter()
                .map(|(code, offset)| (code.to_string(), *offset))
                .collect(),
            fallback_offset: None,
        }
    }

    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    pub fn fallback_offset(&self) -> Option<u32> {
        self.fallback_offset
    }

    /// Configured groups ordered by code
    pub fn groups(&self) -> Vec<RotationGroup> {
        self.groups
            .iter()
            .map(|(code, offset)| RotationGroup {
                code: code.clone(),
                offset: *offset,
            })
            .collect()
    }

    /// True when the group is explicitly configured (the fallback is ignored)
    pub fn is_known_group(&self, group: &str) -> bool {
        self.groups.contains_key(&normalize_group_code(group))
    }

    /// Phase offset of a group
    ///
    /// Unknown groups fail with `InvalidGroup` unless a fallback offset is
    /// configured.
    pub fn phase_offset(&self, group: &str) -> Result<u32, RotationError> {
        let code = normalize_group_code(group);
        self.groups
            .get(&code)
            .copied()
            .or(self.fallback_offset)
            .ok_or(RotationError::InvalidGroup(code))
    }

    fn shift_for_offset(&self, offset: u32, target_date: NaiveDate, anchor: NaiveDate) -> ShiftSymbol {
        let day_index = (target_date - anchor).num_days();
        self.cycle.symbol_at(day_index + i64::from(offset))
    }

    /// Shift dictated by the rotation cycle for a group on a date
    pub fn resolve_shift(
        &self,
        group: &str,
        target_date: NaiveDate,
        anchor: NaiveDate,
    ) -> Result<ShiftSymbol, RotationError> {
        let offset = self.phase_offset(group)?;
        Ok(self.shift_for_offset(offset, target_date, anchor))
    }

    /// Resolve every (agent, day) pair of a month, overrides first
    ///
    /// Entries are ordered by group code, then agent code, then date. Agents
    /// produce no entry for days outside their membership window.
    pub fn project_month(
        &self,
        agents: &[AgentSnapshot],
        month: u32,
        year: i32,
        anchor: NaiveDate,
        overrides: &OverrideMap,
    ) -> Result<Vec<PlanningEntry>, RotationError> {
        let days = month_days(month, year)?;

        let mut seen = HashSet::with_capacity(agents.len());
        let mut roster = Vec::with_capacity(agents.len());
        for agent in agents {
            if !seen.insert(agent.code.as_str()) {
                return Err(RotationError::DuplicateAgentCode(agent.code.clone()));
            }
            let group_code = normalize_group_code(&agent.group_code);
            let offset = self.phase_offset(&group_code)?;
            roster.push((group_code, offset, agent));
        }
        roster.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.2.code.cmp(&b.2.code)));

        let mut entries = Vec::with_capacity(roster.len() * days.len());
        for (group_code, offset, agent) in roster {
            for &date in days.iter().filter(|d| agent.is_member_on(**d)) {
                let (shift, source) = match overrides.get(&agent.code, date) {
                    Some((shift, origin)) => (shift, EntrySource::from(origin)),
                    None => (
                        self.shift_for_offset(offset, date, anchor),
                        EntrySource::Cycle,
                    ),
                };
                entries.push(PlanningEntry {
                    agent_code: agent.code.clone(),
                    group_code: group_code.clone(),
                    date,
                    shift,
                    source,
                });
            }
        }

        Ok(entries)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::reference()
    }
}

/// Short French weekday label used on the planning grid
pub fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Lun",
        chrono::Weekday::Tue => "Mar",
        chrono::Weekday::Wed => "Mer",
        chrono::Weekday::Thu => "Jeu",
        chrono::Weekday::Fri => "Ven",
        chrono::Weekday::Sat => "Sam",
        chrono::Weekday::Sun => "Dim",
    }
}
