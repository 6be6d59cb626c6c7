use super::row::RuleRow;
use serde::Serialize;

/// Normalized attributes a rule row is matched against.
#[derive(Debug, Clone, Copy)]
pub struct RuleQuery<'a> {
    pub segment: &'a str,
    pub category: &'a str,
    pub fuel: &'a str,
    pub age_bucket: &'a str,
    pub engine_cc: u32,
    pub engine_hp: Option<u32>,
}

/// Which matcher pass produced the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPass {
    Exact,
    PowerRelaxed,
}

#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    pub row: &'a RuleRow,
    pub pass: MatchPass,
}

/// Selects the first row, in load order, that fits the query.
///
/// The first pass checks both the displacement and power ranges. The second
/// pass ignores the power range, because many brackets are keyed on
/// displacement alone and callers often do not know the power.
pub fn pick<'a>(rows: &'a [RuleRow], query: &RuleQuery<'_>) -> Option<RuleMatch<'a>> {
    let keyed = |row: &&RuleRow| {
        row.segment == query.segment
            && row.category == query.category
            && row.fuel == query.fuel
            && row.age_bucket == query.age_bucket
            && row.engine_cc.contains(Some(query.engine_cc))
    };

    if let Some(row) = rows
        .iter()
        .filter(keyed)
        .find(|row| row.engine_hp.contains(query.engine_hp))
    {
        return Some(RuleMatch {
            row,
            pass: MatchPass::Exact,
        });
    }

    rows.iter().find(keyed).map(|row| RuleMatch {
        row,
        pass: MatchPass::PowerRelaxed,
    })
}
