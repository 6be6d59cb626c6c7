//! Vehicle age resolution.
//!
//! Age buckets are whatever labels the loaded rule table uses. The resolver
//! recognises the usual spellings of each regulatory bucket and turns an
//! actual age into an ordered list of labels to try against the rules.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const DAYS_PER_YEAR: f64 = 365.2425;

/// Regulatory age bucket a rule-table label can stand for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeCategory {
    UpToThree,
    ThreeToFive,
    FiveToSeven,
    OverSeven,
    OverFive,
}

/// Order in which the remaining buckets are tried once the preferred ones are
/// exhausted.
const FALLBACK_ORDER: [AgeCategory; 5] = [
    AgeCategory::ThreeToFive,
    AgeCategory::FiveToSeven,
    AgeCategory::OverSeven,
    AgeCategory::OverFive,
    AgeCategory::UpToThree,
];

impl AgeCategory {
    pub const fn canonical_label(self) -> &'static str {
        match self {
            Self::UpToThree => "≤3",
            Self::ThreeToFive => "3–5",
            Self::FiveToSeven => "5–7",
            Self::OverSeven => ">7",
            Self::OverFive => ">5",
        }
    }

    /// Recognises a rule-table label, tolerating hyphen styles and spacing.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_lowercase()
            .replace("<=", "≤")
            .replace(['-', '—'], "–")
            .split_whitespace()
            .collect::<String>();

        match normalized.as_str() {
            "≤3" | "1–3" | "0–3" | "до3" => Some(Self::UpToThree),
            "3–5" => Some(Self::ThreeToFive),
            "5–7" => Some(Self::FiveToSeven),
            ">7" | "7+" | "старше7" | "более7" | "свыше7" => Some(Self::OverSeven),
            ">5" | "5+" | "старше5" | "более5" | "свыше5" => Some(Self::OverFive),
            _ => None,
        }
    }

    /// Whether a rule written for `self` is a faithful stand-in for `ideal`.
    pub fn satisfies(self, ideal: AgeCategory) -> bool {
        self == ideal
            || (self == Self::OverFive && matches!(ideal, Self::FiveToSeven | Self::OverSeven))
    }

    fn for_actual_age(age_years: f64) -> Self {
        if age_years <= 3.0 {
            Self::UpToThree
        } else if age_years <= 5.0 {
            Self::ThreeToFive
        } else if age_years <= 7.0 {
            Self::FiveToSeven
        } else {
            Self::OverSeven
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_label())
    }
}

/// Distinct age labels present in a rule table, grouped by bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgeBucketSet {
    recognized: BTreeMap<AgeCategory, Vec<String>>,
    other: BTreeSet<String>,
}

impl AgeBucketSet {
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            match AgeCategory::from_label(label) {
                Some(category) => {
                    let known = set.recognized.entry(category).or_default();
                    if !known.iter().any(|existing| existing == label) {
                        known.push(label.to_string());
                        known.sort();
                    }
                }
                None => {
                    set.other.insert(label.to_string());
                }
            }
        }
        set
    }

    pub fn has(&self, category: AgeCategory) -> bool {
        self.recognized.contains_key(&category)
    }

    pub fn labels_for(&self, category: AgeCategory) -> &[String] {
        self.recognized
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn unrecognized(&self) -> &BTreeSet<String> {
        &self.other
    }

    pub fn all_labels(&self) -> BTreeSet<String> {
        self.recognized
            .values()
            .flatten()
            .chain(self.other.iter())
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.recognized.is_empty() && self.other.is_empty()
    }
}

/// Age in years between December 31 of the production year and the
/// declaration date, never negative.
///
/// Only the year of manufacture is known, so the latest possible production
/// day is assumed.
pub fn actual_age_years(production_year: i32, declaration_date: NaiveDate) -> f64 {
    let Some(year_end) = NaiveDate::from_ymd_opt(production_year, 12, 31) else {
        return 0.0;
    };
    let days = (declaration_date - year_end).num_days().max(0);
    days as f64 / DAYS_PER_YEAR
}

/// Ordered age labels to try against the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeCandidates {
    pub ideal: AgeCategory,
    pub labels: Vec<String>,
}

impl AgeCandidates {
    pub fn preferred(&self) -> &str {
        self.labels
            .first()
            .map(String::as_str)
            .unwrap_or(self.ideal.canonical_label())
    }
}

/// Candidates for an individual importer.
///
/// The "not older than three years" answer is trusted as given; otherwise the
/// bucket follows the actual age.
pub fn candidates_for_individual(
    older_than_three: bool,
    age_years: f64,
    buckets: &AgeBucketSet,
) -> AgeCandidates {
    if !older_than_three {
        return build_candidates(AgeCategory::UpToThree, &[AgeCategory::UpToThree], buckets);
    }

    let ideal = match AgeCategory::for_actual_age(age_years) {
        AgeCategory::UpToThree => AgeCategory::ThreeToFive,
        other => other,
    };
    let mut preferred = Vec::new();
    if age_years <= 5.0 {
        preferred.push(AgeCategory::ThreeToFive);
    }
    if age_years <= 7.0 {
        preferred.push(AgeCategory::FiveToSeven);
    }
    preferred.extend(older_tail(age_years));

    build_candidates(ideal, &preferred, buckets)
}

/// Candidates for a company importer, always driven by the actual age.
pub fn candidates_for_company(age_years: f64, buckets: &AgeBucketSet) -> AgeCandidates {
    let ideal = AgeCategory::for_actual_age(age_years);
    let mut preferred = Vec::new();
    if age_years <= 3.0 {
        preferred.push(AgeCategory::UpToThree);
    }
    if age_years <= 5.0 {
        preferred.push(AgeCategory::ThreeToFive);
    }
    if age_years <= 7.0 {
        preferred.push(AgeCategory::FiveToSeven);
    }
    preferred.extend(older_tail(age_years));

    build_candidates(ideal, &preferred, buckets)
}

fn older_tail(age_years: f64) -> [AgeCategory; 2] {
    if age_years > 5.0 && age_years <= 7.0 {
        [AgeCategory::OverFive, AgeCategory::OverSeven]
    } else {
        [AgeCategory::OverSeven, AgeCategory::OverFive]
    }
}

fn build_candidates(
    ideal: AgeCategory,
    preferred: &[AgeCategory],
    buckets: &AgeBucketSet,
) -> AgeCandidates {
    let mut labels: Vec<String> = Vec::new();
    for category in preferred.iter().chain(FALLBACK_ORDER.iter()) {
        for label in buckets.labels_for(*category) {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
    }
    labels.extend(buckets.unrecognized().iter().cloned());

    if labels.is_empty() {
        labels.push(ideal.canonical_label().to_string());
    }

    AgeCandidates { ideal, labels }
}
