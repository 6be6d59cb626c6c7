use super::cells::RangeBounds;
use super::row::{DutyKind, RuleRow};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub(crate) const FALLBACK_SEGMENT: &str = "Легковой";
pub(crate) const FALLBACK_CATEGORY: &str = "M1";
pub(crate) const FALLBACK_FUEL: &str = "Бензин";

const CC_BANDS: [RangeBounds; 5] = [
    RangeBounds::new(None, Some(1000)),
    RangeBounds::between(1001, 1800),
    RangeBounds::between(1801, 2300),
    RangeBounds::between(2301, 3000),
    RangeBounds::new(Some(3001), None),
];

#[derive(Clone, Copy)]
enum CompanyRate {
    AdValorem { pct: Decimal, min_per_cc: Decimal },
    Specific(Decimal),
}

#[derive(Clone, Copy)]
struct PersonalRate {
    pct: Option<Decimal>,
    min_per_cc: Decimal,
}

/// Minimal passenger-petrol table used when no rule file is available.
///
/// It only covers `Легковой/M1/Бензин`; every other fuel or segment fails with
/// a missing-rule error until real data is loaded.
pub(crate) fn built_in_rows() -> Vec<RuleRow> {
    let ad_valorem_small = CompanyRate::AdValorem {
        pct: dec!(20),
        min_per_cc: dec!(0.36),
    };
    let ad_valorem_large = CompanyRate::AdValorem {
        pct: dec!(20),
        min_per_cc: dec!(0.44),
    };
    let company_young = [
        ad_valorem_small,
        ad_valorem_small,
        ad_valorem_large,
        ad_valorem_large,
        ad_valorem_large,
    ];
    let company_old = [
        CompanyRate::Specific(dec!(1.4)),
        CompanyRate::Specific(dec!(1.5)),
        CompanyRate::Specific(dec!(2.2)),
        CompanyRate::Specific(dec!(2.2)),
        CompanyRate::Specific(dec!(3.2)),
    ];

    let unified_new = [dec!(3.5), dec!(5.5), dec!(6.2), dec!(7.5), dec!(15)]
        .map(|min_per_cc| PersonalRate {
            pct: Some(dec!(48)),
            min_per_cc,
        });
    let unified_mid = [dec!(1.5), dec!(2.5), dec!(2.7), dec!(3.0), dec!(3.6)]
        .map(|min_per_cc| PersonalRate {
            pct: None,
            min_per_cc,
        });
    let unified_old = [dec!(3.0), dec!(3.5), dec!(4.8), dec!(5.0), dec!(5.7)]
        .map(|min_per_cc| PersonalRate {
            pct: None,
            min_per_cc,
        });

    let buckets = [
        ("≤3", company_young, unified_new),
        ("3–5", company_young, unified_mid),
        ("5–7", company_young, unified_old),
        (">7", company_old, unified_old),
    ];

    buckets
        .into_iter()
        .flat_map(|(age_bucket, company, personal)| {
            CC_BANDS
                .into_iter()
                .zip(company)
                .zip(personal)
                .map(move |((engine_cc, company), personal)| {
                    bracket(age_bucket, engine_cc, company, personal)
                })
        })
        .collect()
}

fn bracket(
    age_bucket: &str,
    engine_cc: RangeBounds,
    company: CompanyRate,
    personal: PersonalRate,
) -> RuleRow {
    let (duty_kind, duty_pct, min_per_cc, specific_per_cc) = match company {
        CompanyRate::AdValorem { pct, min_per_cc } => (
            DutyKind::AdValoremWithMinimum,
            Some(pct),
            Some(min_per_cc),
            None,
        ),
        CompanyRate::Specific(rate) => (DutyKind::SpecificPerUnit, None, None, Some(rate)),
    };

    RuleRow {
        segment: FALLBACK_SEGMENT.to_string(),
        category: FALLBACK_CATEGORY.to_string(),
        fuel: FALLBACK_FUEL.to_string(),
        age_bucket: age_bucket.to_string(),
        engine_cc,
        engine_hp: RangeBounds::UNBOUNDED,
        duty_kind,
        duty_pct,
        min_per_cc,
        specific_per_cc,
        personal_pct: personal.pct,
        personal_min_per_cc: Some(personal.min_per_cc),
        vat_pct: Some(dec!(20)),
        excise_per_hp: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_covers_every_bucket_and_displacement() {
        let rows = built_in_rows();
        assert_eq!(rows.len(), 20);

        for bucket in ["≤3", "3–5", "5–7", ">7"] {
            for cc in [800, 1600, 2300, 2301, 5000] {
                assert!(
                    rows.iter()
                        .any(|row| row.age_bucket == bucket && row.engine_cc.contains(Some(cc))),
                    "no built-in row for {bucket} at {cc} cc"
                );
            }
        }
    }

    #[test]
    fn older_company_imports_use_specific_rates() {
        let rows = built_in_rows();
        let row = rows
            .iter()
            .find(|row| row.age_bucket == ">7" && row.engine_cc.contains(Some(3500)))
            .expect("row for >7 large engines");
        assert_eq!(row.duty_kind, DutyKind::SpecificPerUnit);
        assert_eq!(row.specific_per_cc, Some(dec!(3.2)));
    }
}
