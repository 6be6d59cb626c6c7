use super::cells::{parse_decimal, parse_range, Cell, RangeBounds};
use super::row::{DutyKind, RuleRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use tracing::warn;

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<RuleRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<RuleCsvRow>().enumerate() {
        let raw = record?;
        // Header is line 1.
        let line = index + 2;
        rows.push(raw.into_rule(line));
    }

    Ok(rows)
}

#[derive(Debug, Deserialize)]
struct RuleCsvRow {
    #[serde(rename = "Сегмент", default)]
    segment: String,
    #[serde(rename = "Категория ТС", default)]
    category: String,
    #[serde(rename = "Топливо/Тип привода", default)]
    fuel: String,
    #[serde(rename = "Возрастная категория", default)]
    age_bucket: String,
    #[serde(
        rename = "Диапазон объёма, см³",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    range_cc: Option<String>,
    #[serde(
        rename = "Диапазон мощности, л.с.",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    range_hp: Option<String>,
    #[serde(
        rename = "Тип ставки пошлины",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    duty_type: Option<String>,
    #[serde(
        rename = "Ставка пошлины, %",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    duty_pct: Option<String>,
    #[serde(
        rename = "Минимум пошлины, €/см³",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    min_per_cc: Option<String>,
    #[serde(
        rename = "Специфическая пошлина, €/см³",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    specific_per_cc: Option<String>,
    #[serde(
        rename = "СТП (для ФЛ), %",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    personal_pct: Option<String>,
    #[serde(
        rename = "СТП (для ФЛ), минимум €/см³",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    personal_min_per_cc: Option<String>,
    #[serde(rename = "НДС, %", default, deserialize_with = "empty_string_as_none")]
    vat_pct: Option<String>,
    #[serde(
        rename = "Акциз, ₽/л.с.",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    excise_per_hp: Option<String>,
}

impl RuleCsvRow {
    fn into_rule(self, line: usize) -> RuleRow {
        let engine_cc = range_cell(self.range_cc.as_deref(), line, "engine cc range");
        let engine_hp = range_cell(self.range_hp.as_deref(), line, "engine hp range");
        let specific_per_cc = decimal_cell(self.specific_per_cc.as_deref(), line, "specific duty");

        RuleRow {
            duty_kind: DutyKind::classify(self.duty_type.as_deref(), specific_per_cc),
            segment: self.segment,
            category: self.category,
            fuel: self.fuel,
            age_bucket: self.age_bucket,
            engine_cc,
            engine_hp,
            duty_pct: decimal_cell(self.duty_pct.as_deref(), line, "duty rate"),
            min_per_cc: decimal_cell(self.min_per_cc.as_deref(), line, "minimum duty"),
            specific_per_cc,
            personal_pct: decimal_cell(self.personal_pct.as_deref(), line, "unified duty rate"),
            personal_min_per_cc: decimal_cell(
                self.personal_min_per_cc.as_deref(),
                line,
                "unified duty minimum",
            ),
            vat_pct: decimal_cell(self.vat_pct.as_deref(), line, "VAT rate"),
            excise_per_hp: decimal_cell(self.excise_per_hp.as_deref(), line, "excise rate"),
        }
    }
}

fn range_cell(raw: Option<&str>, line: usize, column: &'static str) -> RangeBounds {
    let Some(raw) = raw else {
        return RangeBounds::UNBOUNDED;
    };

    match parse_range(raw) {
        Cell::Value(range) => range,
        Cell::Empty => RangeBounds::UNBOUNDED,
        Cell::Malformed => {
            warn!(line, column, value = raw, "malformed range cell treated as unbounded");
            RangeBounds::UNBOUNDED
        }
    }
}

fn decimal_cell(raw: Option<&str>, line: usize, column: &'static str) -> Option<Decimal> {
    let raw = raw?;
    let cell = parse_decimal(raw);
    if cell == Cell::Malformed {
        warn!(line, column, value = raw, "malformed numeric cell treated as unset");
    }
    cell.into_option()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;

    #[test]
    fn rows_are_parsed_with_cyrillic_headers() {
        let csv = "\"Сегмент\",\"Категория ТС\",\"Топливо/Тип привода\",\"Возрастная категория\",\"Диапазон объёма, см³\",\"Диапазон мощности, л.с.\",\"Тип ставки пошлины\",\"Ставка пошлины, %\",\"Минимум пошлины, €/см³\",\"Специфическая пошлина, €/см³\",\"СТП (для ФЛ), %\",\"СТП (для ФЛ), минимум €/см³\",\"НДС, %\",\"Акциз, ₽/л.с.\"\n\
Легковой,M1,Бензин,3–5,2301-3000,—,Адвалор+Мин,20,\"0,44\",,,3.0,20,\n";

        let rows = parse_rows(Cursor::new(csv)).expect("rows parse");
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.segment, "Легковой");
        assert_eq!(row.age_bucket, "3–5");
        assert_eq!(row.engine_cc, RangeBounds::between(2301, 3000));
        assert!(row.engine_hp.is_unbounded());
        assert_eq!(row.duty_kind, DutyKind::AdValoremWithMinimum);
        assert_eq!(row.duty_pct, Some(dec!(20)));
        assert_eq!(row.min_per_cc, Some(dec!(0.44)));
        assert_eq!(row.personal_min_per_cc, Some(dec!(3.0)));
        assert_eq!(row.vat_pct, Some(dec!(20)));
        assert_eq!(row.excise_per_hp, None);
    }

    #[test]
    fn malformed_cells_degrade_instead_of_failing_the_load() {
        let csv = "\"Сегмент\",\"Категория ТС\",\"Топливо/Тип привода\",\"Возрастная категория\",\"Диапазон объёма, см³\",\"Ставка пошлины, %\"\n\
Легковой,M1,Бензин,≤3,about 2 litres,twenty\n\
Легковой,M1,Бензин,≤3,1801-2300,15\n";

        let rows = parse_rows(Cursor::new(csv)).expect("rows parse");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].engine_cc.is_unbounded());
        assert_eq!(rows[0].duty_pct, None);
        assert_eq!(rows[1].engine_cc, RangeBounds::between(1801, 2300));
        assert_eq!(rows[1].duty_pct, Some(dec!(15)));
        assert!(rows[1].engine_hp.is_unbounded());
    }
}
