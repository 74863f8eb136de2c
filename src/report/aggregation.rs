//! Report data types and the gap-filling of time series.

use std::collections::HashMap;

use serde::{Serialize, ser::SerializeStruct};
use time::{Date, Month};

use crate::{
    category::CategoryId,
    money::Amount,
    period::{DateRange, format_year_month},
    transaction::TransactionType,
};

/// Income and expenses over some span of time.
///
/// Serializes as `{"income", "expense", "net"}` where `net` is income minus
/// expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flow {
    pub income: Amount,
    pub expense: Amount,
}

impl Flow {
    pub fn net(&self) -> Amount {
        self.income - self.expense
    }
}

impl Serialize for Flow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Flow", 3)?;
        state.serialize_field("income", &self.income)?;
        state.serialize_field("expense", &self.expense)?;
        state.serialize_field("net", &self.net())?;
        state.end()
    }
}

/// The total of one category and transaction type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// `None` for transactions without a category.
    pub category_id: Option<CategoryId>,
    pub category_name: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub total: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    #[serde(with = "crate::period::ymd_date")]
    pub date: Date,
    #[serde(flatten)]
    pub flow: Flow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    /// The month formatted as `YYYY-MM`.
    pub month: String,
    #[serde(flatten)]
    pub flow: Flow,
}

/// A time series with exactly one point per day or per month of a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    Daily(Vec<DailyPoint>),
    Monthly(Vec<MonthlyPoint>),
}

/// Build one point for every day in `date_range`, using zero for days
/// missing from `totals`.
pub fn fill_daily(date_range: DateRange, totals: &HashMap<Date, Flow>) -> Vec<DailyPoint> {
    date_range
        .days()
        .map(|date| DailyPoint {
            date,
            flow: totals.get(&date).copied().unwrap_or_default(),
        })
        .collect()
}

/// Build one point for each of the twelve months of `year`, using zero for
/// months missing from `totals`.
pub fn fill_monthly(year: i32, totals: &HashMap<Month, Flow>) -> Vec<MonthlyPoint> {
    std::iter::successors(Some(Month::January), |month| Some(month.next()))
        .take(12)
        .map(|month| MonthlyPoint {
            month: format_year_month(year, month),
            flow: totals.get(&month).copied().unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod series_tests {
    use std::collections::HashMap;

    use serde_json::json;
    use time::{Month, macros::date};

    use crate::{money::Amount, period::resolve_month};

    use super::{Flow, Series, fill_daily, fill_monthly};

    fn flow(income: i64, expense: i64) -> Flow {
        Flow {
            income: Amount::from_cents(income),
            expense: Amount::from_cents(expense),
        }
    }

    #[test]
    fn net_is_income_minus_expense() {
        assert_eq!(flow(1_000, 2_500).net(), Amount::from_cents(-1_500));
    }

    #[test]
    fn flow_serializes_net() {
        let got = serde_json::to_value(flow(100_000, 25_000)).unwrap();

        assert_eq!(
            got,
            json!({"income": "1000.00", "expense": "250.00", "net": "750.00"})
        );
    }

    #[test]
    fn daily_series_has_a_point_for_every_day() {
        let june = resolve_month(Some("2024-06")).unwrap();
        let totals = HashMap::from([(date!(2024 - 06 - 03), flow(100, 50))]);

        let series = fill_daily(june, &totals);

        assert_eq!(series.len(), 30);
        assert_eq!(series[0].date, date!(2024 - 06 - 01));
        assert_eq!(series[0].flow, Flow::default());
        assert_eq!(series[2].flow, flow(100, 50));
        assert_eq!(series[29].date, date!(2024 - 06 - 30));
    }

    #[test]
    fn daily_series_handles_leap_february() {
        let february = resolve_month(Some("2024-02")).unwrap();

        assert_eq!(fill_daily(february, &HashMap::new()).len(), 29);
    }

    #[test]
    fn monthly_series_has_twelve_points() {
        let totals = HashMap::from([(Month::December, flow(0, 700))]);

        let series = fill_monthly(2024, &totals);

        let months: Vec<&str> = series.iter().map(|point| point.month.as_str()).collect();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], "2024-01");
        assert_eq!(months[11], "2024-12");
        assert_eq!(series[11].flow, flow(0, 700));
        assert!(series[..11].iter().all(|point| point.flow == Flow::default()));
    }

    #[test]
    fn series_serializes_under_its_granularity() {
        let daily = Series::Daily(fill_daily(
            resolve_month(Some("2024-02")).unwrap(),
            &HashMap::new(),
        ));

        let got = serde_json::to_value(&daily).unwrap();

        assert_eq!(
            got["daily"][0],
            json!({"date": "2024-02-01", "income": "0.00", "expense": "0.00", "net": "0.00"})
        );
    }
}
