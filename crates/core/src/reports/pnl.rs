//! P&L report assembly.
//!
//! Sign convention: positive amounts are income, negative amounts are
//! expenses. Expenses are stored negative and displayed positive, so the
//! raw expense sum is absolute-valued before it reaches the wire.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::period::PeriodRange;

/// Fallback bucket for transactions without a category.
const UNCATEGORIZED: &str = "Uncategorized";

/// One category's summed amounts as returned by the ledger store.
#[derive(Debug, Clone)]
pub struct CategorySum {
    /// Category name; `None` for uncategorized transactions.
    pub category_name: Option<String>,
    /// Signed sum of amounts in the category.
    pub total: Decimal,
}

/// Whether a breakdown row nets out as income or expense.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakdownKind {
    /// Raw sum was non-negative.
    Income,
    /// Raw sum was negative.
    Expense,
}

/// One row of the category breakdown.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// Category name, falling back to "Uncategorized".
    pub category_name: String,
    /// Absolute summed amount.
    pub amount: Decimal,
    /// Income or expense classification of the raw sum.
    #[serde(rename = "type")]
    pub kind: BreakdownKind,
}

/// A profit-and-loss report for one tenant and period.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PnLReport {
    /// The period key this report answers.
    pub period: String,
    /// First day of the period (YYYY-MM-DD).
    pub start_date: String,
    /// Last day of the period (YYYY-MM-DD).
    pub end_date: String,
    /// Sum of positive amounts.
    pub total_income: Decimal,
    /// Absolute sum of negative amounts.
    pub total_expense: Decimal,
    /// Income minus expense.
    pub net_profit: Decimal,
    /// Per-category breakdown, ordered by descending raw sum.
    pub breakdown: Vec<CategoryBreakdown>,
}

/// Assembles a P&L report from ledger aggregates.
///
/// `raw_expense` is the (negative) sum of negative amounts as stored; it is
/// absolute-valued here. Empty aggregates produce a zeroed report.
#[must_use]
pub fn build_report(
    period: &str,
    range: PeriodRange,
    income: Decimal,
    raw_expense: Decimal,
    by_category: Vec<CategorySum>,
) -> PnLReport {
    let total_expense = raw_expense.abs();
    let net_profit = income - total_expense;

    let breakdown = by_category
        .into_iter()
        .map(|row| {
            let kind = if row.total.is_sign_negative() && !row.total.is_zero() {
                BreakdownKind::Expense
            } else {
                BreakdownKind::Income
            };
            CategoryBreakdown {
                category_name: row
                    .category_name
                    .unwrap_or_else(|| UNCATEGORIZED.to_string()),
                amount: row.total.abs(),
                kind,
            }
        })
        .collect();

    PnLReport {
        period: period.to_string(),
        start_date: format_date(range.start),
        end_date: format_date(range.end),
        total_income: income,
        total_expense,
        net_profit,
        breakdown,
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn range() -> PeriodRange {
        PeriodRange {
            start: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
        }
    }

    #[test]
    fn income_and_expense_signs() {
        let report = build_report("month", range(), dec!(50000), dec!(-12500), vec![]);

        assert_eq!(report.total_income, dec!(50000));
        assert_eq!(report.total_expense, dec!(12500));
        assert_eq!(report.net_profit, dec!(37500));
        assert_eq!(report.start_date, "2026-02-01");
        assert_eq!(report.end_date, "2026-02-28");
    }

    #[test]
    fn empty_ledger_yields_zeros() {
        let report = build_report("month", range(), Decimal::ZERO, Decimal::ZERO, vec![]);

        assert_eq!(report.total_income, Decimal::ZERO);
        assert_eq!(report.total_expense, Decimal::ZERO);
        assert_eq!(report.net_profit, Decimal::ZERO);
        assert!(report.breakdown.is_empty());
    }

    #[test]
    fn breakdown_classifies_and_absolutes() {
        let rows = vec![
            CategorySum {
                category_name: Some("Sales".to_string()),
                total: dec!(8000),
            },
            CategorySum {
                category_name: None,
                total: dec!(-300),
            },
            CategorySum {
                category_name: Some("Rent".to_string()),
                total: dec!(-2000),
            },
        ];

        let report = build_report("month", range(), dec!(8000), dec!(-2300), rows);

        assert_eq!(report.breakdown.len(), 3);

        assert_eq!(report.breakdown[0].category_name, "Sales");
        assert_eq!(report.breakdown[0].amount, dec!(8000));
        assert_eq!(report.breakdown[0].kind, BreakdownKind::Income);

        assert_eq!(report.breakdown[1].category_name, "Uncategorized");
        assert_eq!(report.breakdown[1].amount, dec!(300));
        assert_eq!(report.breakdown[1].kind, BreakdownKind::Expense);

        assert_eq!(report.breakdown[2].category_name, "Rent");
        assert_eq!(report.breakdown[2].amount, dec!(2000));
        assert_eq!(report.breakdown[2].kind, BreakdownKind::Expense);
    }

    #[test]
    fn zero_category_sum_counts_as_income() {
        let rows = vec![CategorySum {
            category_name: Some("Adjustments".to_string()),
            total: Decimal::ZERO,
        }];
        let report = build_report("month", range(), Decimal::ZERO, Decimal::ZERO, rows);
        assert_eq!(report.breakdown[0].kind, BreakdownKind::Income);
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let report = build_report("month", range(), dec!(1), dec!(0), vec![]);
        let value = serde_json::to_value(&report).unwrap();

        assert!(value.get("totalIncome").is_some());
        assert!(value.get("totalExpense").is_some());
        assert!(value.get("netProfit").is_some());
        assert!(value.get("startDate").is_some());
        assert_eq!(value["startDate"], "2026-02-01");
    }
}
