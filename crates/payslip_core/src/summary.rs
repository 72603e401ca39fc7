use crate::MonthSummary;

/// Range-wide counters shown above the monthly table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SummaryTotals {
    pub total: u64,
    pub sent: u64,
    pub failed: u64,
    pub pending: u64,
}

pub fn totals(rows: &[MonthSummary]) -> SummaryTotals {
    rows.iter().fold(SummaryTotals::default(), |acc, row| SummaryTotals {
        total: acc.total + u64::from(row.total),
        sent: acc.sent + u64::from(row.sent),
        failed: acc.failed + u64::from(row.failed),
        pending: acc.pending + u64::from(row.pending),
    })
}

/// Orders rows chronologically; the backend gives no ordering guarantee.
pub fn sort_chronologically(rows: &mut [MonthSummary]) {
    rows.sort_by_key(|row| (row.year, row.month));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(year: i32, month: u32, sent: u32, failed: u32, pending: u32) -> MonthSummary {
        MonthSummary {
            year,
            month,
            total: sent + failed + pending,
            sent,
            failed,
            pending,
        }
    }

    #[test]
    fn rows_sort_by_year_then_month() {
        let mut rows = vec![row(2024, 2, 1, 0, 0), row(2023, 12, 1, 0, 0), row(2024, 1, 1, 0, 0)];
        sort_chronologically(&mut rows);
        let keys: Vec<_> = rows.iter().map(|r| (r.year, r.month)).collect();
        assert_eq!(keys, vec![(2023, 12), (2024, 1), (2024, 2)]);
    }

    #[test]
    fn totals_sum_every_column() {
        let rows = vec![row(2024, 1, 18, 2, 0), row(2024, 2, 10, 1, 4)];
        assert!(rows.iter().all(MonthSummary::is_consistent));
        assert_eq!(
            totals(&rows),
            SummaryTotals {
                total: 35,
                sent: 28,
                failed: 3,
                pending: 4,
            }
        );
    }

    #[test]
    fn consistency_checks_total_against_the_columns() {
        assert!(row(2024, 3, 0, 0, 0).is_consistent());
        let mut drifted = row(2024, 3, 5, 1, 0);
        drifted.total = 7;
        assert!(!drifted.is_consistent());
        // Totals sum what the backend reported; the rule is not enforced here.
        assert_eq!(totals(&[drifted]).total, 7);
    }
}
