//! Ordering competing stats snapshots by a "better" criterion.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::decoration::Style;
use crate::report::Report;
use crate::stats::{Stat, Stats};
use crate::table;

/// Which statistic decides the ranking, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankingCriteria {
    LowerMeanIsBetter,
    HigherMeanIsBetter,
    LowerMedianIsBetter,
    HigherMedianIsBetter,
    LowerMinIsBetter,
    HigherMinIsBetter,
    LowerMaxIsBetter,
    HigherMaxIsBetter,
}

const CRITERIA: [(RankingCriteria, Stat, bool, &str); 8] = [
    (RankingCriteria::LowerMeanIsBetter, Stat::Mean, true, "Lower Mean is Better"),
    (RankingCriteria::HigherMeanIsBetter, Stat::Mean, false, "Higher Mean is Better"),
    (RankingCriteria::LowerMedianIsBetter, Stat::Median, true, "Lower Median is Better"),
    (RankingCriteria::HigherMedianIsBetter, Stat::Median, false, "Higher Median is Better"),
    (RankingCriteria::LowerMinIsBetter, Stat::Min, true, "Lower Min is Better"),
    (RankingCriteria::HigherMinIsBetter, Stat::Min, false, "Higher Min is Better"),
    (RankingCriteria::LowerMaxIsBetter, Stat::Max, true, "Lower Max is Better"),
    (RankingCriteria::HigherMaxIsBetter, Stat::Max, false, "Higher Max is Better"),
];

impl RankingCriteria {
    fn row(self) -> (Stat, bool, &'static str) {
        CRITERIA
            .iter()
            .find(|(c, ..)| *c == self)
            .map(|&(_, stat, lower, label)| (stat, lower, label))
            .unwrap_or((Stat::Mean, true, ""))
    }

    /// The statistic compared.
    pub fn stat(self) -> Stat {
        self.row().0
    }

    /// Whether smaller values win.
    pub fn lower_is_better(self) -> bool {
        self.row().1
    }

    fn compare(self, a: &Stats, b: &Stats) -> Ordering {
        let stat = self.stat();
        let ord = a.float_for(stat).total_cmp(&b.float_for(stat));
        if self.lower_is_better() {
            ord
        } else {
            ord.reverse()
        }
    }
}

impl fmt::Display for RankingCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.row().2)
    }
}

/// Stats sorted best-first.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub criteria: RankingCriteria,
    pub stats: Vec<Stats>,
}

/// Sort `stats` by `criteria`. Tie order is unspecified.
///
/// ```
/// use cntryl_measure::{rank_stats, Decorations, Experiment, RankingCriteria};
///
/// let fast = Experiment::new("fast");
/// fast.record_value("t", 1.0, Decorations::new());
/// let slow = Experiment::new("slow");
/// slow.record_value("t", 5.0, Decorations::new());
///
/// let ranking = rank_stats(
///     RankingCriteria::LowerMeanIsBetter,
///     vec![slow.get_stats("t"), fast.get_stats("t")],
/// );
/// assert_eq!(ranking.winner().experiment_name, "fast");
/// ```
pub fn rank_stats(criteria: RankingCriteria, mut stats: Vec<Stats>) -> Ranking {
    stats.sort_unstable_by(|a, b| criteria.compare(a, b));
    Ranking { criteria, stats }
}

impl Ranking {
    /// The best stats, or zero-count stats if the ranking is empty.
    pub fn winner(&self) -> Stats {
        self.stats.first().cloned().unwrap_or_default()
    }
}

impl Report for Ranking {
    fn report(&self, styled: bool) -> String {
        if self.stats.is_empty() {
            return "Empty Ranking".to_string();
        }
        let mut t = table::new_table(styled);
        t.set_header(
            ["Experiment", "Name", "N", "Min", "Median", "Mean", "StdDev", "Max"]
                .map(|h| table::cell(h, Style::Bold, styled)),
        );

        for (idx, stats) in self.stats.iter().enumerate() {
            let mut experiment_name = stats.experiment_name.clone();
            let mut name = stats.label();
            let mut style = stats.style;
            if idx == 0 {
                experiment_name.push_str("\n*Winner*");
                name.push_str("\n*Winner*");
                if style == Style::Plain {
                    style = Style::Bold;
                }
            }
            let mut row = vec![
                table::cell(experiment_name, style, styled),
                table::cell(name, style, styled),
            ];
            row.extend(stats.cells(style, styled));
            t.add_row(row);
        }

        let mut title = format!("Ranking Criteria: {}", self.criteria);
        if styled {
            title = Style::Bold.paint(&title).to_string();
        }
        format!("{}\n{}", title, table::render(&mut t))
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report(false))
    }
}
