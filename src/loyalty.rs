//! Two-pass loyalty aggregation
//!
//! Day 1 entries are folded into per-user state first, then day 2 entries.
//! A user is loyal when both days were observed for them and the union of
//! pages they visited reaches the configured minimum.

use std::collections::{HashMap, HashSet};

use crate::entry::{LogEntry, UserId};
use crate::platform::{CancelContext, Interrupted};

pub const DEFAULT_MIN_PAGES: usize = 4;

/// Entries between cancellation checks within a pass.
const POLL_INTERVAL: usize = 64 * 1024;

/// The comparison period an entry collection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Day {
    First,
    Second,
}

impl Day {
    fn bit(self) -> u8 {
        match self {
            Day::First => 0b01,
            Day::Second => 0b10,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Day::First => 1,
            Day::Second => 2,
        }
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {}", self.number())
    }
}

/// Set of days a user has been seen on.
///
/// Recording a day is idempotent, so observing the same collection twice
/// never promotes a single-day user to "both days".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaySet(u8);

impl DaySet {
    pub fn insert(&mut self, day: Day) {
        self.0 |= day.bit();
    }

    pub fn contains(&self, day: Day) -> bool {
        self.0 & day.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn both(&self) -> bool {
        self.contains(Day::First) && self.contains(Day::Second)
    }
}

/// Per-user accumulator. Page names borrow from the entry collections.
#[derive(Debug, Default)]
pub struct UserVisitState<'a> {
    pub pages_seen: HashSet<&'a str>,
    pub days_present: DaySet,
}

pub struct LoyaltyAggregator<'a> {
    min_pages: usize,
    users: HashMap<UserId, UserVisitState<'a>>,
}

impl<'a> LoyaltyAggregator<'a> {
    pub fn new(min_pages: usize) -> Self {
        Self {
            min_pages,
            users: HashMap::new(),
        }
    }

    /// Fold one day's entries into the per-user state.
    pub fn observe(
        &mut self,
        day: Day,
        entries: &'a [LogEntry],
        ctx: &CancelContext,
    ) -> Result<(), Interrupted> {
        ctx.check()?;

        for (i, entry) in entries.iter().enumerate() {
            if i > 0 && i % POLL_INTERVAL == 0 {
                ctx.check()?;
            }

            let state = self.users.entry(entry.user_id).or_default();
            state.pages_seen.insert(entry.page_name.as_str());
            state.days_present.insert(day);
        }

        tracing::debug!(%day, entries = entries.len(), users = self.users.len(), "observed day");
        Ok(())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn state(&self, user_id: UserId) -> Option<&UserVisitState<'a>> {
        self.users.get(&user_id)
    }

    fn is_loyal(&self, state: &UserVisitState<'_>) -> bool {
        state.days_present.both() && state.pages_seen.len() >= self.min_pages
    }

    /// Loyal user ids in ascending order.
    pub fn loyal_users(&self) -> Vec<UserId> {
        let mut loyal: Vec<UserId> = self
            .users
            .iter()
            .filter(|(_, state)| self.is_loyal(state))
            .map(|(&user_id, _)| user_id)
            .collect();
        loyal.sort_unstable();
        loyal.dedup();
        loyal
    }
}

/// Users present in both collections with at least `min_pages` distinct
/// pages across the two days, sorted ascending.
pub fn identify_loyal_users(
    day1: &[LogEntry],
    day2: &[LogEntry],
    min_pages: usize,
    ctx: &CancelContext,
) -> Result<Vec<UserId>, Interrupted> {
    let mut aggregator = LoyaltyAggregator::new(min_pages);
    aggregator.observe(Day::First, day1, ctx)?;
    aggregator.observe(Day::Second, day2, ctx)?;
    ctx.check()?;
    Ok(aggregator.loyal_users())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn entries(pairs: &[(i64, &str)]) -> Vec<LogEntry> {
        let ts = DateTime::parse_from_rfc3339("2024-10-01T00:00:00Z").unwrap();
        pairs
            .iter()
            .map(|&(user, page)| LogEntry::new(user, page, ts))
            .collect()
    }

    fn loyal(day1: &[(i64, &str)], day2: &[(i64, &str)], min_pages: usize) -> Vec<UserId> {
        identify_loyal_users(
            &entries(day1),
            &entries(day2),
            min_pages,
            &CancelContext::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_two_users_meet_threshold_across_days() {
        let day1 = [
            (1, "blog"),
            (1, "dashboard"),
            (1, "shop"),
            (3, "blog"),
            (3, "profile"),
            (3, "shop"),
        ];
        let day2 = [(1, "blog"), (1, "about"), (3, "shop"), (3, "contact")];

        assert_eq!(loyal(&day1, &day2, 4), vec![1, 3]);
    }

    #[test]
    fn test_day_two_only_user_is_excluded() {
        let day1 = [(1, "a"), (1, "b")];
        let day2 = [(1, "c"), (1, "d"), (9, "a"), (9, "b"), (9, "c"), (9, "d"), (9, "e")];

        assert_eq!(loyal(&day1, &day2, 4), vec![1]);
    }

    #[test]
    fn test_day_one_only_user_is_excluded() {
        let day1 = [(5, "a"), (5, "b"), (5, "c"), (5, "d")];
        let day2 = [(6, "a")];

        assert!(loyal(&day1, &day2, 4).is_empty());
    }

    #[test]
    fn test_pages_are_counted_over_the_union() {
        let day1 = [(2, "a"), (2, "b"), (2, "a")];
        let day2 = [(2, "a"), (2, "b"), (2, "b")];

        assert!(loyal(&day1, &day2, 3).is_empty());
        assert_eq!(loyal(&day1, &day2, 2), vec![2]);
    }

    #[test]
    fn test_output_is_sorted_and_idempotent() {
        let day1 = [(30, "a"), (-4, "a"), (12, "a"), (7, "a")];
        let day2 = [(7, "b"), (12, "b"), (30, "b"), (-4, "b")];

        let first = loyal(&day1, &day2, 2);
        let second = loyal(&day1, &day2, 2);
        assert_eq!(first, vec![-4, 7, 12, 30]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_observing_a_day_twice_does_not_count_as_both() {
        let day = entries(&[(1, "a"), (1, "b"), (1, "c"), (1, "d")]);
        let mut aggregator = LoyaltyAggregator::new(4);
        let ctx = CancelContext::new();

        aggregator.observe(Day::Second, &day, &ctx).unwrap();
        aggregator.observe(Day::Second, &day, &ctx).unwrap();
        assert!(aggregator.loyal_users().is_empty());
        assert_eq!(aggregator.state(1).unwrap().days_present.len(), 1);

        aggregator.observe(Day::First, &day, &ctx).unwrap();
        assert_eq!(aggregator.loyal_users(), vec![1]);
    }

    #[test]
    fn test_cancelled_context_stops_aggregation() {
        let ctx = CancelContext::new();
        ctx.cancel();

        let result = identify_loyal_users(&entries(&[(1, "a")]), &[], 1, &ctx);
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[test]
    fn test_day_set() {
        let mut days = DaySet::default();
        assert!(days.is_empty());
        days.insert(Day::Second);
        assert!(days.contains(Day::Second));
        assert!(!days.both());
        days.insert(Day::First);
        days.insert(Day::First);
        assert!(days.both());
        assert_eq!(days.len(), 2);
    }

    fn arb_day() -> impl Strategy<Value = Vec<(i64, String)>> {
        proptest::collection::vec((0i64..20, "[a-f]"), 0..80)
    }

    proptest! {
        #[test]
        fn prop_output_satisfies_both_predicates(
            day1 in arb_day(),
            day2 in arb_day(),
            min_pages in 1usize..6,
        ) {
            let day1: Vec<(i64, &str)> = day1.iter().map(|(u, p)| (*u, p.as_str())).collect();
            let day2: Vec<(i64, &str)> = day2.iter().map(|(u, p)| (*u, p.as_str())).collect();
            let result = loyal(&day1, &day2, min_pages);

            prop_assert!(result.windows(2).all(|w| w[0] < w[1]));

            let mut pages: BTreeMap<i64, HashSet<&str>> = BTreeMap::new();
            for &(user, page) in day1.iter().chain(day2.iter()) {
                pages.entry(user).or_default().insert(page);
            }
            let expected: Vec<i64> = pages
                .iter()
                .filter(|(user, seen)| {
                    day1.iter().any(|(u, _)| u == *user)
                        && day2.iter().any(|(u, _)| u == *user)
                        && seen.len() >= min_pages
                })
                .map(|(user, _)| *user)
                .collect();
            prop_assert_eq!(result, expected);
        }
    }
}
