use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use super::super::domain::StudentProfile;
use super::super::repository::GroupTally;

/// Two decimal places, half-up.
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `placed / total * 100` rounded half-up to two places; zero for an empty population.
pub fn placement_percentage(placed: u64, total: u64) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    round_half_up(Decimal::from(placed) * Decimal::ONE_HUNDRED / Decimal::from(total))
}

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().copied().sum();
    Some(sum / Decimal::from(values.len() as u64))
}

/// Group students by `key`, counting totals and averaging the recorded packages of placed
/// members. A placed student without a package counts as placed but not in the average.
pub fn tally_by<K, F>(students: &[StudentProfile], key: F) -> Vec<GroupTally<K>>
where
    K: Ord + Clone,
    F: Fn(&StudentProfile) -> K,
{
    let mut groups: BTreeMap<K, (u64, u64, Vec<Decimal>)> = BTreeMap::new();
    for student in students {
        let entry = groups
            .entry(key(student))
            .or_insert_with(|| (0, 0, Vec::new()));
        entry.0 += 1;
        if student.is_placed() {
            entry.1 += 1;
            entry.2.extend(student.package_lpa);
        }
    }

    groups
        .into_iter()
        .map(|(key, (total, placed, packages))| GroupTally {
            key,
            total,
            placed,
            average_package: mean(&packages),
        })
        .collect()
}
