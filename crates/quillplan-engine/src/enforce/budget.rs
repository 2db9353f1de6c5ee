use std::cmp::Reverse;

use quillplan_core::{CategoryRule, get_path_mut};
use serde_json::Value;

use crate::model::EnforcementReport;

/// Redistribute `values` so they sum to `target` exactly, keeping every value
/// at or above `floor` and the relative proportions of the inputs.
///
/// A zero sum is split evenly. Otherwise every value is scaled by
/// `target / sum` and rounded; the rounding residual is then handed out one
/// unit at a time in descending order of the original values, cycling as
/// often as needed. Decrements skip values already at the floor, so the sum
/// only falls short of the target when `target < floor * values.len()`.
pub fn rebalance(values: &[i64], target: i64, floor: i64) -> Vec<i64> {
    if values.is_empty() {
        return Vec::new();
    }

    // Sums run in i128 so saturated inputs cannot overflow.
    let sum: i128 = values.iter().map(|value| i128::from(*value)).sum();
    let mut balanced: Vec<i64> = if sum == 0 {
        let share = (target / values.len() as i64).max(floor);
        vec![share; values.len()]
    } else {
        let ratio = target as f64 / sum as f64;
        values
            .iter()
            .map(|value| ((*value as f64 * ratio).round() as i64).max(floor))
            .collect()
    };

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|idx| Reverse(values[*idx]));

    let mut residual =
        i128::from(target) - balanced.iter().map(|value| i128::from(*value)).sum::<i128>();
    while residual != 0 {
        let mut moved = false;
        for &idx in &order {
            if residual == 0 {
                break;
            }
            if residual > 0 {
                balanced[idx] = balanced[idx].saturating_add(1);
                residual -= 1;
                moved = true;
            } else if balanced[idx] > floor {
                balanced[idx] -= 1;
                residual += 1;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    balanced
}

/// Read a budget value: integers as-is, floats truncated, numeric strings
/// parsed, anything else 0. Negatives clamp to 0.
pub(crate) fn budget_value(value: Option<&Value>) -> i64 {
    let raw = match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        Some(Value::String(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().map(|float| float as i64))
                .unwrap_or(0)
        }
        _ => 0,
    };
    raw.max(0)
}

/// Rebalance the budget field of every category that carries a target.
pub(crate) fn rebalance_budgets(document: &mut Value, rule: &CategoryRule, report: &mut EnforcementReport) {
    let Some(entries) = get_path_mut(document, &rule.array_path).and_then(Value::as_array_mut) else {
        return;
    };

    for category in &rule.categories {
        let Some(target) = category.budget else {
            continue;
        };
        let members: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                entry.get(&rule.discriminator).and_then(Value::as_str) == Some(category.name.as_str())
            })
            .map(|(idx, _)| idx)
            .collect();
        if members.is_empty() {
            continue;
        }

        let current: Vec<i64> = members
            .iter()
            .map(|idx| budget_value(entries[*idx].get(&rule.budget_field)))
            .collect();
        let balanced = rebalance(&current, target, rule.budget_floor);

        let mut changed = false;
        for (idx, words) in members.iter().zip(balanced) {
            let Some(entry) = entries[*idx].as_object_mut() else {
                continue;
            };
            let words = Value::from(words);
            if entry.get(&rule.budget_field) != Some(&words) {
                entry.insert(rule.budget_field.clone(), words);
                changed = true;
            }
        }
        if changed {
            report.record_rebalanced(&category.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scales_even_values_without_residual() {
        assert_eq!(rebalance(&[1000, 1000, 1000], 9000, 300), vec![3000, 3000, 3000]);
    }

    #[test]
    fn zero_sum_is_split_evenly_with_remainder() {
        let balanced = rebalance(&[0, 0, 0], 1000, 300);
        assert_eq!(balanced.iter().sum::<i64>(), 1000);
        assert_eq!(balanced, vec![334, 333, 333]);
    }

    #[test]
    fn residual_goes_to_largest_originals_first() {
        let balanced = rebalance(&[1, 5, 4], 100, 0);
        assert_eq!(balanced, vec![10, 50, 40]);

        // 100/3 rounds to 33 each; ties keep input order.
        let balanced = rebalance(&[1, 1, 1], 100, 0);
        assert_eq!(balanced, vec![34, 33, 33]);

        let balanced = rebalance(&[10, 20, 10], 101, 0);
        assert_eq!(balanced, vec![25, 51, 25]);
    }

    #[test]
    fn floor_is_held_and_others_absorb_the_difference() {
        let balanced = rebalance(&[1, 100, 100], 1000, 300);
        assert!(balanced.iter().all(|words| *words >= 300));
        assert_eq!(balanced.iter().sum::<i64>(), 1000);
        assert_eq!(balanced[0], 300);
    }

    #[test]
    fn infeasible_target_stops_at_floor() {
        assert_eq!(rebalance(&[500, 500], 400, 300), vec![300, 300]);
    }

    #[test]
    fn balanced_values_are_fixed_points() {
        let once = rebalance(&[120, 80, 7, 3000], 9000, 300);
        assert_eq!(rebalance(&once, 9000, 300), once);
    }

    #[test]
    fn saturated_values_do_not_overflow() {
        let balanced = rebalance(&[i64::MAX, i64::MAX, i64::MAX], 9000, 300);
        assert_eq!(balanced.iter().sum::<i64>(), 9000);
        assert!(balanced.iter().all(|words| *words >= 300));
    }

    #[test]
    fn reads_loose_budget_values() {
        assert_eq!(budget_value(Some(&json!(1800))), 1800);
        assert_eq!(budget_value(Some(&json!(1799.9))), 1799);
        assert_eq!(budget_value(Some(&json!(" 1200 "))), 1200);
        assert_eq!(budget_value(Some(&json!("12.5"))), 12);
        assert_eq!(budget_value(Some(&json!(-40))), 0);
        assert_eq!(budget_value(Some(&json!("many"))), 0);
        assert_eq!(budget_value(Some(&json!(1e300))), i64::MAX);
        assert_eq!(budget_value(None), 0);
    }
}
