use quillplan_core::{LockedValue, get_path, set_path};
use serde_json::Value;

use crate::model::EnforcementReport;

/// Overwrite every locked path with its canonical value.
pub(crate) fn reassert_locks(document: &mut Value, locks: &[LockedValue], report: &mut EnforcementReport) {
    for lock in locks {
        if get_path(document, &lock.path) != Some(&lock.value) {
            set_path(document, &lock.path, lock.value.clone());
            report.record_relocked(lock.path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lock(path: &str, value: Value) -> LockedValue {
        LockedValue::new(path.parse().expect("path"), value)
    }

    #[test]
    fn restores_missing_wrong_and_mistyped_values() {
        let locks = vec![
            lock("constraints.tone", json!("witty")),
            lock("constraints.max_total_words", json!(60000)),
            lock("pacing.acts", json!({"I": 12, "II": 9, "III": 3})),
        ];
        let mut document = json!({
            "constraints": {"tone": "grim", "max_total_words": "60000"},
            "pacing": "twelve-nine-three"
        });
        let mut report = EnforcementReport::default();
        reassert_locks(&mut document, &locks, &mut report);

        assert_eq!(document["constraints"]["tone"], "witty");
        assert_eq!(document["constraints"]["max_total_words"], 60000);
        assert_eq!(document["pacing"]["acts"]["III"], 3);
        assert_eq!(report.relocked_paths.len(), 3);
    }

    #[test]
    fn matching_values_are_not_reported() {
        let locks = vec![lock("constraints.tone", json!("witty"))];
        let mut document = json!({"constraints": {"tone": "witty"}});
        let mut report = EnforcementReport::default();
        reassert_locks(&mut document, &locks, &mut report);
        assert!(report.is_clean());
    }
}
