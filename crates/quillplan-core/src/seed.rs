use serde_json::Value;

use crate::path::{JsonPath, set_path};

/// Domain-shaped scaffolding laid over a derived skeleton.
#[derive(Debug, Clone)]
pub struct SeedOverlay {
    /// Array replaced wholesale by `records`.
    pub array_path: JsonPath,
    pub records: Vec<Value>,
    /// Other fields whose initial value is reset.
    pub overrides: Vec<(JsonPath, Value)>,
}

/// Overwrite (never merge) the overlay's paths in `skeleton`.
pub fn inject_seed(skeleton: &mut Value, overlay: &SeedOverlay) {
    set_path(
        skeleton,
        &overlay.array_path,
        Value::Array(overlay.records.clone()),
    );
    for (path, value) in &overlay.overrides {
        set_path(skeleton, path, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn replaces_array_and_overrides() {
        let mut skeleton = json!({
            "chapters": [],
            "selection": {"figures": [{"name": ""}], "extra": 1},
            "title": ""
        });
        let overlay = SeedOverlay {
            array_path: "chapters".parse().expect("path"),
            records: vec![json!({"ch": 1, "act": "I"}), json!({"ch": 2, "act": "II"})],
            overrides: vec![("selection".parse().expect("path"), json!({"figures": []}))],
        };

        inject_seed(&mut skeleton, &overlay);

        assert_eq!(
            skeleton,
            json!({
                "chapters": [{"ch": 1, "act": "I"}, {"ch": 2, "act": "II"}],
                "selection": {"figures": []},
                "title": ""
            })
        );
    }
}
