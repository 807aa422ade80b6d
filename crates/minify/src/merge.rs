//! Option merging for minimizer adapters.

use serde_json::Value;

use crate::types::MinimizerOptions;

/// Merge `overrides` over `base`, key by key.
///
/// Nested objects merge recursively; any other value in `overrides`
/// replaces the one in `base`, including `null`.
pub fn deep_merge(base: &MinimizerOptions, overrides: &MinimizerOptions) -> MinimizerOptions {
    let mut merged = base.clone();
    for (key, value) in overrides {
        if let (Some(Value::Object(inner)), Value::Object(nested)) = (merged.get_mut(key), value) {
            *inner = deep_merge(inner, nested);
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> MinimizerOptions {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn overrides_take_precedence() {
        let base = obj(json!({ "collapseWhitespace": true, "removeComments": true }));
        let user = obj(json!({ "removeComments": false }));

        let merged = deep_merge(&base, &user);

        assert_eq!(merged["collapseWhitespace"], json!(true));
        assert_eq!(merged["removeComments"], json!(false));
    }

    #[test]
    fn new_keys_are_added() {
        let merged = deep_merge(&obj(json!({ "a": 1 })), &obj(json!({ "b": 2 })));
        assert_eq!(Value::Object(merged), json!({ "a": 1, "b": 2 }));
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let base = obj(json!({ "minifyJS": { "compress": true, "mangle": true } }));
        let user = obj(json!({ "minifyJS": { "mangle": false } }));

        let merged = deep_merge(&base, &user);

        assert_eq!(merged["minifyJS"], json!({ "compress": true, "mangle": false }));
    }

    #[test]
    fn object_replaces_scalar() {
        let base = obj(json!({ "minifyCSS": true }));
        let user = obj(json!({ "minifyCSS": { "level": 2 } }));

        let merged = deep_merge(&base, &user);

        assert_eq!(merged["minifyCSS"], json!({ "level": 2 }));
    }

    #[test]
    fn empty_overrides_keep_base() {
        let base = obj(json!({ "x": [1, 2] }));
        assert_eq!(deep_merge(&base, &MinimizerOptions::new()), base);
    }
}
