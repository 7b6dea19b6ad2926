//! Navigation menu shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level menu payload. Must carry an `items` array to be accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuData {
    pub items: Vec<MenuItem>,
}

impl MenuData {
    /// Parse menu data that arrives either as a JSON object or as a
    /// JSON-encoded string (both shapes exist in stored components).
    ///
    /// Returns `None` when the payload fails the basic shape check; the
    /// caller logs and leaves the placeholder untouched.
    pub fn from_value(value: &Value) -> Option<MenuData> {
        let parsed = match value {
            Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
            other => other.clone(),
        };
        // Shape check: an object with an `items` array.
        if !parsed.get("items").is_some_and(Value::is_array) {
            return None;
        }
        serde_json::from_value(parsed).ok()
    }

    /// Recompute every item's current-page flag from an exact URL match.
    ///
    /// The whole tree is rewritten: stale flags from stored data are
    /// cleared, not only leaves.
    pub fn mark_current(&mut self, current_path: &str) {
        fn mark(items: &mut [MenuItem], path: &str) {
            for item in items {
                item.is_current_page = item.url.as_deref() == Some(path);
                mark(&mut item.children, path);
            }
        }
        mark(&mut self.items, current_path);
    }
}

/// One menu entry; nests arbitrarily via `children`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Option<String>,
    pub label: String,
    pub url: Option<String>,
    /// `page` | `external` | `anchor` | `products`.
    pub link_type: Option<String>,
    /// `_self` (default) or `_blank`.
    pub target: Option<String>,
    pub is_current_page: bool,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    /// Whether the link opens in a new tab (gets `rel="noopener noreferrer"`).
    pub fn opens_in_new_tab(&self) -> bool {
        self.target.as_deref() == Some("_blank")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_accepts_object_and_string() {
        let obj = json!({"items": [{"id": "1", "label": "Home", "url": "/"}]});
        assert!(MenuData::from_value(&obj).is_some());

        let as_string = Value::String(obj.to_string());
        let parsed = MenuData::from_value(&as_string).unwrap();
        assert_eq!(parsed.items[0].label, "Home");
    }

    #[test]
    fn test_from_value_rejects_missing_items() {
        assert!(MenuData::from_value(&json!({"menu": []})).is_none());
        assert!(MenuData::from_value(&json!({"items": "nope"})).is_none());
        assert!(MenuData::from_value(&Value::String("not json".into())).is_none());
    }

    #[test]
    fn test_mark_current_exact_match_only() {
        let mut menu: MenuData = serde_json::from_value(json!({
            "items": [
                {"label": "Products", "url": "/products", "children": [
                    {"label": "Widgets", "url": "/products/widgets"},
                    {"label": "Gadgets", "url": "/products/gadgets"}
                ]},
                {"label": "About", "url": "/about", "isCurrentPage": true}
            ]
        }))
        .unwrap();

        menu.mark_current("/products/widgets");

        assert!(!menu.items[0].is_current_page, "ancestors stay unmarked");
        assert!(menu.items[0].children[0].is_current_page);
        assert!(!menu.items[0].children[1].is_current_page, "siblings stay unmarked");
        assert!(!menu.items[1].is_current_page, "stale flags are cleared");
    }
}
