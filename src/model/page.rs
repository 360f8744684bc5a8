//! Page-level metadata types: layers, keywords, templates, lasso counts.
use serde::{Deserialize, Serialize};

/// One layer of a note page. Layer 0 is the main layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Layer {
    pub layer_id: i64,
    pub name: String,
    pub is_current_layer: bool,
    pub is_visible: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyWord {
    pub keyword: String,
    pub page: u64,
    /// Index within the page, starting at 0.
    pub index: u64,
}

/// Built-in note template descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    /// Template URI for portrait orientation.
    pub v_uri: String,
    /// Template URI for landscape orientation.
    pub h_uri: String,
}

/// Background template of one note page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateInfo {
    pub name: String,
    /// MD5 for custom styles; system styles report "0".
    pub md5: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Size {
    pub width: u64,
    pub height: u64,
}

/// Per-type counts of the elements inside the current lasso selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LassoElementTypeCounts {
    pub trail_link_num: u64,
    pub text_link_num: u64,
    pub todo_link_num: u64,
    pub title_num: u64,
    pub bitmap_num: u64,
    pub normal_text_box_num: u64,
    pub digest_text_box_num: u64,
    pub digest_text_box_editable_num: u64,
    pub geometry_num: u64,
    pub straight_line_num: u64,
    pub circle_num: u64,
    pub ellipse_num: u64,
    pub trail_num: u64,
}

#[cfg(test)]
mod tests {
    use super::Layer;
    use serde_json::json;

    #[test]
    fn layer_round_trips_camel_case() {
        let layer: Layer = serde_json::from_value(json!({
            "layerId": 2,
            "name": "sketch",
            "isCurrentLayer": true,
            "isVisible": false
        }))
        .expect("layer");
        assert_eq!(layer.layer_id, 2);
        assert!(layer.is_current_layer);
        let raw = serde_json::to_value(&layer).expect("value");
        assert_eq!(raw["layerId"], 2);
        assert_eq!(raw["isVisible"], false);
    }
}
