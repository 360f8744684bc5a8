//! Purpose: Shared rule sets for the parameter shapes the host accepts.
//! Exports: schema builders (`rect_schema`, `layer_schema`, ...) and
//! Exports: `verify_element` / `element_rule` for whole-element payloads.
//! Role: Single source of truth so every facade rejects the same way.
//! Invariants: Business asserts fire only after structural checks pass.
use crate::core::error::{Error, ErrorKind};
use crate::core::verify::{verify, Rule, Schema, VerifyOptions};
use crate::model::element::{Element, Geometry, Link};
use serde_json::Value;

pub fn point_schema() -> Schema {
    Schema::new()
        .field("x", Rule::number().required())
        .field("y", Rule::number().required())
}

pub fn rect_schema() -> Schema {
    Schema::new()
        .field("left", Rule::number().required())
        .field("top", Rule::number().required())
        .field("right", Rule::number().required())
        .field("bottom", Rule::number().required())
}

pub fn size_schema() -> Schema {
    Schema::new()
        .field("width", Rule::number().required().integer().min(1.0))
        .field("height", Rule::number().required().integer().min(1.0))
}

pub fn layer_schema() -> Schema {
    Schema::new()
        .field(
            "layerId",
            Rule::number().required().integer().min(0.0).max(3.0),
        )
        .field("name", Rule::string().required().non_empty())
        .field("isCurrentLayer", Rule::boolean().required())
        .field("isVisible", Rule::boolean().required())
}

pub fn geometry_schema() -> Schema {
    Schema::new()
        .field("penColor", Rule::number().integer())
        .field("penType", Rule::number().integer())
        .field("penWidth", Rule::number().min(1.0))
        .field(
            "type",
            Rule::string().required().one_of_strings([
                Geometry::TYPE_STRAIGHT_LINE,
                Geometry::TYPE_CIRCLE,
                Geometry::TYPE_ELLIPSE,
                Geometry::TYPE_POLYGON,
            ]),
        )
        .field("points", Rule::array(Rule::object(point_schema())))
        .field("ellipseCenterPoint", Rule::object(point_schema()))
        .field("ellipseMajorAxisRadius", Rule::number().min(0.0))
        .field("ellipseMinorAxisRadius", Rule::number().min(0.0))
        .field("ellipseAngle", Rule::number())
}

/// A five-pointed star outline is exactly six vertices with the trailing one
/// closing the loop back onto the first.
pub fn assert_five_star_outline(value: &mut Value, path: &str) -> Result<(), Error> {
    let Some(points) = value.as_array() else {
        return Ok(());
    };
    if points.len() != 6 {
        return Err(Error::new(ErrorKind::InvalidParam)
            .with_message(format!("{path} must contain exactly 6 points"))
            .with_path(path));
    }
    if points.first() != points.last() {
        return Err(Error::new(ErrorKind::InvalidParam)
            .with_message(format!("{path} must close the outline: first and last points differ"))
            .with_path(path));
    }
    Ok(())
}

/// Reject rectangles that enclose no area.
pub fn assert_rect_not_empty(value: &mut Value, path: &str) -> Result<(), Error> {
    let Some(rect) = value.as_object() else {
        return Ok(());
    };
    let side = |name: &str| rect.get(name).and_then(Value::as_f64).unwrap_or(0.0);
    if side("right") - side("left") <= 0.0 || side("bottom") - side("top") <= 0.0 {
        return Err(Error::new(ErrorKind::EmptyRect)
            .with_message(format!("{path} encloses no area"))
            .with_path(path));
    }
    Ok(())
}

/// Note-page links must name where they point.
pub fn assert_link_destination(value: &mut Value, path: &str) -> Result<(), Error> {
    let Some(link) = value.as_object() else {
        return Ok(());
    };
    let link_type = link
        .get("linkType")
        .and_then(Value::as_i64)
        .unwrap_or(Link::LINK_TYPE_NOTE_PAGE);
    let dest_path = link.get("destPath").and_then(Value::as_str).unwrap_or("");
    if dest_path.trim().is_empty() {
        return Err(Error::new(ErrorKind::MissingDestination)
            .with_message(format!("{path}.destPath is required for a link"))
            .with_path(path));
    }
    if link_type == Link::LINK_TYPE_NOTE_PAGE && link.get("destPage").and_then(Value::as_u64).is_none() {
        return Err(Error::new(ErrorKind::MissingDestination)
            .with_message(format!(
                "{path}.destPage is required for a note-page link"
            ))
            .with_path(path));
    }
    Ok(())
}

pub fn stroke_schema() -> Schema {
    Schema::new()
        .field("penColor", Rule::number().integer())
        .field("penType", Rule::number().integer())
        .field("penWidth", Rule::number().min(1.0))
}

pub fn link_schema() -> Schema {
    Schema::new()
        .field(
            "category",
            Rule::number()
                .required()
                .integer()
                .one_of_numbers([Link::CATEGORY_TEXT as f64, Link::CATEGORY_TRAIL as f64]),
        )
        .field("X", Rule::number().required())
        .field("Y", Rule::number().required())
        .field("width", Rule::number().required().min(0.0))
        .field("height", Rule::number().required().min(0.0))
        .field("style", Rule::number().required().integer())
        .field("linkType", Rule::number().required().integer())
        .field("destPath", Rule::string())
        .field("destPage", Rule::number().integer().min(0.0))
        .field("fontSize", Rule::number().min(0.0))
        .field("fullText", Rule::string())
        .field("showText", Rule::string())
        .field("italic", Rule::number().integer().one_of_numbers([0.0, 1.0]))
        .field(
            "controlTrailNums",
            Rule::array(Rule::number().integer().min(0.0)),
        )
}

pub fn text_box_schema() -> Schema {
    Schema::new()
        .field("textContentFull", Rule::string().required().non_empty())
        .field(
            "textRect",
            Rule::object(rect_schema())
                .required()
                .assert(assert_rect_not_empty),
        )
        .field("textDigestData", Rule::string())
        .field("fontSize", Rule::number().min(1.0))
        .field("fontPath", Rule::string())
        .field("textAlign", Rule::number().integer().one_of_numbers([0.0, 1.0, 2.0]))
        .field("textBold", Rule::number().integer())
        .field("textItalics", Rule::number().integer())
        .field("textFrameWidthType", Rule::number().integer())
        .field("textFrameWidth", Rule::number().integer())
        .field("textFrameStyle", Rule::number().integer())
        .field("textEditable", Rule::number().integer())
}

pub fn title_schema() -> Schema {
    Schema::new()
        .field("X", Rule::number().required())
        .field("Y", Rule::number().required())
        .field("width", Rule::number().required().min(0.0))
        .field("height", Rule::number().required().min(0.0))
        .field("style", Rule::number().integer().min(0.0).max(4.0))
        .field(
            "controlTrailNums",
            Rule::array(Rule::number().integer().min(0.0)),
        )
}

pub fn five_star_schema() -> Schema {
    Schema::new().field(
        "points",
        Rule::array(Rule::object(point_schema()))
            .required()
            .assert(assert_five_star_outline),
    )
}

pub fn picture_schema() -> Schema {
    Schema::new()
        .field("picturePath", Rule::string().required().non_empty())
        .field(
            "rect",
            Rule::object(rect_schema())
                .required()
                .assert(assert_rect_not_empty),
        )
}

// Element kinds that may only live on the main layer.
const MAIN_LAYER_ONLY: [i64; 5] = [
    Element::TYPE_TITLE,
    Element::TYPE_TEXT,
    Element::TYPE_TEXT_DIGEST_QUOTE,
    Element::TYPE_TEXT_DIGEST_CREATE,
    Element::TYPE_LINK,
];

/// Validate one whole element payload in place.
///
/// Checks the kind is known, enforces the main-layer restriction, then
/// requires and validates the payload field matching the kind. Scalar fields
/// the host fills in (uuid, numInPage, ...) are deliberately not declared;
/// payload sub-schemas run lenient for the same reason.
pub fn verify_element(candidate: &mut Value, path: &str) -> Result<(), Error> {
    let Some(map) = candidate.as_object() else {
        return Err(Error::new(ErrorKind::NullElement)
            .with_message(format!("{path} must be an element object"))
            .with_path(path));
    };

    let kind = map.get("type").and_then(Value::as_i64);
    let Some(kind) = kind.filter(|k| Element::VALID_TYPES.contains(k)) else {
        return Err(Error::new(ErrorKind::InvalidElementType)
            .with_message(format!("{path}.type is not a known element type"))
            .with_path(path));
    };

    let layer_num = map.get("layerNum").and_then(Value::as_i64).unwrap_or(0);
    if layer_num != 0 && MAIN_LAYER_ONLY.contains(&kind) {
        return Err(Error::new(ErrorKind::LayerRestricted)
            .with_message(format!(
                "{path}: element type {kind} is only allowed on the main layer"
            ))
            .with_path(path));
    }

    let payload = match kind {
        Element::TYPE_STROKE => Some(("stroke", stroke_schema(), None)),
        Element::TYPE_TITLE => Some(("title", title_schema(), None)),
        Element::TYPE_PICTURE => Some(("picture", picture_schema(), None)),
        Element::TYPE_TEXT
        | Element::TYPE_TEXT_DIGEST_QUOTE
        | Element::TYPE_TEXT_DIGEST_CREATE => Some(("textBox", text_box_schema(), None)),
        Element::TYPE_LINK => Some((
            "link",
            link_schema(),
            Some(assert_link_destination as fn(&mut Value, &str) -> Result<(), Error>),
        )),
        Element::TYPE_GEO => Some(("geometry", geometry_schema(), None)),
        Element::TYPE_FIVE_STAR => Some(("fiveStar", five_star_schema(), None)),
        _ => None,
    };

    if let Some((field, fields, extra)) = payload {
        let field_path = format!("{path}.{field}");
        let Some(map) = candidate.as_object_mut() else {
            return Ok(());
        };
        let Some(value) = map.get_mut(field).filter(|v| !v.is_null()) else {
            return Err(Error::new(ErrorKind::InvalidParam)
                .with_message(format!("{field_path} is required"))
                .with_path(field_path.as_str()));
        };
        verify(&fields, value, &VerifyOptions::lenient(&field_path))?;
        if let Some(assert) = extra {
            assert(value, &field_path)?;
        }
    }
    Ok(())
}

/// Rule form of [`verify_element`] for embedding in larger schemas.
pub fn element_rule() -> Rule {
    Rule::any_object().required().assert(verify_element)
}

#[cfg(test)]
mod tests {
    use super::{verify_element, assert_five_star_outline, assert_rect_not_empty};
    use crate::core::error::ErrorKind;
    use crate::model::element::Element;
    use serde_json::json;

    #[test]
    fn unknown_kind_is_rejected_with_element_type_code() {
        let mut candidate = json!({"type": 42});
        let err = verify_element(&mut candidate, "op.element").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidElementType);
        assert_eq!(err.code(), 201);
    }

    #[test]
    fn text_off_main_layer_is_layer_restricted() {
        let mut candidate = json!({
            "type": Element::TYPE_TEXT,
            "layerNum": 2,
            "textBox": {"textContentFull": "hi", "textRect": {"left": 0, "top": 0, "right": 10, "bottom": 10}}
        });
        let err = verify_element(&mut candidate, "op.element").expect_err("err");
        assert_eq!(err.code(), 203);
    }

    #[test]
    fn stroke_payload_must_be_present() {
        let mut candidate = json!({"type": Element::TYPE_STROKE});
        let err = verify_element(&mut candidate, "op.element").expect_err("err");
        assert_eq!(err.code(), 107);
        assert!(err.message().expect("msg").contains("stroke is required"));
    }

    #[test]
    fn valid_stroke_element_passes() {
        let mut candidate = json!({
            "type": Element::TYPE_STROKE,
            "layerNum": 1,
            "stroke": {"penColor": 158, "penType": 10, "penWidth": 2.0}
        });
        verify_element(&mut candidate, "op.element").expect("ok");
    }

    #[test]
    fn note_page_link_requires_destination() {
        let mut candidate = json!({
            "type": Element::TYPE_LINK,
            "link": {
                "category": 0, "X": 1.0, "Y": 1.0, "width": 10.0, "height": 5.0,
                "style": 0, "linkType": 0, "destPath": "a.note"
            }
        });
        let err = verify_element(&mut candidate, "op.element").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MissingDestination);
        assert_eq!(err.code(), 204);

        let obj = candidate["link"].as_object_mut().expect("link");
        obj.insert("destPage".to_string(), json!(4));
        verify_element(&mut candidate, "op.element").expect("ok");
    }

    #[test]
    fn empty_text_rect_is_rejected() {
        let mut rect = json!({"left": 5, "top": 5, "right": 5, "bottom": 20});
        let err = assert_rect_not_empty(&mut rect, "op.rect").expect_err("err");
        assert_eq!(err.kind(), ErrorKind::EmptyRect);
        assert_eq!(err.code(), 205);
    }

    #[test]
    fn five_star_outline_must_close() {
        let mut open = json!([
            {"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 2, "y": 1},
            {"x": 1, "y": 2}, {"x": 0, "y": 2}, {"x": 9, "y": 9}
        ]);
        let err = assert_five_star_outline(&mut open, "op.points").expect_err("err");
        assert!(err.message().expect("msg").contains("close the outline"));

        let mut short = json!([{"x": 0, "y": 0}]);
        let err = assert_five_star_outline(&mut short, "op.points").expect_err("err");
        assert!(err.message().expect("msg").contains("exactly 6"));

        let mut closed = json!([
            {"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 2, "y": 1},
            {"x": 1, "y": 2}, {"x": 0, "y": 2}, {"x": 0, "y": 0}
        ]);
        assert_five_star_outline(&mut closed, "op.points").expect("ok");
    }
}
