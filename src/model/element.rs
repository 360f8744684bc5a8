//! Purpose: Typed document-element model mirroring the host's wire shapes.
//! Exports: `Element`, `Stroke`, `Link`, `Title`, `TextBox`, `Geometry`,
//! Exports: `FiveStar`, `Picture`, `Point`, `Rect`, `RecognRecord`.
//! Role: Composes scalar wire fields with client-side data accessors.
//! Invariants: Exactly one kind payload is populated, chosen by `kind`.
//! Invariants: Accessor fields never cross the wire; they are attached
//! Invariants: client-side against the element's uuid.
use crate::core::accessor::{DataAccessor, StreamValue};
use crate::core::transport::{StreamKind, StreamTransport};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl StreamValue for Point {
    fn from_raw(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        let x = obj.get("x")?.as_f64()?;
        let y = obj.get("y")?.as_f64()?;
        Some(Point { x, y })
    }

    fn into_raw(self) -> Value {
        json!({ "x": self.x, "y": self.y })
    }
}

// Contour polygons: the whole value is rejected if any vertex is malformed.
impl StreamValue for Vec<Point> {
    fn from_raw(raw: &Value) -> Option<Self> {
        raw.as_array()?.iter().map(Point::from_raw).collect()
    }

    fn into_raw(self) -> Value {
        Value::Array(self.into_iter().map(StreamValue::into_raw).collect())
    }
}

/// One handwriting-recognition sample. Wire field names are the host's.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognRecord {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    #[serde(rename = "Flag")]
    pub flag: f64,
    pub timestamp: f64,
}

impl Default for RecognRecord {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            flag: 0.0,
            timestamp: -1.0,
        }
    }
}

impl StreamValue for RecognRecord {
    fn from_raw(raw: &Value) -> Option<Self> {
        let obj = raw.as_object()?;
        Some(RecognRecord {
            x: obj.get("X")?.as_f64()?,
            y: obj.get("Y")?.as_f64()?,
            flag: obj.get("Flag")?.as_f64()?,
            timestamp: obj.get("timestamp")?.as_f64()?,
        })
    }

    fn into_raw(self) -> Value {
        json!({
            "X": self.x,
            "Y": self.y,
            "Flag": self.flag,
            "timestamp": self.timestamp,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Recognition summary carried on every element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecogResult {
    pub predict_name: String,
    pub up_left_point_x: f64,
    pub up_left_point_y: f64,
    pub key_point_x: f64,
    pub key_point_y: f64,
    pub down_right_point_x: f64,
    pub down_right_point_y: f64,
}

impl Default for RecogResult {
    fn default() -> Self {
        Self {
            predict_name: "others".to_string(),
            up_left_point_x: 0.0,
            up_left_point_y: 0.0,
            key_point_x: 0.0,
            key_point_y: 0.0,
            down_right_point_x: 0.0,
            down_right_point_y: 0.0,
        }
    }
}

/// One visible document object.
///
/// `kind` discriminates which payload field is populated; the two accessors
/// (`angles`, `contours_src`) exist on every element once attached.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Element {
    pub uuid: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub page_num: u64,
    pub layer_num: i64,
    pub thickness: f64,
    pub recognize_result: RecogResult,
    pub max_x: f64,
    pub max_y: f64,
    pub status: i64,
    pub num_in_page: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_box: Option<TextBox>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub five_star: Option<FiveStar>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<Picture>,
    /// Per-point angle data, host-cached; reachable only through here.
    #[serde(skip)]
    pub angles: Option<DataAccessor<Point>>,
    /// Contour polygons, host-cached; reachable only through here.
    #[serde(skip)]
    pub contours_src: Option<DataAccessor<Vec<Point>>>,
}

impl Element {
    pub const TYPE_STROKE: i64 = 0;
    pub const TYPE_TITLE: i64 = 100;
    pub const TYPE_PICTURE: i64 = 200;
    pub const TYPE_TEXT: i64 = 500;
    pub const TYPE_TEXT_DIGEST_QUOTE: i64 = 501;
    pub const TYPE_TEXT_DIGEST_CREATE: i64 = 502;
    pub const TYPE_LINK: i64 = 600;
    pub const TYPE_GEO: i64 = 700;
    pub const TYPE_FIVE_STAR: i64 = 800;

    pub const VALID_TYPES: [i64; 9] = [
        Self::TYPE_STROKE,
        Self::TYPE_TITLE,
        Self::TYPE_PICTURE,
        Self::TYPE_TEXT,
        Self::TYPE_TEXT_DIGEST_QUOTE,
        Self::TYPE_TEXT_DIGEST_CREATE,
        Self::TYPE_LINK,
        Self::TYPE_GEO,
        Self::TYPE_FIVE_STAR,
    ];

    /// Bind fresh accessors to this element's uuid. Called after the element
    /// arrives from (or is created by) the host; a stroke element also gets
    /// its six stroke-data accessors.
    pub fn attach(&mut self, transport: Arc<dyn StreamTransport>) {
        self.angles = Some(DataAccessor::new(
            transport.clone(),
            &self.uuid,
            StreamKind::AnglePoint,
        ));
        self.contours_src = Some(DataAccessor::new(
            transport.clone(),
            &self.uuid,
            StreamKind::ContourPoint,
        ));

        if self.kind == Self::TYPE_STROKE {
            let uuid = self.uuid.clone();
            self.stroke
                .get_or_insert_with(Stroke::default)
                .attach(&uuid, transport);
        }
    }

    /// Ask the host to release its cache for this element, then drop every
    /// local accessor cache. Fire-and-forget on the host side; the uuid is
    /// invalid for further reads afterwards.
    pub fn recycle(&mut self) {
        if let Some(angles) = &self.angles {
            angles.transport().release_element_cache(&self.uuid);
        }
        if let Some(angles) = &mut self.angles {
            angles.clear_cache();
        }
        if let Some(contours) = &mut self.contours_src {
            contours.clear_cache();
        }
        if let Some(stroke) = &mut self.stroke {
            stroke.recycle();
        }
    }
}

/// Stroke payload. The six large data series live host-side and are reached
/// through the attached accessors.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Stroke {
    pub pen_color: i64,
    pub pen_type: i64,
    pub pen_width: f64,
    #[serde(skip)]
    pub points: Option<DataAccessor<Point>>,
    #[serde(skip)]
    pub pressures: Option<DataAccessor<f64>>,
    #[serde(skip)]
    pub erase_line_trail_nums: Option<DataAccessor<f64>>,
    #[serde(skip)]
    pub flag_draw: Option<DataAccessor<bool>>,
    #[serde(skip)]
    pub mark_pen_direction: Option<DataAccessor<Point>>,
    #[serde(skip)]
    pub recogn_points: Option<DataAccessor<RecognRecord>>,
}

impl Stroke {
    pub fn attach(&mut self, uuid: &str, transport: Arc<dyn StreamTransport>) {
        self.points = Some(DataAccessor::new(
            transport.clone(),
            uuid,
            StreamKind::StrokeSamplePoint,
        ));
        self.pressures = Some(DataAccessor::new(
            transport.clone(),
            uuid,
            StreamKind::StrokePressure,
        ));
        self.erase_line_trail_nums = Some(DataAccessor::new(
            transport.clone(),
            uuid,
            StreamKind::EraseLineData,
        ));
        self.flag_draw = Some(DataAccessor::new(
            transport.clone(),
            uuid,
            StreamKind::WriteFlag,
        ));
        self.mark_pen_direction = Some(DataAccessor::new(
            transport.clone(),
            uuid,
            StreamKind::MarkPenDirection,
        ));
        self.recogn_points = Some(DataAccessor::new(
            transport,
            uuid,
            StreamKind::RecognitionData,
        ));
    }

    /// Drop the local caches of all six stroke-data accessors.
    pub fn recycle(&mut self) {
        if let Some(points) = &mut self.points {
            points.clear_cache();
        }
        if let Some(pressures) = &mut self.pressures {
            pressures.clear_cache();
        }
        if let Some(nums) = &mut self.erase_line_trail_nums {
            nums.clear_cache();
        }
        if let Some(flags) = &mut self.flag_draw {
            flags.clear_cache();
        }
        if let Some(direction) = &mut self.mark_pen_direction {
            direction.clear_cache();
        }
        if let Some(recogn) = &mut self.recogn_points {
            recogn.clear_cache();
        }
    }
}

/// Link payload; present only on link elements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    /// 0 = text link, 1 = stroke link.
    pub category: i64,
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page: u64,
    /// 0 solid underline, 1 solid border, 2 dashed border.
    pub style: i64,
    /// 0 note page, 1 note file, 2 document, 3 image, 4 URL, 5 other,
    /// 6 digest. Must match the host mapping.
    pub link_type: i64,
    /// Target path; for URL links this is the URL itself.
    pub dest_path: String,
    /// Target page number; only meaningful when `link_type` is 0.
    pub dest_page: u64,
    pub font_size: f64,
    pub full_text: String,
    pub show_text: String,
    pub italic: i64,
    /// Stroke links: which strokes belong to this link.
    pub control_trail_nums: Vec<i64>,
}

impl Link {
    pub const CATEGORY_TEXT: i64 = 0;
    pub const CATEGORY_TRAIL: i64 = 1;
    /// `link_type` value that requires `dest_page` to be set.
    pub const LINK_TYPE_NOTE_PAGE: i64 = 0;
}

impl Default for Link {
    fn default() -> Self {
        Self {
            category: 0,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            page: 0,
            style: 0,
            link_type: 0,
            dest_path: String::new(),
            dest_page: 0,
            font_size: 0.0,
            full_text: String::new(),
            show_text: String::new(),
            italic: 1,
            control_trail_nums: Vec::new(),
        }
    }
}

/// Title payload; present only on title elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Title {
    #[serde(rename = "X")]
    pub x: f64,
    #[serde(rename = "Y")]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page: u64,
    pub num: u64,
    /// 0 remove, 1 black background, 2 light gray, 3 dark gray, 4 shadow.
    pub style: i64,
    pub control_trail_nums: Vec<i64>,
}

/// Text box payload; present only on text elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextBox {
    pub font_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content_full: Option<String>,
    pub text_rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_digest_data: Option<String>,
    /// 0 left, 1 center, 2 right.
    pub text_align: i64,
    pub text_bold: i64,
    pub text_italics: i64,
    /// 0 fixed width, 1 auto width.
    pub text_frame_width_type: i64,
    /// 0 no border, 3 stroke border (digest boxes).
    pub text_frame_style: i64,
    /// 0 editable, 1 not editable (digest boxes).
    pub text_editable: i64,
}

/// Geometry payload; present only on geometry elements.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Geometry {
    pub pen_color: i64,
    pub pen_type: i64,
    pub pen_width: f64,
    #[serde(rename = "type")]
    pub kind: String,
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ellipse_center_point: Option<Point>,
    pub ellipse_major_axis_radius: f64,
    pub ellipse_minor_axis_radius: f64,
    pub ellipse_angle: f64,
}

impl Geometry {
    pub const TYPE_STRAIGHT_LINE: &'static str = "straightLine";
    pub const TYPE_CIRCLE: &'static str = "GEO_circle";
    pub const TYPE_ELLIPSE: &'static str = "GEO_ellipse";
    pub const TYPE_POLYGON: &'static str = "GEO_polygon";
}

/// Five-pointed star payload: six vertices, first equal to last.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiveStar {
    pub points: Vec<Point>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Picture {
    pub picture_path: String,
    pub rect: Rect,
}

#[cfg(test)]
mod tests {
    use super::{Element, Point, RecognRecord, StreamValue};
    use serde_json::json;

    #[test]
    fn point_shape_requires_numeric_coordinates() {
        assert_eq!(
            Point::from_raw(&json!({"x": 1.0, "y": 2.0})),
            Some(Point { x: 1.0, y: 2.0 })
        );
        assert_eq!(Point::from_raw(&json!({"x": "1", "y": 2.0})), None);
        assert_eq!(Point::from_raw(&json!({"x": 1.0})), None);
        assert_eq!(Point::from_raw(&json!(1.0)), None);
    }

    #[test]
    fn point_sequence_rejects_any_bad_vertex() {
        let good = json!([{"x": 0, "y": 0}, {"x": 1, "y": 1}]);
        assert_eq!(
            <Vec<Point>>::from_raw(&good),
            Some(vec![Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }])
        );
        let bad = json!([{"x": 0, "y": 0}, "not-a-point"]);
        assert_eq!(<Vec<Point>>::from_raw(&bad), None);
        assert_eq!(<Vec<Point>>::from_raw(&json!("not-an-array")), None);
    }

    #[test]
    fn recognition_record_requires_all_four_fields() {
        let good = json!({"X": 1.0, "Y": 2.0, "Flag": 0.0, "timestamp": 99.0});
        assert_eq!(
            RecognRecord::from_raw(&good),
            Some(RecognRecord {
                x: 1.0,
                y: 2.0,
                flag: 0.0,
                timestamp: 99.0
            })
        );
        let missing = json!({"X": 1.0, "Y": 2.0, "Flag": 0.0});
        assert_eq!(RecognRecord::from_raw(&missing), None);
    }

    #[test]
    fn element_deserializes_host_payload() {
        let raw = json!({
            "uuid": "e1",
            "type": Element::TYPE_STROKE,
            "pageNum": 3,
            "layerNum": 1,
            "thickness": 0.4,
            "maxX": 100.0,
            "maxY": 200.0,
            "stroke": {"penColor": 158, "penType": 10, "penWidth": 2.0}
        });
        let element: Element = serde_json::from_value(raw).expect("element");
        assert_eq!(element.uuid, "e1");
        assert_eq!(element.kind, Element::TYPE_STROKE);
        assert_eq!(element.page_num, 3);
        let stroke = element.stroke.as_ref().expect("stroke");
        assert_eq!(stroke.pen_type, 10);
        // Accessors never come off the wire.
        assert!(element.angles.is_none());
        assert!(stroke.points.is_none());
    }

    #[test]
    fn element_serialization_omits_absent_payloads() {
        let element = Element {
            uuid: "e2".to_string(),
            kind: Element::TYPE_TITLE,
            title: Some(super::Title::default()),
            ..Element::default()
        };
        let raw = serde_json::to_value(&element).expect("value");
        let obj = raw.as_object().expect("obj");
        assert!(obj.contains_key("title"));
        assert!(!obj.contains_key("stroke"));
        assert!(!obj.contains_key("link"));
        assert!(!obj.contains_key("angles"));
    }
}
