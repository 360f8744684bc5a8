//! Purpose: Session-scoped host surface: current file, lasso, stickers.
//! Exports: `CommApi`.
//! Role: Validates locally, forwards over the transport, decodes envelopes.
//! Invariants: A call that fails validation never reaches the transport;
//! Invariants: its failure envelope is built entirely client-side.
use crate::api::response::ApiResponse;
use crate::api::schemas::{
    assert_five_star_outline, assert_link_destination, assert_rect_not_empty, element_rule,
    geometry_schema, point_schema, rect_schema, size_schema, text_box_schema,
};
use crate::api::transport::HostTransport;
use crate::core::error::{Error, ErrorKind};
use crate::core::transport::StreamTransport;
use crate::core::verify::{verify, Rule, Schema, VerifyOptions};
use crate::model::element::{Element, Geometry, Link, Point, Rect, TextBox, Title};
use crate::model::page::{LassoElementTypeCounts, Size, Template};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

fn assert_known_kind(value: &mut Value, path: &str) -> Result<(), Error> {
    let known = value
        .as_i64()
        .is_some_and(|kind| Element::VALID_TYPES.contains(&kind));
    if known {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::InvalidElementType)
            .with_message(format!("{path} is not a known element type"))
            .with_path(path))
    }
}

/// Session-level operations on whatever note is open right now.
///
/// Every async method returns `Ok` with a failure envelope when the
/// parameters are rejected locally or the host reports a business failure,
/// and `Err` only when the transport itself breaks.
pub struct CommApi<T: HostTransport + 'static> {
    transport: Arc<T>,
}

impl<T: HostTransport + 'static> CommApi<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    fn stream(&self) -> Arc<dyn StreamTransport> {
        self.transport.clone()
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &'static str,
        schema: &Schema,
        mut params: Value,
    ) -> Result<ApiResponse<R>, Error> {
        if let Err(err) = verify(schema, &mut params, &VerifyOptions::strict(method)) {
            warn!(method, code = err.code(), "parameter validation failed");
            return Ok(ApiResponse::failure(&err));
        }
        debug!(method, "host call");
        let raw = self.transport.invoke(method, params).await?;
        raw.decode()
    }

    /// Ask the host to allocate a fresh element of `kind`. The returned
    /// element arrives with its accessors already attached.
    pub async fn create_element(&self, kind: i64) -> Result<ApiResponse<Element>, Error> {
        let schema = Schema::new().field(
            "type",
            Rule::number().required().integer().assert(assert_known_kind),
        );
        let mut resp = self
            .call::<Element>("createElement", &schema, json!({ "type": kind }))
            .await?;
        if let Some(element) = resp.result.as_mut() {
            element.attach(self.stream());
        }
        Ok(resp)
    }

    /// Release the host-side cache behind `element` and drop every local
    /// accessor cache. The uuid must not be read through afterwards.
    pub fn recycle_element(&self, element: &mut Element) -> ApiResponse<bool> {
        if element.uuid.trim().is_empty() {
            let err = Error::new(ErrorKind::NullElement)
                .with_message("element has no uuid; nothing to recycle");
            return ApiResponse::failure(&err);
        }
        if element.angles.is_some() {
            element.recycle();
        } else {
            self.transport.release_element_cache(&element.uuid);
        }
        ApiResponse::success(true)
    }

    /// Drop every element cache the host holds for this plugin.
    pub async fn clear_element_cache(&self) -> Result<ApiResponse<bool>, Error> {
        self.call("clearElementCache", &Schema::new(), json!({})).await
    }

    pub async fn save_sticker_by_lasso(&self, sticker_path: &str) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field("stickerPath", Rule::string().required().non_empty());
        self.call(
            "saveStickerByLasso",
            &schema,
            json!({ "stickerPath": sticker_path }),
        )
        .await
    }

    pub async fn get_sticker_size(&self, sticker_path: &str) -> Result<ApiResponse<Size>, Error> {
        let schema = Schema::new().field("stickerPath", Rule::string().required().non_empty());
        self.call(
            "getStickerSize",
            &schema,
            json!({ "stickerPath": sticker_path }),
        )
        .await
    }

    /// Render a PNG thumbnail of a saved sticker.
    pub async fn generate_sticker_thumbnail(
        &self,
        sticker_path: &str,
        thumbnail_path: &str,
        size: Size,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("stickerPath", Rule::string().required().non_empty())
            .field(
                "thumbnailPath",
                Rule::string().required().non_empty().pattern(r"\.png$"),
            )
            .field("size", Rule::object(size_schema()).required());
        self.call(
            "generateStickerThumbnail",
            &schema,
            json!({
                "stickerPath": sticker_path,
                "thumbnailPath": thumbnail_path,
                "size": size,
            }),
        )
        .await
    }

    /// Bake loose elements into a sticker file for `machine_type`.
    pub async fn convert_elements_to_sticker(
        &self,
        machine_type: i64,
        elements: &[Element],
        sticker_path: &str,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("machineType", Rule::number().required().integer().min(0.0))
            .field("elements", Rule::array(element_rule()).required())
            .field("stickerPath", Rule::string().required().non_empty());
        self.call(
            "convertElement2Sticker",
            &schema,
            json!({
                "machineType": machine_type,
                "elements": elements,
                "stickerPath": sticker_path,
            }),
        )
        .await
    }

    pub async fn insert_sticker(&self, sticker_path: &str) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field("stickerPath", Rule::string().required().non_empty());
        self.call(
            "insertSticker",
            &schema,
            json!({ "stickerPath": sticker_path }),
        )
        .await
    }

    /// 0 dismisses the lasso box, 1 shows it.
    pub async fn set_lasso_box_state(&self, state: i64) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field(
            "state",
            Rule::number().required().integer().one_of_numbers([0.0, 1.0]),
        );
        self.call("setLassoBoxState", &schema, json!({ "state": state }))
            .await
    }

    pub async fn get_lasso_rect(&self) -> Result<ApiResponse<Rect>, Error> {
        self.call("getLassoRect", &Schema::new(), json!({})).await
    }

    pub async fn update_lasso_rect(&self, rect: Rect) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field(
            "rect",
            Rule::object(rect_schema())
                .required()
                .assert(assert_rect_not_empty),
        );
        self.call("updateLassoRect", &schema, json!({ "rect": rect }))
            .await
    }

    /// Everything inside the current lasso selection, accessors attached.
    pub async fn get_lasso_elements(&self) -> Result<ApiResponse<Vec<Element>>, Error> {
        let mut resp = self
            .call::<Vec<Element>>("getLassoElements", &Schema::new(), json!({}))
            .await?;
        if let Some(elements) = resp.result.as_mut() {
            for element in elements {
                element.attach(self.stream());
            }
        }
        Ok(resp)
    }

    /// Topmost element of the current note page, accessors attached.
    pub async fn get_last_element(&self) -> Result<ApiResponse<Element>, Error> {
        let mut resp = self
            .call::<Element>("getLastElement", &Schema::new(), json!({}))
            .await?;
        if let Some(element) = resp.result.as_mut() {
            element.attach(self.stream());
        }
        Ok(resp)
    }

    pub async fn get_lasso_element_type_counts(
        &self,
    ) -> Result<ApiResponse<LassoElementTypeCounts>, Error> {
        self.call("getLassoElementTypeCounts", &Schema::new(), json!({}))
            .await
    }

    pub async fn delete_lasso_elements(&self) -> Result<ApiResponse<bool>, Error> {
        self.call("deleteLassoElements", &Schema::new(), json!({}))
            .await
    }

    pub async fn get_lasso_geometries(&self) -> Result<ApiResponse<Vec<Geometry>>, Error> {
        self.call("getLassoGeometries", &Schema::new(), json!({}))
            .await
    }

    pub async fn insert_geometry(&self, geometry: &Geometry) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field("geometry", Rule::object(geometry_schema()).required());
        self.call("insertGeometry", &schema, json!({ "geometry": geometry }))
            .await
    }

    /// Replace the single geometry currently under the lasso.
    pub async fn modify_lasso_geometry(
        &self,
        geometry: &Geometry,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field("geometry", Rule::object(geometry_schema()).required());
        self.call(
            "modifyLassoGeometry",
            &schema,
            json!({ "geometry": geometry }),
        )
        .await
    }

    pub async fn insert_five_star(&self, points: &[Point]) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field(
            "starPoints",
            Rule::array(Rule::object(point_schema()))
                .required()
                .assert(assert_five_star_outline),
        );
        self.call(
            "insertFiveStar",
            &schema,
            json!({ "starPoints": points }),
        )
        .await
    }

    pub async fn get_lasso_text(&self) -> Result<ApiResponse<String>, Error> {
        self.call("getLassoText", &Schema::new(), json!({})).await
    }

    pub async fn get_lasso_links(&self) -> Result<ApiResponse<Vec<Link>>, Error> {
        self.call("getLassoLinks", &Schema::new(), json!({})).await
    }

    pub async fn get_lasso_titles(&self) -> Result<ApiResponse<Vec<Title>>, Error> {
        self.call("getLassoTitles", &Schema::new(), json!({})).await
    }

    /// Rewrite the text box under the lasso with `text_box`'s content and
    /// styling.
    pub async fn modify_lasso_text(&self, text_box: &TextBox) -> Result<ApiResponse<bool>, Error> {
        let schema =
            Schema::new().field("textBox", Rule::object(text_box_schema()).required());
        self.call("modifyLassoText", &schema, json!({ "textBox": text_box }))
            .await
    }

    /// Style the title under the lasso; style 0 removes it.
    pub async fn set_lasso_title(&self, style: i64) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new().field(
            "style",
            Rule::number().required().integer().min(0.0).max(4.0),
        );
        self.call("setLassoTitle", &schema, json!({ "style": style }))
            .await
    }

    /// Re-point the link under the lasso at a new destination.
    pub async fn modify_lasso_link(
        &self,
        dest_path: &str,
        dest_page: u64,
        style: i64,
        link_type: i64,
    ) -> Result<ApiResponse<bool>, Error> {
        let fields = Schema::new()
            .field("destPath", Rule::string().required().non_empty())
            .field("destPage", Rule::number().integer().min(0.0))
            .field("style", Rule::number().required().integer())
            .field("linkType", Rule::number().required().integer());
        let schema = Schema::new().field(
            "modifyLink",
            Rule::object(fields)
                .required()
                .assert(assert_link_destination),
        );
        self.call(
            "modifyLassoLink",
            &schema,
            json!({
                "modifyLink": {
                    "destPath": dest_path,
                    "destPage": dest_page,
                    "style": style,
                    "linkType": link_type,
                }
            }),
        )
        .await
    }

    /// Turn the strokes under the lasso into a stroke link.
    pub async fn set_lasso_stroke_link(
        &self,
        dest_path: &str,
        dest_page: u64,
        style: i64,
        link_type: i64,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("destPath", Rule::string().required().non_empty())
            .field("destPage", Rule::number().integer().min(0.0))
            .field("style", Rule::number().required().integer())
            .field("linkType", Rule::number().required().integer());
        self.call(
            "setLassoStrokeLink",
            &schema,
            json!({
                "destPath": dest_path,
                "destPage": dest_page,
                "style": style,
                "linkType": link_type,
            }),
        )
        .await
    }

    pub async fn get_note_system_templates(&self) -> Result<ApiResponse<Vec<Template>>, Error> {
        self.call("getNoteSystemTemplates", &Schema::new(), json!({}))
            .await
    }

    pub async fn get_current_page_num(&self) -> Result<ApiResponse<u64>, Error> {
        self.call("getCurrentPageNum", &Schema::new(), json!({}))
            .await
    }

    pub async fn get_current_file_path(&self) -> Result<ApiResponse<String>, Error> {
        self.call("getCurrentFilePath", &Schema::new(), json!({}))
            .await
    }

    /// Re-read the open file from disk, discarding host render caches.
    pub async fn reload_file(&self) -> Result<ApiResponse<bool>, Error> {
        self.call("reloadFile", &Schema::new(), json!({})).await
    }
}
