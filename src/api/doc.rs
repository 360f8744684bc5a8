//! Purpose: File-addressed host surface: pages, layers, elements, text.
//! Exports: `DocApi`.
//! Role: Validates locally, forwards over the transport, decodes envelopes.
//! Invariants: Whole-element payloads always pass `verify_element` before
//! Invariants: leaving the client; returned elements come back attached.
use crate::api::response::ApiResponse;
use crate::api::schemas::{
    assert_rect_not_empty, element_rule, layer_schema, rect_schema, size_schema,
    text_box_schema,
};
use crate::api::transport::HostTransport;
use crate::core::error::Error;
use crate::core::transport::StreamTransport;
use crate::core::verify::{verify, Rule, Schema, VerifyOptions};
use crate::model::element::{Element, Link, Rect, TextBox, Title};
use crate::model::page::{KeyWord, Layer, Size, TemplateInfo};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

fn note_page_schema() -> Schema {
    Schema::new()
        .field("notePath", Rule::string().required().non_empty())
        .field("page", Rule::number().required().integer().min(0.0))
}

/// Operations addressed to a note file on disk plus the read-side of the
/// open document. Same envelope policy as [`crate::api::comm::CommApi`]:
/// local rejections and host business failures are `Ok` failure envelopes,
/// transport breakage is `Err`.
pub struct DocApi<T: HostTransport + 'static> {
    transport: Arc<T>,
}

impl<T: HostTransport + 'static> DocApi<T> {
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

    async fn element_batch(
        &self,
        method: &'static str,
        note_path: &str,
        page: u64,
        elements: &[Element],
    ) -> Result<ApiResponse<bool>, Error> {
        let schema =
            note_page_schema().field("elements", Rule::array(element_rule()).required());
        self.call(
            method,
            &schema,
            json!({ "notePath": note_path, "page": page, "elements": elements }),
        )
        .await
    }

    /// All elements on one page, accessors attached.
    pub async fn get_elements(
        &self,
        note_path: &str,
        page: u64,
    ) -> Result<ApiResponse<Vec<Element>>, Error> {
        let mut resp = self
            .call::<Vec<Element>>(
                "getElements",
                &note_page_schema(),
                json!({ "notePath": note_path, "page": page }),
            )
            .await?;
        if let Some(elements) = resp.result.as_mut() {
            for element in elements {
                element.attach(self.stream());
            }
        }
        Ok(resp)
    }

    pub async fn get_element(
        &self,
        note_path: &str,
        page: u64,
        num_in_page: u64,
    ) -> Result<ApiResponse<Element>, Error> {
        let schema =
            note_page_schema().field("num", Rule::number().required().integer().min(0.0));
        let mut resp = self
            .call::<Element>(
                "getElement",
                &schema,
                json!({ "notePath": note_path, "page": page, "num": num_in_page }),
            )
            .await?;
        if let Some(element) = resp.result.as_mut() {
            element.attach(self.stream());
        }
        Ok(resp)
    }

    pub async fn get_element_counts(
        &self,
        note_path: &str,
        page: u64,
    ) -> Result<ApiResponse<u64>, Error> {
        self.call(
            "getElementCounts",
            &note_page_schema(),
            json!({ "notePath": note_path, "page": page }),
        )
        .await
    }

    /// `numInPage` values of every element on the page, in z-order.
    pub async fn get_element_num_list(
        &self,
        note_path: &str,
        page: u64,
    ) -> Result<ApiResponse<Vec<u64>>, Error> {
        self.call(
            "getElementNumList",
            &note_page_schema(),
            json!({ "notePath": note_path, "page": page }),
        )
        .await
    }

    pub async fn insert_elements(
        &self,
        note_path: &str,
        page: u64,
        elements: &[Element],
    ) -> Result<ApiResponse<bool>, Error> {
        self.element_batch("insertElements", note_path, page, elements)
            .await
    }

    /// Modify elements in place; each element is matched by uuid.
    pub async fn modify_elements(
        &self,
        note_path: &str,
        page: u64,
        elements: &[Element],
    ) -> Result<ApiResponse<bool>, Error> {
        self.element_batch("modifyElements", note_path, page, elements)
            .await
    }

    /// Replace the whole page content with `elements`.
    pub async fn replace_elements(
        &self,
        note_path: &str,
        page: u64,
        elements: &[Element],
    ) -> Result<ApiResponse<bool>, Error> {
        self.element_batch("replaceElements", note_path, page, elements)
            .await
    }

    pub async fn get_layers(
        &self,
        note_path: &str,
        page: u64,
    ) -> Result<ApiResponse<Vec<Layer>>, Error> {
        self.call(
            "getLayers",
            &note_page_schema(),
            json!({ "notePath": note_path, "page": page }),
        )
        .await
    }

    pub async fn insert_layer(
        &self,
        note_path: &str,
        page: u64,
        layer: &Layer,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema().field("layer", Rule::object(layer_schema()).required());
        self.call(
            "insertLayer",
            &schema,
            json!({ "notePath": note_path, "page": page, "layer": layer }),
        )
        .await
    }

    pub async fn modify_layers(
        &self,
        note_path: &str,
        page: u64,
        layers: &[Layer],
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema()
            .field("layers", Rule::array(Rule::object(layer_schema())).required());
        self.call(
            "modifyLayers",
            &schema,
            json!({ "notePath": note_path, "page": page, "layers": layers }),
        )
        .await
    }

    pub async fn delete_layers(
        &self,
        note_path: &str,
        page: u64,
        layer_ids: &[i64],
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema().field(
            "layerIds",
            Rule::array(Rule::number().integer().min(0.0).max(3.0)).required(),
        );
        self.call(
            "deleteLayers",
            &schema,
            json!({ "notePath": note_path, "page": page, "layerIds": layer_ids }),
        )
        .await
    }

    /// Reorder layers; `layer_ids` lists every layer id front-to-back.
    pub async fn sort_layers(
        &self,
        note_path: &str,
        page: u64,
        layer_ids: &[i64],
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema().field(
            "layerIds",
            Rule::array(Rule::number().integer().min(0.0).max(3.0)).required(),
        );
        self.call(
            "sortLayers",
            &schema,
            json!({ "notePath": note_path, "page": page, "layerIds": layer_ids }),
        )
        .await
    }

    /// Wipe every element on one layer of the page.
    pub async fn clear_layer_elements(
        &self,
        note_path: &str,
        page: u64,
        layer_id: i64,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema().field("layer", Rule::number().required().integer());
        self.call(
            "clearLayerElements",
            &schema,
            json!({ "notePath": note_path, "page": page, "layer": layer_id }),
        )
        .await
    }

    pub async fn get_titles(
        &self,
        note_path: &str,
        pages: &[u64],
    ) -> Result<ApiResponse<Vec<Title>>, Error> {
        let schema = Schema::new()
            .field("notePath", Rule::string().required().non_empty())
            .field(
                "pageList",
                Rule::array(Rule::number().integer().min(0.0)).required(),
            );
        self.call(
            "getTitles",
            &schema,
            json!({ "notePath": note_path, "pageList": pages }),
        )
        .await
    }

    pub async fn get_key_words(
        &self,
        note_path: &str,
        pages: &[u64],
    ) -> Result<ApiResponse<Vec<KeyWord>>, Error> {
        let schema = Schema::new()
            .field("notePath", Rule::string().required().non_empty())
            .field(
                "pageList",
                Rule::array(Rule::number().integer().min(0.0)).required(),
            );
        self.call(
            "getKeyWords",
            &schema,
            json!({ "notePath": note_path, "pageList": pages }),
        )
        .await
    }

    pub async fn insert_key_word(
        &self,
        note_path: &str,
        page: u64,
        keyword: &str,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema().field("keyword", Rule::string().required().non_empty());
        self.call(
            "insertKeyWord",
            &schema,
            json!({ "notePath": note_path, "page": page, "keyword": keyword }),
        )
        .await
    }

    pub async fn delete_key_word(
        &self,
        note_path: &str,
        page: u64,
        index: u64,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema =
            note_page_schema().field("index", Rule::number().required().integer().min(0.0));
        self.call(
            "deleteKeyWord",
            &schema,
            json!({ "notePath": note_path, "page": page, "index": index }),
        )
        .await
    }

    /// Pages of `file_path` carrying at least one five-star marker.
    pub async fn search_five_stars(
        &self,
        file_path: &str,
    ) -> Result<ApiResponse<Vec<u64>>, Error> {
        let schema = Schema::new().field("filePath", Rule::string().required().non_empty());
        self.call(
            "searchFiveStars",
            &schema,
            json!({ "filePath": file_path }),
        )
        .await
    }

    /// Pages of a document that carry mark (side-note) content.
    pub async fn get_mark_pages(
        &self,
        file_path: &str,
    ) -> Result<ApiResponse<Vec<u64>>, Error> {
        let schema = Schema::new().field("filePath", Rule::string().required().non_empty());
        self.call("getMarkPages", &schema, json!({ "filePath": file_path }))
            .await
    }

    /// Delete the mark content of one document page.
    pub async fn clear_mark_elements(
        &self,
        file_path: &str,
        page: u64,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("filePath", Rule::string().required().non_empty())
            .field("page", Rule::number().required().integer().min(0.0));
        self.call(
            "clearMarkElements",
            &schema,
            json!({ "filePath": file_path, "page": page }),
        )
        .await
    }

    /// Render the marks of one page into a PNG thumbnail of `size`.
    pub async fn generate_mark_thumbnails(
        &self,
        mark_path: &str,
        page: u64,
        png_path: &str,
        size: Size,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("markPath", Rule::string().required().non_empty())
            .field("page", Rule::number().required().integer().min(0.0))
            .field(
                "pngPath",
                Rule::string().required().non_empty().pattern(r"(?i)\.png$"),
            )
            .field("size", Rule::object(size_schema()).required());
        self.call(
            "generateMarkThumbnails",
            &schema,
            json!({
                "markPath": mark_path,
                "page": page,
                "pngPath": png_path,
                "size": size,
            }),
        )
        .await
    }

    /// Insert a text box at its own `textRect` on the current page.
    pub async fn insert_text(&self, text_box: &TextBox) -> Result<ApiResponse<bool>, Error> {
        let schema =
            Schema::new().field("textBox", Rule::object(text_box_schema()).required());
        self.call("insertText", &schema, json!({ "textBox": text_box }))
            .await
    }

    /// Insert a text link whose visible body sits inside `rect`.
    pub async fn insert_text_link(
        &self,
        link: &Link,
        rect: Rect,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("destPath", Rule::string().required().non_empty())
            .field("destPage", Rule::number().integer().min(0.0))
            .field("style", Rule::number().required().integer())
            .field("linkType", Rule::number().required().integer())
            .field("fontSize", Rule::number().min(0.0))
            .field("fullText", Rule::string())
            .field("showText", Rule::string())
            .field("italic", Rule::number().integer().one_of_numbers([0.0, 1.0]))
            .field(
                "rect",
                Rule::object(rect_schema())
                    .required()
                    .assert(assert_rect_not_empty),
            );
        self.call(
            "insertTextLink",
            &schema,
            json!({
                "destPath": link.dest_path,
                "destPage": link.dest_page,
                "style": link.style,
                "linkType": link.link_type,
                "fontSize": link.font_size,
                "fullText": link.full_text,
                "showText": link.show_text,
                "italic": link.italic,
                "rect": rect,
            }),
        )
        .await
    }

    /// Insert an image file; the host scales it into `rect`.
    pub async fn insert_image(
        &self,
        picture_path: &str,
        rect: Rect,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("picturePath", Rule::string().required().non_empty())
            .field(
                "rect",
                Rule::object(rect_schema())
                    .required()
                    .assert(assert_rect_not_empty),
            );
        self.call(
            "insertImage",
            &schema,
            json!({ "picturePath": picture_path, "rect": rect }),
        )
        .await
    }

    /// Rasterize one note page to a PNG file. `times` is the render scale
    /// multiplier, `render_type` selects the host's render pipeline.
    pub async fn generate_note_png(
        &self,
        note_path: &str,
        page: u64,
        times: i64,
        png_path: &str,
        render_type: i64,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema()
            .field("times", Rule::number().required().integer())
            .field(
                "pngPath",
                Rule::string().required().non_empty().pattern(r"(?i)\.png$"),
            )
            .field("type", Rule::number().required().integer());
        self.call(
            "generateNotePng",
            &schema,
            json!({
                "notePath": note_path,
                "page": page,
                "times": times,
                "pngPath": png_path,
                "type": render_type,
            }),
        )
        .await
    }

    pub async fn save_current_note(&self) -> Result<ApiResponse<bool>, Error> {
        self.call("saveCurrentNote", &Schema::new(), json!({})).await
    }

    pub async fn get_selected_text(&self) -> Result<ApiResponse<String>, Error> {
        self.call("getSelectedText", &Schema::new(), json!({})).await
    }

    /// Full text of one page of the open document (PDF/EPUB side).
    pub async fn get_current_doc_text(&self, page: u64) -> Result<ApiResponse<String>, Error> {
        let schema =
            Schema::new().field("page", Rule::number().required().integer().min(0.0));
        self.call("getCurrentDocText", &schema, json!({ "page": page }))
            .await
    }

    pub async fn get_current_total_pages(&self) -> Result<ApiResponse<u64>, Error> {
        self.call("getCurrentTotalPages", &Schema::new(), json!({}))
            .await
    }

    pub async fn get_note_total_page_num(
        &self,
        note_path: &str,
    ) -> Result<ApiResponse<u64>, Error> {
        let schema = Schema::new().field("notePath", Rule::string().required().non_empty());
        self.call(
            "getNoteTotalPageNum",
            &schema,
            json!({ "notePath": note_path }),
        )
        .await
    }

    /// Host-side note format discriminator for `note_path`.
    pub async fn get_note_type(&self, note_path: &str) -> Result<ApiResponse<i64>, Error> {
        let schema = Schema::new().field("notePath", Rule::string().required().non_empty());
        self.call("getNoteType", &schema, json!({ "notePath": note_path }))
            .await
    }

    /// Device family the note file was produced on.
    pub async fn get_file_machine_type(
        &self,
        note_path: &str,
    ) -> Result<ApiResponse<i64>, Error> {
        let schema = Schema::new().field("notePath", Rule::string().required().non_empty());
        self.call(
            "getFileMachineType",
            &schema,
            json!({ "notePath": note_path }),
        )
        .await
    }

    pub async fn get_page_size(
        &self,
        note_path: &str,
        page: u64,
    ) -> Result<ApiResponse<Size>, Error> {
        self.call(
            "getPageSize",
            &note_page_schema(),
            json!({ "notePath": note_path, "page": page }),
        )
        .await
    }

    pub async fn remove_note_page(
        &self,
        note_path: &str,
        page: u64,
    ) -> Result<ApiResponse<bool>, Error> {
        self.call(
            "removeNotePage",
            &note_page_schema(),
            json!({ "notePath": note_path, "page": page }),
        )
        .await
    }

    /// Insert a blank page before `page`, styled by `template`.
    pub async fn insert_note_page(
        &self,
        note_path: &str,
        page: u64,
        template: &str,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema =
            note_page_schema().field("template", Rule::string().required().non_empty());
        self.call(
            "insertNotePage",
            &schema,
            json!({ "notePath": note_path, "page": page, "template": template }),
        )
        .await
    }

    /// Background template applied to one note page.
    pub async fn get_note_page_template(
        &self,
        note_path: &str,
        page: u64,
    ) -> Result<ApiResponse<TemplateInfo>, Error> {
        self.call(
            "getNotePageTemplate",
            &note_page_schema(),
            json!({ "notePath": note_path, "page": page }),
        )
        .await
    }

    /// Rasterize just the background template of one page to a PNG file.
    pub async fn generate_note_template_png(
        &self,
        note_path: &str,
        page: u64,
        png_path: &str,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = note_page_schema().field(
            "pngPath",
            Rule::string().required().non_empty().pattern(r"(?i)\.png$"),
        );
        self.call(
            "generateNoteTemplatePng",
            &schema,
            json!({ "notePath": note_path, "page": page, "pngPath": png_path }),
        )
        .await
    }

    /// Create a fresh note file from a template. `mode` selects the note
    /// layout variant the host offers for that template.
    pub async fn create_note(
        &self,
        note_path: &str,
        template: &str,
        mode: i64,
        is_portrait: bool,
    ) -> Result<ApiResponse<bool>, Error> {
        let schema = Schema::new()
            .field("notePath", Rule::string().required().non_empty())
            .field("template", Rule::string().required().non_empty())
            .field("mode", Rule::number().required().integer())
            .field("isPortrait", Rule::boolean().required());
        self.call(
            "createNote",
            &schema,
            json!({
                "notePath": note_path,
                "template": template,
                "mode": mode,
                "isPortrait": is_portrait,
            }),
        )
        .await
    }
}
