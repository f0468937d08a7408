//! Upload session bindings.
//!
//! Wraps [`UploadSession`] for the product page uploader. Work runs
//! synchronously on the calling thread; the page registers an observer to
//! hear about the ordered list of finished images.
//!
//! Decoding and rendering a batch can take a while, so the session is meant
//! to be hosted in a Web Worker that owns its own instance of this module.
//! The page posts files and crop or edit commands to the worker and relays
//! observer updates back. The core's job API (`begin_batch`, `DecodeJob`,
//! `complete_decode`, `edit`, `complete_render`) is not bound here: its jobs
//! are Rust values that cannot cross to another wasm instance, and inside a
//! single worker running them inline is equivalent.
//!
//! ```typescript
//! const session = new JsUploadSession(product, undefined);
//! session.set_observer((images: string[]) => setImages(images));
//! const report = session.upload(names, mimes, buffers);
//! while (session.is_cropping()) {
//!   session.confirm_crop();
//! }
//! ```

use js_sys::{Array, Function, Uint8Array};
use photomagnet_core::catalog::Product;
use photomagnet_core::decode::UploadFile;
use photomagnet_core::session::{BatchReport, ImageSlot, SlotObserver, SlotState, UploadSession};
use photomagnet_core::transform::{CropRegion, Rotation};
use photomagnet_core::Adjustments;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::adjustments::{channel_from_name, JsAdjustments};
use crate::compose::config_from_js;
use crate::types::js_error;

struct JsObserver(Function);

impl SlotObserver for JsObserver {
    fn images_updated(&mut self, images: &[String]) {
        let list: Array = images.iter().map(|url| JsValue::from_str(url)).collect();
        if let Err(e) = self.0.call1(&JsValue::NULL, &list) {
            log::warn!("image observer threw: {:?}", e);
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureView {
    file_name: String,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchReportView {
    batch_id: u64,
    placed: Vec<usize>,
    failed: Vec<FailureView>,
    truncated: usize,
    rejected: Vec<String>,
}

impl From<BatchReport> for BatchReportView {
    fn from(report: BatchReport) -> Self {
        Self {
            batch_id: report.batch_id,
            placed: report.placed,
            failed: report
                .failed
                .into_iter()
                .map(|f| FailureView {
                    file_name: f.file_name,
                    error: f.error.to_string(),
                })
                .collect(),
            truncated: report.truncated,
            rejected: report.rejected.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SlotView {
    state: SlotState,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rotation: Option<Rotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    adjustments: Option<Adjustments>,
}

impl From<&ImageSlot> for SlotView {
    fn from(slot: &ImageSlot) -> Self {
        let populated = slot.as_populated();
        Self {
            state: slot.state(),
            data_url: slot.data_url(),
            rotation: populated.map(|p| p.rotation),
            adjustments: populated.map(|p| p.adjustments),
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

/// Pair up file names, MIME types and contents from the file picker.
pub(crate) fn upload_files(
    names: Vec<String>,
    mimes: Vec<String>,
    contents: Vec<Vec<u8>>,
) -> Result<Vec<UploadFile>, String> {
    if names.len() != mimes.len() || names.len() != contents.len() {
        return Err(format!(
            "upload lists differ in length ({} names, {} types, {} files)",
            names.len(),
            mimes.len(),
            contents.len()
        ));
    }
    Ok(names
        .into_iter()
        .zip(mimes)
        .zip(contents)
        .map(|((name, mime), bytes)| UploadFile::new(name, mime, bytes))
        .collect())
}

#[wasm_bindgen]
pub struct JsUploadSession {
    inner: UploadSession,
}

#[wasm_bindgen]
impl JsUploadSession {
    /// New session for `product` (a catalog product object). `config` may be
    /// `undefined`.
    #[wasm_bindgen(constructor)]
    pub fn new(product: JsValue, config: JsValue) -> Result<JsUploadSession, JsValue> {
        let product: Product = serde_wasm_bindgen::from_value(product).map_err(js_error)?;
        let config = config_from_js(config)?;
        Ok(Self {
            inner: UploadSession::for_product(&product, config),
        })
    }

    /// Session pre-filled with images already in the cart.
    pub fn with_existing(
        product: JsValue,
        config: JsValue,
        images: Vec<String>,
    ) -> Result<JsUploadSession, JsValue> {
        let product: Product = serde_wasm_bindgen::from_value(product).map_err(js_error)?;
        let config = config_from_js(config)?;
        let inner = UploadSession::with_existing(&product, config, &images).map_err(js_error)?;
        Ok(Self { inner })
    }

    /// Call `callback(images)` whenever the populated image list changes.
    pub fn set_observer(&mut self, callback: Function) {
        self.inner.set_observer(JsObserver(callback));
    }

    pub fn clear_observer(&mut self) {
        self.inner.clear_observer();
    }

    /// Validate, decode and queue files for cropping.
    ///
    /// `contents` is an array of `Uint8Array`, parallel to `names` and
    /// `mimes`. Returns `{batchId, placed, failed, truncated, rejected}`.
    pub fn upload(
        &mut self,
        names: Vec<String>,
        mimes: Vec<String>,
        contents: Array,
    ) -> Result<JsValue, JsValue> {
        let contents = contents
            .iter()
            .map(|buffer| Uint8Array::new(&buffer).to_vec())
            .collect();
        let files = upload_files(names, mimes, contents).map_err(|e| JsValue::from_str(&e))?;
        let report = self.inner.upload_batch(files).map_err(js_error)?;
        to_js(&BatchReportView::from(report))
    }

    #[wasm_bindgen(getter)]
    pub fn max_images(&self) -> usize {
        self.inner.max_images()
    }

    pub fn populated_count(&self) -> usize {
        self.inner.populated_count()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.inner.remaining_capacity()
    }

    /// Every slot holds a finished image.
    pub fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }

    /// Finished images as data URLs, in slot order.
    pub fn images(&self) -> Vec<String> {
        self.inner.populated_images()
    }

    /// `[{state, dataUrl?, rotation?, adjustments?}]` for every slot.
    pub fn slots(&self) -> Result<JsValue, JsValue> {
        let views: Vec<SlotView> = self.inner.slots().iter().map(SlotView::from).collect();
        to_js(&views)
    }

    pub fn is_cropping(&self) -> bool {
        self.inner.is_cropping()
    }

    pub fn current_crop_index(&self) -> Option<usize> {
        self.inner.current_crop_index()
    }

    /// Current crop region, or `undefined` outside crop mode.
    pub fn crop_region(&self) -> Result<JsValue, JsValue> {
        match self.inner.crop_selector() {
            Some(selector) => to_js(&selector.region()),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Source dimensions of the image being cropped, as `[width, height]`.
    pub fn crop_source_size(&self) -> Option<Vec<u32>> {
        self.inner.crop_selector().map(|s| {
            let (w, h) = s.source_dimensions();
            vec![w, h]
        })
    }

    pub fn set_crop_region(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<JsValue, JsValue> {
        let region = self
            .inner
            .set_crop_region(CropRegion::new(x, y, width, height))
            .map_err(js_error)?;
        to_js(&region)
    }

    pub fn translate_crop(&mut self, dx: i32, dy: i32) -> Result<JsValue, JsValue> {
        let region = self
            .inner
            .translate_crop(i64::from(dx), i64::from(dy))
            .map_err(js_error)?;
        to_js(&region)
    }

    pub fn scale_crop(&mut self, factor: f64) -> Result<JsValue, JsValue> {
        let region = self.inner.scale_crop(factor).map_err(js_error)?;
        to_js(&region)
    }

    pub fn reset_crop(&mut self) -> Result<JsValue, JsValue> {
        let region = self.inner.reset_crop().map_err(js_error)?;
        to_js(&region)
    }

    /// Rasterize the crop and populate its slot. Returns the slot index.
    pub fn confirm_crop(&mut self) -> Result<usize, JsValue> {
        self.inner.confirm_crop().map_err(js_error)
    }

    /// Leave crop mode, discarding every pending image.
    pub fn cancel_crop(&mut self) {
        self.inner.cancel_crop();
    }

    /// Rotate a populated slot a quarter turn clockwise. Returns the new angle.
    pub fn rotate(&mut self, index: usize) -> Result<i32, JsValue> {
        self.inner
            .rotate(index)
            .map(Rotation::degrees)
            .map_err(js_error)
    }

    pub fn set_adjustment(&mut self, index: usize, channel: &str, value: f32) -> Result<JsAdjustments, JsValue> {
        let channel = channel_from_name(channel)?;
        self.inner
            .set_adjustment(index, channel, value)
            .map(JsAdjustments::from_core)
            .map_err(js_error)
    }

    pub fn reset_adjustments(&mut self, index: usize) -> Result<(), JsValue> {
        self.inner.reset_adjustments(index).map_err(js_error)
    }

    /// Apply rotation and adjustments together, as the editor's Save does.
    pub fn apply_edit(
        &mut self,
        index: usize,
        rotation_degrees: i32,
        adjustments: &JsAdjustments,
    ) -> Result<(), JsValue> {
        let rotation = Rotation::from_degrees(rotation_degrees).map_err(js_error)?;
        self.inner
            .apply_edit(index, rotation, *adjustments.inner())
            .map_err(js_error)
    }

    /// Starting region for re-cropping a populated slot.
    pub fn recrop_region(&self, index: usize) -> Result<JsValue, JsValue> {
        let selector = self.inner.recrop_selector(index).map_err(js_error)?;
        to_js(&selector.region())
    }

    pub fn recrop(&mut self, index: usize, x: u32, y: u32, width: u32, height: u32) -> Result<JsValue, JsValue> {
        let region = self
            .inner
            .recrop(index, CropRegion::new(x, y, width, height))
            .map_err(js_error)?;
        to_js(&region)
    }

    /// Delete an image; later images shift down.
    pub fn remove(&mut self, index: usize) -> Result<(), JsValue> {
        self.inner.remove(index).map_err(js_error)
    }

    /// Stop the session. Results arriving afterwards are ignored.
    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use photomagnet_core::catalog::default_catalog;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn product_js(id: &str) -> JsValue {
        let catalog = default_catalog("2024-01-01T00:00:00Z");
        let product = catalog.iter().find(|p| p.id == id).unwrap();
        serde_wasm_bindgen::to_value(product).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_new_session_from_product() {
        let session = JsUploadSession::new(product_js("set-of-6"), JsValue::UNDEFINED).unwrap();
        assert_eq!(session.max_images(), 6);
        assert!(!session.is_complete());
        assert!(session.images().is_empty());
    }

    #[wasm_bindgen_test]
    fn test_non_image_is_rejected() {
        let mut session = JsUploadSession::new(product_js("puzzle"), JsValue::UNDEFINED).unwrap();
        let contents = Array::of1(&Uint8Array::from(&[1u8, 2, 3][..]));
        let report = session
            .upload(vec!["notes.txt".to_string()], vec!["text/plain".to_string()], contents)
            .unwrap();
        assert!(report.is_object());
        assert!(!session.is_cropping());
    }

    #[wasm_bindgen_test]
    fn test_remove_out_of_range_errors() {
        let mut session = JsUploadSession::new(product_js("set-of-3"), JsValue::UNDEFINED).unwrap();
        assert!(session.remove(7).is_err());
    }

    #[wasm_bindgen_test]
    fn test_close() {
        let mut session = JsUploadSession::new(product_js("set-of-3"), JsValue::UNDEFINED).unwrap();
        session.close();
        assert!(session.is_closed());
    }
}
