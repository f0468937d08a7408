//! Adjustment WASM bindings.
//!
//! Exposes the five CSS-style filter channels to TypeScript so editor
//! sliders can read and write them directly.

use crate::types::{js_error, JsDecodedImage};
use photomagnet_core::adjustments::adjusted;
use photomagnet_core::{AdjustmentChannel, Adjustments};
use wasm_bindgen::prelude::*;

/// Brightness, contrast, saturation, blur and sepia for one image.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsAdjustments {
    inner: Adjustments,
}

#[wasm_bindgen]
impl JsAdjustments {
    /// Identity adjustments: 100/100/100/0/0.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    #[wasm_bindgen(getter)]
    pub fn brightness(&self) -> f32 {
        self.inner.brightness
    }

    #[wasm_bindgen(setter)]
    pub fn set_brightness(&mut self, value: f32) {
        self.inner.set(AdjustmentChannel::Brightness, value);
    }

    #[wasm_bindgen(getter)]
    pub fn contrast(&self) -> f32 {
        self.inner.contrast
    }

    #[wasm_bindgen(setter)]
    pub fn set_contrast(&mut self, value: f32) {
        self.inner.set(AdjustmentChannel::Contrast, value);
    }

    #[wasm_bindgen(getter)]
    pub fn saturation(&self) -> f32 {
        self.inner.saturation
    }

    #[wasm_bindgen(setter)]
    pub fn set_saturation(&mut self, value: f32) {
        self.inner.set(AdjustmentChannel::Saturation, value);
    }

    /// Blur radius in output pixels
    #[wasm_bindgen(getter)]
    pub fn blur(&self) -> f32 {
        self.inner.blur
    }

    #[wasm_bindgen(setter)]
    pub fn set_blur(&mut self, value: f32) {
        self.inner.set(AdjustmentChannel::Blur, value);
    }

    #[wasm_bindgen(getter)]
    pub fn sepia(&self) -> f32 {
        self.inner.sepia
    }

    #[wasm_bindgen(setter)]
    pub fn set_sepia(&mut self, value: f32) {
        self.inner.set(AdjustmentChannel::Sepia, value);
    }

    /// Set a channel by its slider name (`"brightness"`, `"blur"`, ...).
    pub fn set_channel(&mut self, name: &str, value: f32) -> Result<(), JsValue> {
        let channel = channel_from_name(name)?;
        self.inner.set(channel, value);
        Ok(())
    }

    pub fn is_default(&self) -> bool {
        self.inner.is_default()
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn to_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner).map_err(js_error)
    }

    pub fn from_json(value: JsValue) -> Result<JsAdjustments, JsValue> {
        let inner: Adjustments = serde_wasm_bindgen::from_value(value).map_err(js_error)?;
        Ok(Self::from_core(inner))
    }
}

impl JsAdjustments {
    pub(crate) fn from_core(inner: Adjustments) -> Self {
        Self {
            inner: inner.clamped(),
        }
    }

    pub(crate) fn inner(&self) -> &Adjustments {
        &self.inner
    }
}

pub(crate) fn channel_from_name(name: &str) -> Result<AdjustmentChannel, JsValue> {
    AdjustmentChannel::from_name(name)
        .ok_or_else(|| JsValue::from_str(&format!("unknown adjustment {}", name)))
}

/// Return a copy of `image` with the filter chain applied.
#[wasm_bindgen]
pub fn apply_adjustments(
    image: &JsDecodedImage,
    adjustments: &JsAdjustments,
) -> Result<JsDecodedImage, JsValue> {
    Ok(JsDecodedImage::from_decoded(adjusted(&image.to_decoded()?, adjustments.inner())))
}
