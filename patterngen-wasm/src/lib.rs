use serde::{Deserialize, Serialize};
use tsify_next::Tsify;
use wasm_bindgen::prelude::*;

use patterngen::canvas::{RasterCanvas, SvgCanvas};
use patterngen::config::RenderConfig;
use patterngen::geometry::Page;
use patterngen::pattern::{render_pattern, PatternConfig, RenderReport};
use patterngen::source::{MarkerRegistry, MemorySource, RegistryStatus};

// ── Tsify types for TypeScript interface generation ──

/// What happened during a render.
#[derive(Tsify, Serialize, Deserialize, Default)]
#[tsify(into_wasm_abi)]
pub struct WasmReport {
    pub markers_drawn: u32,
    /// IDs drawn as red placeholder boxes.
    pub placeholders: Vec<u64>,
    /// True when synthetic markers stood in for missing family data.
    pub fallback: bool,
    pub warnings: Vec<String>,
}

impl From<RenderReport> for WasmReport {
    fn from(r: RenderReport) -> Self {
        WasmReport {
            markers_drawn: r.markers_drawn as u32,
            placeholders: r.placeholders,
            fallback: r.fallback,
            warnings: r.warnings,
        }
    }
}

/// SVG markup plus its render report.
#[derive(Tsify, Serialize, Deserialize)]
#[tsify(into_wasm_abi)]
pub struct WasmSvg {
    pub svg: String,
    pub report: WasmReport,
}

/// Registry state for UI warnings.
#[derive(Tsify, Serialize, Deserialize)]
#[tsify(into_wasm_abi)]
pub struct WasmStatus {
    pub families: Vec<String>,
    pub bitmap_db_loaded: Option<bool>,
    pub april_fallback: bool,
    pub aruco_fallback: bool,
    pub warnings: Vec<String>,
}

impl From<RegistryStatus> for WasmStatus {
    fn from(s: RegistryStatus) -> Self {
        WasmStatus {
            families: s.families,
            bitmap_db_loaded: s.bitmap_db_loaded,
            april_fallback: s.april_fallback,
            aruco_fallback: s.aruco_fallback,
            warnings: s.warnings,
        }
    }
}

// ── Renderer wrapper ──

/// Pattern renderer for use from JavaScript/TypeScript.
///
/// Family files and `aruco_bitmaps.json` are handed over as bytes with
/// [`add_asset`](Renderer::add_asset); nothing is fetched by the module.
#[wasm_bindgen]
pub struct Renderer {
    registry: MarkerRegistry<MemorySource>,
    last_report: Option<RenderReport>,
}

#[wasm_bindgen]
impl Renderer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Renderer {
        Renderer {
            registry: MarkerRegistry::new(MemorySource::new()),
            last_report: None,
        }
    }

    /// Register an asset (e.g. `tag36h11.json`). Clears anything cached so
    /// the next render picks the new data up.
    pub fn add_asset(&mut self, name: &str, bytes: &[u8]) {
        let registry = std::mem::replace(
            &mut self.registry,
            MarkerRegistry::new(MemorySource::new()),
        );
        let source = registry.into_source().with(name, bytes);
        self.registry = MarkerRegistry::new(source);
    }

    /// Render a full page config (`{ page, caption, footer, pattern }`) to SVG.
    pub fn render_svg(&mut self, config: JsValue) -> Result<WasmSvg, JsError> {
        let config: RenderConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsError::new(&format!("invalid config: {e}")))?;
        let page = config
            .page()
            .map_err(|e| JsError::new(&e.to_string()))?;
        let mut svg = SvgCanvas::new(&page);
        let report = config
            .render(&mut self.registry, &mut svg)
            .map_err(|e| JsError::new(&e.to_string()))?;
        self.last_report = Some(report.clone());
        Ok(WasmSvg {
            svg: svg.finish(),
            report: report.into(),
        })
    }

    /// Render a pattern (`{ kind, ... }`) onto a borderless `width`×`height`
    /// preview, returned as RGBA bytes ready for `ImageData`.
    pub fn render_rgba(
        &mut self,
        pattern: JsValue,
        width: u32,
        height: u32,
    ) -> Result<js_sys::Uint8ClampedArray, JsError> {
        if width == 0 || height == 0 {
            return Err(JsError::new(&format!(
                "canvas size {width}x{height} is empty"
            )));
        }
        let pattern: PatternConfig = serde_wasm_bindgen::from_value(pattern)
            .map_err(|e| JsError::new(&format!("invalid pattern: {e}")))?;
        let page = Page::canvas(width, height);
        let mut raster = RasterCanvas::for_page(&page, 1.0)
            .ok_or_else(|| JsError::new(&format!("canvas size {width}x{height} is too large")))?;
        let report = render_pattern(&pattern, &mut self.registry, &page, &mut raster);
        self.last_report = Some(report);
        Ok(js_sys::Uint8ClampedArray::from(raster.rgba()))
    }

    /// Report of the most recent render.
    pub fn last_report(&self) -> WasmReport {
        self.last_report.clone().map(Into::into).unwrap_or_default()
    }

    /// Which families are cached and whether any fallback is active.
    pub fn status(&self) -> WasmStatus {
        self.registry.status().into()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
