//! WASM bindings for chinese-name-engine — the engine behind a browser
//! Web Worker. Messages use the JSON worker protocol.

use wasm_bindgen::prelude::*;

use chinese_name_engine::core::pipeline::NameEngine;
use chinese_name_engine::core::worker::handle_json;
use chinese_name_engine::schema::lexicon::Region;
use chinese_name_engine::schema::request::SelectionMode;

// ---------------------------------------------------------------------------
// NameWorkerBridge — the main exported struct
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct NameWorkerBridge {
    engine: NameEngine,
}

#[wasm_bindgen]
impl NameWorkerBridge {
    /// Create an engine over the bundled lexicon. The default region is
    /// loaded immediately; others load on first use or on `warm_up`.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<NameWorkerBridge, JsError> {
        let engine = NameEngine::builder()
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(NameWorkerBridge { engine })
    }

    /// Handle one protocol message.
    ///
    /// Expected JSON shapes:
    /// ```json
    /// { "type": "warm_up", "id": 1, "regions": ["TW", "HK"] }
    /// { "type": "generate", "id": 2, "request": { "gender": "female", "seed": "42" } }
    /// ```
    /// Replies are `{ "type": "results", "id", "results": [...] }` or
    /// `{ "type": "error", "id", "message" }`.
    pub fn handle(&mut self, message_json: &str) -> String {
        handle_json(&mut self.engine, message_json)
    }

    /// Drop memoised scores.
    pub fn reset_caches(&mut self) {
        self.engine.reset_caches();
    }

    /// Return JSON array of region codes.
    pub fn regions() -> String {
        let codes: Vec<&str> = Region::all().iter().map(|r| r.code()).collect();
        serde_json::to_string(&codes).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of selection modes.
    pub fn modes() -> String {
        let modes = [SelectionMode::Max, SelectionMode::Sample, SelectionMode::Beam];
        let labels: Vec<&str> = modes.iter().map(|m| m.label()).collect();
        serde_json::to_string(&labels).unwrap_or_else(|_| "[]".to_string())
    }
}
