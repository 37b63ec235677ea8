// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Chatmock Web Bindings
//!
//! wasm-bindgen wrapper that runs the cache service inside the editor page.
//! The page forwards its lifecycle events, calls `tick` from a timer, and
//! receives status, toast and reload events through one callback.

use std::cell::RefCell;
use std::rc::Rc;

use chatmock_core::{
    AppHandle, CacheConfig, CacheEvent, CacheService, CallbackHandler, Clock, Dialog, Domain,
    NotificationKind,
};
use js_sys::{Function, JSON};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::Window;

mod app;
mod clock;
mod error;
mod store;

pub use app::JsApp;
pub use clock::BrowserClock;
pub use error::WebError;
pub use store::LocalStorageStore;

fn event_to_json(event: &CacheEvent) -> serde_json::Value {
    match event {
        CacheEvent::StatusChanged { text } => json!({ "type": "statusChanged", "text": text }),
        CacheEvent::NotificationShown { id, message, kind } => json!({
            "type": "notificationShown",
            "id": id,
            "message": message,
            "kind": kind,
        }),
        CacheEvent::NotificationDismissed { id } => {
            json!({ "type": "notificationDismissed", "id": id })
        }
        CacheEvent::NotificationContainerRemoved => {
            json!({ "type": "notificationContainerRemoved" })
        }
        CacheEvent::ReloadRequested => json!({ "type": "reloadRequested" }),
        CacheEvent::RecoveryApplied { source, domains } => json!({
            "type": "recoveryApplied",
            "source": source.as_str(),
            "domains": domains.iter().map(Domain::as_str).collect::<Vec<_>>(),
        }),
        CacheEvent::Saved { key } => json!({ "type": "saved", "key": key }),
        CacheEvent::SaveFailed { key, error } => {
            json!({ "type": "saveFailed", "key": key, "error": error })
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(WebError::from)?;
    JSON::parse(&text)
}

fn parse_domain(name: &str) -> Option<Domain> {
    Domain::ALL.into_iter().find(|d| d.as_str() == name)
}

fn parse_kind(kind: &str) -> NotificationKind {
    match kind {
        "success" => NotificationKind::Success,
        "error" => NotificationKind::Error,
        _ => NotificationKind::Info,
    }
}

/// The cache service bound to `window.localStorage`.
#[wasm_bindgen]
pub struct WebCache {
    service: CacheService,
    window: Window,
    listener: Rc<RefCell<Option<Function>>>,
}

#[wasm_bindgen]
impl WebCache {
    /// Opens the cache with default settings and arms startup recovery.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebCache, JsValue> {
        let window = web_sys::window().ok_or(WebError::NoWindow)?;
        let store = LocalStorageStore::new(&window)?;
        let clock: Rc<dyn Clock> = Rc::new(BrowserClock);
        let mut service = CacheService::new(store, clock, CacheConfig::default());

        let listener: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&listener);
        let reload_window = window.clone();
        service.add_event_handler(Rc::new(CallbackHandler::new(move |event: CacheEvent| {
            if event == CacheEvent::ReloadRequested {
                if let Err(e) = reload_window.location().reload() {
                    warn!(error = %error::describe(&e), "reload failed");
                }
            }
            let Some(callback) = sink.borrow().clone() else {
                return;
            };
            match to_js(&event_to_json(&event)) {
                Ok(payload) => {
                    if let Err(e) = callback.call1(&JsValue::NULL, &payload) {
                        warn!(error = %error::describe(&e), "event listener threw");
                    }
                }
                Err(e) => warn!(error = %error::describe(&e), "event not encodable"),
            }
        })));

        Ok(WebCache {
            service,
            window,
            listener,
        })
    }

    /// Sets the single event listener. Events are plain objects with a
    /// `type` field.
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&mut self, callback: Function) {
        *self.listener.borrow_mut() = Some(callback);
    }

    /// Registers the editor view-model and runs pending recovery.
    #[wasm_bindgen(js_name = registerApp)]
    pub fn register_app(&mut self, vm: JsValue) {
        let app: AppHandle = Rc::new(RefCell::new(JsApp::new(vm)));
        self.service.register_app(app);
    }

    /// Runs due tasks. Call from a short interval timer.
    pub fn tick(&mut self) -> u32 {
        self.service.tick() as u32
    }

    /// Epoch milliseconds of the next due task.
    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.service.next_deadline().map(|ms| ms as f64)
    }

    // === Lifecycle ===

    #[wasm_bindgen(js_name = onLoad)]
    pub fn on_load(&mut self) {
        self.service.on_load();
    }

    #[wasm_bindgen(js_name = onBeforeUnload)]
    pub fn on_before_unload(&mut self) {
        self.service.on_before_unload();
    }

    #[wasm_bindgen(js_name = onVisibilityChange)]
    pub fn on_visibility_change(&mut self, hidden: bool) {
        self.service.on_visibility_change(hidden);
    }

    /// Reports a change to `setting`, `users` or `dialogs`.
    #[wasm_bindgen(js_name = notifyChanged)]
    pub fn notify_changed(&mut self, domain: &str) -> Result<(), JsValue> {
        let domain = parse_domain(domain)
            .ok_or_else(|| WebError::Js(format!("unknown domain: {domain}")))?;
        self.service.notify_changed(domain);
        Ok(())
    }

    // === Saving and loading ===

    #[wasm_bindgen(js_name = saveAll)]
    pub fn save_all(&mut self) -> bool {
        self.service.save_all()
    }

    #[wasm_bindgen(js_name = manualSave)]
    pub fn manual_save(&mut self) -> bool {
        self.service.manual_save()
    }

    #[wasm_bindgen(js_name = manualLoad)]
    pub fn manual_load(&mut self) -> bool {
        self.service.manual_load()
    }

    #[wasm_bindgen(js_name = hasValidCacheData)]
    pub fn has_valid_cache_data(&self) -> bool {
        self.service.has_valid_cache_data()
    }

    // === Import / export ===

    #[wasm_bindgen(js_name = exportData)]
    pub fn export_data(&mut self) -> Result<String, JsValue> {
        Ok(self.service.export_data().map_err(WebError::from)?)
    }

    #[wasm_bindgen(js_name = exportFileName)]
    pub fn export_file_name(&self) -> String {
        self.service.export_file_name()
    }

    /// Imports an export document. Resolves to whether the data reached
    /// the editor right away.
    #[wasm_bindgen(js_name = importData)]
    pub fn import_data(&mut self, text: &str) -> Result<bool, JsValue> {
        let report = self.service.import_data(text).map_err(WebError::from)?;
        Ok(report.applied)
    }

    #[wasm_bindgen(js_name = clearAll)]
    pub fn clear_all(&mut self) -> bool {
        let window = self.window.clone();
        self.service
            .clear_all(&move |message: &str| confirm(&window, message))
    }

    #[wasm_bindgen(js_name = cacheStats)]
    pub fn cache_stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.service.cache_stats())
    }

    // === Backups ===

    #[wasm_bindgen(js_name = createBackup)]
    pub fn create_backup(&mut self) -> Option<String> {
        self.service.create_backup()
    }

    #[wasm_bindgen(js_name = restoreBackup)]
    pub fn restore_backup(&mut self, key: &str) -> bool {
        self.service.restore_backup(key)
    }

    /// Backup keys, newest first.
    #[wasm_bindgen(js_name = listBackups)]
    pub fn list_backups(&self) -> Vec<String> {
        self.service
            .list_backups()
            .into_iter()
            .map(|b| b.key)
            .collect()
    }

    // === Status and notifications ===

    #[wasm_bindgen(js_name = updateCacheStatus)]
    pub fn update_cache_status(&mut self, text: &str) -> bool {
        self.service.update_cache_status(text)
    }

    #[wasm_bindgen(js_name = statusText)]
    pub fn status_text(&self) -> String {
        self.service.status_text().to_string()
    }

    /// `kind` is `info`, `success` or `error`.
    #[wasm_bindgen(js_name = showNotification)]
    pub fn show_notification(&mut self, message: &str, kind: &str) -> f64 {
        self.service.show_notification(message, parse_kind(kind)) as f64
    }

    #[wasm_bindgen(js_name = dismissNotification)]
    pub fn dismiss_notification(&mut self, id: f64) -> bool {
        self.service.dismiss_notification(id as u64)
    }

    // === Editor operations ===

    /// Adds a dialog given as a JSON string.
    #[wasm_bindgen(js_name = addDialog)]
    pub fn add_dialog(&mut self, dialog: &str) -> Result<bool, JsValue> {
        let dialog: Dialog = serde_json::from_str(dialog).map_err(WebError::from)?;
        Ok(self.service.add_dialog(dialog))
    }

    #[wasm_bindgen(js_name = deleteDialog)]
    pub fn delete_dialog(&mut self, index: usize) -> bool {
        self.service.delete_dialog(index)
    }

    #[wasm_bindgen(js_name = cleanDialogs)]
    pub fn clean_dialogs(&mut self) -> bool {
        let window = self.window.clone();
        self.service
            .clean_dialogs(&move |message: &str| confirm(&window, message))
    }

    #[wasm_bindgen(js_name = addUser)]
    pub fn add_user(&mut self) -> bool {
        self.service.add_user()
    }

    #[wasm_bindgen(js_name = delUser)]
    pub fn delete_user(&mut self, index: usize) -> bool {
        self.service.delete_user(index)
    }

    #[wasm_bindgen(js_name = redpacketGet)]
    pub fn claim_red_packet(&mut self, index: usize) -> bool {
        self.service.claim_red_packet(index)
    }

    #[wasm_bindgen(js_name = transferGet)]
    pub fn claim_transfer(&mut self, index: usize) -> bool {
        self.service.claim_transfer(index)
    }

    #[wasm_bindgen(js_name = editDialog)]
    pub fn begin_edit(&mut self, index: usize) -> bool {
        self.service.begin_edit(index)
    }

    #[wasm_bindgen(js_name = saveEditDialog)]
    pub fn save_edit(&mut self, index: usize) -> bool {
        self.service.save_edit(index)
    }

    #[wasm_bindgen(js_name = cancelEditDialog)]
    pub fn cancel_edit(&mut self, index: usize) -> bool {
        self.service.cancel_edit(index)
    }

    #[wasm_bindgen(js_name = blockDialog)]
    pub fn block_dialog(&mut self, index: usize) -> bool {
        self.service.block_dialog(index)
    }

    #[wasm_bindgen(js_name = addImageDialogFromData)]
    pub fn add_image_dialog(&mut self, image_data: &str) -> bool {
        self.service.add_image_dialog(image_data)
    }

    #[wasm_bindgen(js_name = convertEmojiContent)]
    pub fn render_content(&self, content: &str) -> String {
        self.service.render_content(content)
    }
}

fn confirm(window: &Window, message: &str) -> bool {
    window.confirm_with_message(message).unwrap_or(false)
}
