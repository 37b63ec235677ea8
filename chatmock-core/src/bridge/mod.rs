// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Application Bridge
//!
//! The cache only sees the chat application through [`ChatApp`]: three
//! observable fields, a render hook and the handful of mutating operations
//! whose effects must be persisted. The application registers itself with
//! the service; hosts that cannot do that may add [`AppLocator`] strategies
//! instead.

pub mod editing;
mod memory;
mod ready;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::model::{Dialog, Settings, User};

pub use memory::MemoryApp;
pub use ready::ReadySignal;

/// The live chat application.
///
/// Reads return `None` when the field cannot be read right now; callers then
/// leave persisted data untouched rather than overwrite it with nothing.
pub trait ChatApp {
    fn settings(&self) -> Option<Settings>;
    fn users(&self) -> Option<Vec<User>>;
    fn dialogs(&self) -> Option<Vec<Dialog>>;

    fn set_settings(&mut self, settings: Settings);
    fn set_users(&mut self, users: Vec<User>);
    fn set_dialogs(&mut self, dialogs: Vec<Dialog>);

    /// Flushes pending UI updates after programmatic field replacement.
    fn request_render(&mut self);

    fn add_dialog(&mut self, dialog: Dialog);
    fn delete_dialog(&mut self, index: usize);
    fn clean_dialogs(&mut self);
    /// Appends a new user with application defaults.
    fn add_user(&mut self);
    fn delete_user(&mut self, index: usize);
    fn claim_red_packet(&mut self, index: usize);
    fn claim_transfer(&mut self, index: usize);

    /// The user currently selected as message author.
    fn selected_user(&self) -> Option<User> {
        None
    }
}

/// Shared handle to the live application.
pub type AppHandle = Rc<RefCell<dyn ChatApp>>;

/// A strategy for finding an application that did not register itself.
pub trait AppLocator {
    fn name(&self) -> &str;
    fn locate(&self) -> Option<AppHandle>;
}

/// Asks the user to confirm a destructive action.
pub trait ConfirmPrompt {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Resolves the live application: the registered handle first, then the
/// cached result of an earlier lookup, then the locator strategies in order.
#[derive(Default)]
pub struct AppBridge {
    registered: Option<AppHandle>,
    cached: Option<AppHandle>,
    locators: Vec<Box<dyn AppLocator>>,
}

impl AppBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, app: AppHandle) {
        self.registered = Some(app);
        self.cached = None;
    }

    pub fn add_locator(&mut self, locator: Box<dyn AppLocator>) {
        self.locators.push(locator);
    }

    pub fn is_registered(&self) -> bool {
        self.registered.is_some()
    }

    /// Finds the application, caching a locator hit.
    pub fn locate(&mut self) -> Option<AppHandle> {
        if let Some(app) = &self.registered {
            return Some(Rc::clone(app));
        }
        if let Some(app) = &self.cached {
            return Some(Rc::clone(app));
        }
        self.probe()
    }

    /// Finds the application without trusting the cached lookup.
    pub fn locate_fresh(&mut self) -> Option<AppHandle> {
        if let Some(app) = &self.registered {
            return Some(Rc::clone(app));
        }
        self.cached = None;
        self.probe()
    }

    fn probe(&mut self) -> Option<AppHandle> {
        for locator in &self.locators {
            if let Some(app) = locator.locate() {
                debug!(locator = locator.name(), "application located");
                self.cached = Some(Rc::clone(&app));
                return Some(app);
            }
        }
        None
    }
}
