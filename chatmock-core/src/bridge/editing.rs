// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Inline message editing and blocking.
//!
//! Each function mutates the live dialog list. Functions that return the
//! updated list expect the caller to persist it right away.

use crate::error::{CacheError, CacheResult};
use crate::model::{Dialog, BLOCKED_NOTICE};

use super::ChatApp;

fn with_dialog<R>(
    app: &mut dyn ChatApp,
    index: usize,
    f: impl FnOnce(&mut Vec<Dialog>) -> R,
) -> CacheResult<(R, Vec<Dialog>)> {
    let mut dialogs = app.dialogs().ok_or(CacheError::AppUnavailable)?;
    if index >= dialogs.len() {
        return Err(CacheError::IndexOutOfRange(index));
    }
    let result = f(&mut dialogs);
    app.set_dialogs(dialogs.clone());
    Ok((result, dialogs))
}

/// Enters edit mode with the current content as the draft.
pub fn begin_edit(app: &mut dyn ChatApp, index: usize) -> CacheResult<()> {
    with_dialog(app, index, |dialogs| {
        let dialog = &mut dialogs[index];
        dialog.edit_content = dialog.content.clone();
        dialog.is_editing = true;
    })?;
    Ok(())
}

/// Commits the draft and leaves edit mode.
pub fn save_edit(app: &mut dyn ChatApp, index: usize) -> CacheResult<Vec<Dialog>> {
    let (_, dialogs) = with_dialog(app, index, |dialogs| {
        let dialog = &mut dialogs[index];
        if let Some(draft) = dialog.edit_content.clone() {
            dialog.content = Some(draft);
        }
        dialog.is_editing = false;
    })?;
    Ok(dialogs)
}

/// Leaves edit mode keeping the original content.
pub fn cancel_edit(app: &mut dyn ChatApp, index: usize) -> CacheResult<()> {
    with_dialog(app, index, |dialogs| {
        dialogs[index].is_editing = false;
    })?;
    Ok(())
}

/// Marks a message as refused by the recipient and inserts the system
/// notice right after it.
pub fn block_dialog(app: &mut dyn ChatApp, index: usize, now_ms: u64) -> CacheResult<Vec<Dialog>> {
    let (_, dialogs) = with_dialog(app, index, |dialogs| {
        dialogs[index].is_blocked = true;
        dialogs.insert(
            index + 1,
            Dialog::notice(Dialog::time_id(now_ms), BLOCKED_NOTICE),
        );
    })?;
    Ok(dialogs)
}

/// Appends an image message authored by the selected user.
pub fn add_image_dialog(
    app: &mut dyn ChatApp,
    image_data: &str,
    now_ms: u64,
) -> CacheResult<Dialog> {
    let user = app.selected_user().ok_or(CacheError::NoSelectedUser)?;
    let dialog = Dialog::image(Dialog::time_id(now_ms), user.is_me, user.id, image_data);
    app.add_dialog(dialog.clone());
    Ok(dialog)
}
