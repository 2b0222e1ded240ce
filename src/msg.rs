// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Canonical error and log strings shared by every resource builder.

/// Error for a builder whose definition was never set up.
pub fn undefined_crd_object_err_string(kind: &str) -> String {
    format!("can not redefine the undefined {}", kind)
}

pub fn name_empty(kind: &str) -> String {
    format!("{} 'name' cannot be empty", kind)
}

pub fn namespace_empty(kind: &str) -> String {
    format!("{} 'nsname' cannot be empty", kind)
}

pub fn does_not_exist(kind: &str, name: &str) -> String {
    format!("{} object {} does not exist", kind, name)
}

/// Log line emitted when an update fails and the caller did not ask for force.
pub fn fail_to_update_notification(kind: &str, name: &str, namespace: Option<&str>) -> String {
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => format!(
            "Failed to update the {} object {} in namespace {}. Note: Force flag set, executed delete/create methods instead",
            kind, name, ns
        ),
        None => format!(
            "Failed to update the {} object {}. Note: Force flag set, executed delete/create methods instead",
            kind, name
        ),
    }
}

pub fn fail_to_update_error(kind: &str, name: &str) -> String {
    format!("failed to update {} {}, option 'force' is disabled", kind, name)
}
