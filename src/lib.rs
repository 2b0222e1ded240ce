// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod builder;
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod msg;
pub mod resources;
pub mod types;

pub use builder::wait::{ConditionStatus, Conditioned};
pub use builder::{Builder, ManagedResource};
pub use clients::Settings;
pub use error::{BuilderError, Result};
