// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{kind_of, Builder, ManagedResource};
use crate::error::{BuilderError, Result};
use crate::types::Condition;

/// A kind whose status carries a list of operator conditions.
pub trait Conditioned {
    fn conditions(&self) -> &[Condition];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn missing_condition(condition_type: &str) -> String {
    format!("the {} condition not found exists", condition_type)
}

impl<K: ManagedResource + Conditioned> Builder<K> {
    /// Condition of the last observed object.
    pub fn get_condition(&self, condition_type: &str) -> Option<&Condition> {
        self.object
            .as_ref()?
            .conditions()
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    /// Poll until `condition_type` reports `status`.
    pub async fn wait_until_condition(
        &mut self,
        condition_type: &str,
        status: ConditionStatus,
        interval: Duration,
        timeout: Duration,
    ) -> Result<()> {
        self.poll_condition(condition_type, interval, timeout, |condition| match condition {
            None => Err(missing_condition(condition_type)),
            Some(c) if c.status == status.as_str() => Ok(()),
            Some(c) => Err(format!("the {} condition has status {}", condition_type, c.status)),
        })
        .await
    }

    pub async fn wait_until_condition_true(&mut self, condition_type: &str, timeout: Duration) -> Result<()> {
        let interval = self.settings().poll_interval();
        self.wait_until_condition(condition_type, ConditionStatus::True, interval, timeout)
            .await
    }

    /// Poll until `condition_type` carries `reason`, whatever its status.
    /// A condition without a reason counts as not found.
    pub async fn wait_until_condition_reason(
        &mut self,
        condition_type: &str,
        reason: &str,
        interval: Duration,
        timeout: Duration,
    ) -> Result<()> {
        self.poll_condition(condition_type, interval, timeout, |condition| {
            match condition.and_then(|c| c.reason.as_deref()).filter(|r| !r.is_empty()) {
                None => Err(missing_condition(condition_type)),
                Some(current) if current == reason => Ok(()),
                Some(current) => Err(format!("the {} condition has reason {}", condition_type, current)),
            }
        })
        .await
    }

    /// Re-read the object every `interval` until `check` accepts the
    /// condition or `timeout` elapses. The first read happens immediately.
    /// Read failures while polling are retried.
    #[instrument(skip(self, check), fields(kind = %kind_of::<K>(), name = %self.name()))]
    pub(crate) async fn poll_condition<F>(
        &mut self,
        condition_type: &str,
        interval: Duration,
        timeout: Duration,
        check: F,
    ) -> Result<()>
    where
        F: Fn(Option<&Condition>) -> std::result::Result<(), String>,
    {
        self.validate()?;

        let kind = kind_of::<K>();
        if condition_type.is_empty() {
            return Err(BuilderError::InvalidInput(format!(
                "{} conditionType cannot be empty",
                kind
            )));
        }

        if !self.exists().await {
            return Err(BuilderError::not_found(kind, self.name(), Some(self.namespace())));
        }

        let mut last_reason = missing_condition(condition_type);
        let polled = tokio::time::timeout(timeout, async {
            loop {
                match self.get().await {
                    Ok(object) => {
                        let outcome = check(
                            object
                                .conditions()
                                .iter()
                                .find(|c| c.condition_type == condition_type),
                        );
                        self.object = Some(object);
                        match outcome {
                            Ok(()) => return,
                            Err(reason) => last_reason = reason,
                        }
                    }
                    Err(e) => last_reason = e.to_string(),
                }

                debug!("Waiting for {} condition: {}", condition_type, last_reason);
                tokio::time::sleep(interval).await;
            }
        })
        .await;

        match polled {
            Ok(()) => Ok(()),
            Err(_) => Err(BuilderError::DeadlineExceeded { reason: last_reason }),
        }
    }
}
