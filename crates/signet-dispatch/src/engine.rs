//! The dispatch engine: one item at a time, in submission order.
//!
//! Ordering and pacing rules:
//! - items are processed strictly sequentially, never in parallel;
//! - the event channel is checked before every item, and a closed channel
//!   aborts the run (at most the in-flight item still completes);
//! - each attempted address gets a dispatch log row immediately, success
//!   or not, so an aborted run still leaves an accurate trail;
//! - a short pause follows every item, and a longer one follows each
//!   streak of consecutive successes, which keeps the relay from rate
//!   limiting the whole batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use validator::ValidateEmail;

use signet_auth::RequestContext;
use signet_core::config::dispatch::DispatchConfig;
use signet_core::types::SignatureId;
use signet_database::repositories::{DispatchLogRepository, SignatureRepository};
use signet_entity::dispatch::{CreateDispatchLogEntry, DispatchStatus};
use signet_template::{SignatureRenderer, TemplateStore};

use crate::event::ProgressEvent;
use crate::transport::{Courier, Delivery};

/// Result of a dispatch run, as seen by the task that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Items handed to the relay.
    pub sent: i64,
    /// Items that failed validation, rendering, or delivery.
    pub failed: i64,
    /// Whether the run stopped early because the listener went away.
    pub aborted: bool,
}

/// Per-item result before it is turned into an event and a log row.
struct ItemReport {
    success: bool,
    message: String,
    audit: Option<CreateDispatchLogEntry>,
}

/// Sequential bulk-dispatch engine.
#[derive(Clone)]
pub struct DispatchEngine {
    signature_repo: Arc<SignatureRepository>,
    audit: Arc<DispatchLogRepository>,
    templates: Arc<TemplateStore>,
    renderer: SignatureRenderer,
    courier: Arc<dyn Courier>,
    config: DispatchConfig,
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine").finish()
    }
}

impl DispatchEngine {
    /// Create a new dispatch engine.
    pub fn new(
        signature_repo: Arc<SignatureRepository>,
        audit: Arc<DispatchLogRepository>,
        templates: Arc<TemplateStore>,
        renderer: SignatureRenderer,
        courier: Arc<dyn Courier>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            signature_repo,
            audit,
            templates,
            renderer,
            courier,
            config,
        }
    }

    /// Run one dispatch batch, reporting progress through `events`.
    ///
    /// The caller has already vetted the request (admin, non-empty, within
    /// the size limit). Per-item failures are events, not errors; the run
    /// itself cannot fail, only finish or abort.
    pub async fn run(
        &self,
        ctx: &RequestContext,
        item_ids: Vec<SignatureId>,
        events: mpsc::Sender<ProgressEvent>,
    ) -> DispatchOutcome {
        let total = item_ids.len() as i64;
        let mut sent = 0i64;
        let mut failed = 0i64;
        let mut streak = 0i64;

        info!(items = total, requested_by = %ctx.user_id, "Dispatch run started");

        for (index, signature_id) in item_ids.into_iter().enumerate() {
            let current = index as i64 + 1;

            if events.is_closed() {
                warn!(delivered = index, total, "Listener gone, aborting dispatch run");
                return DispatchOutcome {
                    sent,
                    failed,
                    aborted: true,
                };
            }

            let report = self.process_item(signature_id).await;

            if let Some(entry) = &report.audit {
                if let Err(e) = self.audit.record(entry).await {
                    warn!(signature_id = %signature_id, error = %e, "Failed to record dispatch log entry");
                }
            }

            let event = if report.success {
                sent += 1;
                streak += 1;
                ProgressEvent::success(report.message, current, total)
            } else {
                failed += 1;
                streak = 0;
                ProgressEvent::error(report.message, current, total)
            };

            if events.send(event).await.is_err() {
                warn!(delivered = current, total, "Listener gone, aborting dispatch run");
                return DispatchOutcome {
                    sent,
                    failed,
                    aborted: true,
                };
            }

            sleep(Duration::from_millis(self.config.per_item_delay_ms)).await;
            if self.config.burst_size > 0 && streak >= i64::from(self.config.burst_size) {
                debug!(streak, "Burst pause");
                sleep(Duration::from_secs(self.config.burst_pause_secs)).await;
                streak = 0;
            }
        }

        let summary = format!("Dispatch finished: {sent} sent, {failed} failed");
        let _ = events.send(ProgressEvent::finished(summary, total)).await;
        info!(sent, failed, total, "Dispatch run finished");

        DispatchOutcome {
            sent,
            failed,
            aborted: false,
        }
    }

    /// Handle one item end to end.
    ///
    /// An unresolvable id produces no log row: nothing addressable was
    /// attempted. Every later failure is tied to a recipient and logged.
    async fn process_item(&self, signature_id: SignatureId) -> ItemReport {
        let signature = match self.signature_repo.find_by_id(signature_id).await {
            Ok(Some(signature)) => signature,
            Ok(None) => {
                return ItemReport {
                    success: false,
                    message: format!("Signature {signature_id} not found"),
                    audit: None,
                };
            }
            Err(e) => {
                error!(signature_id = %signature_id, error = %e, "Signature lookup failed");
                return ItemReport {
                    success: false,
                    message: format!("Signature {signature_id} could not be loaded"),
                    audit: None,
                };
            }
        };

        if !signature.email.validate_email() {
            let message = format!("Invalid email address: {}", signature.email);
            return ItemReport {
                success: false,
                audit: Some(CreateDispatchLogEntry {
                    signature_id: Some(signature.id),
                    recipient: signature.email.clone(),
                    status: DispatchStatus::Error,
                    message: message.clone(),
                }),
                message,
            };
        }

        let template = match self.templates.load_strict(&signature.template).await {
            Ok(template) => template,
            Err(_) => {
                let message = format!("Template '{}' is missing", signature.template);
                return ItemReport {
                    success: false,
                    audit: Some(CreateDispatchLogEntry {
                        signature_id: Some(signature.id),
                        recipient: signature.email.clone(),
                        status: DispatchStatus::Error,
                        message: message.clone(),
                    }),
                    message,
                };
            }
        };

        let delivery = Delivery {
            recipient: signature.email.clone(),
            subject: format!("Email signature for {}", signature.name),
            html: self.renderer.render(&template, &signature),
            attachment_name: "signature.html".to_string(),
        };

        match self.courier.deliver(&delivery).await {
            Ok(()) => ItemReport {
                success: true,
                message: format!("Sent to {}", signature.email),
                audit: Some(CreateDispatchLogEntry {
                    signature_id: Some(signature.id),
                    recipient: signature.email.clone(),
                    status: DispatchStatus::Success,
                    message: format!("Dispatched to {}", signature.email),
                }),
            },
            Err(e) => {
                let message = format!("Delivery failed: {}", e.message);
                ItemReport {
                    success: false,
                    audit: Some(CreateDispatchLogEntry {
                        signature_id: Some(signature.id),
                        recipient: signature.email.clone(),
                        status: DispatchStatus::Error,
                        message: message.clone(),
                    }),
                    message,
                }
            }
        }
    }
}
