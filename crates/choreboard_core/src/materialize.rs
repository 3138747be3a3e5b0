//! crates/choreboard_core/src/materialize.rs
//!
//! The instance materializer: ensures that for a given date, exactly one
//! instance row exists per active template whose rule generates that day.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::ports::{InstanceDefaults, InstanceStore, PortResult, TemplateStore};
use crate::schedule::should_generate;

/// Walks the active templates for one date and upserts the instances the
/// schedule predicate calls for.
pub struct Materializer {
    templates: Arc<dyn TemplateStore>,
    instances: Arc<dyn InstanceStore>,
}

impl Materializer {
    pub fn new(templates: Arc<dyn TemplateStore>, instances: Arc<dyn InstanceStore>) -> Self {
        Self {
            templates,
            instances,
        }
    }

    /// Ensures instances exist for `date`.
    ///
    /// Each generating template is upserted keyed on `(template_id, date)`:
    /// inserted as `PENDING` if absent, untouched if already present. Not
    /// transactional across templates — a store failure partway through
    /// leaves earlier templates materialized, and re-invoking for the same
    /// date safely completes the rest. Non-generating templates are skipped
    /// outright; instances that already exist from an earlier run are never
    /// reconciled against template changes.
    pub async fn ensure_instances_for_date(&self, date: NaiveDate) -> PortResult<()> {
        let templates = self.templates.list_active().await?;

        for template in &templates {
            let decision = should_generate(template, date);
            if !decision.generate {
                continue;
            }

            let defaults = InstanceDefaults {
                assigned_to: template.assigned_to,
                available_after: decision.available_after,
            };
            self.instances
                .upsert_if_absent(template.id, date, &defaults)
                .await?;
        }

        Ok(())
    }
}
