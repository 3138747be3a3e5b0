use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use uuid::Uuid;

use choreboard_core::domain::{
    FrequencyRule, InstanceStatus, MemberRef, TaskInstance, TaskTemplate, WeekInstance,
};
use choreboard_core::materialize::Materializer;
use choreboard_core::ports::{
    InstanceDefaults, InstanceStore, NewTemplate, PortError, PortResult, TemplateStore,
};

//=========================================================================================
// In-memory fakes
//=========================================================================================

struct InMemoryTemplates {
    templates: Mutex<Vec<TaskTemplate>>,
}

impl InMemoryTemplates {
    fn new(templates: Vec<TaskTemplate>) -> Self {
        Self {
            templates: Mutex::new(templates),
        }
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplates {
    async fn list_active(&self) -> PortResult<Vec<TaskTemplate>> {
        let templates = self.templates.lock().unwrap();
        Ok(templates.iter().filter(|t| t.active).cloned().collect())
    }

    async fn list_all(&self) -> PortResult<Vec<TaskTemplate>> {
        Ok(self.templates.lock().unwrap().clone())
    }

    async fn create(&self, new: NewTemplate) -> PortResult<TaskTemplate> {
        let template = TaskTemplate {
            id: Uuid::new_v4(),
            title: new.title,
            rule: FrequencyRule::from_parts(
                &new.frequency_type,
                new.day_of_week,
                new.week_of_month,
                new.day_of_month,
                new.semiannual_months.as_deref(),
                new.conditional_after_time.as_deref(),
            ),
            assigned_to: new.assigned_to,
            points_base: new.points_base,
            active: true,
        };
        self.templates.lock().unwrap().push(template.clone());
        Ok(template)
    }

    async fn set_active(&self, template_id: Uuid, active: bool) -> PortResult<()> {
        let mut templates = self.templates.lock().unwrap();
        let template = templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| PortError::NotFound(template_id.to_string()))?;
        template.active = active;
        Ok(())
    }
}

#[derive(Default)]
struct InMemoryInstances {
    rows: Mutex<HashMap<(Uuid, NaiveDate), TaskInstance>>,
}

impl InMemoryInstances {
    fn get(&self, template_id: Uuid, task_date: NaiveDate) -> Option<TaskInstance> {
        self.rows
            .lock()
            .unwrap()
            .get(&(template_id, task_date))
            .cloned()
    }

    fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstances {
    async fn upsert_if_absent(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
        defaults: &InstanceDefaults,
    ) -> PortResult<()> {
        let mut rows = self.rows.lock().unwrap();
        rows.entry((template_id, task_date))
            .or_insert_with(|| TaskInstance {
                id: Uuid::new_v4(),
                template_id,
                task_date,
                assigned_to: defaults.assigned_to,
                status: InstanceStatus::Pending,
                done_without_reminder: false,
                complaint_logged: false,
                is_extra: false,
                available_after: defaults.available_after.clone(),
            });
        Ok(())
    }

    async fn list_range(&self, from: NaiveDate, to: NaiveDate) -> PortResult<Vec<WeekInstance>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .values()
            .filter(|i| i.task_date >= from && i.task_date <= to)
            .map(|i| WeekInstance {
                instance: i.clone(),
                points_base: Some(1),
                member: MemberRef {
                    id: i.assigned_to,
                    display_name: "kid".to_string(),
                },
            })
            .collect())
    }

    async fn set_status(
        &self,
        instance_id: Uuid,
        status: InstanceStatus,
        done_without_reminder: bool,
        complaint_logged: bool,
    ) -> PortResult<TaskInstance> {
        let mut rows = self.rows.lock().unwrap();
        let instance = rows
            .values_mut()
            .find(|i| i.id == instance_id)
            .ok_or_else(|| PortError::NotFound(instance_id.to_string()))?;
        instance.status = status;
        instance.done_without_reminder = done_without_reminder;
        instance.complaint_logged = complaint_logged;
        Ok(instance.clone())
    }

    async fn insert_extra(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
    ) -> PortResult<TaskInstance> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&(template_id, task_date)) {
            return Err(PortError::Conflict(format!(
                "instance already exists for {template_id} on {task_date}"
            )));
        }
        let instance = TaskInstance {
            id: Uuid::new_v4(),
            template_id,
            task_date,
            assigned_to: Uuid::new_v4(),
            status: InstanceStatus::Pending,
            done_without_reminder: false,
            complaint_logged: false,
            is_extra: true,
            available_after: None,
        };
        rows.insert((template_id, task_date), instance.clone());
        Ok(instance)
    }
}

/// Wraps an instance store and fails the first upsert for one template,
/// to exercise retry-after-partial-failure.
struct FailOnce {
    inner: Arc<InMemoryInstances>,
    fail_for: Uuid,
    tripped: AtomicBool,
}

#[async_trait]
impl InstanceStore for FailOnce {
    async fn upsert_if_absent(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
        defaults: &InstanceDefaults,
    ) -> PortResult<()> {
        if template_id == self.fail_for && !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(PortError::Unexpected("store unavailable".to_string()));
        }
        self.inner
            .upsert_if_absent(template_id, task_date, defaults)
            .await
    }

    async fn list_range(&self, from: NaiveDate, to: NaiveDate) -> PortResult<Vec<WeekInstance>> {
        self.inner.list_range(from, to).await
    }

    async fn set_status(
        &self,
        instance_id: Uuid,
        status: InstanceStatus,
        done_without_reminder: bool,
        complaint_logged: bool,
    ) -> PortResult<TaskInstance> {
        self.inner
            .set_status(instance_id, status, done_without_reminder, complaint_logged)
            .await
    }

    async fn insert_extra(
        &self,
        template_id: Uuid,
        task_date: NaiveDate,
    ) -> PortResult<TaskInstance> {
        self.inner.insert_extra(template_id, task_date).await
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn template(title: &str, rule: Option<FrequencyRule>) -> TaskTemplate {
    TaskTemplate {
        id: Uuid::new_v4(),
        title: title.to_string(),
        rule,
        assigned_to: Uuid::new_v4(),
        points_base: 1,
        active: true,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn materializes_only_generating_templates() {
    let daily = template("dishes", Some(FrequencyRule::Daily));
    // 2025-06-02 is a Monday; a Thursday chore must not generate.
    let thursday_only = template(
        "trash",
        Some(FrequencyRule::Weekly {
            weekday: Weekday::Thu,
        }),
    );
    let templates = Arc::new(InMemoryTemplates::new(vec![
        daily.clone(),
        thursday_only.clone(),
    ]));
    let instances = Arc::new(InMemoryInstances::default());
    let materializer = Materializer::new(templates, instances.clone());

    let monday = date(2025, 6, 2);
    materializer.ensure_instances_for_date(monday).await.unwrap();

    assert_eq!(instances.len(), 1);
    let created = instances.get(daily.id, monday).unwrap();
    assert_eq!(created.status, InstanceStatus::Pending);
    assert_eq!(created.assigned_to, daily.assigned_to);
    assert!(instances.get(thursday_only.id, monday).is_none());
}

#[tokio::test]
async fn second_run_never_touches_existing_instances() {
    let daily = template("dishes", Some(FrequencyRule::Daily));
    let templates = Arc::new(InMemoryTemplates::new(vec![daily.clone()]));
    let instances = Arc::new(InMemoryInstances::default());
    let materializer = Materializer::new(templates, instances.clone());

    let day = date(2025, 6, 2);
    materializer.ensure_instances_for_date(day).await.unwrap();
    let created = instances.get(daily.id, day).unwrap();

    // The chore gets recorded as done, then a later run materializes again.
    instances
        .set_status(created.id, InstanceStatus::Done, true, false)
        .await
        .unwrap();
    materializer.ensure_instances_for_date(day).await.unwrap();

    assert_eq!(instances.len(), 1);
    let after = instances.get(daily.id, day).unwrap();
    assert_eq!(after.id, created.id);
    assert_eq!(after.status, InstanceStatus::Done);
    assert!(after.done_without_reminder);
}

#[tokio::test]
async fn inactive_and_ruleless_templates_are_skipped() {
    let mut inactive = template("mow lawn", Some(FrequencyRule::Daily));
    inactive.active = false;
    let misconfigured = template("water plants", None);
    let templates = Arc::new(InMemoryTemplates::new(vec![inactive, misconfigured]));
    let instances = Arc::new(InMemoryInstances::default());
    let materializer = Materializer::new(templates, instances.clone());

    materializer
        .ensure_instances_for_date(date(2025, 6, 2))
        .await
        .unwrap();

    assert_eq!(instances.len(), 0);
}

#[tokio::test]
async fn conditional_time_is_copied_onto_the_instance() {
    let homework = template(
        "homework",
        Some(FrequencyRule::Conditional {
            weekday: Weekday::Mon,
            available_after: Some("16:00".to_string()),
        }),
    );
    let templates = Arc::new(InMemoryTemplates::new(vec![homework.clone()]));
    let instances = Arc::new(InMemoryInstances::default());
    let materializer = Materializer::new(templates, instances.clone());

    let monday = date(2025, 6, 2);
    materializer.ensure_instances_for_date(monday).await.unwrap();

    let created = instances.get(homework.id, monday).unwrap();
    assert_eq!(created.available_after.as_deref(), Some("16:00"));
}

#[tokio::test]
async fn retry_after_partial_failure_completes_the_date() {
    let first = template("dishes", Some(FrequencyRule::Daily));
    let second = template("laundry", Some(FrequencyRule::Daily));
    let templates = Arc::new(InMemoryTemplates::new(vec![first.clone(), second.clone()]));
    let inner = Arc::new(InMemoryInstances::default());
    let flaky = Arc::new(FailOnce {
        inner: inner.clone(),
        fail_for: second.id,
        tripped: AtomicBool::new(false),
    });
    let materializer = Materializer::new(templates, flaky);

    let day = date(2025, 6, 2);
    let err = materializer.ensure_instances_for_date(day).await;
    assert!(err.is_err());
    // The template processed before the failure is already materialized.
    assert!(inner.get(first.id, day).is_some());
    assert!(inner.get(second.id, day).is_none());

    // Retrying the whole call completes the rest without duplicating.
    materializer.ensure_instances_for_date(day).await.unwrap();
    assert_eq!(inner.len(), 2);
}
