pub mod domain;
pub mod materialize;
pub mod ports;
pub mod schedule;
pub mod scoring;

pub use domain::{
    AuthSession, Classification, FrequencyRule, InstanceStatus, Member, MemberCredentials,
    MemberRef, MemberRole, Project, TaskInstance, TaskTemplate, WeekInstance, WeeklySummaryRow,
    WorkLog,
};
pub use materialize::Materializer;
pub use ports::{
    DatabaseService, InstanceDefaults, InstanceStore, NewTemplate, PortError, PortResult,
    PriceService, TemplateStore,
};
pub use schedule::{should_generate, Decision};
pub use scoring::{classify_week, points_for_instance, summarize_week, week_range};
