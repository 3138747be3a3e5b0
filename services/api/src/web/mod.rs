pub mod auth;
pub mod chores;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod worklog;

// Re-export the handlers the binary needs to build the web server router.
pub use chores::{
    log_extra_handler, materialize_handler, set_status_handler, weekly_summary_handler,
};
pub use middleware::require_auth;
pub use rest::{
    create_child_handler, create_template_handler, list_members_handler, list_templates_handler,
    update_template_handler,
};
pub use worklog::{
    approve_work_log_handler, create_project_handler, create_work_log_handler,
    list_member_work_logs_handler, list_projects_handler, savings_handler,
};
