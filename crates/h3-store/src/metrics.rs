//! Guest tracking metrics.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Tracked guest views.
    pub const VIEWS_TOTAL: &str = "h3_guest_views_total";

    /// Views answered with a login prompt.
    pub const LOGIN_PROMPTS_TOTAL: &str = "h3_guest_login_prompts_total";

    /// Views past the limit.
    pub const LIMIT_REACHED_TOTAL: &str = "h3_guest_limit_reached_total";

    /// Store failures by operation and whether the tracker failed open.
    pub const STORE_ERRORS_TOTAL: &str = "h3_guest_store_errors_total";
}

pub fn record_view(new_session: bool, show_login_prompt: bool, limit_reached: bool) {
    counter!(names::VIEWS_TOTAL, "new_session" => new_session.to_string()).increment(1);
    if show_login_prompt {
        counter!(names::LOGIN_PROMPTS_TOTAL).increment(1);
    }
    if limit_reached {
        counter!(names::LIMIT_REACHED_TOTAL).increment(1);
    }
}

pub fn record_store_error(operation: &str, failed_open: bool) {
    counter!(
        names::STORE_ERRORS_TOTAL,
        "operation" => operation.to_string(),
        "failed_open" => failed_open.to_string()
    )
    .increment(1);
}
