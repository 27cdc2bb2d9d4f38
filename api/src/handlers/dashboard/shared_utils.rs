// Shared utilities for dashboard handlers

use axum::http::HeaderMap;
use tera::Context;

use crate::handlers::ErrorResponse;

const MONTH_NAMES: [&str; 12] = [
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juillet",
    "Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

/// Check if request is HTMX and setup context accordingly
/// Returns the template to render
pub fn setup_htmx_context(
    context: &mut Context,
    headers: &HeaderMap,
    content_template: &'static str,
    full_template: &'static str,
) -> &'static str {
    let is_htmx = headers.get("HX-Request").is_some();
    context.insert("is_htmx", &is_htmx);

    if is_htmx {
        content_template
    } else {
        full_template
    }
}

/// Convert template error to ErrorResponse
pub fn template_error(template_name: &str, e: impl std::fmt::Display) -> ErrorResponse {
    tracing::error!(error = %e, template = template_name, "Template rendering failed");
    ErrorResponse::new(
        "template_error",
        format!("Failed to render '{}': {}", template_name, e),
    )
}

/// French month name, empty for an invalid month
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// (previous, next) months as (month, year) pairs
pub fn adjacent_months(month: u32, year: i32) -> ((u32, i32), (u32, i32)) {
    let previous = if month == 1 { (12, year - 1) } else { (month - 1, year) };
    let next = if month == 12 { (1, year + 1) } else { (month + 1, year) };
    (previous, next)
}
