//! The API endpoints URIs.
//!
//! Tests build paths for endpoints that take a parameter, e.g.,
//! '/categories/{id}', with `format_endpoint`.

/// The health check route.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/auth/logout";
/// The route for getting the current user.
pub const ME: &str = "/auth/me";
/// The route for getting the CSRF token of the caller's session.
pub const CSRF: &str = "/auth/csrf";
/// The route to list and create categories.
pub const CATEGORIES: &str = "/categories";
/// The route to update or delete a single category.
pub const CATEGORY: &str = "/categories/{id}";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to get, update or delete a single transaction.
pub const TRANSACTION: &str = "/transactions/{id}";
/// The route for the report on a single month.
pub const MONTH_REPORT: &str = "/reports/month";
/// The route for the report on a single year.
pub const YEAR_REPORT: &str = "/reports/year";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/categories/{id}', '{id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
#[cfg(test)]
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map_or(endpoint_path.len(), |end| param_start + end + 1);

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
