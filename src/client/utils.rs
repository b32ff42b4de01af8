//! Status code helpers.

/// True for 2xx statuses.
///
/// # Examples
///
/// ```
/// use storage_rest_core::client::is_success_status;
///
/// assert!(is_success_status(204));
/// assert!(!is_success_status(301));
/// ```
#[inline]
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

/// True for statuses meaning the session token is missing or rejected.
#[inline]
pub fn is_access_denied_status(status: u16) -> bool {
    status == 401 || status == 403
}
