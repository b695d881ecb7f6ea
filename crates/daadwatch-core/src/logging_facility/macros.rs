//! Canonical logging macros

/// Log the start of an operation
///
/// ```
/// # use daadwatch_core::log_op_start;
/// log_op_start!("fetch_catalog");
/// log_op_start!("fetch_catalog", page_size = 100);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        ::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::daadwatch_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        ::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::daadwatch_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use daadwatch_core::log_op_end;
/// log_op_end!("fetch_catalog", duration_ms = 42);
/// log_op_end!("fetch_catalog", duration_ms = 42, programmes = 1200);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        ::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::daadwatch_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        ::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::daadwatch_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// `$err` must be an [`ExError`](crate::errors::ExError) or a reference to one.
///
/// ```
/// # use daadwatch_core::log_op_error;
/// # use daadwatch_core::errors::{ExError, ExErrorKind};
/// let err = ExError::new(ExErrorKind::Fetch).with_message("HTTP 503");
/// log_op_error!("fetch_catalog", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: &$crate::errors::ExError = &$err;
        ::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::daadwatch_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: &$crate::errors::ExError = &$err;
        ::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::daadwatch_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = ex_err.message(),
            $($field)*
        );
    }};
}
