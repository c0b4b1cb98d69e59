use thiserror::Error;

/// Errors produced while declaring gauges or applying operations to them.
///
/// Every failure is detected and reported synchronously at the call boundary; nothing is retried
/// internally and no partial mutation occurs. These represent programmer error (wrong spec, wrong
/// arity, non-finite value) rather than transient conditions, so callers should treat them as
/// bugs at the call site rather than something to back off and retry.
#[derive(Debug, Error, PartialEq)]
pub enum GaugeError {
    /// A required declaration field was absent.
    #[error("required spec field `{0}` is missing")]
    MissingSpecKey(&'static str),

    /// The metric name does not match `[a-zA-Z_:][a-zA-Z0-9_:]*`.
    #[error("invalid metric name `{0}`")]
    InvalidMetricName(String),

    /// The help text is present but malformed (e.g. blank).
    #[error("invalid metric help for `{0}`")]
    InvalidMetricHelp(String),

    /// The label name list is malformed as a whole, e.g. contains duplicates.
    #[error("invalid label list: {0}")]
    InvalidLabelList(String),

    /// A label name does not match `[a-zA-Z_][a-zA-Z0-9_]*`, or is reserved (`__` prefix).
    #[error("invalid label name `{0}`")]
    InvalidMetricLabelName(String),

    /// The duration unit is unrecognized or disagrees with a unit suffix already encoded in the
    /// metric name.
    #[error("invalid duration unit for `{metric}`: {reason}")]
    InvalidDurationUnit {
        /// The metric being declared.
        metric: String,
        /// What was wrong with the unit.
        reason: String,
    },

    /// A `register` call collided with an existing descriptor of the same name.
    #[error("metric `{0}` already exists")]
    MetricAlreadyExists(String),

    /// An operation referenced a metric name with no descriptor.
    #[error("unknown metric `{0}`")]
    UnknownMetric(String),

    /// The number of label values did not match the declared label count.
    #[error("metric `{metric}` expects {expected} label value(s), got {actual}")]
    InvalidMetricArity {
        /// The metric being addressed.
        metric: String,
        /// Declared label count.
        expected: usize,
        /// Label values supplied by the caller.
        actual: usize,
    },

    /// A value or delta was not a finite number.
    #[error("value must be a finite number, got `{0}`")]
    InvalidValue(f64),
}
