use std::sync::Arc;

use crate::common::SharedString;
use crate::error::GaugeError;
use crate::unit::DurationUnit;

/// Declaration input for a gauge.
///
/// A spec is the one mutable, caller-assembled piece of the declaration path: binding layers fill
/// in whichever fields their call site provides, then hand the spec to
/// [`GaugeStore::declare`][crate::GaugeStore::declare] or
/// [`GaugeStore::register`][crate::GaugeStore::register], which validates it as a whole.
/// `name` and `help` are required; everything else is optional.
#[derive(Clone, Debug, Default)]
pub struct GaugeSpec {
    name: Option<SharedString>,
    help: Option<SharedString>,
    label_names: Vec<SharedString>,
    duration_unit: Option<DurationUnit>,
}

impl GaugeSpec {
    /// Creates a spec with the required fields filled in.
    pub fn new<N, H>(name: N, help: H) -> Self
    where
        N: Into<SharedString>,
        H: Into<SharedString>,
    {
        Self {
            name: Some(name.into()),
            help: Some(help.into()),
            label_names: Vec::new(),
            duration_unit: None,
        }
    }

    /// Sets the ordered list of label names for this gauge.
    pub fn with_labels<I, L>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<SharedString>,
    {
        self.label_names = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the duration unit for this gauge.
    ///
    /// Duration-valued gauges store base seconds internally; reads and collected samples are
    /// scaled to this unit.
    pub fn with_duration_unit(mut self, unit: DurationUnit) -> Self {
        self.duration_unit = Some(unit);
        self
    }

    /// Validates this spec and builds the immutable descriptor from it.
    ///
    /// Checks run in a fixed order so a spec with multiple problems reports deterministically:
    /// name presence, name grammar, help presence and shape, label list, per-label grammar, and
    /// finally duration-unit agreement with any unit suffix already encoded in the name.
    pub(crate) fn into_descriptor(self) -> Result<GaugeDescriptor, GaugeError> {
        let name = self.name.filter(|n| !n.is_empty()).ok_or(GaugeError::MissingSpecKey("name"))?;
        if !valid_metric_name(&name) {
            return Err(GaugeError::InvalidMetricName(name.into_owned()));
        }

        let help = self.help.ok_or(GaugeError::MissingSpecKey("help"))?;
        if help.trim().is_empty() {
            return Err(GaugeError::InvalidMetricHelp(name.into_owned()));
        }

        for (idx, label) in self.label_names.iter().enumerate() {
            if !valid_label_name(label) {
                return Err(GaugeError::InvalidMetricLabelName(label.clone().into_owned()));
            }
            if self.label_names[..idx].contains(label) {
                return Err(GaugeError::InvalidLabelList(format!(
                    "duplicate label name `{label}`"
                )));
            }
        }

        if let Some(unit) = self.duration_unit {
            if let Some(suffix_unit) = DurationUnit::from_name_suffix(&name) {
                if suffix_unit != unit {
                    return Err(GaugeError::InvalidDurationUnit {
                        metric: name.into_owned(),
                        reason: format!(
                            "name encodes `{}` but spec says `{}`",
                            suffix_unit.as_str(),
                            unit.as_str()
                        ),
                    });
                }
            }
        }

        Ok(GaugeDescriptor {
            name: Arc::from(name.as_ref()),
            help,
            label_names: self.label_names,
            duration_unit: self.duration_unit,
        })
    }
}

/// The immutable declaration of a gauge.
///
/// Built once from a validated [`GaugeSpec`] and shared as `Arc<GaugeDescriptor>` between the
/// registry, live series keys, and collected samples. The name is interned as an `Arc<str>` at
/// declaration time so series keys clone a pointer rather than the string.
#[derive(Clone, Debug, PartialEq)]
pub struct GaugeDescriptor {
    name: Arc<str>,
    help: SharedString,
    label_names: Vec<SharedString>,
    duration_unit: Option<DurationUnit>,
}

impl GaugeDescriptor {
    /// Name of this gauge.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interned name, shared with series keys.
    pub(crate) fn interned_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Help text of this gauge.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// The ordered label names every series of this gauge must supply values for.
    pub fn label_names(&self) -> &[SharedString] {
        &self.label_names
    }

    /// The duration unit applied when reading this gauge, if any.
    pub fn duration_unit(&self) -> Option<DurationUnit> {
        self.duration_unit
    }

    /// Scales a stored base-seconds value to this gauge's unit, if one is configured.
    pub(crate) fn scale(&self, value: f64) -> f64 {
        match self.duration_unit {
            Some(unit) => unit.from_seconds(value),
            None => value,
        }
    }
}

/// Checks a metric name against `[a-zA-Z_:][a-zA-Z0-9_:]*`.
fn valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// Checks a label name against `[a-zA-Z_][a-zA-Z0-9_]*`, rejecting the reserved `__` prefix.
fn valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::{GaugeSpec, valid_label_name, valid_metric_name};
    use crate::error::GaugeError;
    use crate::unit::DurationUnit;

    #[test]
    fn metric_name_grammar() {
        assert!(valid_metric_name("queue_size"));
        assert!(valid_metric_name(":subsystem:depth"));
        assert!(valid_metric_name("_hidden9"));
        assert!(!valid_metric_name("9lives"));
        assert!(!valid_metric_name("has-dash"));
        assert!(!valid_metric_name(""));
    }

    #[test]
    fn label_name_grammar() {
        assert!(valid_label_name("pool"));
        assert!(valid_label_name("_internal"));
        assert!(!valid_label_name("__reserved"));
        assert!(!valid_label_name("1st"));
        assert!(!valid_label_name("with:colon"));
    }

    #[test]
    fn missing_fields_are_distinct_from_malformed_ones() {
        let err = GaugeSpec::default().into_descriptor().unwrap_err();
        assert_eq!(err, GaugeError::MissingSpecKey("name"));

        let mut spec = GaugeSpec::default();
        spec.name = Some("queue_size".into());
        let err = spec.into_descriptor().unwrap_err();
        assert_eq!(err, GaugeError::MissingSpecKey("help"));

        let err = GaugeSpec::new("queue_size", "  ").into_descriptor().unwrap_err();
        assert_eq!(err, GaugeError::InvalidMetricHelp("queue_size".to_string()));
    }

    #[test]
    fn label_list_validation() {
        let err = GaugeSpec::new("conns", "open connections")
            .with_labels(["pool", "__shard"])
            .into_descriptor()
            .unwrap_err();
        assert_eq!(err, GaugeError::InvalidMetricLabelName("__shard".to_string()));

        let err = GaugeSpec::new("conns", "open connections")
            .with_labels(["pool", "pool"])
            .into_descriptor()
            .unwrap_err();
        assert!(matches!(err, GaugeError::InvalidLabelList(_)));
    }

    #[test]
    fn duration_unit_must_agree_with_name_suffix() {
        let err = GaugeSpec::new("gc_pause_seconds", "last GC pause")
            .with_duration_unit(DurationUnit::Milliseconds)
            .into_descriptor()
            .unwrap_err();
        assert!(matches!(err, GaugeError::InvalidDurationUnit { .. }));

        // Agreement and no-suffix cases are both fine.
        assert!(GaugeSpec::new("gc_pause_seconds", "last GC pause")
            .with_duration_unit(DurationUnit::Seconds)
            .into_descriptor()
            .is_ok());
        assert!(GaugeSpec::new("gc_pause", "last GC pause")
            .with_duration_unit(DurationUnit::Milliseconds)
            .into_descriptor()
            .is_ok());
    }

    #[test]
    fn descriptor_carries_interned_name_and_metadata() {
        let desc = GaugeSpec::new("pool_checked_out", "connections checked out")
            .with_labels(["pool"])
            .into_descriptor()
            .unwrap();
        assert_eq!(desc.name(), "pool_checked_out");
        assert_eq!(desc.help(), "connections checked out");
        assert_eq!(desc.label_names(), ["pool"]);
        assert_eq!(desc.duration_unit(), None);
    }
}
