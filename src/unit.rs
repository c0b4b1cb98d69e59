/// Time units for duration-valued gauges.
///
/// Gauges that measure durations always store their value in base seconds; a descriptor can carry
/// a `DurationUnit` so that reads and collected samples are scaled to the unit the exporter
/// expects. The scale is a pure linear factor and therefore invertible.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DurationUnit {
    /// Seconds.
    ///
    /// One second is equal to 1000 milliseconds.
    Seconds,
    /// Milliseconds.
    ///
    /// One millisecond is equal to 1000 microseconds.
    Milliseconds,
    /// Microseconds.
    ///
    /// One microsecond is equal to 1000 nanoseconds.
    Microseconds,
    /// Nanoseconds.
    Nanoseconds,
}

impl DurationUnit {
    /// Gets the string form of this `DurationUnit`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Seconds => "seconds",
            DurationUnit::Milliseconds => "milliseconds",
            DurationUnit::Microseconds => "microseconds",
            DurationUnit::Nanoseconds => "nanoseconds",
        }
    }

    /// Gets the canonical string label for the given unit.
    ///
    /// For example, the canonical label for `Seconds` would be `s`, while for `Nanoseconds`, it
    /// would be `ns`.
    pub fn as_canonical_label(&self) -> &'static str {
        match self {
            DurationUnit::Seconds => "s",
            DurationUnit::Milliseconds => "ms",
            DurationUnit::Microseconds => "μs",
            DurationUnit::Nanoseconds => "ns",
        }
    }

    /// Converts the string representation of a unit back into `DurationUnit` if possible.
    ///
    /// The value passed here should match the output of [`DurationUnit::as_str`].
    pub fn from_string(s: &str) -> Option<DurationUnit> {
        match s {
            "seconds" => Some(DurationUnit::Seconds),
            "milliseconds" => Some(DurationUnit::Milliseconds),
            "microseconds" => Some(DurationUnit::Microseconds),
            "nanoseconds" => Some(DurationUnit::Nanoseconds),
            _ => None,
        }
    }

    /// Detects a unit already encoded in a metric name as a trailing suffix.
    ///
    /// Metric naming conventions encode the unit at the end of the name, e.g.
    /// `request_duration_seconds`. When a declaration also carries an explicit unit, the two must
    /// agree.
    pub fn from_name_suffix(name: &str) -> Option<DurationUnit> {
        let suffix = name.rsplit('_').next()?;
        DurationUnit::from_string(suffix)
    }

    /// Scales a base-seconds value to this unit.
    pub(crate) fn from_seconds(&self, value: f64) -> f64 {
        match self {
            DurationUnit::Seconds => value,
            DurationUnit::Milliseconds => value * 1e3,
            DurationUnit::Microseconds => value * 1e6,
            DurationUnit::Nanoseconds => value * 1e9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DurationUnit;

    #[test]
    fn string_form_round_trips() {
        for unit in [
            DurationUnit::Seconds,
            DurationUnit::Milliseconds,
            DurationUnit::Microseconds,
            DurationUnit::Nanoseconds,
        ] {
            assert_eq!(DurationUnit::from_string(unit.as_str()), Some(unit));
        }
        assert_eq!(DurationUnit::from_string("fortnights"), None);
    }

    #[test]
    fn name_suffix_detection() {
        assert_eq!(
            DurationUnit::from_name_suffix("request_duration_seconds"),
            Some(DurationUnit::Seconds)
        );
        assert_eq!(
            DurationUnit::from_name_suffix("gc_pause_milliseconds"),
            Some(DurationUnit::Milliseconds)
        );
        assert_eq!(DurationUnit::from_name_suffix("queue_size"), None);
        assert_eq!(DurationUnit::from_name_suffix("seconds"), Some(DurationUnit::Seconds));
    }

    #[test]
    fn scaling_is_linear() {
        assert_eq!(DurationUnit::Seconds.from_seconds(1.5), 1.5);
        assert_eq!(DurationUnit::Milliseconds.from_seconds(1.5), 1500.0);
        assert_eq!(DurationUnit::Microseconds.from_seconds(0.25), 250_000.0);
        assert_eq!(DurationUnit::Nanoseconds.from_seconds(2.0), 2e9);
    }
}
