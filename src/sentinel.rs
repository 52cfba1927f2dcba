/// Classification and display of device sentinel values
///
/// The device reports sensor states in-band: a field that would normally carry
/// a measurement instead holds a reserved code meaning "sensor off" or
/// "sensor heating up". The same code appears in several scalings depending on
/// how the field was decoded (raw 16-bit, divided by 10, signed 15-bit, ...).
/// `FieldKind` names that decoding and selects the extra sentinels to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Generic,
    Temperature,
    Humidity,
    Pressure,
}

/// Result of classifying a decoded value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorState {
    Off,
    Heating,
    Value(f64),
}

const OFF: [f64; 3] = [65535.0, 6553.5, 32767.0];
const HEATING: [f64; 3] = [65534.0, 6553.4, 32766.0];
// Signed 16-bit sentinels after the 1/100 temperature scaling
const TEMPERATURE_OFF: [f64; 2] = [327.67, 327.66];
const HUMIDITY_OFF: f64 = -1.0;
// u32::MAX after the 1/10 pressure scaling
const PRESSURE_OFF: f64 = 429_496_729.5;

/// Classify a decoded value.
///
/// The generic Off/Heating codes are checked before the kind-specific ones,
/// so a temperature equal to 65535.0 is `Off` regardless of its kind.
pub fn classify(value: f64, kind: FieldKind) -> SensorState {
    // Exact comparisons: decoders produce these by correctly rounded division
    if OFF.contains(&value) {
        return SensorState::Off;
    }
    if HEATING.contains(&value) {
        return SensorState::Heating;
    }

    let off = match kind {
        FieldKind::Generic => false,
        FieldKind::Temperature => TEMPERATURE_OFF.contains(&value),
        FieldKind::Humidity => value == HUMIDITY_OFF,
        FieldKind::Pressure => value == PRESSURE_OFF,
    };

    if off {
        SensorState::Off
    } else {
        SensorState::Value(value)
    }
}

/// Format a possibly absent value for display or export
///
/// Absent values render as an empty string. Numbers use the shortest
/// representation that round-trips the `f64`, so integral values carry no
/// decimal point (`-10`, `45`) and fractions are never padded (`1013.2`).
pub fn format_value(value: Option<f64>, kind: FieldKind) -> String {
    match value.map(|v| classify(v, kind)) {
        None => String::new(),
        Some(SensorState::Off) => "Off".to_string(),
        Some(SensorState::Heating) => "Heating".to_string(),
        Some(SensorState::Value(v)) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_is_empty() {
        assert_eq!(format_value(None, FieldKind::Generic), "");
        assert_eq!(format_value(None, FieldKind::Temperature), "");
    }

    #[test]
    fn generic_sentinels() {
        for off in [65535.0, 6553.5, 32767.0] {
            assert_eq!(format_value(Some(off), FieldKind::Generic), "Off");
        }
        for heating in [65534.0, 6553.4, 32766.0] {
            assert_eq!(format_value(Some(heating), FieldKind::Generic), "Heating");
        }
    }

    #[test]
    fn generic_checks_win_over_kind() {
        assert_eq!(classify(65535.0, FieldKind::Temperature), SensorState::Off);
        assert_eq!(classify(65534.0, FieldKind::Humidity), SensorState::Heating);
        assert_eq!(classify(6553.4, FieldKind::Pressure), SensorState::Heating);
    }

    #[test]
    fn kind_specific_sentinels() {
        assert_eq!(format_value(Some(327.67), FieldKind::Temperature), "Off");
        assert_eq!(format_value(Some(327.66), FieldKind::Temperature), "Off");
        assert_eq!(format_value(Some(-1.0), FieldKind::Humidity), "Off");
        assert_eq!(format_value(Some(429_496_729.5), FieldKind::Pressure), "Off");

        // Only meaningful for their own kind
        assert_eq!(format_value(Some(327.67), FieldKind::Generic), "327.67");
        assert_eq!(format_value(Some(-1.0), FieldKind::Temperature), "-1");
        assert_eq!(format_value(Some(-1.0), FieldKind::Generic), "-1");
    }

    #[test]
    fn plain_numbers() {
        assert_eq!(format_value(Some(-10.0), FieldKind::Temperature), "-10");
        assert_eq!(format_value(Some(45.0), FieldKind::Humidity), "45");
        assert_eq!(format_value(Some(1013.2), FieldKind::Pressure), "1013.2");
        assert_eq!(format_value(Some(21.37), FieldKind::Temperature), "21.37");
        assert_eq!(format_value(Some(0.0), FieldKind::Generic), "0");
    }

    #[test]
    fn scaled_temperature_sentinel_matches_decoder_output() {
        // 32767 / 100 as produced by the decoders
        let decoded = f64::from(i16::MAX) / 100.0;
        assert_eq!(classify(decoded, FieldKind::Temperature), SensorState::Off);
    }
}
