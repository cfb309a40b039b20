//! Text codec for AIM processing logs.
//!
//! The log is a fixed-width, line-oriented block. Keys and values are
//! separated by runs of two or more spaces; single spaces occur inside keys
//! and inside values such as dates, so they never split a line.

use tracing::{debug, warn};

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::header::types::{LogValue, ProcessingLog};

const BANNER: &str = "! Processing Log\n!\n";

const SEPARATOR: &str =
    "!-------------------------------------------------------------------------------\n";

/// Keys closing a section of the legacy layout; a separator line follows them.
pub const SECTION_END_KEYS: [&str; 5] = [
    "Orig-ISQ-Dim-um",
    "Index Measurement",
    "Default-Eval",
    "HU: mu water",
    "Standard data deviation",
];

const KEY_WIDTH: usize = 30;
const NUMBER_WIDTH: usize = 23;
const LIST_ITEM_WIDTH: usize = 10;
const LINE_WIDTH: usize = 80;

/// Token standing in for `\n` when the log is stored as single-line metadata.
pub const LINEBREAK_SENTINEL: &str = "_LINEBREAK_";

/// Parses a processing log.
///
/// Blank lines and `!` comment lines are skipped. Lines that cannot be read
/// as a key-value pair are reported with a warning and dropped; parsing never
/// fails as a whole.
pub fn parse(text: &str) -> ProcessingLog {
    let mut log = ProcessingLog::new();
    let mut skipped = 0usize;

    for (index, line) in text.split('\n').enumerate() {
        if line.trim().is_empty() || line.trim_start().starts_with('!') {
            continue;
        }
        match parse_line(index + 1, line) {
            Ok((key, value)) => {
                log.insert(key, value);
            }
            Err(e) => {
                warn!("{}", e);
                skipped += 1;
            }
        }
    }

    debug!(entries = log.len(), skipped, "Parsed processing log");
    log
}

/// Parses one non-blank, non-comment line into a key and its value.
pub(crate) fn parse_line(line_number: usize, line: &str) -> Result<(String, LogValue)> {
    let fragments = split_fragments(line);
    let malformed = || ConversionError::MalformedHeaderLine {
        line_number,
        line: line.to_string(),
    };

    match fragments.as_slice() {
        [key, value] => Ok((key.to_string(), classify_value(value))),
        [key, rest @ ..] if rest.len() > 1 => {
            let values = rest
                .iter()
                .map(|p| p.parse::<i64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|_| malformed())?;
            Ok((key.to_string(), LogValue::IntList(values)))
        }
        _ => Err(malformed()),
    }
}

fn split_fragments(line: &str) -> Vec<&str> {
    line.split("  ")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Decides the variant of a scalar value.
///
/// A value is numeric when removing at most one `.`, one `-` and one `e+`
/// leaves a non-empty run of ASCII digits. Numeric values with a `.` or an
/// exponent are floats, the rest integers. Anything else, including numbers
/// that do not fit the target type, stays a string.
pub fn classify_value(value: &str) -> LogValue {
    let stripped = value
        .replacen('.', "", 1)
        .replacen('-', "", 1)
        .replacen("e+", "", 1);
    let numeric = !stripped.is_empty() && stripped.bytes().all(|b| b.is_ascii_digit());
    if !numeric {
        return LogValue::Str(value.to_string());
    }

    if value.contains(['.', 'e']) {
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => LogValue::Float(v),
            _ => LogValue::Str(value.to_string()),
        }
    } else {
        match value.parse::<i64>() {
            Ok(v) => LogValue::Int(v),
            Err(_) => LogValue::Str(value.to_string()),
        }
    }
}

/// Renders a processing log in the legacy fixed-width layout.
///
/// The result is an approximation of the layout written by the scanner
/// software, not a byte-identical copy of any original log.
pub fn serialize(log: &ProcessingLog) -> String {
    let mut out = String::with_capacity(BANNER.len() + SEPARATOR.len() + log.len() * (LINE_WIDTH + 1));
    out.push_str(BANNER);
    out.push_str(SEPARATOR);

    for (key, value) in log.iter() {
        let key_field = key_field(key);
        let line = match value {
            LogValue::Int(_) | LogValue::Float(_) => {
                format!("{key_field}{:>width$}", value.to_string(), width = NUMBER_WIDTH)
            }
            LogValue::IntList(values) => {
                let items: Vec<String> = values
                    .iter()
                    .map(|v| {
                        let text = v.to_string();
                        let width = LIST_ITEM_WIDTH.max(text.len() + 1);
                        format!("{text:>width$}")
                    })
                    .collect();
                format!("{key_field}{}", items.join(" "))
            }
            LogValue::Str(s) => format!("{:<width$}", format!("{key_field}{s}"), width = LINE_WIDTH),
        };
        out.push_str(&line);
        out.push('\n');

        if SECTION_END_KEYS.contains(&key) {
            out.push_str(SEPARATOR);
        }
    }

    out
}

// Long keys still need a two-space gap before their value.
fn key_field(key: &str) -> String {
    if key.len() + 2 > KEY_WIDTH {
        format!("{key}  ")
    } else {
        format!("{key:<width$}", width = KEY_WIDTH)
    }
}

/// Flattens a log onto one line for container metadata.
pub fn encode_log_metadata(text: &str) -> String {
    text.replace('\n', LINEBREAK_SENTINEL)
}

/// Restores a log stored with [`encode_log_metadata`].
pub fn decode_log_metadata(text: &str) -> String {
    text.replace(LINEBREAK_SENTINEL, "\n")
}

impl std::str::FromStr for ProcessingLog {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(parse(s))
    }
}

impl std::fmt::Display for ProcessingLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&serialize(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_LOG: &str = "! Processing Log\n\
!\n\
!-------------------------------------------------------------------------------\n\
Created by                    ISQ_TO_AIM (IPL)\n\
Time                          12-JAN-2021 10:22:31.45\n\
Original Creation-Date        12-JAN-2021 10:22:31.45\n\
Orig-ISQ-Dim-p                                 2304       2304        168\n\
Orig-ISQ-Dim-um                              139995     139995      10248\n\
!-------------------------------------------------------------------------------\n\
Patient Name                  Anonymous\n\
Index Patient                                    1234\n\
Index Measurement                               5678\n\
!-------------------------------------------------------------------------------\n\
Site                                               21\n\
Scanner ID                                       3401\n\
Scanner type                                        9\n\
Position Slice 1 [um]                           71316\n\
No. samples                                      2304\n\
No. projections per 180                           900\n\
Scan Distance [um]                             139995\n\
Integration time [us]                           43000\n\
Reference line [um]                             70826\n\
Reconstruction-Alg.                                 3\n\
Energy [V]                                      68000\n\
Intensity [uA]                                   1470\n\
Angle-Offset [mdeg]                                 0\n\
Default-Eval                                       21\n\
!-------------------------------------------------------------------------------\n\
Mu_Scaling                                       8192\n\
Calibration Data              68 kVp, BH: 200 mg HA/ccm, Scaling 8192, 0.2 CU\n\
Calib. default unit type      2 (Density)\n\
Density: unit                 mg HA/ccm\n\
Density: slope                         1.60304004e+03\n\
Density: intercept                    -3.91106812e+02\n\
HU: mu water                                  0.24090\n\
!-------------------------------------------------------------------------------\n\
Parameter name                Linear Attenuation\n\
Parameter units               [1/cm]\n\
Minimum value                                 -2.64575\n\
Maximum value                                  5.61023\n\
Average data value                             0.79014\n\
Standard data deviation                        1.06102\n\
!-------------------------------------------------------------------------------\n";

    #[test]
    fn test_parse_scalar_types() {
        let log = parse("Mu_Scaling      8192\nDensity_Slope      1.2\nDensity_Intercept      -2.0\n");

        assert_eq!(log.get("Mu_Scaling"), Some(&LogValue::Int(8192)));
        assert_eq!(log.get("Density_Slope"), Some(&LogValue::Float(1.2)));
        assert_eq!(log.get("Density_Intercept"), Some(&LogValue::Float(-2.0)));
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_parse_sample_log() {
        let log = parse(SAMPLE_LOG);

        assert_eq!(log.get_str("Created by"), Some("ISQ_TO_AIM (IPL)"));
        // single spaces inside dates survive the split
        assert_eq!(log.get_str("Time"), Some("12-JAN-2021 10:22:31.45"));
        assert_eq!(log.get_int_list("Orig-ISQ-Dim-p"), Some(&[2304, 2304, 168][..]));
        assert_eq!(log.get("Mu_Scaling"), Some(&LogValue::Int(8192)));
        assert_eq!(log.get_f64("Density: slope"), Some(1603.04004));
        assert_eq!(log.get_f64("Density: intercept"), Some(-391.106812));
        assert_eq!(log.get_f64("HU: mu water"), Some(0.2409));
        assert_eq!(log.get_f64("Minimum value"), Some(-2.64575));
        assert_eq!(log.get_str("Calib. default unit type"), Some("2 (Density)"));
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let log = parse("! comment  with  gaps\n\n   \nKey    Value\n");
        assert_eq!(log.len(), 1);
        assert_eq!(log.get_str("Key"), Some("Value"));
    }

    #[test]
    fn test_parse_skips_indented_comments() {
        let log = parse("  !Key      5\nKey    Value\n");
        assert_eq!(log.len(), 1);
        assert!(!log.contains_key("!Key"));
        assert_eq!(parse(&serialize(&log)), log);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let log = parse("LonelyKey\nGood    1\nDims    1    two    3\n");
        assert_eq!(log.len(), 1);
        assert_eq!(log.get("Good"), Some(&LogValue::Int(1)));
    }

    #[test]
    fn test_parse_line_reports_malformed() {
        let err = parse_line(7, "LonelyKey").unwrap_err();
        assert!(matches!(
            err,
            ConversionError::MalformedHeaderLine { line_number: 7, .. }
        ));
    }

    #[test]
    fn test_parse_handles_crlf() {
        let log = parse("Mu_Scaling      8192\r\nSite    Tibia\r\n");
        assert_eq!(log.get("Mu_Scaling"), Some(&LogValue::Int(8192)));
        assert_eq!(log.get_str("Site"), Some("Tibia"));
    }

    #[test]
    fn test_classify_value() {
        assert_eq!(classify_value("42"), LogValue::Int(42));
        assert_eq!(classify_value("-42"), LogValue::Int(-42));
        assert_eq!(classify_value("0.5"), LogValue::Float(0.5));
        assert_eq!(classify_value("1.5e+03"), LogValue::Float(1500.0));
        assert_eq!(classify_value("1e+03"), LogValue::Float(1000.0));
        assert_eq!(classify_value("12-JAN-2021"), LogValue::Str("12-JAN-2021".into()));
        assert_eq!(classify_value("1.2.3"), LogValue::Str("1.2.3".into()));
        assert_eq!(classify_value("."), LogValue::Str(".".into()));
        assert_eq!(
            classify_value("99999999999999999999"),
            LogValue::Str("99999999999999999999".into())
        );
    }

    #[test]
    fn test_serialize_layout() {
        let log: ProcessingLog = vec![
            ("Mu_Scaling", LogValue::Int(8192)),
            ("HU: mu water", LogValue::Float(0.2409)),
            ("Orig-ISQ-Dim-p", LogValue::IntList(vec![2304, 2304, 168])),
            ("Site", LogValue::Str("Radius".to_string())),
        ]
        .into_iter()
        .collect();

        let text = serialize(&log);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "! Processing Log");
        assert_eq!(lines[1], "!");
        assert_eq!(lines[2], SEPARATOR.trim_end());
        assert_eq!(lines[3], format!("{:<30}{:>23}", "Mu_Scaling", "8192"));
        assert_eq!(lines[4].len(), 53);
        assert!(lines[4].ends_with("0.2409"));
        assert_eq!(lines[5], SEPARATOR.trim_end());
        assert_eq!(
            lines[6],
            format!("{:<30}{:>10} {:>10} {:>10}", "Orig-ISQ-Dim-p", 2304, 2304, 168)
        );
        assert_eq!(lines[7].len(), 80);
        assert!(lines[7].starts_with("Site                          Radius"));
    }

    #[test]
    fn test_round_trip_sample_log() {
        let log = parse(SAMPLE_LOG);
        assert_eq!(parse(&serialize(&log)), log);
    }

    #[test]
    fn test_round_trip_edge_cases() {
        let log: ProcessingLog = vec![
            ("A key that is exactly thirty c", LogValue::Float(3.0)),
            ("Key of twenty-nine characters", LogValue::Str("x y".to_string())),
            ("Wide", LogValue::IntList(vec![1234567890, -1234567890, 0])),
            ("Big", LogValue::Float(1e20)),
            ("Small", LogValue::Float(-1.5e-7)),
        ]
        .into_iter()
        .collect();

        assert_eq!(parse(&serialize(&log)), log);
    }

    #[test]
    fn test_from_str_and_display() {
        let log: ProcessingLog = "Mu_Scaling      8192\n".parse().unwrap();
        assert!(log.to_string().contains("Mu_Scaling"));
    }

    #[test]
    fn test_metadata_sentinel() {
        let encoded = encode_log_metadata("a\nb\n");
        assert_eq!(encoded, "a_LINEBREAK_b_LINEBREAK_");
        assert!(!encoded.contains('\n'));
        assert_eq!(decode_log_metadata(&encoded), "a\nb\n");
    }
}
