//! Processing log data types

use std::fmt;

/// A single value in an AIM processing log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    Int(i64),
    Float(f64),
    Str(String),
    /// Several whitespace-separated integers on one line (e.g. dimensions)
    IntList(Vec<i64>),
}

impl LogValue {
    /// Numeric view of a scalar value; `None` for strings and lists.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LogValue::Int(v) => Some(*v as f64),
            LogValue::Float(v) => Some(*v),
            LogValue::Str(_) | LogValue::IntList(_) => None,
        }
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Int(v) => write!(f, "{v}"),
            LogValue::Float(v) => {
                let text = v.to_string();
                // Keep floats recognisable as floats when read back
                if v.is_finite() && !text.contains(['.', 'e', 'E']) {
                    write!(f, "{text}.0")
                } else {
                    f.write_str(&text)
                }
            }
            LogValue::Str(s) => f.write_str(s),
            LogValue::IntList(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                f.write_str(&parts.join(" "))
            }
        }
    }
}

/// Ordered key-value view of an AIM processing log.
///
/// Keys keep their first-insertion order; inserting an existing key replaces
/// its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingLog {
    entries: Vec<(String, LogValue)>,
}

impl ProcessingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: LogValue) -> Option<LogValue> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<LogValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&LogValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(LogValue::as_f64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            LogValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int_list(&self, key: &str) -> Option<&[i64]> {
        match self.get(key)? {
            LogValue::IntList(values) => Some(values),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LogValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, LogValue)> for ProcessingLog {
    fn from_iter<I: IntoIterator<Item = (K, LogValue)>>(iter: I) -> Self {
        let mut log = ProcessingLog::new();
        for (key, value) in iter {
            log.insert(key, value);
        }
        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut log = ProcessingLog::new();
        log.insert("A", LogValue::Int(1));
        log.insert("B", LogValue::Int(2));
        let previous = log.insert("A", LogValue::Float(3.5));

        assert_eq!(previous, Some(LogValue::Int(1)));
        let keys: Vec<&str> = log.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["A", "B"]);
        assert_eq!(log.get_f64("A"), Some(3.5));
    }

    #[test]
    fn test_typed_getters() {
        let log: ProcessingLog = vec![
            ("Dim", LogValue::IntList(vec![10, 20, 30])),
            ("Site", LogValue::Str("Radius".to_string())),
        ]
        .into_iter()
        .collect();

        assert_eq!(log.get_int_list("Dim"), Some(&[10, 20, 30][..]));
        assert_eq!(log.get_str("Site"), Some("Radius"));
        assert_eq!(log.get_f64("Site"), None);
        assert!(log.get("Missing").is_none());
    }

    #[test]
    fn test_float_display_keeps_decimal_point() {
        assert_eq!(LogValue::Float(8192.0).to_string(), "8192.0");
        assert_eq!(LogValue::Float(-2.0).to_string(), "-2.0");
        assert_eq!(LogValue::Float(0.2409).to_string(), "0.2409");
    }
}
