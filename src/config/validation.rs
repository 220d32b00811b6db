//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for StationConfig.
///
/// Maintained by hand to match the struct hierarchy in station_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [station]
        "station",
        "station.name",
        "station.site",
        // [thresholds]
        "thresholds",
        "thresholds.sensor_temp_critical_c",
        "thresholds.vibration_critical",
        "thresholds.critical_rate_expectation_percent",
        // [model]
        "model",
        "model.train_fraction",
        "model.seed",
        "model.n_trees",
        "model.max_depth",
        "model.min_samples_split",
        // [generator]
        "generator",
        "generator.machines",
        "generator.batch_size",
        "generator.lookback_days",
        "generator.ambient_temp",
        "generator.ambient_temp.min",
        "generator.ambient_temp.max",
        "generator.temp_min",
        "generator.temp_min.min",
        "generator.temp_min.max",
        "generator.temp_max",
        "generator.temp_max.min",
        "generator.temp_max.max",
        "generator.vibration",
        "generator.vibration.min",
        "generator.vibration.max",
        "generator.standard_solder_time",
        "generator.standard_solder_time.min",
        "generator.standard_solder_time.max",
        "generator.ambient_humidity",
        "generator.ambient_humidity.min",
        "generator.ambient_humidity.max",
        "generator.actual_solder_time",
        "generator.actual_solder_time.min",
        "generator.actual_solder_time.max",
        // [storage]
        "storage",
        "storage.path",
        // [report]
        "report",
        "report.default_lookback_days",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
///
/// Ties resolve to the lexicographically smallest key so the suggestion does
/// not depend on hash-set iteration order.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        best = match best {
            Some((bk, bd)) if bd < dist || (bd == dist && bk <= k) => Some((bk, bd)),
            _ => Some((k, dist)),
        };
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let found = walk_toml_keys(&value, "");
    let mut warnings = Vec::new();

    for key in &found {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key.clone(),
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate physical ranges on a parsed StationConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::StationConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let g = &config.generator;

    // Relative humidity is a percentage
    if g.ambient_humidity.min < 0.0 || g.ambient_humidity.max > 100.0 {
        errors.push(format!(
            "generator.ambient_humidity = [{:.1}, {:.1}] is outside physical range (0-100 %)",
            g.ambient_humidity.min, g.ambient_humidity.max
        ));
    }

    // Vibration magnitude and durations cannot be negative
    for (name, range) in [
        ("vibration", g.vibration),
        ("standard_solder_time", g.standard_solder_time),
        ("actual_solder_time", g.actual_solder_time),
    ] {
        if range.min < 0.0 {
            errors.push(format!(
                "generator.{name}.min = {:.2} cannot be negative",
                range.min
            ));
        }
    }

    if config.thresholds.vibration_critical < 0.0 {
        errors.push(format!(
            "thresholds.vibration_critical = {:.2} cannot be negative",
            config.thresholds.vibration_critical
        ));
    }

    // Overlapping process windows allow temp_min > temp_max draws; the
    // generator swaps the bounds in that case.
    if g.temp_min.max > g.temp_max.min {
        warnings.push(ValidationWarning {
            field: "generator.temp_min".to_string(),
            message: format!(
                "generator.temp_min upper bound ({:.1}) exceeds temp_max lower bound ({:.1}); inverted windows will be swapped",
                g.temp_min.max, g.temp_max.min
            ),
            suggestion: None,
        });
    }

    // A critical temperature outside the sampled window never or always trips
    let t = config.thresholds.sensor_temp_critical_c;
    let lowest = g.temp_min.min.min(g.temp_max.min);
    let highest = g.temp_min.max.max(g.temp_max.max);
    if t < lowest || t > highest {
        warnings.push(ValidationWarning {
            field: "thresholds.sensor_temp_critical_c".to_string(),
            message: format!(
                "sensor_temp_critical_c = {:.1} is outside the generated temperature window ({:.1}-{:.1})",
                t, lowest, highest
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("vibraton", "vibration"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [generator]
            vibration = { min = 0.5, max = 5.0 }
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"generator".to_string()));
        assert!(keys.contains(&"generator.vibration".to_string()));
        assert!(keys.contains(&"generator.vibration.min".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[thresholds]
vibraton_critical = 4.5
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].field.contains("vibraton_critical"));
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("thresholds.vibration_critical")
        );
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let toml_str = r#"
[dashboard]
theme = "dark"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.iter().any(|w| w.field == "dashboard"));
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_humidity_above_100_is_error() {
        let mut config = crate::config::StationConfig::default();
        config.generator.ambient_humidity.max = 120.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("ambient_humidity")));
    }

    #[test]
    fn test_overlapping_temp_windows_warn() {
        let mut config = crate::config::StationConfig::default();
        config.generator.temp_min.max = 260.0;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "generator.temp_min"));
    }

    #[test]
    fn test_default_ranges_are_clean() {
        let config = crate::config::StationConfig::default();
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }
}
