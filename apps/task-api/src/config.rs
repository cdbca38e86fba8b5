use std::path::PathBuf;
use std::str::FromStr;

/// Task API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Origin allowed by CORS (the web client).
    pub cors_origin: String,
    /// Seconds between due-date sweeps.
    pub reminder_interval_secs: u64,
    /// How far ahead a due date triggers `taskDueReminder`.
    pub due_reminder_window_hours: i64,
    /// Optional JSON seed for the in-memory contact directory.
    pub contacts_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5001,
            cors_origin: "http://localhost:5173".to_string(),
            reminder_interval_secs: 60,
            due_reminder_window_hours: 24,
            contacts_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables. Every variable is
    /// optional.
    ///
    /// Panics with a descriptive message if a variable is set to a value that
    /// does not parse.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|s| !s.is_empty());
        let defaults = Self::default();
        Self {
            port: parsed_var(&var, "PORT").unwrap_or(defaults.port),
            cors_origin: var("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            reminder_interval_secs: positive_var(&var, "REMINDER_INTERVAL_SECS")
                .unwrap_or(defaults.reminder_interval_secs),
            due_reminder_window_hours: positive_var(&var, "DUE_REMINDER_WINDOW_HOURS")
                .unwrap_or(defaults.due_reminder_window_hours),
            contacts_file: var("CONTACTS_FILE").map(PathBuf::from),
        }
    }
}

fn parsed_var<T: FromStr>(var: impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    var(name).map(|v| {
        v.trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} env var is not a valid number: {v:?}"))
    })
}

fn positive_var<T>(var: impl Fn(&str) -> Option<String>, name: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    let value: Option<T> = parsed_var(var, name);
    if let Some(v) = &value {
        if *v <= T::default() {
            panic!("{name} env var must be greater than zero");
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 5001);
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert_eq!(config.reminder_interval_secs, 60);
        assert_eq!(config.due_reminder_window_hours, 24);
        assert!(config.contacts_file.is_none());
    }

    #[test]
    fn set_variables_override_defaults() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("CORS_ORIGIN", "https://tasks.example.com"),
            ("REMINDER_INTERVAL_SECS", "15"),
            ("DUE_REMINDER_WINDOW_HOURS", "48"),
            ("CONTACTS_FILE", "contacts.json"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origin, "https://tasks.example.com");
        assert_eq!(config.reminder_interval_secs, 15);
        assert_eq!(config.due_reminder_window_hours, 48);
        assert_eq!(config.contacts_file, Some(PathBuf::from("contacts.json")));
    }

    #[test]
    fn empty_values_count_as_unset() {
        assert_eq!(config_from(&[("PORT", "")]).port, 5001);
    }

    #[test]
    #[should_panic(expected = "PORT env var is not a valid number")]
    fn unparseable_port_fails() {
        config_from(&[("PORT", "abc")]);
    }

    #[test]
    #[should_panic(expected = "REMINDER_INTERVAL_SECS env var must be greater than zero")]
    fn zero_interval_fails() {
        config_from(&[("REMINDER_INTERVAL_SECS", "0")]);
    }

    #[test]
    #[should_panic(expected = "DUE_REMINDER_WINDOW_HOURS env var must be greater than zero")]
    fn negative_window_fails() {
        config_from(&[("DUE_REMINDER_WINDOW_HOURS", "-3")]);
    }
}
