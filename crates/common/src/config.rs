use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Read `key` and parse it, falling back to `default` when the variable is
/// unset or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read `key` as a non-empty string.
pub fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Split a comma separated variable into its non-empty entries.
pub fn env_list(key: &str) -> Vec<String> {
    env_opt(key)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn set(key: &str, value: &str) {
        unsafe { env::set_var(key, value) };
    }

    fn unset(key: &str) {
        unsafe { env::remove_var(key) };
    }

    #[test]
    #[serial]
    fn test_environment_defaults_to_development() {
        unset("ENVIRONMENT");
        assert_eq!(Environment::from_env(), Environment::Development);
    }

    #[test]
    #[serial]
    fn test_environment_accepts_prod_alias() {
        set("ENVIRONMENT", "PROD");
        assert_eq!(Environment::from_env(), Environment::Production);
        assert_eq!(Environment::from_env().as_str(), "production");
        unset("ENVIRONMENT");
    }

    #[test]
    #[serial]
    fn test_env_or_falls_back_on_garbage() {
        set("COMMON_TEST_THRESHOLD", "not-a-number");
        assert_eq!(env_or("COMMON_TEST_THRESHOLD", 0.25f32), 0.25);

        set("COMMON_TEST_THRESHOLD", " 0.7 ");
        assert_eq!(env_or("COMMON_TEST_THRESHOLD", 0.25f32), 0.7);
        unset("COMMON_TEST_THRESHOLD");
    }

    #[test]
    #[serial]
    fn test_env_list_skips_empty_entries() {
        set("COMMON_TEST_LIST", "a.jpg, ,b.png,");
        assert_eq!(env_list("COMMON_TEST_LIST"), vec!["a.jpg", "b.png"]);

        unset("COMMON_TEST_LIST");
        assert!(env_list("COMMON_TEST_LIST").is_empty());
        assert_eq!(env_opt("COMMON_TEST_LIST"), None);
    }
}
