//! Runtime settings read from the environment.
//!
//! `main` loads `.env` with `dotenvy` before anything here runs. Every knob
//! has a default; unparseable values fall back silently to it.

/// Products strictly below this quantity are flagged as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 5;
pub const DEFAULT_ASSISTANT_MAX_TOKENS: u32 = 1024;

pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Shop-level settings shared through `AppState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopSettings {
    pub low_stock_threshold: i32,
    pub assistant_max_tokens: u32,
}

impl ShopSettings {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            low_stock_threshold: env_parse("LOW_STOCK_THRESHOLD", DEFAULT_LOW_STOCK_THRESHOLD),
            assistant_max_tokens: env_parse("ASSISTANT_MAX_TOKENS", DEFAULT_ASSISTANT_MAX_TOKENS),
        }
    }
}

impl Default for ShopSettings {
    fn default() -> Self {
        Self { low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD, assistant_max_tokens: DEFAULT_ASSISTANT_MAX_TOKENS }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_missing_or_garbage() {
        assert_eq!(env_parse("MANUSHOP_TEST_UNSET_KEY", 7_i32), 7);
        unsafe { std::env::set_var("MANUSHOP_TEST_GARBAGE_KEY", "seven") };
        assert_eq!(env_parse("MANUSHOP_TEST_GARBAGE_KEY", 7_i32), 7);
        unsafe { std::env::set_var("MANUSHOP_TEST_GOOD_KEY", "12") };
        assert_eq!(env_parse("MANUSHOP_TEST_GOOD_KEY", 7_i32), 12);
    }

    #[test]
    fn default_threshold_is_five() {
        assert_eq!(ShopSettings::default().low_stock_threshold, 5);
    }
}
