//! Environment variable overrides consumed by the CLI binary only.
//!
//! `BROTHER_LABEL_BACKEND`/`_MODEL`/`_DEVICE` let a user pin defaults without
//! repeating flags on every invocation. The core library never reads these
//! itself (keeps it testable without process environment side effects);
//! only `src/bin/brother_label.rs` consults this module.

use std::env;

/// Backend override from `BROTHER_LABEL_BACKEND`. `"auto"` (the CLI's
/// explicit "detect for me" value) is treated the same as unset.
#[must_use]
pub fn backend() -> Option<String> {
    non_auto("BROTHER_LABEL_BACKEND")
}

/// Model override from `BROTHER_LABEL_MODEL`. `"auto"` is treated as unset.
#[must_use]
pub fn model() -> Option<String> {
    non_auto("BROTHER_LABEL_MODEL")
}

/// Device URL override from `BROTHER_LABEL_DEVICE`.
#[must_use]
pub fn device() -> Option<String> {
    non_auto("BROTHER_LABEL_DEVICE")
}

fn non_auto(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.is_empty() && !value.eq_ignore_ascii_case("auto") => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn auto_value_is_treated_as_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("BROTHER_LABEL_MODEL", "auto");
        assert_eq!(model(), None);
        env::remove_var("BROTHER_LABEL_MODEL");
    }

    #[test]
    fn explicit_value_is_returned() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("BROTHER_LABEL_DEVICE", "tcp://192.168.1.21:9100");
        assert_eq!(device().as_deref(), Some("tcp://192.168.1.21:9100"));
        env::remove_var("BROTHER_LABEL_DEVICE");
    }
}
