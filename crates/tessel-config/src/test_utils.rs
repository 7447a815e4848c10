use std::ffi::OsString;

/// Restores the overridden environment variables when dropped, so a failing
/// assertion inside a test does not leak state into the next one.
pub struct EnvGuard {
    saved: Vec<(String, Option<OsString>)>,
}

impl EnvGuard {
    pub fn set(vars: &[(&str, &str)]) -> Self {
        let saved = vars
            .iter()
            .map(|(key, _)| (key.to_string(), std::env::var_os(key)))
            .collect();

        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        Self { saved }
    }

    pub fn unset(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| (key.to_string(), std::env::var_os(key)))
            .collect();

        for key in keys {
            std::env::remove_var(key);
        }

        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old_value) in self.saved.drain(..) {
            match old_value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}
