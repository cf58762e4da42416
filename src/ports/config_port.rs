//! Configuration access port trait.
//!
//! Keys are addressed as `[section] key`. Numeric getters fall back to the
//! supplied default when the key is absent or does not parse; validation
//! reads the raw string to tell those two cases apart.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// Trimmed value, with blank values treated as absent.
    fn get_trimmed(&self, section: &str, key: &str) -> Option<String> {
        self.get_string(section, key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}
