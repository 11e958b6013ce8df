use chrono::{DateTime, TimeZone, Utc};
use rand::distributions::Uniform;
use rand::Rng;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates `{unix_millis}_{9 base36 chars}`.
pub fn generate_file_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let dist = Uniform::from(0..BASE36.len());
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.sample(dist)] as char)
        .collect();
    format!("{}_{}", now.timestamp_millis(), suffix)
}

/// Creation time encoded in an id produced by `generate_file_id`.
pub fn file_id_timestamp(file_id: &str) -> Option<DateTime<Utc>> {
    let (millis, _) = file_id.split_once('_')?;
    let millis: i64 = millis.parse().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

/// Replaces every run of characters outside `[A-Za-z0-9_.-]` with a single `_`.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

pub fn logical_path(path_prefix: &str, file_id: &str, name: &str) -> String {
    format!("{}/{}_{}", path_prefix, file_id, sanitize_name(name))
}
