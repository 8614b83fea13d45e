//! Output file naming

use std::path::Path;

/// `<prefix>-<base>-<timestamp>.<extension>`
///
/// `base` is the original file name without its extension; names without a
/// usable stem become `image`.
///
/// # Examples
///
/// ```
/// use kirinuki::batch::unique_filename_at;
///
/// assert_eq!(
///     unique_filename_at("holiday.photo.jpeg", "cropped", "png", 1700000000000),
///     "cropped-holiday.photo-1700000000000.png"
/// );
/// ```
pub fn unique_filename_at(original: &str, prefix: &str, extension: &str, timestamp_ms: i64) -> String {
    format!("{}-{}-{}.{}", prefix, stem(original), timestamp_ms, extension)
}

fn stem(original: &str) -> &str {
    Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image")
}

/// [`unique_filename_at`] stamped with the current time in milliseconds
pub fn unique_filename(original: &str, prefix: &str, extension: &str) -> String {
    unique_filename_at(
        original,
        prefix,
        extension,
        chrono::Utc::now().timestamp_millis(),
    )
}

/// Assign distinct output names to a batch sharing one timestamp.
///
/// Repeated originals get a `-<n>` suffix on the stem, counted from 2.
pub fn batch_filenames(originals: &[String], prefix: &str, extension: &str, timestamp_ms: i64) -> Vec<String> {
    let mut used = std::collections::HashSet::new();
    originals
        .iter()
        .map(|original| {
            let mut name = unique_filename_at(original, prefix, extension, timestamp_ms);
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!(
                    "{}-{}-{}-{}.{}",
                    prefix,
                    stem(original),
                    n,
                    timestamp_ms,
                    extension
                );
                n += 1;
            }
            name
        })
        .collect()
}
