const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Human-readable size using 1024-based units, rounded to two decimals.
///
/// `0` renders as `"0 Bytes"`. Trailing zeros are dropped (`"1.5 KB"`,
/// `"1 MB"`). Sizes beyond the TB range stay in TB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let (value, unit) = scale(bytes);
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}

/// Value in the largest unit whose quotient is at least 1, and that unit's index.
fn scale(bytes: u64) -> (f64, usize) {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    (value, unit)
}
