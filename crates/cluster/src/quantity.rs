//! Kubernetes quantity parsing for the catalog projection.

/// Parse a Kubernetes quantity string (`"4Gi"`, `"512Mi"`, `"2000000000"`)
/// into whole mebibytes. Decimal suffixes (`M`, `G`) are accepted as their
/// SI meaning. Returns `None` for unparseable input.
pub fn parse_quantity_mb(quantity: &str) -> Option<i64> {
    let q = quantity.trim();
    if q.is_empty() {
        return None;
    }
    let split = q.find(|c: char| !c.is_ascii_digit()).unwrap_or(q.len());
    let (digits, suffix) = q.split_at(split);
    let value: i64 = digits.parse().ok()?;
    let bytes = match suffix {
        "" => value,
        "Ki" => value.checked_mul(1 << 10)?,
        "Mi" => value.checked_mul(1 << 20)?,
        "Gi" => value.checked_mul(1 << 30)?,
        "Ti" => value.checked_mul(1 << 40)?,
        "k" => value.checked_mul(1_000)?,
        "M" => value.checked_mul(1_000_000)?,
        "G" => value.checked_mul(1_000_000_000)?,
        "T" => value.checked_mul(1_000_000_000_000)?,
        _ => return None,
    };
    Some(bytes / (1 << 20))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_suffixes() {
        assert_eq!(parse_quantity_mb("512Mi"), Some(512));
        assert_eq!(parse_quantity_mb("4Gi"), Some(4096));
        assert_eq!(parse_quantity_mb("1Ti"), Some(1024 * 1024));
        assert_eq!(parse_quantity_mb("1024Ki"), Some(1));
    }

    #[test]
    fn decimal_suffixes_and_raw_bytes() {
        assert_eq!(parse_quantity_mb("1000000000"), Some(953));
        assert_eq!(parse_quantity_mb("1G"), Some(953));
        assert_eq!(parse_quantity_mb("500M"), Some(476));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_quantity_mb(""), None);
        assert_eq!(parse_quantity_mb("lots"), None);
        assert_eq!(parse_quantity_mb("4Qi"), None);
        assert_eq!(parse_quantity_mb("-1Gi"), None);
    }
}
