//! Namespace name derivation.

/// Slug used in namespace names: lowercased, everything outside `[a-z0-9-]`
/// removed, truncated to 40 characters.
pub fn slug(name: &str) -> String {
    let mut out: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    out.truncate(40);
    out
}

/// Base namespace name for a VDC. Collisions among live VDCs are resolved by
/// the orchestrator with a numeric suffix.
pub fn vdc_namespace_base(org_name: &str, vdc_name: &str) -> String {
    format!("vdc-{}-{}", slug(org_name), slug(vdc_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_lowercases_and_strips() {
        assert_eq!(slug("TestOrg"), "testorg");
        assert_eq!(slug("My VDC #1"), "myvdc1");
        assert_eq!(slug("already-fine-42"), "already-fine-42");
    }

    #[test]
    fn slug_truncates_to_40() {
        let long = "a".repeat(80);
        assert_eq!(slug(&long).len(), 40);
    }

    #[test]
    fn base_name_shape() {
        assert_eq!(vdc_namespace_base("TestOrg", "VDC-0"), "vdc-testorg-vdc-0");
    }
}
