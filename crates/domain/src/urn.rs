//! URN-typed identifiers.
//!
//! Every externally visible id is a URN of the form
//! `urn:vcloud:<type>:<uuid>`. Catalog items are the one exception: they are
//! never persisted, so their id carries the owning catalog's uuid **and** the
//! cluster template name (`urn:vcloud:catalogitem:<catalogUuid>:<name>`).

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::Error;

const URN_PREFIX: &str = "urn:vcloud";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UrnKind
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The `<type>` segment of a URN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrnKind {
    Org,
    Vdc,
    Catalog,
    CatalogItem,
    VApp,
    Vm,
    User,
    Role,
    Session,
    Site,
}

impl UrnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrnKind::Org => "org",
            UrnKind::Vdc => "vdc",
            UrnKind::Catalog => "catalog",
            UrnKind::CatalogItem => "catalogitem",
            UrnKind::VApp => "vapp",
            UrnKind::Vm => "vm",
            UrnKind::User => "user",
            UrnKind::Role => "role",
            UrnKind::Session => "session",
            UrnKind::Site => "site",
        }
    }
}

impl FromStr for UrnKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "org" => Ok(UrnKind::Org),
            "vdc" => Ok(UrnKind::Vdc),
            "catalog" => Ok(UrnKind::Catalog),
            "catalogitem" => Ok(UrnKind::CatalogItem),
            "vapp" => Ok(UrnKind::VApp),
            "vm" => Ok(UrnKind::Vm),
            "user" => Ok(UrnKind::User),
            "role" => Ok(UrnKind::Role),
            "session" => Ok(UrnKind::Session),
            "site" => Ok(UrnKind::Site),
            other => Err(Error::validation(format!("unknown URN type {other:?}"))),
        }
    }
}

impl fmt::Display for UrnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Urn
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A fully typed `urn:vcloud:<type>:<uuid>` identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Urn {
    pub kind: UrnKind,
    pub id: Uuid,
}

impl Urn {
    /// Mint a fresh random URN of the given kind.
    pub fn random(kind: UrnKind) -> Self {
        Urn {
            kind,
            id: Uuid::new_v4(),
        }
    }

    pub fn of(kind: UrnKind, id: Uuid) -> Self {
        Urn { kind, id }
    }

    /// Parse, additionally requiring the type segment to match `expected`.
    pub fn parse_as(expected: UrnKind, s: &str) -> Result<Self, Error> {
        let urn: Urn = s.parse()?;
        urn.expect_kind(expected)
    }

    /// Require this URN to be of the given kind (for ids arriving through
    /// already-deserialized request bodies).
    pub fn expect_kind(self, expected: UrnKind) -> Result<Self, Error> {
        if self.kind != expected {
            return Err(Error::validation(format!(
                "expected a {} URN, got a {} URN",
                expected, self.kind
            )));
        }
        Ok(self)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URN_PREFIX}:{}:{}", self.kind, self.id)
    }
}

impl FromStr for Urn {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let mut parts = s.splitn(4, ':');
        let (urn, ns, kind, rest) = (
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
        );
        if urn != "urn" || ns != "vcloud" || kind.is_empty() || rest.is_empty() {
            return Err(Error::validation(format!("malformed URN {s:?}")));
        }
        let kind: UrnKind = kind.parse()?;
        if kind == UrnKind::CatalogItem {
            // Catalog item ids carry a template-name suffix; see CatalogItemId.
            return Err(Error::validation(format!(
                "catalog item id {s:?} is not a plain URN"
            )));
        }
        let id = Uuid::parse_str(rest)
            .map_err(|_| Error::validation(format!("malformed URN uuid in {s:?}")))?;
        Ok(Urn { kind, id })
    }
}

impl Serialize for Urn {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Urn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// CatalogItemId
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Identifier of a (virtual) catalog item:
/// `urn:vcloud:catalogitem:<catalogUuid>:<templateName>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogItemId {
    pub catalog: Uuid,
    pub template: String,
}

impl CatalogItemId {
    pub fn new(catalog: Uuid, template: impl Into<String>) -> Self {
        CatalogItemId {
            catalog,
            template: template.into(),
        }
    }

    /// URN of the owning catalog.
    pub fn catalog_urn(&self) -> Urn {
        Urn::of(UrnKind::Catalog, self.catalog)
    }
}

impl fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{URN_PREFIX}:catalogitem:{}:{}",
            self.catalog, self.template
        )
    }
}

impl FromStr for CatalogItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let mut parts = s.splitn(5, ':');
        let (urn, ns, kind, uuid, name) = (
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
            parts.next().unwrap_or_default(),
        );
        if urn != "urn" || ns != "vcloud" || kind != "catalogitem" || name.is_empty() {
            return Err(Error::validation(format!("malformed catalog item id {s:?}")));
        }
        let catalog = Uuid::parse_str(uuid)
            .map_err(|_| Error::validation(format!("malformed catalog uuid in {s:?}")))?;
        Ok(CatalogItemId {
            catalog,
            template: name.to_owned(),
        })
    }
}

impl Serialize for CatalogItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CatalogItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_every_kind() {
        for kind in [
            UrnKind::Org,
            UrnKind::Vdc,
            UrnKind::Catalog,
            UrnKind::VApp,
            UrnKind::Vm,
            UrnKind::User,
            UrnKind::Role,
            UrnKind::Session,
            UrnKind::Site,
        ] {
            let urn = Urn::random(kind);
            let parsed: Urn = urn.to_string().parse().unwrap();
            assert_eq!(parsed, urn);
        }
    }

    #[test]
    fn rejects_wrong_shapes() {
        for bad in [
            "",
            "urn:vcloud:org",
            "urn:vcloud:org:",
            "urn:vmware:org:f47ac10b-58cc-4372-a567-0e02b2c3d479",
            "urn:vcloud:orgg:f47ac10b-58cc-4372-a567-0e02b2c3d479",
            "urn:vcloud:org:not-a-uuid",
            "vcloud:org:f47ac10b-58cc-4372-a567-0e02b2c3d479",
        ] {
            assert!(bad.parse::<Urn>().is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let urn = Urn::random(UrnKind::Vdc);
        assert!(Urn::parse_as(UrnKind::Org, &urn.to_string()).is_err());
        assert!(Urn::parse_as(UrnKind::Vdc, &urn.to_string()).is_ok());
    }

    #[test]
    fn catalog_item_id_roundtrip() {
        let id = CatalogItemId::new(Uuid::new_v4(), "ubuntu");
        let parsed: CatalogItemId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        // A plain Urn parse must not accept the five-segment form.
        assert!(id.to_string().parse::<Urn>().is_err());
    }

    #[test]
    fn catalog_item_id_keeps_colons_out_of_uuid() {
        assert!("urn:vcloud:catalogitem:nope:ubuntu"
            .parse::<CatalogItemId>()
            .is_err());
        assert!("urn:vcloud:catalogitem:f47ac10b-58cc-4372-a567-0e02b2c3d479:"
            .parse::<CatalogItemId>()
            .is_err());
    }

    #[test]
    fn serde_as_string() {
        let urn = Urn::random(UrnKind::Org);
        let json = serde_json::to_string(&urn).unwrap();
        assert_eq!(json, format!("\"{urn}\""));
        let back: Urn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, urn);
    }
}
