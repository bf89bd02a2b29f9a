//! Label and annotation vocabulary authored by the control plane.

/// VDC that owns a namespace.
pub const VDC_ID_LABEL: &str = "ssvirt.io/vdc-id";
/// Org that owns a namespace.
pub const ORG_ID_LABEL: &str = "ssvirt.io/org-id";
/// vApp that owns a TemplateInstance.
pub const VAPP_ID_LABEL: &str = "ssvirt.io/vapp-id";
/// VM row backing a VirtualMachine.
pub const VM_ID_LABEL: &str = "ssvirt.io/vm-id";

/// Catalog a cluster template belongs to. Templates without this label are
/// invisible to the catalog projection.
pub const CATALOG_ID_LABEL: &str = "catalog.ssvirt.io/catalog-id";
/// `"true"` marks the projected catalog item as published.
pub const PUBLISHED_LABEL: &str = "catalog.ssvirt.io/published";

/// Suspend marker on a KubeVirt VirtualMachine.
pub const SUSPEND_STATUS_ANNOTATION: &str = "ssvirt.io/suspend-status";

/// Annotation key carrying a template's human description.
pub const DESCRIPTION_ANNOTATION: &str = "description";
