//! Storage capabilities and capability statement generation.
//!
//! This module defines the capability declaration of the table store and
//! renders it as a FHIR `CapabilityStatement.rest` fragment.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported FHIR interactions for a resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interaction {
    /// history-instance - Retrieve history for a resource instance.
    HistoryInstance,
    /// history-type - Retrieve history for a resource type.
    HistoryType,
}

impl std::fmt::Display for Interaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interaction::HistoryInstance => write!(f, "history-instance"),
            Interaction::HistoryType => write!(f, "history-type"),
        }
    }
}

/// Supported system-level interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemInteraction {
    /// history-system - Retrieve history for all resources.
    HistorySystem,
}

impl std::fmt::Display for SystemInteraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemInteraction::HistorySystem => write!(f, "history-system"),
        }
    }
}

/// Capabilities for a specific resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCapabilities {
    /// The resource type.
    pub resource_type: String,
    /// Supported interactions.
    pub interactions: BTreeSet<Interaction>,
}

impl ResourceCapabilities {
    /// Creates capabilities for a resource type.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    /// Adds type and instance history.
    pub fn with_history(mut self) -> Self {
        self.interactions.insert(Interaction::HistoryType);
        self.interactions.insert(Interaction::HistoryInstance);
        self
    }
}

/// Overall storage capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCapabilities {
    /// Capabilities by resource type.
    pub resources: BTreeMap<String, ResourceCapabilities>,
    /// Supported system-level interactions.
    pub system_interactions: BTreeSet<SystemInteraction>,
    /// Maximum page size.
    pub max_page_size: Option<u32>,
    /// Default page size.
    pub default_page_size: u32,
    /// Backend name.
    pub backend_name: String,
}

impl StorageCapabilities {
    /// Creates new storage capabilities.
    pub fn new(backend_name: impl Into<String>) -> Self {
        Self {
            backend_name: backend_name.into(),
            default_page_size: 20,
            ..Default::default()
        }
    }

    /// Adds resource capabilities.
    pub fn with_resource(mut self, caps: ResourceCapabilities) -> Self {
        self.resources.insert(caps.resource_type.clone(), caps);
        self
    }

    /// Enables system history.
    pub fn with_system_history(mut self) -> Self {
        self.system_interactions.insert(SystemInteraction::HistorySystem);
        self
    }

    /// Sets pagination limits.
    pub fn with_pagination(mut self, default: u32, max: Option<u32>) -> Self {
        self.default_page_size = default;
        self.max_page_size = max;
        self
    }

    /// Generates a FHIR CapabilityStatement rest resource for this storage.
    pub fn to_capability_rest(&self) -> Value {
        let resources: Vec<Value> = self
            .resources
            .values()
            .map(|caps| {
                serde_json::json!({
                    "type": caps.resource_type,
                    "interaction": caps.interactions.iter().map(|i| {
                        serde_json::json!({"code": i.to_string()})
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();

        let mut rest = serde_json::json!({
            "mode": "server",
            "resource": resources,
        });

        if !self.system_interactions.is_empty() {
            rest["interaction"] = serde_json::json!(
                self.system_interactions.iter().map(|i| {
                    serde_json::json!({"code": i.to_string()})
                }).collect::<Vec<_>>()
            );
        }

        rest
    }
}

/// Trait for components that declare their capabilities.
pub trait CapabilityProvider {
    /// Returns the declared capabilities.
    fn capabilities(&self) -> StorageCapabilities;

    /// Checks if a specific resource type interaction is supported.
    fn supports_interaction(&self, resource_type: &str, interaction: Interaction) -> bool {
        self.capabilities()
            .resources
            .get(resource_type)
            .map(|r| r.interactions.contains(&interaction))
            .unwrap_or(false)
    }

    /// Checks if a system interaction is supported.
    fn supports_system_interaction(&self, interaction: SystemInteraction) -> bool {
        self.capabilities()
            .system_interactions
            .contains(&interaction)
    }

    /// Gets the capabilities for a specific resource type.
    fn resource_capabilities(&self, resource_type: &str) -> Option<ResourceCapabilities> {
        self.capabilities().resources.get(resource_type).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_display() {
        assert_eq!(Interaction::HistoryInstance.to_string(), "history-instance");
        assert_eq!(Interaction::HistoryType.to_string(), "history-type");
        assert_eq!(SystemInteraction::HistorySystem.to_string(), "history-system");
    }

    #[test]
    fn test_interaction_serde_matches_display() {
        let json = serde_json::to_value(Interaction::HistoryInstance).unwrap();
        assert_eq!(json, "history-instance");
    }

    #[test]
    fn test_resource_capabilities() {
        let caps = ResourceCapabilities::new("Patient").with_history();

        assert!(caps.interactions.contains(&Interaction::HistoryType));
        assert!(caps.interactions.contains(&Interaction::HistoryInstance));
    }

    #[test]
    fn test_to_capability_rest() {
        let caps = StorageCapabilities::new("test")
            .with_resource(ResourceCapabilities::new("Patient").with_history())
            .with_resource(ResourceCapabilities::new("Account").with_history())
            .with_system_history()
            .with_pagination(20, Some(100));

        let rest = caps.to_capability_rest();
        assert_eq!(rest["mode"], "server");
        assert_eq!(rest["resource"][0]["type"], "Account");
        assert_eq!(rest["resource"][1]["type"], "Patient");
        assert_eq!(
            rest["resource"][1]["interaction"],
            serde_json::json!([{"code": "history-instance"}, {"code": "history-type"}])
        );
        assert_eq!(
            rest["interaction"],
            serde_json::json!([{"code": "history-system"}])
        );
    }
}
