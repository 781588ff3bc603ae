//! Table store configuration.

use serde::{Deserialize, Serialize};

use crate::error::{StorageResult, ValidationError};

/// FHIR R4 resource types.
pub const R4_RESOURCE_TYPES: &[&str] = &[
    "Account",
    "ActivityDefinition",
    "AdverseEvent",
    "AllergyIntolerance",
    "Appointment",
    "AppointmentResponse",
    "AuditEvent",
    "Basic",
    "Binary",
    "BiologicallyDerivedProduct",
    "BodyStructure",
    "Bundle",
    "CapabilityStatement",
    "CarePlan",
    "CareTeam",
    "CatalogEntry",
    "ChargeItem",
    "ChargeItemDefinition",
    "Claim",
    "ClaimResponse",
    "ClinicalImpression",
    "CodeSystem",
    "Communication",
    "CommunicationRequest",
    "CompartmentDefinition",
    "Composition",
    "ConceptMap",
    "Condition",
    "Consent",
    "Contract",
    "Coverage",
    "CoverageEligibilityRequest",
    "CoverageEligibilityResponse",
    "DetectedIssue",
    "Device",
    "DeviceDefinition",
    "DeviceMetric",
    "DeviceRequest",
    "DeviceUseStatement",
    "DiagnosticReport",
    "DocumentManifest",
    "DocumentReference",
    "EffectEvidenceSynthesis",
    "Encounter",
    "Endpoint",
    "EnrollmentRequest",
    "EnrollmentResponse",
    "EpisodeOfCare",
    "EventDefinition",
    "Evidence",
    "EvidenceVariable",
    "ExampleScenario",
    "ExplanationOfBenefit",
    "FamilyMemberHistory",
    "Flag",
    "Goal",
    "GraphDefinition",
    "Group",
    "GuidanceResponse",
    "HealthcareService",
    "ImagingStudy",
    "Immunization",
    "ImmunizationEvaluation",
    "ImmunizationRecommendation",
    "ImplementationGuide",
    "InsurancePlan",
    "Invoice",
    "Library",
    "Linkage",
    "List",
    "Location",
    "Measure",
    "MeasureReport",
    "Media",
    "Medication",
    "MedicationAdministration",
    "MedicationDispense",
    "MedicationKnowledge",
    "MedicationRequest",
    "MedicationStatement",
    "MedicinalProduct",
    "MedicinalProductAuthorization",
    "MedicinalProductContraindication",
    "MedicinalProductIndication",
    "MedicinalProductIngredient",
    "MedicinalProductInteraction",
    "MedicinalProductManufactured",
    "MedicinalProductPackaged",
    "MedicinalProductPharmaceutical",
    "MedicinalProductUndesirableEffect",
    "MessageDefinition",
    "MessageHeader",
    "MolecularSequence",
    "NamingSystem",
    "NutritionOrder",
    "Observation",
    "ObservationDefinition",
    "OperationDefinition",
    "OperationOutcome",
    "Organization",
    "OrganizationAffiliation",
    "Parameters",
    "Patient",
    "PaymentNotice",
    "PaymentReconciliation",
    "Person",
    "PlanDefinition",
    "Practitioner",
    "PractitionerRole",
    "Procedure",
    "Provenance",
    "Questionnaire",
    "QuestionnaireResponse",
    "RelatedPerson",
    "RequestGroup",
    "ResearchDefinition",
    "ResearchElementDefinition",
    "ResearchStudy",
    "ResearchSubject",
    "RiskAssessment",
    "RiskEvidenceSynthesis",
    "Schedule",
    "SearchParameter",
    "ServiceRequest",
    "Slot",
    "Specimen",
    "SpecimenDefinition",
    "StructureDefinition",
    "StructureMap",
    "Subscription",
    "Substance",
    "SubstanceNucleicAcid",
    "SubstancePolymer",
    "SubstanceProtein",
    "SubstanceReferenceInformation",
    "SubstanceSourceMaterial",
    "SubstanceSpecification",
    "SupplyDelivery",
    "SupplyRequest",
    "Task",
    "TerminologyCapabilities",
    "TestReport",
    "TestScript",
    "ValueSet",
    "VerificationResult",
    "VisionPrescription",
];

/// FHIR R4 compartment types.
pub const R4_COMPARTMENT_TYPES: &[&str] = &[
    "Device",
    "Encounter",
    "Patient",
    "Practitioner",
    "RelatedPerson",
];

/// Configuration for the table store and its search service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStoreConfig {
    /// Page size used when a search carries no `_count`.
    pub default_page_size: u32,

    /// Upper bound for `_count`.
    pub max_page_size: u32,

    /// Resource types known to the store.
    ///
    /// Every type listed here is declared with type and instance history in
    /// the capability statement.
    pub resource_types: Vec<String>,

    /// Resource types that define a compartment.
    pub compartment_types: Vec<String>,
}

impl Default for TableStoreConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 1000,
            resource_types: R4_RESOURCE_TYPES.iter().map(|t| t.to_string()).collect(),
            compartment_types: R4_COMPARTMENT_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl TableStoreConfig {
    /// Returns true if the resource type is known.
    pub fn is_known_resource_type(&self, resource_type: &str) -> bool {
        self.resource_types.iter().any(|t| t == resource_type)
    }

    /// Returns true if the resource type defines a compartment.
    pub fn is_compartment_type(&self, compartment_type: &str) -> bool {
        self.compartment_types.iter().any(|t| t == compartment_type)
    }

    /// Validates configuration invariants.
    pub fn validate(&self) -> StorageResult<()> {
        if self.default_page_size == 0 {
            return Err(invalid("default_page_size must be > 0"));
        }

        if self.max_page_size < self.default_page_size {
            return Err(invalid("max_page_size must be >= default_page_size"));
        }

        if self.resource_types.iter().any(|t| t.trim().is_empty()) {
            return Err(invalid("resource_types must not contain empty names"));
        }

        if let Some(unknown) = self
            .compartment_types
            .iter()
            .find(|t| !self.is_known_resource_type(t))
        {
            return Err(invalid(&format!(
                "compartment type '{}' is not a known resource type",
                unknown
            )));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> crate::error::StorageError {
    ValidationError::InvalidConfiguration {
        message: message.to_string(),
    }
    .into()
}
