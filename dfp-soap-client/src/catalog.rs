//! Compiled-in catalog of API versions and their services.
//!
//! The catalog never gates a request; it is consulted only after a service
//! description could not be fetched, to tell a typo in the version or
//! service name apart from a transport failure.

use crate::error::ClientError;

/// Behavior that differs between API versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `ReportService.getReportJobStatus` exists. Older versions expose the
    /// status only as the `reportJobStatus` field of `getReportJob`.
    pub report_status_endpoint: bool,
}

impl Capabilities {
    /// Capabilities assumed for versions newer than anything in the catalog.
    pub const LATEST: Capabilities = Capabilities {
        report_status_endpoint: true,
    };
}

/// One catalog entry.
#[derive(Debug)]
pub struct VersionEntry {
    pub version: &'static str,
    pub services: &'static [&'static str],
    pub capabilities: Capabilities,
}

impl VersionEntry {
    pub fn has_service(&self, service: &str) -> bool {
        self.services.contains(&service)
    }
}

const SERVICES_V201502: &[&str] = &[
    "ActivityGroupService",
    "ActivityService",
    "AdExclusionRuleService",
    "AdRuleService",
    "AudienceSegmentService",
    "BaseRateService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentMetadataKeyHierarchyService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "ExchangeRateService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "NetworkService",
    "OrderService",
    "PackageService",
    "PlacementService",
    "PremiumRateService",
    "ProductPackageItemService",
    "ProductPackageService",
    "ProductService",
    "ProductTemplateService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "RateCardService",
    "ReconciliationOrderReportService",
    "ReconciliationReportRowService",
    "ReconciliationReportService",
    "ReportService",
    "SharedAdUnitService",
    "SuggestedAdUnitService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "WorkflowRequestService",
];

const SERVICES_V201505: &[&str] = &[
    "ActivityGroupService",
    "ActivityService",
    "AdExclusionRuleService",
    "AdRuleService",
    "AudienceSegmentService",
    "BaseRateService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentMetadataKeyHierarchyService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "ExchangeRateService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "NetworkService",
    "OrderService",
    "PackageService",
    "PlacementService",
    "PremiumRateService",
    "ProductPackageItemService",
    "ProductPackageService",
    "ProductService",
    "ProductTemplateService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "RateCardService",
    "ReconciliationOrderReportService",
    "ReconciliationReportRowService",
    "ReconciliationReportService",
    "ReportService",
    "SharedAdUnitService",
    "SuggestedAdUnitService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "WorkflowRequestService",
];

const SERVICES_V201508: &[&str] = &[
    "ActivityGroupService",
    "ActivityService",
    "AdExclusionRuleService",
    "AdRuleService",
    "AudienceSegmentService",
    "BaseRateService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentMetadataKeyHierarchyService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "ExchangeRateService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "NetworkService",
    "OrderService",
    "PackageService",
    "PlacementService",
    "PremiumRateService",
    "ProductPackageItemService",
    "ProductPackageService",
    "ProductService",
    "ProductTemplateService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "RateCardService",
    "ReconciliationLineItemReportService",
    "ReconciliationOrderReportService",
    "ReconciliationReportRowService",
    "ReconciliationReportService",
    "ReportService",
    "SharedAdUnitService",
    "SuggestedAdUnitService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "WorkflowRequestService",
];

const SERVICES_V201511: &[&str] = &[
    "ActivityGroupService",
    "ActivityService",
    "AdExclusionRuleService",
    "AdRuleService",
    "AudienceSegmentService",
    "BaseRateService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentMetadataKeyHierarchyService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "ExchangeRateService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "NetworkService",
    "OrderService",
    "PackageService",
    "PlacementService",
    "PremiumRateService",
    "ProductPackageItemService",
    "ProductPackageService",
    "ProductService",
    "ProductTemplateService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "RateCardService",
    "ReconciliationLineItemReportService",
    "ReconciliationOrderReportService",
    "ReconciliationReportRowService",
    "ReconciliationReportService",
    "ReportService",
    "SharedAdUnitService",
    "SuggestedAdUnitService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "WorkflowRequestService",
];

const SERVICES_V201602: &[&str] = &[
    "ActivityGroupService",
    "ActivityService",
    "AdExclusionRuleService",
    "AdRuleService",
    "AudienceSegmentService",
    "BaseRateService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentMetadataKeyHierarchyService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "ExchangeRateService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "NetworkService",
    "OrderService",
    "PackageService",
    "PlacementService",
    "PremiumRateService",
    "ProductPackageItemService",
    "ProductPackageService",
    "ProductService",
    "ProductTemplateService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "RateCardService",
    "ReconciliationLineItemReportService",
    "ReconciliationOrderReportService",
    "ReconciliationReportRowService",
    "ReconciliationReportService",
    "ReportService",
    "SuggestedAdUnitService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "WorkflowRequestService",
];

const SERVICES_V202311: &[&str] = &[
    "ActivityGroupService",
    "ActivityService",
    "AdRuleService",
    "AdjustmentService",
    "AudienceSegmentService",
    "CdnConfigurationService",
    "CmsMetadataService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentService",
    "CreativeReviewService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "DaiAuthenticationKeyService",
    "DaiEncodingProfileService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "MobileApplicationService",
    "NativeStyleService",
    "NetworkService",
    "OrderService",
    "PlacementService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "ReportService",
    "SegmentPopulationService",
    "SiteService",
    "StreamActivityMonitorService",
    "SuggestedAdUnitService",
    "TargetingPresetService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "YieldGroupService",
];

const SERVICES_V202402: &[&str] = &[
    "ActivityGroupService",
    "ActivityService",
    "AdRuleService",
    "AdjustmentService",
    "AudienceSegmentService",
    "CdnConfigurationService",
    "CmsMetadataService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "DaiAuthenticationKeyService",
    "DaiEncodingProfileService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "MobileApplicationService",
    "NativeStyleService",
    "NetworkService",
    "OrderService",
    "PlacementService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "ReportService",
    "SegmentPopulationService",
    "SiteService",
    "StreamActivityMonitorService",
    "SuggestedAdUnitService",
    "TargetingPresetService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "YieldGroupService",
];

const SERVICES_V202405: &[&str] = &[
    "AdRuleService",
    "AdjustmentService",
    "AudienceSegmentService",
    "CdnConfigurationService",
    "CmsMetadataService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "DaiAuthenticationKeyService",
    "DaiEncodingProfileService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "MobileApplicationService",
    "NativeStyleService",
    "NetworkService",
    "OrderService",
    "PlacementService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "ReportService",
    "SegmentPopulationService",
    "SiteService",
    "StreamActivityMonitorService",
    "SuggestedAdUnitService",
    "TargetingPresetService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "YieldGroupService",
];

const SERVICES_V202408: &[&str] = &[
    "AdRuleService",
    "AdjustmentService",
    "AdsTxtService",
    "AudienceSegmentService",
    "CdnConfigurationService",
    "CmsMetadataService",
    "CompanyService",
    "ContactService",
    "ContentBundleService",
    "ContentService",
    "CreativeService",
    "CreativeSetService",
    "CreativeTemplateService",
    "CreativeWrapperService",
    "CustomFieldService",
    "CustomTargetingService",
    "DaiAuthenticationKeyService",
    "DaiEncodingProfileService",
    "ForecastService",
    "InventoryService",
    "LabelService",
    "LineItemCreativeAssociationService",
    "LineItemService",
    "LineItemTemplateService",
    "LiveStreamEventService",
    "MobileApplicationService",
    "NativeStyleService",
    "NetworkService",
    "OrderService",
    "PlacementService",
    "ProposalLineItemService",
    "ProposalService",
    "PublisherQueryLanguageService",
    "ReportService",
    "SegmentPopulationService",
    "SiteService",
    "StreamActivityMonitorService",
    "SuggestedAdUnitService",
    "TargetingPresetService",
    "TeamService",
    "UserService",
    "UserTeamAssociationService",
    "YieldGroupService",
];

/// Every version the library knows, oldest first.
pub static VERSIONS: &[VersionEntry] = &[
    VersionEntry {
        version: "v201502",
        services: SERVICES_V201502,
        capabilities: Capabilities {
            report_status_endpoint: false,
        },
    },
    VersionEntry {
        version: "v201505",
        services: SERVICES_V201505,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
    VersionEntry {
        version: "v201508",
        services: SERVICES_V201508,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
    VersionEntry {
        version: "v201511",
        services: SERVICES_V201511,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
    VersionEntry {
        version: "v201602",
        services: SERVICES_V201602,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
    VersionEntry {
        version: "v202311",
        services: SERVICES_V202311,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
    VersionEntry {
        version: "v202402",
        services: SERVICES_V202402,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
    VersionEntry {
        version: "v202405",
        services: SERVICES_V202405,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
    VersionEntry {
        version: "v202408",
        services: SERVICES_V202408,
        capabilities: Capabilities {
            report_status_endpoint: true,
        },
    },
];

/// Look up a version by tag.
pub fn lookup(version: &str) -> Option<&'static VersionEntry> {
    VERSIONS.iter().find(|entry| entry.version == version)
}

/// Known version tags, oldest first.
pub fn known_versions() -> Vec<String> {
    VERSIONS.iter().map(|entry| entry.version.to_string()).collect()
}

/// The lexicographically greatest version tag.
///
/// Tags are `vYYYYMM`, so lexical order is chronological order.
pub fn latest_version() -> &'static str {
    VERSIONS
        .iter()
        .map(|entry| entry.version)
        .max()
        .unwrap_or("v202408")
}

/// Capabilities of `version`, or [`Capabilities::LATEST`] for unknown tags.
pub fn capabilities(version: &str) -> Capabilities {
    lookup(version).map_or(Capabilities::LATEST, |entry| entry.capabilities)
}

/// Explain a failed description fetch in catalog terms.
///
/// Returns `UnknownVersion` or `UnknownService` when the catalog proves the
/// request invalid, and `None` when the pair is known.
pub fn diagnose(version: &str, service: &str) -> Option<ClientError> {
    let Some(entry) = lookup(version) else {
        return Some(ClientError::UnknownVersion {
            version: version.to_string(),
            known: known_versions(),
        });
    };
    if entry.has_service(service) {
        return None;
    }
    Some(ClientError::UnknownService {
        service: service.to_string(),
        version: version.to_string(),
        known: entry.services.iter().map(|s| s.to_string()).collect(),
    })
}
