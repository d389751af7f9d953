use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Activity a driver declares; decides which document types beyond the common set apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    Taxi,
    Vtc,
}

impl BusinessType {
    pub const fn ordered() -> [BusinessType; 2] {
        [BusinessType::Taxi, BusinessType::Vtc]
    }

    pub const fn label(self) -> &'static str {
        match self {
            BusinessType::Taxi => "taxi",
            BusinessType::Vtc => "vtc",
        }
    }

    fn specific_types(self) -> &'static [DocumentType] {
        match self {
            BusinessType::Taxi => TAXI_TYPES,
            BusinessType::Vtc => VTC_TYPES,
        }
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BusinessType {
    type Err = UnknownBusinessType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "taxi" => Ok(BusinessType::Taxi),
            "vtc" => Ok(BusinessType::Vtc),
            _ => Err(UnknownBusinessType(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown business type '{0}' (expected taxi or vtc)")]
pub struct UnknownBusinessType(pub String);

/// One entry of the catalog: stable key plus the label shown to drivers and accountants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentType {
    pub key: &'static str,
    pub label: &'static str,
}

const fn entry(key: &'static str, label: &'static str) -> DocumentType {
    DocumentType { key, label }
}

const COMMON_TYPES: &[DocumentType] = &[
    entry("facture_achat_vehicule", "Facture achat véhicule"),
    entry("feuille_amortissement", "Feuille amortissement"),
    entry("releve_bancaire", "Relevé bancaire"),
    entry("essence_recharges", "Essence/Recharges"),
    entry("entretien_courant", "Entretien courant"),
    entry("assurances", "Assurances"),
    entry("entretien_reparations", "Entretien/Réparations"),
    entry("peages", "Péages"),
    entry("telephone_pro", "Téléphone pro"),
    entry("autres", "Autres"),
];

const TAXI_TYPES: &[DocumentType] = &[
    entry("taxe_stationnement", "Taxe de stationnement"),
    entry("location_licence", "Location licence"),
    entry("location_vehicule_licence", "Location véhicule + licence"),
    entry("abonnement_g7", "Abonnement G7"),
    entry("mise_a_jour_taximetre", "Mise à jour taximètre"),
];

const VTC_TYPES: &[DocumentType] = &[
    entry("location_vehicule_vtc", "Location véhicule VTC"),
    entry("abonnement_plateformes_vtc", "Abonnement plateformes VTC"),
];

const MONTH_LABELS: [&str; 12] = [
    "Janvier",
    "Février",
    "Mars",
    "Avril",
    "Mai",
    "Juin",
    "Juillet",
    "Août",
    "Septembre",
    "Octobre",
    "Novembre",
    "Décembre",
];

/// Static document-type lookup. Holds no state.
pub struct DocumentCatalog;

impl DocumentCatalog {
    /// Common types first, then the ones specific to `business_type`, in catalog order.
    pub fn available_types(business_type: BusinessType) -> Vec<DocumentType> {
        COMMON_TYPES
            .iter()
            .chain(business_type.specific_types())
            .copied()
            .collect()
    }

    pub fn find(business_type: BusinessType, type_key: &str) -> Option<DocumentType> {
        COMMON_TYPES
            .iter()
            .chain(business_type.specific_types())
            .find(|candidate| candidate.key == type_key)
            .copied()
    }

    pub fn is_valid(business_type: BusinessType, type_key: &str) -> bool {
        Self::find(business_type, type_key).is_some()
    }

    /// Label for a stored key regardless of business type. Documents keep their key when a
    /// client later switches type, so reporting has to search every set.
    pub fn label(type_key: &str) -> Option<&'static str> {
        COMMON_TYPES
            .iter()
            .chain(TAXI_TYPES)
            .chain(VTC_TYPES)
            .find(|candidate| candidate.key == type_key)
            .map(|candidate| candidate.label)
    }
}

/// French month name for 1..=12.
pub fn month_label(month: u8) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|index| MONTH_LABELS.get(usize::from(index)))
        .copied()
}
