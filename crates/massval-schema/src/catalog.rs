use serde::Serialize;

/// A company type accepted in the `companyTypes` column.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompanyType {
    pub code: &'static str,
    pub label: &'static str,
}

pub const COMPANY_TYPES: &[CompanyType] = &[
    CompanyType {
        code: "PRODUCER",
        label: "Producteur de déchets",
    },
    CompanyType {
        code: "COLLECTOR",
        label: "Installation de transit, regroupement ou tri de déchets",
    },
    CompanyType {
        code: "WASTEPROCESSOR",
        label: "Installation de traitement",
    },
    CompanyType {
        code: "TRANSPORTER",
        label: "Transporteur",
    },
    CompanyType {
        code: "WASTE_VEHICLES",
        label: "Installation d'entreposage, dépollution, démontage de VHU",
    },
    CompanyType {
        code: "WASTE_CENTER",
        label: "Installation de collecte de déchets apportés par le producteur initial",
    },
    CompanyType {
        code: "TRADER",
        label: "Négociant",
    },
    CompanyType {
        code: "BROKER",
        label: "Courtier",
    },
    CompanyType {
        code: "ECO_ORGANISME",
        label: "Éco-organisme",
    },
    CompanyType {
        code: "WORKER",
        label: "Entreprise de travaux amiante",
    },
];

/// Roles a user can be granted on an establishment.
pub const ROLES: &[&str] = &["MEMBER", "ADMIN"];

pub fn is_company_type(code: &str) -> bool {
    COMPANY_TYPES.iter().any(|c| c.code == code)
}

pub fn get_company_type(code: &str) -> Option<&'static CompanyType> {
    COMPANY_TYPES.iter().find(|c| c.code == code)
}

pub fn is_role(role: &str) -> bool {
    ROLES.contains(&role)
}
