//! Compound database and property package names known to the engine.

/// Pure-compound constants used by the loopback backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompoundData {
    pub name: &'static str,
    pub formula: &'static str,
    pub aliases: &'static [&'static str],
    /// Molar mass [g/mol]
    pub molar_mass_g_mol: f64,
    /// Normal boiling point [K]
    pub normal_boiling_k: f64,
    /// Heat of vaporization at the normal boiling point [J/mol]
    pub dh_vap_j_mol: f64,
}

impl CompoundData {
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        self.name.eq_ignore_ascii_case(query)
            || self.formula.eq_ignore_ascii_case(query)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(query))
    }

    /// Molar mass [kg/mol]
    pub fn molar_mass_kg_mol(&self) -> f64 {
        self.molar_mass_g_mol / 1000.0
    }
}

const COMPOUNDS: [CompoundData; 10] = [
    CompoundData {
        name: "Methane",
        formula: "CH4",
        aliases: &[],
        molar_mass_g_mol: 16.043,
        normal_boiling_k: 111.66,
        dh_vap_j_mol: 8_190.0,
    },
    CompoundData {
        name: "Ethane",
        formula: "C2H6",
        aliases: &[],
        molar_mass_g_mol: 30.069,
        normal_boiling_k: 184.55,
        dh_vap_j_mol: 14_690.0,
    },
    CompoundData {
        name: "Propane",
        formula: "C3H8",
        aliases: &[],
        molar_mass_g_mol: 44.096,
        normal_boiling_k: 231.11,
        dh_vap_j_mol: 19_040.0,
    },
    CompoundData {
        name: "N-butane",
        formula: "C4H10",
        aliases: &["n-butane", "butane"],
        molar_mass_g_mol: 58.122,
        normal_boiling_k: 272.65,
        dh_vap_j_mol: 22_440.0,
    },
    CompoundData {
        name: "Benzene",
        formula: "C6H6",
        aliases: &[],
        molar_mass_g_mol: 78.112,
        normal_boiling_k: 353.24,
        dh_vap_j_mol: 30_720.0,
    },
    CompoundData {
        name: "Toluene",
        formula: "C7H8",
        aliases: &["methylbenzene"],
        molar_mass_g_mol: 92.138,
        normal_boiling_k: 383.78,
        dh_vap_j_mol: 33_180.0,
    },
    CompoundData {
        name: "Water",
        formula: "H2O",
        aliases: &[],
        molar_mass_g_mol: 18.015,
        normal_boiling_k: 373.15,
        dh_vap_j_mol: 40_650.0,
    },
    CompoundData {
        name: "Methanol",
        formula: "CH4O",
        aliases: &["methyl alcohol"],
        molar_mass_g_mol: 32.042,
        normal_boiling_k: 337.85,
        dh_vap_j_mol: 35_210.0,
    },
    CompoundData {
        name: "Ethanol",
        formula: "C2H6O",
        aliases: &["ethyl alcohol"],
        molar_mass_g_mol: 46.069,
        normal_boiling_k: 351.44,
        dh_vap_j_mol: 38_560.0,
    },
    CompoundData {
        name: "Acetone",
        formula: "C3H6O",
        aliases: &["propanone"],
        molar_mass_g_mol: 58.080,
        normal_boiling_k: 329.20,
        dh_vap_j_mol: 29_100.0,
    },
];

/// Property packages the engine can instantiate.
pub const PROPERTY_PACKAGES: [&str; 6] = [
    "Peng-Robinson (PR)",
    "Soave-Redlich-Kwong (SRK)",
    "NRTL",
    "UNIQUAC",
    "Raoult's Law",
    "Steam Tables (IAPWS-IF97)",
];

pub fn compound_catalog() -> &'static [CompoundData] {
    &COMPOUNDS
}

pub fn find_compound(name: &str) -> Option<&'static CompoundData> {
    COMPOUNDS.iter().find(|entry| entry.matches(name))
}

pub fn is_known_property_package(name: &str) -> bool {
    PROPERTY_PACKAGES.iter().any(|p| p.eq_ignore_ascii_case(name.trim()))
}
