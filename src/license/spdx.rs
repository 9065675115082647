use crate::models::LicenseRisk;

/// An entry of the bundled SPDX license registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpdxLicense {
    pub id: &'static str,
    pub name: &'static str,
    pub risk: Risk,
}

/// Copyable twin of [`LicenseRisk`] so the registry can live in a `static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Risk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
}

impl From<Risk> for LicenseRisk {
    fn from(risk: Risk) -> Self {
        match risk {
            Risk::Permissive => LicenseRisk::Permissive,
            Risk::WeakCopyleft => LicenseRisk::WeakCopyleft,
            Risk::StrongCopyleft => LicenseRisk::StrongCopyleft,
        }
    }
}

macro_rules! spdx {
    ($id:literal, $name:literal, $risk:ident) => {
        SpdxLicense {
            id: $id,
            name: $name,
            risk: Risk::$risk,
        }
    };
}

static REGISTRY: &[SpdxLicense] = &[
    // Permissive
    spdx!("0BSD", "BSD Zero Clause License", Permissive),
    spdx!("Apache-2.0", "Apache License 2.0", Permissive),
    spdx!("Artistic-2.0", "Artistic License 2.0", Permissive),
    spdx!("BlueOak-1.0.0", "Blue Oak Model License 1.0.0", Permissive),
    spdx!("BSD-2-Clause", "BSD 2-Clause \"Simplified\" License", Permissive),
    spdx!("BSD-3-Clause", "BSD 3-Clause \"New\" or \"Revised\" License", Permissive),
    spdx!("BSD-4-Clause", "BSD 4-Clause \"Original\" or \"Old\" License", Permissive),
    spdx!("BSL-1.0", "Boost Software License 1.0", Permissive),
    spdx!("CC-BY-4.0", "Creative Commons Attribution 4.0 International", Permissive),
    spdx!("CC0-1.0", "Creative Commons Zero v1.0 Universal", Permissive),
    spdx!("ISC", "ISC License", Permissive),
    spdx!("MIT", "MIT License", Permissive),
    spdx!("MIT-0", "MIT No Attribution", Permissive),
    spdx!("PSF-2.0", "Python Software Foundation License 2.0", Permissive),
    spdx!("Unlicense", "The Unlicense", Permissive),
    spdx!("WTFPL", "Do What The F*ck You Want To Public License", Permissive),
    spdx!("Zlib", "zlib License", Permissive),
    // Weak copyleft
    spdx!("CDDL-1.0", "Common Development and Distribution License 1.0", WeakCopyleft),
    spdx!("EPL-1.0", "Eclipse Public License 1.0", WeakCopyleft),
    spdx!("EPL-2.0", "Eclipse Public License 2.0", WeakCopyleft),
    spdx!("EUPL-1.2", "European Union Public License 1.2", WeakCopyleft),
    spdx!("LGPL-2.1", "GNU Lesser General Public License v2.1 only", WeakCopyleft),
    spdx!("LGPL-2.1-only", "GNU Lesser General Public License v2.1 only", WeakCopyleft),
    spdx!("LGPL-2.1-or-later", "GNU Lesser General Public License v2.1 or later", WeakCopyleft),
    spdx!("LGPL-3.0", "GNU Lesser General Public License v3.0 only", WeakCopyleft),
    spdx!("LGPL-3.0-only", "GNU Lesser General Public License v3.0 only", WeakCopyleft),
    spdx!("LGPL-3.0-or-later", "GNU Lesser General Public License v3.0 or later", WeakCopyleft),
    spdx!("MPL-2.0", "Mozilla Public License 2.0", WeakCopyleft),
    // Strong copyleft
    spdx!("AGPL-3.0", "GNU Affero General Public License v3.0", StrongCopyleft),
    spdx!("AGPL-3.0-only", "GNU Affero General Public License v3.0 only", StrongCopyleft),
    spdx!("AGPL-3.0-or-later", "GNU Affero General Public License v3.0 or later", StrongCopyleft),
    spdx!("GPL-2.0", "GNU General Public License v2.0 only", StrongCopyleft),
    spdx!("GPL-2.0-only", "GNU General Public License v2.0 only", StrongCopyleft),
    spdx!("GPL-2.0-or-later", "GNU General Public License v2.0 or later", StrongCopyleft),
    spdx!("GPL-3.0", "GNU General Public License v3.0 only", StrongCopyleft),
    spdx!("GPL-3.0-only", "GNU General Public License v3.0 only", StrongCopyleft),
    spdx!("GPL-3.0-or-later", "GNU General Public License v3.0 or later", StrongCopyleft),
];

/// Look up an SPDX identifier (case-insensitive).
pub fn lookup(id: &str) -> Option<&'static SpdxLicense> {
    let id = id.trim();
    REGISTRY.iter().find(|l| l.id.eq_ignore_ascii_case(id))
}

/// Risk category of a license identifier; anything unregistered is `Unknown`.
pub fn risk_of(id: &str) -> LicenseRisk {
    lookup(id)
        .map(|l| l.risk.into())
        .unwrap_or(LicenseRisk::Unknown)
}

/// Normalize common non-SPDX strings to their SPDX equivalents.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed {
        "Apache 2.0" | "Apache License 2.0" | "Apache License, Version 2.0" => {
            "Apache-2.0".to_string()
        }
        "MIT License" | "The MIT License" => "MIT".to_string(),
        "BSD 2-Clause" | "Simplified BSD" => "BSD-2-Clause".to_string(),
        "BSD 3-Clause" | "New BSD" | "Modified BSD" => "BSD-3-Clause".to_string(),
        "GPL v2" | "GPLv2" => "GPL-2.0".to_string(),
        "GPL v3" | "GPLv3" => "GPL-3.0".to_string(),
        "LGPL v2.1" | "LGPLv2.1" => "LGPL-2.1".to_string(),
        "LGPL v3" | "LGPLv3" => "LGPL-3.0".to_string(),
        "MPL 2.0" | "MPLv2" => "MPL-2.0".to_string(),
        "ISC License" => "ISC".to_string(),
        "AGPL v3" | "AGPLv3" => "AGPL-3.0".to_string(),
        other => other.to_string(),
    }
}
