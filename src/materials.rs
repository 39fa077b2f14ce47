//! Reference properties of barrel body materials.
//!
//! Materials are immutable reference data. A design stores the full record so
//! that custom materials survive a save/load round-trip, but library entries
//! are always resolved back to the values below.

use serde::{Deserialize, Serialize};

use crate::error::{BoreError, Result};

/// Body material of the barrel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Display name, e.g. "African Blackwood"
    pub name: String,
    /// Density (kg/m³)
    pub density: f64,
    /// Kinematic viscosity used for boundary-layer losses (m²/s)
    pub kinematic_viscosity: f64,
    /// Speed of sound in the solid (m/s)
    pub speed_of_sound: f64,
    /// Characteristic acoustic impedance (Pa·s/m)
    pub characteristic_impedance: f64,
}

impl Material {
    pub fn new(
        name: impl Into<String>,
        density: f64,
        kinematic_viscosity: f64,
        speed_of_sound: f64,
        characteristic_impedance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            density,
            kinematic_viscosity,
            speed_of_sound,
            characteristic_impedance,
        }
    }

    /// African Blackwood (Dalbergia melanoxylon)
    pub fn african_blackwood() -> Self {
        Self::new("African Blackwood", 1270.0, 1.5e-5, 4360.0, 4.5e6)
    }

    /// Mopane (Colophospermum mopane)
    pub fn mopane() -> Self {
        Self::new("Mopane", 1230.0, 1.55e-5, 4200.0, 4.3e6)
    }

    /// Cocobolo (Dalbergia retusa)
    pub fn cocobolo() -> Self {
        Self::new("Cocobolo", 1100.0, 1.55e-5, 4000.0, 4.0e6)
    }

    /// Vulcanised hard rubber (ebonite)
    pub fn hard_rubber() -> Self {
        Self::new("Hard Rubber", 1100.0, 1.8e-5, 2340.0, 3.1e6)
    }

    /// Moulded resin/wood-powder composite
    pub fn composite() -> Self {
        Self::new("Composite", 950.0, 1.6e-5, 2800.0, 3.8e6)
    }

    /// Check the numeric properties are physical.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("density", self.density),
            ("kinematic_viscosity", self.kinematic_viscosity),
            ("speed_of_sound", self.speed_of_sound),
            ("characteristic_impedance", self.characteristic_impedance),
        ];
        for (field, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(BoreError::InvalidConfig {
                    key: format!("material.{field}"),
                    reason: format!("'{}' has non-positive {field} {value}", self.name),
                });
            }
        }
        Ok(())
    }

    /// Whether this record is one of the library entries, by display name.
    pub fn is_library_entry(&self) -> bool {
        find_material(&self.name).is_some()
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::african_blackwood()
    }
}

/// All available material keys.
pub const MATERIAL_KEYS: &[&str] = &[
    "african_blackwood",
    "mopane",
    "cocobolo",
    "hard_rubber",
    "composite",
];

/// Get material by key.
///
/// # Example
/// ```
/// use clarinet_bore::materials::get_material;
///
/// let blackwood = get_material("african_blackwood").unwrap();
/// assert_eq!(blackwood.name, "African Blackwood");
/// assert!((blackwood.density - 1270.0).abs() < 1e-9);
/// ```
pub fn get_material(key: &str) -> Option<Material> {
    match key {
        "african_blackwood" => Some(Material::african_blackwood()),
        "mopane" => Some(Material::mopane()),
        "cocobolo" => Some(Material::cocobolo()),
        "hard_rubber" => Some(Material::hard_rubber()),
        "composite" => Some(Material::composite()),
        _ => None,
    }
}

/// Look up a material by key or display name (case-insensitive).
pub fn find_material(name_or_key: &str) -> Option<Material> {
    let wanted = name_or_key.trim();
    if let Some(material) = get_material(wanted) {
        return Some(material);
    }
    get_all_materials()
        .into_iter()
        .map(|(_, material)| material)
        .find(|material| material.name.eq_ignore_ascii_case(wanted))
}

/// Like [`find_material`] but reports an unknown name as an error.
pub fn lookup_material(name_or_key: &str) -> Result<Material> {
    find_material(name_or_key).ok_or_else(|| BoreError::UnknownMaterial(name_or_key.to_string()))
}

/// Get all available materials as `(key, Material)` tuples.
pub fn get_all_materials() -> Vec<(&'static str, Material)> {
    MATERIAL_KEYS
        .iter()
        .filter_map(|&key| get_material(key).map(|m| (key, m)))
        .collect()
}
