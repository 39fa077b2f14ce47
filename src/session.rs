//! Design sessions: the saved unit of work and its JSON codec.
//!
//! A session file is a pretty-printed JSON object:
//!
//! ```json
//! {
//!   "timestamp": "2026-03-01T10:00:00Z",
//!   "design_name": "Barrel A",
//!   "notes": "",
//!   "bore_profile": [{ "position": 0.0, "diameter": 14.8 }, ...],
//!   "environment": { "temperature": 22.0, "humidity": 50.0 },
//!   "material": { "name": "African Blackwood", ... },
//!   "geometry": { ... },
//!   "result": { ... }
//! }
//! ```
//!
//! `geometry` and `result` are written only when present. On load every
//! field except `bore_profile` may be missing. `material` may also be given
//! as a bare name, which must then be a library material, or as an empty
//! object, which stands for the default material. Design names are stored
//! without surrounding whitespace.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BoreError, Result};
use crate::geometry::{Geometry, ProfileCurve};
use crate::materials::{find_material, Material};
use crate::simulation::AcousticResult;
use crate::types::Environment;

/// Name given to designs saved without one.
pub const DEFAULT_DESIGN_NAME: &str = "Untitled";

/// Name given to an unnamed material stored with its full property set.
const CUSTOM_MATERIAL_NAME: &str = "Custom";

/// One barrel design with everything needed to restore it.
#[derive(Debug, Clone, PartialEq)]
pub struct Design {
    pub name: String,
    pub geometry: Geometry,
    pub bore_profile: ProfileCurve,
    pub material: Material,
    pub environment: Environment,
    pub notes: String,
    pub last_result: Option<AcousticResult>,
    /// When the design was last saved (UTC)
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for Design {
    fn default() -> Self {
        Self {
            name: DEFAULT_DESIGN_NAME.to_string(),
            geometry: Geometry::default(),
            bore_profile: ProfileCurve::default(),
            material: Material::default(),
            environment: Environment::default(),
            notes: String::new(),
            last_result: None,
            saved_at: None,
        }
    }
}

impl Design {
    /// Surrounding whitespace is stripped from `name`.
    pub fn new(name: impl Into<String>, bore_profile: ProfileCurve) -> Self {
        Self {
            name: name.into().trim().to_string(),
            bore_profile,
            ..Default::default()
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_result(mut self, result: AcousticResult) -> Self {
        self.last_result = Some(result);
        self
    }
}

#[derive(Serialize)]
struct SessionOut<'a> {
    timestamp: String,
    design_name: &'a str,
    notes: &'a str,
    bore_profile: &'a ProfileCurve,
    environment: &'a Environment,
    material: &'a Material,
    #[serde(skip_serializing_if = "Option::is_none")]
    geometry: Option<&'a Geometry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a AcousticResult>,
}

#[derive(Deserialize)]
struct SessionIn {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    design_name: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    bore_profile: Option<ProfileCurve>,
    #[serde(default)]
    environment: Option<Environment>,
    #[serde(default)]
    material: Option<MaterialRecord>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    result: Option<AcousticResult>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaterialRecord {
    Name(String),
    Properties {
        #[serde(default)]
        name: Option<String>,
        density: Option<f64>,
        kinematic_viscosity: Option<f64>,
        speed_of_sound: Option<f64>,
        characteristic_impedance: Option<f64>,
    },
}

impl MaterialRecord {
    fn resolve(self) -> Result<Material> {
        match self {
            MaterialRecord::Name(name) => find_material(&name)
                .ok_or_else(|| BoreError::MalformedSession(format!("unknown material '{name}'"))),
            MaterialRecord::Properties {
                name,
                density,
                kinematic_viscosity,
                speed_of_sound,
                characteristic_impedance,
            } => {
                if let Some(material) = name.as_deref().and_then(find_material) {
                    return Ok(material);
                }
                let properties = (density, kinematic_viscosity, speed_of_sound, characteristic_impedance);
                if name.is_none() && properties == (None, None, None, None) {
                    return Ok(Material::default());
                }
                let name = name.unwrap_or_else(|| CUSTOM_MATERIAL_NAME.to_string());
                let (Some(density), Some(nu), Some(c), Some(z)) = properties else {
                    return Err(BoreError::MalformedSession(format!(
                        "custom material '{name}' is missing properties"
                    )));
                };
                let material = Material::new(name, density, nu, c, z);
                material
                    .validate()
                    .map_err(|e| BoreError::MalformedSession(e.to_string()))?;
                Ok(material)
            }
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    // Naive ISO 8601 without an offset is read as UTC.
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// JSON session codec.
pub struct SessionCodec;

impl SessionCodec {
    /// Encode `design` as pretty JSON.
    ///
    /// The timestamp is `saved_at`, or the current time when unset.
    pub fn serialize(design: &Design) -> Result<String> {
        let timestamp = design
            .saved_at
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true);
        let out = SessionOut {
            timestamp,
            design_name: design.name.trim(),
            notes: &design.notes,
            bore_profile: &design.bore_profile,
            environment: &design.environment,
            material: &design.material,
            geometry: (!design.geometry.is_empty()).then_some(&design.geometry),
            result: design.last_result.as_ref(),
        };
        serde_json::to_string_pretty(&out)
            .map_err(|e| BoreError::MalformedSession(format!("failed to encode session: {e}")))
    }

    /// Decode a session payload.
    ///
    /// # Errors
    /// `MalformedSession` when the text is not a session object, when
    /// `bore_profile` is missing or invalid, or when any present field fails
    /// its own validation.
    pub fn deserialize(text: &str) -> Result<Design> {
        let raw: SessionIn = serde_json::from_str(text)
            .map_err(|e| BoreError::MalformedSession(format!("unparseable session: {e}")))?;

        let bore_profile = raw
            .bore_profile
            .ok_or_else(|| BoreError::MalformedSession("missing bore_profile".to_string()))?;

        let geometry = raw.geometry.unwrap_or_default();
        geometry
            .validate()
            .map_err(|e| BoreError::MalformedSession(e.to_string()))?;

        let material = match raw.material {
            Some(record) => record.resolve()?,
            None => Material::default(),
        };

        let saved_at = raw.timestamp.as_deref().and_then(|text| {
            let parsed = parse_timestamp(text);
            if parsed.is_none() {
                debug!(timestamp = text, "ignoring unparseable session timestamp");
            }
            parsed
        });

        let name = raw
            .design_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_DESIGN_NAME.to_string());

        Ok(Design {
            name,
            geometry,
            bore_profile,
            material,
            environment: raw.environment.unwrap_or_default(),
            notes: raw.notes.unwrap_or_default(),
            last_result: raw.result,
            saved_at,
        })
    }

    /// Write `design` to `path`.
    pub fn save_to_path(design: &Design, path: &Path) -> Result<()> {
        let text = Self::serialize(design)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Read a design from `path`.
    pub fn load_from_path(path: &Path) -> Result<Design> {
        let text = std::fs::read_to_string(path)?;
        Self::deserialize(&text)
    }
}

/// In-memory store of named designs.
#[derive(Debug, Clone, Default)]
pub struct DesignStore {
    designs: BTreeMap<String, Design>,
}

impl DesignStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `design` under its name, stamping `saved_at`.
    ///
    /// An existing design with the same name is replaced. A blank name is
    /// rejected.
    pub fn save(&mut self, mut design: Design) -> Result<()> {
        let name = design.name.trim().to_string();
        if name.is_empty() {
            return Err(BoreError::invalid_config("design.name", "must not be blank"));
        }
        design.name = name.clone();
        design.saved_at = Some(Utc::now());
        let replaced = self.designs.insert(name.clone(), design).is_some();
        info!(design = %name, replaced, "design saved");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Design> {
        self.designs.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Design> {
        self.designs.remove(name)
    }

    /// Stored names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.designs.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.designs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }

    pub fn clear(&mut self) {
        self.designs.clear();
    }

    /// Decode `text` and store the design. Returns the stored name.
    ///
    /// Nothing is stored unless the whole payload decodes.
    pub fn load_session(&mut self, text: &str) -> Result<String> {
        let design = match SessionCodec::deserialize(text) {
            Ok(design) => design,
            Err(err) => {
                warn!(error = %err, "session rejected");
                return Err(err);
            }
        };
        let name = design.name.clone();
        self.designs.insert(name.clone(), design);
        info!(design = %name, "session loaded");
        Ok(name)
    }

    /// Encode the stored design `name`.
    pub fn export_session(&self, name: &str) -> Result<String> {
        let design = self
            .designs
            .get(name)
            .ok_or_else(|| BoreError::UnknownDesign(name.to_string()))?;
        SessionCodec::serialize(design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoreSegment, ToneHole};
    use crate::profile::ProfileGenerator;
    use crate::simulation::{PlaceholderSimulationAdapter, SimulationAdapter};
    use crate::types::BoreShape;
    use chrono::TimeZone;

    fn profile() -> ProfileCurve {
        ProfileGenerator::default()
            .generate(BoreShape::Tapered, 14.8, 15.2, 66.0, 10)
            .unwrap()
    }

    fn full_design() -> Design {
        let curve = profile();
        let result = PlaceholderSimulationAdapter::new(9)
            .evaluate(&curve, &Material::default(), 3.0, &Environment::default())
            .unwrap();
        let geometry = Geometry {
            segments: vec![BoreSegment::new(0.0, 66.0, 14.8, 15.2)],
            holes: vec![ToneHole::new("T1", 30.0, 3.0, 6.0)],
            fingerings: vec![],
        };
        let mut design = Design::new("Barrel A", curve)
            .with_geometry(geometry)
            .with_material(Material::hard_rubber())
            .with_environment(Environment::new(24.0, 60.0))
            .with_notes("first try")
            .with_result(result);
        design.saved_at = Some(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
        design
    }

    #[test]
    fn test_round_trip() {
        let design = full_design();
        let text = SessionCodec::serialize(&design).unwrap();
        assert!(text.contains("\"timestamp\": \"2026-03-01T10:00:00Z\""));
        let loaded = SessionCodec::deserialize(&text).unwrap();
        assert_eq!(loaded, design);
    }

    #[test]
    fn test_optional_sections_omitted() {
        let design = Design::new("Plain", profile());
        let text = SessionCodec::serialize(&design).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("geometry").is_none());
        assert!(value.get("result").is_none());
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_missing_fields_default() {
        let text = r#"{"bore_profile": [{"position": 0.0, "diameter": 15.0}, {"position": 66.0, "diameter": 15.0}]}"#;
        let design = SessionCodec::deserialize(text).unwrap();
        assert_eq!(design.name, "Untitled");
        assert_eq!(design.notes, "");
        assert_eq!(design.environment, Environment::new(22.0, 50.0));
        assert_eq!(design.material, Material::default());
        assert!(design.geometry.is_empty());
        assert!(design.last_result.is_none());
        assert!(design.saved_at.is_none());
    }

    #[test]
    fn test_missing_or_invalid_profile_is_malformed() {
        for text in [
            "not json",
            r#"{"design_name": "x"}"#,
            r#"{"bore_profile": [{"position": 0.0, "diameter": 15.0}]}"#,
            r#"{"bore_profile": [{"position": 5.0, "diameter": 15.0}, {"position": 1.0, "diameter": 15.0}]}"#,
        ] {
            assert!(matches!(
                SessionCodec::deserialize(text),
                Err(BoreError::MalformedSession(_))
            ));
        }
    }

    #[test]
    fn test_material_resolution() {
        let base = r#""bore_profile": [{"position": 0.0, "diameter": 15.0}, {"position": 66.0, "diameter": 15.0}]"#;

        let by_name = format!(r#"{{{base}, "material": "Hard Rubber"}}"#);
        assert_eq!(SessionCodec::deserialize(&by_name).unwrap().material, Material::hard_rubber());

        // Library names win over stored numbers.
        let stale = format!(r#"{{{base}, "material": {{"name": "Mopane", "density": 1.0}}}}"#);
        assert_eq!(SessionCodec::deserialize(&stale).unwrap().material, Material::mopane());

        let custom = format!(
            r#"{{{base}, "material": {{"name": "Boxwood", "density": 950.0, "kinematic_viscosity": 1.5e-5, "speed_of_sound": 3900.0, "characteristic_impedance": 3.7e6}}}}"#
        );
        let material = SessionCodec::deserialize(&custom).unwrap().material;
        assert_eq!(material.name, "Boxwood");
        assert!(!material.is_library_entry());

        let incomplete = format!(r#"{{{base}, "material": {{"name": "Boxwood", "density": 950.0}}}}"#);
        assert!(matches!(
            SessionCodec::deserialize(&incomplete),
            Err(BoreError::MalformedSession(_))
        ));

        let unknown = format!(r#"{{{base}, "material": "Unobtainium"}}"#);
        assert!(SessionCodec::deserialize(&unknown).is_err());
    }

    #[test]
    fn test_empty_material_object_uses_default() {
        let text = r#"{"timestamp":"2025-01-01T10:00:00.123456","notes":"","bore_profile":[{"position":0,"diameter":0.0148},{"position":0.066,"diameter":0.0152}],"environment":{"temperature":22,"humidity":50},"material":{}}"#;
        let design = SessionCodec::deserialize(text).unwrap();
        assert_eq!(design.material, Material::default());
        assert_eq!(design.name, DEFAULT_DESIGN_NAME);
        assert_eq!(design.bore_profile.len(), 2);
        assert_eq!(design.environment, Environment::new(22.0, 50.0));
        assert!(design.saved_at.is_some());

        let unnamed = r#"{"bore_profile":[{"position":0,"diameter":15.0},{"position":66,"diameter":15.0}],"material":{"density":950.0,"kinematic_viscosity":1.5e-5,"speed_of_sound":3900.0,"characteristic_impedance":3.7e6}}"#;
        assert_eq!(SessionCodec::deserialize(unnamed).unwrap().material.name, "Custom");

        let partial = r#"{"bore_profile":[{"position":0,"diameter":15.0},{"position":66,"diameter":15.0}],"material":{"density":950.0}}"#;
        assert!(matches!(
            SessionCodec::deserialize(partial),
            Err(BoreError::MalformedSession(_))
        ));
    }

    #[test]
    fn test_name_whitespace_is_stable_across_round_trip() {
        let design = Design::new("  Barrel C ", profile());
        assert_eq!(design.name, "Barrel C");
        let loaded = SessionCodec::deserialize(&SessionCodec::serialize(&design).unwrap()).unwrap();
        assert_eq!(loaded.name, "Barrel C");

        let padded = Design {
            name: " Barrel D\t".to_string(),
            ..design
        };
        let text = SessionCodec::serialize(&padded).unwrap();
        assert!(text.contains("\"design_name\": \"Barrel D\""));
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let text = r#"{"timestamp": "2025-11-02T08:30:15.250000", "bore_profile": []}"#;
        let design = SessionCodec::deserialize(text).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 11, 2, 8, 30, 15).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(design.saved_at, Some(expected));
        assert!(design.bore_profile.is_empty());
    }

    #[test]
    fn test_store_save_and_export() {
        let mut store = DesignStore::new();
        store.save(Design::new("  B  ", profile())).unwrap();
        store.save(Design::new("A", profile())).unwrap();
        assert_eq!(store.names(), vec!["A".to_string(), "B".to_string()]);
        assert!(store.get("B").unwrap().saved_at.is_some());

        let text = store.export_session("A").unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.load_session(&text).unwrap(), "A");
        assert_eq!(store.len(), 1);

        assert!(matches!(store.export_session("Z"), Err(BoreError::UnknownDesign(_))));
        assert!(store.save(Design::new(" ", profile())).is_err());
        assert!(store.remove("A").is_some());
        assert!(store.remove("A").is_none());
    }

    #[test]
    fn test_store_rejects_malformed_without_inserting() {
        let mut store = DesignStore::new();
        store.save(Design::new("Keep", profile())).unwrap();
        assert!(store.load_session(r#"{"design_name": "Broken"}"#).is_err());
        assert_eq!(store.names(), vec!["Keep".to_string()]);
    }
}
