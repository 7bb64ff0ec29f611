//! Scene serialization
//!
//! A scene is a sample described in RON: named materials, then regions cut
//! from shapes and filled with those materials. Regions are listed parents
//! first; a region without a parent sits directly in the chamber.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use epmc_geometry::GeometryError;

use crate::error::ModelError;
use crate::model::{ConstantLossModel, MaterialScatterModel, VacuumModel};
use crate::region::{RegionTree, DEFAULT_CHAMBER_RADIUS};
use crate::shapes::ShapeTemplate;

fn default_chamber_radius() -> f64 {
    DEFAULT_CHAMBER_RADIUS
}

fn default_min_energy() -> f64 {
    50.0
}

/// Serializable scattering model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ModelTemplate {
    Vacuum {
        #[serde(default)]
        min_energy: f64,
    },
    ConstantLoss {
        /// Metres
        mean_free_path: f64,
        /// eV per metre
        stopping_power: f64,
        #[serde(default)]
        deflection_sigma: f64,
        #[serde(default = "default_min_energy")]
        min_energy: f64,
        #[serde(default)]
        secondary_probability: f64,
        #[serde(default)]
        secondary_fraction: f64,
        #[serde(default)]
        element: Option<u8>,
    },
}

impl ModelTemplate {
    /// Build the model, named `name` in logs and errors
    pub fn create_model(&self, name: &str) -> Result<Arc<dyn MaterialScatterModel>, ModelError> {
        match self {
            ModelTemplate::Vacuum { min_energy } => Ok(Arc::new(VacuumModel::new().with_min_energy(*min_energy))),
            ModelTemplate::ConstantLoss {
                mean_free_path,
                stopping_power,
                deflection_sigma,
                min_energy,
                secondary_probability,
                secondary_fraction,
                element,
            } => {
                let mut model = ConstantLossModel::new(name, *mean_free_path, *stopping_power)?
                    .with_deflection(*deflection_sigma)?
                    .with_min_energy(*min_energy)
                    .with_secondaries(*secondary_probability, *secondary_fraction)?;
                if let Some(z) = element {
                    model = model.with_element(*z);
                }
                Ok(Arc::new(model))
            }
        }
    }
}

/// A named material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTemplate {
    pub name: String,
    pub model: ModelTemplate,
}

/// A region of the sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTemplate {
    pub name: String,
    /// Enclosing region; the chamber when absent
    #[serde(default)]
    pub parent: Option<String>,
    pub shape: ShapeTemplate,
    /// Name of an entry in the scene's materials
    pub material: String,
}

/// A serializable scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTemplate {
    pub name: String,
    /// Radius (metres) of the vacuum chamber sphere
    #[serde(default = "default_chamber_radius")]
    pub chamber_radius: f64,
    #[serde(default)]
    pub materials: Vec<MaterialTemplate>,
    #[serde(default)]
    pub regions: Vec<RegionTemplate>,
}

/// A built scene, ready to simulate
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub regions: RegionTree,
    /// Materials by name, as shared with the regions
    pub materials: HashMap<String, Arc<dyn MaterialScatterModel>>,
}

impl SceneTemplate {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chamber_radius: DEFAULT_CHAMBER_RADIUS,
            materials: Vec::new(),
            regions: Vec::new(),
        }
    }

    /// A single material filling z >= 0
    pub fn bulk_substrate(material: impl Into<String>, model: ModelTemplate) -> Self {
        let material = material.into();
        Self::new(format!("bulk {}", material))
            .with_material(material.clone(), model)
            .with_region(RegionTemplate {
                name: "substrate".to_string(),
                parent: None,
                shape: ShapeTemplate::substrate(),
                material,
            })
    }

    /// Load a scene from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SceneError> {
        let contents = fs::read_to_string(path)?;
        let scene = ron::from_str(&contents)?;
        Ok(scene)
    }

    /// Save a scene to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SceneError> {
        let pretty = ron::ser::PrettyConfig::new().struct_names(true).enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn with_chamber_radius(mut self, radius: f64) -> Self {
        self.chamber_radius = radius;
        self
    }

    pub fn with_material(mut self, name: impl Into<String>, model: ModelTemplate) -> Self {
        self.materials.push(MaterialTemplate {
            name: name.into(),
            model,
        });
        self
    }

    pub fn with_region(mut self, region: RegionTemplate) -> Self {
        self.regions.push(region);
        self
    }

    /// Build the region tree
    ///
    /// Regions sharing a material share one model instance.
    pub fn build(&self) -> Result<Scene, SceneError> {
        let mut materials: HashMap<String, Arc<dyn MaterialScatterModel>> = HashMap::new();
        for material in &self.materials {
            let model = material.model.create_model(&material.name)?;
            materials.insert(material.name.clone(), model);
        }

        let mut regions = RegionTree::with_chamber_radius(self.chamber_radius)?;
        for template in &self.regions {
            let parent = match &template.parent {
                Some(name) => regions
                    .find_by_name(name)
                    .ok_or_else(|| SceneError::UnknownRegion(name.clone()))?,
                None => regions.chamber(),
            };
            let model = materials
                .get(&template.material)
                .cloned()
                .ok_or_else(|| SceneError::UnknownMaterial(template.material.clone()))?;
            let shape = template.shape.create_shape()?;
            regions.add_region(parent, template.name.clone(), Arc::from(shape), model)?;
        }
        log::info!(
            "Built scene '{}': {} regions, {} materials",
            self.name,
            regions.len(),
            materials.len()
        );

        Ok(Scene {
            name: self.name.clone(),
            regions,
            materials,
        })
    }
}

/// Error loading, saving or building a scene
#[derive(Debug)]
pub enum SceneError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Parse error (invalid RON syntax)
    Parse(ron::error::SpannedError),
    Serialize(ron::Error),
    /// A shape could not be built
    Geometry(GeometryError),
    /// A material's parameters were rejected
    Model(ModelError),
    /// A region names a material that was never defined
    UnknownMaterial(String),
    /// A region names a parent that was never defined (or comes later)
    UnknownRegion(String),
}

impl From<io::Error> for SceneError {
    fn from(e: io::Error) -> Self {
        SceneError::Io(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::Parse(e)
    }
}

impl From<ron::Error> for SceneError {
    fn from(e: ron::Error) -> Self {
        SceneError::Serialize(e)
    }
}

impl From<GeometryError> for SceneError {
    fn from(e: GeometryError) -> Self {
        SceneError::Geometry(e)
    }
}

impl From<ModelError> for SceneError {
    fn from(e: ModelError) -> Self {
        SceneError::Model(e)
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::Io(e) => write!(f, "IO error: {}", e),
            SceneError::Parse(e) => write!(f, "Parse error: {}", e),
            SceneError::Serialize(e) => write!(f, "Serialize error: {}", e),
            SceneError::Geometry(e) => write!(f, "Geometry error: {}", e),
            SceneError::Model(e) => write!(f, "Model error: {}", e),
            SceneError::UnknownMaterial(name) => write!(f, "Unknown material: {}", name),
            SceneError::UnknownRegion(name) => write!(f, "Unknown parent region: {}", name),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::Io(e) => Some(e),
            SceneError::Parse(e) => Some(e),
            SceneError::Serialize(e) => Some(e),
            SceneError::Geometry(e) => Some(e),
            SceneError::Model(e) => Some(e),
            SceneError::UnknownMaterial(_) | SceneError::UnknownRegion(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epmc_math::Vec3;

    fn copper() -> ModelTemplate {
        ModelTemplate::ConstantLoss {
            mean_free_path: 1e-8,
            stopping_power: 2e9,
            deflection_sigma: 0.5,
            min_energy: 50.0,
            secondary_probability: 0.0,
            secondary_fraction: 0.0,
            element: Some(29),
        }
    }

    fn coated_sphere() -> SceneTemplate {
        SceneTemplate::bulk_substrate("copper", copper())
            .with_material("gold", ModelTemplate::Vacuum { min_energy: 10.0 })
            .with_region(RegionTemplate {
                name: "particle".to_string(),
                parent: Some("substrate".to_string()),
                shape: ShapeTemplate::sphere([0.0, 0.0, 2e-6], 1e-6),
                material: "gold".to_string(),
            })
    }

    #[test]
    fn test_bulk_substrate_builds() {
        let scene = SceneTemplate::bulk_substrate("copper", copper()).build().unwrap();
        assert_eq!(scene.regions.len(), 2);
        let substrate = scene.regions.find_by_name("substrate").unwrap();
        assert_eq!(scene.regions.parent(substrate), Some(scene.regions.chamber()));
        assert_eq!(scene.regions.get(substrate).unwrap().model().name(), "copper");
    }

    #[test]
    fn test_nested_regions_and_shared_materials() {
        let scene = coated_sphere().build().unwrap();
        let tree = &scene.regions;
        let particle = tree.find_by_name("particle").unwrap();
        assert_eq!(tree.depth(particle), Some(2));
        assert_eq!(
            tree.containing_sub_region(tree.chamber(), Vec3::new(0.0, 0.0, 2e-6)),
            Some(particle)
        );
        let gold = &scene.materials["gold"];
        assert!(Arc::ptr_eq(tree.get(particle).unwrap().model(), gold));
    }

    #[test]
    fn test_unknown_material() {
        let mut template = coated_sphere();
        template.regions[1].material = "silver".to_string();
        assert!(matches!(template.build(), Err(SceneError::UnknownMaterial(name)) if name == "silver"));
    }

    #[test]
    fn test_parent_must_come_first() {
        let mut template = coated_sphere();
        template.regions.reverse();
        assert!(matches!(template.build(), Err(SceneError::UnknownRegion(name)) if name == "substrate"));
    }

    #[test]
    fn test_bad_model_parameters() {
        let template = SceneTemplate::bulk_substrate(
            "broken",
            ModelTemplate::ConstantLoss {
                mean_free_path: -1.0,
                stopping_power: 1.0,
                deflection_sigma: 0.0,
                min_energy: 50.0,
                secondary_probability: 0.0,
                secondary_fraction: 0.0,
                element: None,
            },
        );
        assert!(matches!(template.build(), Err(SceneError::Model(_))));
    }

    #[test]
    fn test_scene_serialization() {
        let template = coated_sphere();
        let pretty = ron::ser::PrettyConfig::new().struct_names(true);
        let serialized = ron::ser::to_string_pretty(&template, pretty).unwrap();
        let deserialized: SceneTemplate = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, template);
    }

    #[test]
    fn test_parse_scene_file_format() {
        let ron = r#"
            SceneTemplate(
                name: "Silicon",
                materials: [
                    (name: "silicon", model: (type: "ConstantLoss", mean_free_path: 2.0e-8, stopping_power: 1.0e9)),
                ],
                regions: [
                    (name: "wafer", shape: (type: "Substrate"), material: "silicon"),
                ],
            )
        "#;
        let template: SceneTemplate = ron::from_str(ron).unwrap();
        assert_eq!(template.chamber_radius, DEFAULT_CHAMBER_RADIUS);
        match &template.materials[0].model {
            ModelTemplate::ConstantLoss { min_energy, element, .. } => {
                assert_eq!(*min_energy, 50.0);
                assert_eq!(*element, None);
            }
            _ => panic!("Expected ConstantLoss variant"),
        }
        let scene = template.build().unwrap();
        assert!(scene.regions.find_by_name("wafer").is_some());
    }

    #[test]
    fn test_scene_error_display() {
        let err = SceneError::UnknownMaterial("tin".to_string());
        assert_eq!(err.to_string(), "Unknown material: tin");
        let err = SceneError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = SceneTemplate::load("/nonexistent/scene.ron");
        assert!(matches!(result, Err(SceneError::Io(_))));
    }
}
