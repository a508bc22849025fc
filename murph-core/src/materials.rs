//! Material configuration loader.
//!
//! Loads restitution and friction from YAML files so surfaces can be tuned
//! without recompiling. One file per material:
//!
//! ```text
//! materials/
//! ├── elastic.yaml
//! ├── ice.yaml
//! ├── rubber.yaml
//! └── ...
//! ```
//!
//! ```yaml
//! restitution: 0.8
//! friction: 0.9
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PhysicsError, Result};
use crate::types::Material;

/// Material loader with configurable base directory.
#[derive(Debug, Clone)]
pub struct MaterialLoader {
    base_path: PathBuf,
}

impl MaterialLoader {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Loads and validates a material by name (without `.yaml` extension).
    ///
    /// # Example
    /// ```ignore
    /// let loader = MaterialLoader::new("materials");
    /// let ice = loader.load("ice")?;
    /// ```
    pub fn load(&self, name: &str) -> Result<Material> {
        let path = self.base_path.join(format!("{}.yaml", name));
        if !path.exists() {
            return Err(PhysicsError::MaterialNotFound(name.to_string()));
        }
        let contents = fs::read_to_string(&path)?;
        let material: Material = serde_yaml::from_str(&contents)?;
        material.validate()?;
        debug!(name, ?material, "loaded material");
        Ok(material)
    }

    /// Names of every material file in the base directory, sorted.
    ///
    /// A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".yaml") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn materials_path() -> PathBuf {
        let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(manifest_dir).join("..").join("materials")
    }

    #[test]
    fn test_load_existing_material() {
        let loader = MaterialLoader::new(materials_path());
        let result = loader.load("rubber");

        assert!(result.is_ok(), "Should load rubber: {:?}", result.err());
        let rubber = result.unwrap();
        assert_eq!(rubber, Material::rubber());
    }

    #[test]
    fn test_shipped_presets_match_constructors() {
        let loader = MaterialLoader::new(materials_path());
        assert_eq!(loader.load("steel").unwrap(), Material::steel());
        assert_eq!(loader.load("ice").unwrap(), Material::ice());
        assert_eq!(loader.load("elastic").unwrap(), Material::elastic());
    }

    #[test]
    fn test_load_nonexistent_material() {
        let loader = MaterialLoader::new(materials_path());
        match loader.load("nonexistent_material_xyz") {
            Err(PhysicsError::MaterialNotFound(name)) => {
                assert_eq!(name, "nonexistent_material_xyz");
            }
            other => panic!("Expected MaterialNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_material_is_rejected() {
        let dir = env::temp_dir().join(format!("murph-materials-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bouncy.yaml"), "restitution: 1.5\nfriction: 0.1\n").unwrap();

        let result = MaterialLoader::new(&dir).load("bouncy");
        fs::remove_dir_all(&dir).unwrap();
        assert!(matches!(result, Err(PhysicsError::InvalidMaterial { .. })));
    }

    #[test]
    fn test_list_materials() {
        let loader = MaterialLoader::new(materials_path());
        let names = loader.list().unwrap();

        assert_eq!(names, vec!["elastic", "ice", "rubber", "steel", "wood"]);
    }

    #[test]
    fn test_list_missing_directory_is_empty() {
        let loader = MaterialLoader::new("/nonexistent/murph/materials");
        assert!(loader.list().unwrap().is_empty());
    }
}
