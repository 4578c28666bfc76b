use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};

use super::definitions::{CardDefinition, KeywordDefinition, ModDefinition};
use super::templates;
use crate::core::errors::{Result, StsmError};
use crate::events::{MOD_GENERATION_POST, MOD_GENERATION_PRE};
use crate::manager::PluginManager;
use crate::registry::{Namespace, Symbol};

pub const MODULE_ID: &str = "generator";
pub const ORCHESTRATOR_SYMBOL: &str = "generator.orchestrator";
/// Output root used when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "generated_mods";

const ASSET_DIRS: [&str; 5] = ["cards", "relics", "powers", "orbs", "ui"];
const KEEP_FILE: &str = ".gitkeep";

/// Turns a [`ModDefinition`] into a buildable mod project on disk.
pub struct ModOrchestrator {
    manager: Arc<PluginManager>,
    base_output: PathBuf,
}

impl ModOrchestrator {
    pub fn new(manager: Arc<PluginManager>, base_output: Option<PathBuf>) -> Result<Arc<Self>> {
        let base_output = absolute(&base_output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)))?;
        create_dir(&base_output)?;

        let orchestrator = Arc::new(Self { manager, base_output });
        let namespace = Namespace::for_module(MODULE_ID)
            .class::<ModOrchestrator>("ModOrchestrator")
            .class::<ModDefinition>("ModDefinition")
            .class::<CardDefinition>("CardDefinition")
            .class::<KeywordDefinition>("KeywordDefinition");
        orchestrator.manager.register_module(MODULE_ID, &namespace)?;
        orchestrator
            .manager
            .register_symbol(ORCHESTRATOR_SYMBOL, Symbol::shared(orchestrator.clone()))?;
        Ok(orchestrator)
    }

    pub fn base_output(&self) -> &Path {
        &self.base_output
    }

    /// Generate the project, by default under `<base_output>/<mod_id>`.
    ///
    /// An existing destination is an error unless `overwrite` is set, in which
    /// case it is replaced. A failed write leaves no output directory behind.
    pub fn generate_mod(
        &self,
        definition: &ModDefinition,
        destination: Option<&Path>,
        overwrite: bool,
    ) -> Result<PathBuf> {
        definition.validate()?;

        let output_dir = match destination {
            Some(path) => absolute(path)?,
            None => self.base_output.join(&definition.mod_id),
        };
        if output_dir.exists() {
            if !overwrite {
                return Err(StsmError::generation(format!(
                    "Destination {} already exists",
                    output_dir.display()
                )));
            }
            fs::remove_dir_all(&output_dir)
                .map_err(|err| StsmError::io(format!("remove {}", output_dir.display()), err))?;
        }
        create_dir(&output_dir)?;

        info!("Generating mod {} at {}", definition.mod_id, output_dir.display());
        let payload = json!({
            "definition": serde_json::to_value(definition)?,
            "destination": output_dir.to_string_lossy(),
        });
        self.manager.dispatch_event(MOD_GENERATION_PRE, &payload);

        if let Err(err) = write_project(&output_dir, definition) {
            if let Err(cleanup) = fs::remove_dir_all(&output_dir) {
                warn!("Failed to remove partial output {}: {}", output_dir.display(), cleanup);
            }
            return Err(err);
        }

        self.manager.dispatch_event(MOD_GENERATION_POST, &payload);
        Ok(output_dir)
    }
}

fn write_project(base: &Path, definition: &ModDefinition) -> Result<()> {
    let java_dir = definition
        .package
        .split('.')
        .fold(base.join("src").join("main").join("java"), |dir, part| dir.join(part));
    let resource_dir = base.join("src").join("main").join("resources");
    let mod_resources = resource_dir.join(&definition.mod_id);
    let localization_dir = mod_resources
        .join("localization")
        .join(&definition.localization_language);

    write_file(
        &java_dir.join(format!("{}.java", definition.entry_class_name)),
        &templates::entry_point(definition),
    )?;

    let card_package = format!("{}.cards", definition.package);
    let cards_dir = java_dir.join("cards");
    create_dir(&cards_dir)?;
    for card in &definition.cards {
        let source = templates::card_class(card, &card_package, &definition.mod_id)?;
        write_file(&cards_dir.join(format!("{}.java", card.class_name)), &source)?;
    }

    write_json(
        &resource_dir.join("META-INF").join("mod.json"),
        &templates::mod_metadata(definition),
    )?;

    let keywords = Value::from(definition.keyword_resources());
    write_json(&mod_resources.join("keywords.json"), &keywords)?;
    write_json(&localization_dir.join("keywords.json"), &keywords)?;
    write_json(&localization_dir.join("cards.json"), &json!(definition.card_strings()))?;

    for asset in ASSET_DIRS {
        write_file(&mod_resources.join("images").join(asset).join(KEEP_FILE), "")?;
    }

    write_file(&base.join("pom.xml"), &templates::pom(definition))?;
    write_file(&base.join("lib").join(KEEP_FILE), "")?;
    write_file(&base.join("README.md"), &templates::readme(definition))?;
    write_file(&base.join(".gitignore"), templates::GITIGNORE)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|err| StsmError::io("resolve working directory", err))?;
    Ok(cwd.join(path))
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| StsmError::io(format!("create {}", dir.display()), err))
}

/// Write `contents`, creating parent directories.
fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }
    fs::write(path, contents).map_err(|err| StsmError::io(format!("write {}", path.display()), err))
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    write_file(path, &serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::definitions::fixtures::buddy_mod;
    use pretty_assertions::assert_eq;

    fn orchestrator(root: &Path) -> Arc<ModOrchestrator> {
        ModOrchestrator::new(Arc::new(PluginManager::new()), Some(root.join("out"))).unwrap()
    }

    #[test]
    fn test_default_destination_under_base_output() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path());
        let output = orchestrator.generate_mod(&buddy_mod(), None, false).unwrap();
        assert_eq!(output, dir.path().join("out").join("buddy"));
        assert!(output.join("lib").join(".gitkeep").exists());
        assert!(output.join(".gitignore").exists());
    }

    #[test]
    fn test_existing_destination_requires_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path());
        let target = dir.path().join("BuddyMod");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("stale.txt"), "old").unwrap();

        let err = orchestrator.generate_mod(&buddy_mod(), Some(&target), false).unwrap_err();
        assert!(matches!(err, StsmError::Generation { .. }));
        assert!(target.join("stale.txt").exists());

        orchestrator.generate_mod(&buddy_mod(), Some(&target), true).unwrap();
        assert!(!target.join("stale.txt").exists());
        assert!(target.join("pom.xml").exists());
    }

    #[test]
    fn test_invalid_definition_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(dir.path());
        let mut def = buddy_mod();
        def.cards[0].target = "NOBODY".into();
        let target = dir.path().join("bad");
        assert!(orchestrator.generate_mod(&def, Some(&target), true).is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_registers_symbol() {
        let dir = tempfile::tempdir().unwrap();
        let manager = Arc::new(PluginManager::new());
        let orchestrator = ModOrchestrator::new(manager.clone(), Some(dir.path().to_path_buf())).unwrap();
        let found = manager
            .get_symbol(ORCHESTRATOR_SYMBOL)
            .unwrap()
            .downcast_arc::<ModOrchestrator>()
            .unwrap();
        assert!(Arc::ptr_eq(&found, &orchestrator));
        assert!(manager.export_registry()[MODULE_ID].contains_key("ModDefinition"));
    }
}
