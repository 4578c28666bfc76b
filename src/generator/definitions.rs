//! Form-authored descriptions of a mod, its cards and keywords.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::errors::{Result, StsmError};

lazy_static::lazy_static! {
    static ref MOD_ID: Regex = Regex::new(r"^[a-z0-9_.-]+$").expect("valid mod id pattern");
    static ref JAVA_PACKAGE: Regex =
        Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*$").expect("valid package pattern");
    static ref CLASS_NAME: Regex = Regex::new(r"^[A-Z][A-Za-z0-9_]*$").expect("valid class pattern");
}

const CARD_TYPES: [&str; 5] = ["ATTACK", "SKILL", "POWER", "STATUS", "CURSE"];
const CARD_RARITIES: [&str; 6] = ["BASIC", "COMMON", "UNCOMMON", "RARE", "SPECIAL", "CURSE"];
const CARD_TARGETS: [&str; 6] = ["ENEMY", "ALL_ENEMY", "SELF", "SELF_AND_ENEMY", "NONE", "ALL"];
const CARD_COLORS: [&str; 6] = ["RED", "GREEN", "BLUE", "PURPLE", "COLORLESS", "CURSE"];

/// Resolve a card attribute to its `AbstractCard.<Enum>.<VALUE>` literal.
fn card_literal(table: &[&str], enum_name: &str, key: &str) -> Result<String> {
    let upper = key.to_ascii_uppercase();
    if table.contains(&upper.as_str()) {
        Ok(format!("AbstractCard.{}.{}", enum_name, upper))
    } else {
        Err(StsmError::generation(format!("Unsupported card attribute '{}'", key)).with_context("enum", enum_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordDefinition {
    pub name: String,
    pub description: String,
    pub proper_name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default = "default_true")]
    pub positive: bool,
    #[serde(default)]
    pub prefix: bool,
}

fn default_true() -> bool {
    true
}

impl KeywordDefinition {
    pub fn new(name: impl Into<String>, proper_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            proper_name: proper_name.into(),
            aliases: Vec::new(),
            positive: true,
            prefix: false,
        }
    }

    /// Lower-cased name plus aliases, sorted and deduplicated.
    pub fn names(&self) -> Vec<String> {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .map(|name| name.to_lowercase())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Entry for `keywords.json`.
    pub fn to_resource(&self) -> Value {
        let mut resource = Map::new();
        resource.insert("PROPER_NAME".into(), json!(self.proper_name));
        resource.insert("NAMES".into(), json!(self.names()));
        resource.insert("DESCRIPTION".into(), json!(self.description));
        if !self.positive {
            resource.insert("IS_POSITIVE".into(), json!(false));
        }
        if self.prefix {
            resource.insert("IS_PREFIX".into(), json!(true));
        }
        Value::Object(resource)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub card_id: String,
    pub class_name: String,
    pub name: String,
    pub description: String,
    pub upgrade_description: String,
    pub card_type: String,
    pub rarity: String,
    pub target: String,
    pub color: String,
    pub cost: i32,
    #[serde(default)]
    pub base_damage: i32,
    #[serde(default)]
    pub base_block: i32,
    #[serde(default)]
    pub base_magic: i32,
    #[serde(default)]
    pub upgrade_damage: i32,
    #[serde(default)]
    pub upgrade_block: i32,
    #[serde(default)]
    pub upgrade_magic: i32,
    #[serde(default)]
    pub upgrade_cost: i32,
}

/// Resolved enum literals of a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLiterals {
    pub card_type: String,
    pub rarity: String,
    pub target: String,
    pub color: String,
}

impl CardDefinition {
    pub fn literals(&self) -> Result<CardLiterals> {
        Ok(CardLiterals {
            card_type: card_literal(&CARD_TYPES, "CardType", &self.card_type)?,
            rarity: card_literal(&CARD_RARITIES, "CardRarity", &self.rarity)?,
            target: card_literal(&CARD_TARGETS, "CardTarget", &self.target)?,
            color: card_literal(&CARD_COLORS, "CardColor", &self.color)?,
        })
    }

    /// Entry for the card strings localization file.
    pub fn to_localization(&self) -> (String, Value) {
        (
            self.card_id.clone(),
            json!({
                "NAME": self.name,
                "DESCRIPTION": self.description,
                "UPGRADE_DESCRIPTION": self.upgrade_description,
            }),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModDefinition {
    pub mod_id: String,
    pub package: String,
    pub entry_class_name: String,
    pub display_name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    #[serde(default)]
    pub cards: Vec<CardDefinition>,
    #[serde(default)]
    pub keywords: Vec<KeywordDefinition>,
    #[serde(default = "default_language")]
    pub localization_language: String,
}

fn default_language() -> String {
    "eng".to_string()
}

impl ModDefinition {
    /// Check identifiers and card attributes before anything is written.
    pub fn validate(&self) -> Result<()> {
        if !MOD_ID.is_match(&self.mod_id) {
            return Err(StsmError::generation(
                "mod_id must use lowercase letters, digits, '_', '.', or '-' only",
            )
            .with_context("mod_id", &self.mod_id));
        }
        if !JAVA_PACKAGE.is_match(&self.package) {
            return Err(StsmError::generation("package must be a valid Java package identifier")
                .with_context("package", &self.package));
        }
        if !CLASS_NAME.is_match(&self.entry_class_name) {
            return Err(StsmError::generation("Entry class must be a valid PascalCase Java class name")
                .with_context("entry_class_name", &self.entry_class_name));
        }
        let namespace = format!("{}:", self.mod_id);
        for card in &self.cards {
            if !card.card_id.starts_with(&namespace) {
                return Err(StsmError::generation(format!(
                    "Card ID {} must share the mod namespace '{}'",
                    card.card_id, self.mod_id
                ))
                .with_context("card_id", &card.card_id));
            }
            if !CLASS_NAME.is_match(&card.class_name) {
                return Err(StsmError::generation(format!("Card class {} must be PascalCase", card.class_name))
                    .with_context("card_id", &card.card_id));
            }
            card.literals()
                .map_err(|err| err.with_context("card_id", &card.card_id))?;
        }
        if self.keywords.iter().any(|keyword| keyword.name.is_empty()) {
            return Err(StsmError::generation("Keywords must define a base name"));
        }
        Ok(())
    }

    pub fn keyword_resources(&self) -> Vec<Value> {
        self.keywords.iter().map(KeywordDefinition::to_resource).collect()
    }

    pub fn card_strings(&self) -> IndexMap<String, Value> {
        self.cards.iter().map(CardDefinition::to_localization).collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn spark_strike() -> CardDefinition {
        CardDefinition {
            card_id: "buddy:SparkStrike".into(),
            class_name: "SparkStrike".into(),
            name: "Spark Strike".into(),
            description: "Deal !D! damage and gain !B! Block.".into(),
            upgrade_description: "Deal !D! damage and gain !B! Block.".into(),
            card_type: "ATTACK".into(),
            rarity: "COMMON".into(),
            target: "ENEMY".into(),
            color: "RED".into(),
            cost: 1,
            base_damage: 6,
            base_block: 4,
            base_magic: 1,
            upgrade_damage: 3,
            upgrade_block: 2,
            upgrade_magic: 1,
            upgrade_cost: 0,
        }
    }

    pub fn buddy_mod() -> ModDefinition {
        let mut spark = KeywordDefinition::new("spark", "Spark", "Sparks your creativity, granting Strength.");
        spark.aliases.push("sparks".into());
        ModDefinition {
            mod_id: "buddy".into(),
            package: "com.buddy.mod".into(),
            entry_class_name: "BuddyMod".into(),
            display_name: "Buddy Mod".into(),
            author: "Best Bud".into(),
            version: "1.0.0".into(),
            description: "A friendly mod built entirely by automation.".into(),
            cards: vec![spark_strike()],
            keywords: vec![spark],
            localization_language: default_language(),
        }
    }
}
