//! Text renderers for the files of a generated mod project.

use std::fmt::Write as _;

use serde_json::{json, Value};

use super::definitions::{CardDefinition, ModDefinition};
use crate::core::errors::Result;

pub const STS_VERSION: &str = "12-22-2020";
pub const MTS_VERSION: &str = "3.1.0";

const POM_DEPENDENCIES: [(&str, &str, &str, &str); 3] = [
    ("com.megacrit.cardcrawl", "desktop", "1.0", "desktop-1.0.jar"),
    ("basemod", "basemod", "dev", "BaseMod.jar"),
    ("modthespire", "modthespire", "dev", "ModTheSpire.jar"),
];

/// `@SpireInitializer` entry class registering cards, strings and keywords.
pub fn entry_point(definition: &ModDefinition) -> String {
    let class_name = &definition.entry_class_name;
    let mod_id = &definition.mod_id;
    let language = &definition.localization_language;

    let mut cards = String::new();
    for card in &definition.cards {
        let _ = writeln!(cards, "        BaseMod.addCard(new {}());", card.class_name);
    }
    if cards.is_empty() {
        cards.push_str("        // No cards registered yet.\n");
    }

    let mut keywords = String::new();
    for keyword in &definition.keywords {
        let aliases = keyword
            .names()
            .iter()
            .map(|name| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            keywords,
            "        BaseMod.addKeyword(\"{}\", \"{}\", new String[]{{{}}}, \"{}\");",
            mod_id, keyword.proper_name, aliases, keyword.description
        );
    }
    if keywords.is_empty() {
        keywords.push_str("        // No keywords registered yet.\n");
    }

    format!(
        r#"package {package};

import basemod.BaseMod;
import basemod.interfaces.EditCardsSubscriber;
import basemod.interfaces.EditKeywordsSubscriber;
import basemod.interfaces.EditStringsSubscriber;
import com.evacipated.cardcrawl.modthespire.lib.SpireInitializer;
import com.megacrit.cardcrawl.localization.CardStrings;
import com.megacrit.cardcrawl.localization.KeywordStrings;
import {package}.cards.*;

@SpireInitializer
public class {class_name} implements EditCardsSubscriber, EditKeywordsSubscriber, EditStringsSubscriber {{
    public static final String MOD_ID = "{mod_id}";

    public static void initialize() {{
        new {class_name}();
    }}

    public {class_name}() {{
        BaseMod.subscribe(this);
    }}

    @Override
    public void receiveEditCards() {{
{cards}    }}

    @Override
    public void receiveEditStrings() {{
        String cardPath = "{mod_id}/localization/{language}/cards.json";
        String keywordPath = "{mod_id}/localization/{language}/keywords.json";
        BaseMod.loadCustomStringsFile(CardStrings.class, cardPath);
        BaseMod.loadCustomStringsFile(KeywordStrings.class, keywordPath);
    }}

    @Override
    public void receiveEditKeywords() {{
{keywords}    }}
}}
"#,
        package = definition.package,
    )
}

/// `CustomCard` subclass for one card. Upgrade steps are emitted only for
/// non-zero upgrade values.
pub fn card_class(card: &CardDefinition, package: &str, mod_id: &str) -> Result<String> {
    let literals = card.literals()?;
    let class_name = &card.class_name;

    let mut upgrades = String::new();
    if card.upgrade_cost > 0 {
        let _ = writeln!(
            upgrades,
            "            upgradeBaseCost({});",
            card.cost.saturating_sub(card.upgrade_cost).max(0)
        );
    }
    for (amount, method) in [
        (card.upgrade_damage, "upgradeDamage"),
        (card.upgrade_block, "upgradeBlock"),
        (card.upgrade_magic, "upgradeMagicNumber"),
    ] {
        if amount > 0 {
            let _ = writeln!(upgrades, "            {}({});", method, amount);
        }
    }

    Ok(format!(
        r#"package {package};

import basemod.abstracts.CustomCard;
import com.megacrit.cardcrawl.actions.AbstractGameAction;
import com.megacrit.cardcrawl.actions.common.ApplyPowerAction;
import com.megacrit.cardcrawl.actions.common.DamageAction;
import com.megacrit.cardcrawl.actions.common.GainBlockAction;
import com.megacrit.cardcrawl.cards.AbstractCard;
import com.megacrit.cardcrawl.cards.DamageInfo;
import com.megacrit.cardcrawl.characters.AbstractPlayer;
import com.megacrit.cardcrawl.core.CardCrawlGame;
import com.megacrit.cardcrawl.localization.CardStrings;
import com.megacrit.cardcrawl.monsters.AbstractMonster;
import com.megacrit.cardcrawl.powers.StrengthPower;

public class {class_name} extends CustomCard {{
    public static final String ID = "{card_id}";
    private static final CardStrings STRINGS = CardCrawlGame.languagePack.getCardStrings(ID);

    public {class_name}() {{
        super(ID, STRINGS.NAME, makeImagePath("{class_name}.png"), {cost}, STRINGS.DESCRIPTION,
            {card_type}, {color}, {rarity}, {target});
        this.baseDamage = {damage};
        this.baseBlock = {block};
        this.baseMagicNumber = {magic};
        this.magicNumber = this.baseMagicNumber;
    }}

    @Override
    public void use(AbstractPlayer player, AbstractMonster monster) {{
        if (this.baseDamage > 0 && monster != null) {{
            addToBot(new DamageAction(monster, new DamageInfo(player, this.damage, this.damageTypeForTurn),
                AbstractGameAction.AttackEffect.SLASH_DIAGONAL));
        }}
        if (this.baseBlock > 0) {{
            addToBot(new GainBlockAction(player, player, this.block));
        }}
        if (this.baseMagicNumber > 0) {{
            addToBot(new ApplyPowerAction(player, player, new StrengthPower(player, this.magicNumber)));
        }}
    }}

    @Override
    public void upgrade() {{
        if (!this.upgraded) {{
            upgradeName();
{upgrades}        }}
    }}

    @Override
    public AbstractCard makeCopy() {{
        return new {class_name}();
    }}

    private static String makeImagePath(String filename) {{
        return "{mod_id}/images/cards/" + filename;
    }}
}}
"#,
        card_id = card.card_id,
        cost = card.cost,
        card_type = literals.card_type,
        color = literals.color,
        rarity = literals.rarity,
        target = literals.target,
        damage = card.base_damage,
        block = card.base_block,
        magic = card.base_magic,
    ))
}

/// `META-INF/mod.json` contents.
pub fn mod_metadata(definition: &ModDefinition) -> Value {
    json!({
        "modid": definition.mod_id,
        "name": definition.display_name,
        "author_list": [definition.author],
        "description": definition.description,
        "version": definition.version,
        "sts_version": STS_VERSION,
        "mts_version": MTS_VERSION,
        "dependencies": ["basemod"],
    })
}

/// Maven build resolving the game and modding jars from `lib/`.
pub fn pom(definition: &ModDefinition) -> String {
    let mut dependencies = String::new();
    for (group, artifact, version, jar) in POM_DEPENDENCIES {
        let _ = write!(
            dependencies,
            r#"    <dependency>
      <groupId>{group}</groupId>
      <artifactId>{artifact}</artifactId>
      <version>{version}</version>
      <scope>system</scope>
      <systemPath>${{project.basedir}}/lib/{jar}</systemPath>
    </dependency>
"#
        );
    }

    format!(
        r#"<project xmlns="http://maven.apache.org/POM/4.0.0"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xsi:schemaLocation="http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd">
  <modelVersion>4.0.0</modelVersion>
  <groupId>{package}</groupId>
  <artifactId>{mod_id}</artifactId>
  <version>{version}</version>
  <properties>
    <project.build.sourceEncoding>UTF-8</project.build.sourceEncoding>
    <maven.compiler.source>1.8</maven.compiler.source>
    <maven.compiler.target>1.8</maven.compiler.target>
  </properties>
  <dependencies>
{dependencies}  </dependencies>
  <build>
    <plugins>
      <plugin>
        <groupId>org.apache.maven.plugins</groupId>
        <artifactId>maven-compiler-plugin</artifactId>
        <version>3.8.1</version>
        <configuration>
          <source>1.8</source>
          <target>1.8</target>
        </configuration>
      </plugin>
      <plugin>
        <groupId>org.apache.maven.plugins</groupId>
        <artifactId>maven-jar-plugin</artifactId>
        <version>3.2.2</version>
        <configuration>
          <archive>
            <manifestEntries>
              <ModID>{mod_id}</ModID>
            </manifestEntries>
          </archive>
        </configuration>
      </plugin>
    </plugins>
  </build>
</project>
"#,
        package = definition.package,
        mod_id = definition.mod_id,
        version = definition.version,
    )
}

pub fn readme(definition: &ModDefinition) -> String {
    format!(
        "# {}\n\n\
         Generated by STSMODDER for mod ID `{}`.\n\n\
         ## Building\n\n\
         1. Place `desktop-1.0.jar`, `BaseMod.jar`, and `ModTheSpire.jar` into the `lib/` directory.\n\
         2. Run `mvn package`.\n\
         3. Copy the resulting jar from `target/` into your ModTheSpire `mods` directory.\n",
        definition.display_name, definition.mod_id
    )
}

pub const GITIGNORE: &str = "# Generated by STSMODDER\ntarget/\nlib/*.jar\n*.iml\n.idea/\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::definitions::fixtures::{buddy_mod, spark_strike};

    #[test]
    fn test_entry_point_registers_cards_and_keywords() {
        let text = entry_point(&buddy_mod());
        assert!(text.starts_with("package com.buddy.mod;\n"));
        assert!(text.contains("public class BuddyMod implements"));
        assert!(text.contains("BaseMod.addCard(new SparkStrike());"));
        assert!(text.contains(
            r#"BaseMod.addKeyword("buddy", "Spark", new String[]{"spark", "sparks"}, "Sparks your creativity, granting Strength.");"#
        ));
        assert!(text.contains("buddy/localization/eng/cards.json"));
    }

    #[test]
    fn test_entry_point_placeholders() {
        let mut def = buddy_mod();
        def.cards.clear();
        def.keywords.clear();
        let text = entry_point(&def);
        assert!(text.contains("// No cards registered yet."));
        assert!(text.contains("// No keywords registered yet."));
    }

    #[test]
    fn test_card_class() {
        let text = card_class(&spark_strike(), "com.buddy.mod.cards", "buddy").unwrap();
        assert!(text.contains("public class SparkStrike extends CustomCard"));
        assert!(text.contains("AbstractCard.CardType.ATTACK, AbstractCard.CardColor.RED"));
        assert!(text.contains("this.baseDamage = 6;"));
        assert!(text.contains("upgradeDamage(3);"));
        assert!(!text.contains("upgradeBaseCost"));
        assert!(text.contains(r#"return "buddy/images/cards/" + filename;"#));
        assert!(!text.contains("BaseMod"));
    }

    #[test]
    fn test_upgrade_cost_floors_at_zero() {
        let mut card = spark_strike();
        card.cost = i32::MIN;
        card.upgrade_cost = i32::MAX;
        let text = card_class(&card, "com.buddy.mod.cards", "buddy").unwrap();
        assert!(text.contains("upgradeBaseCost(0);"));

        card.cost = 3;
        card.upgrade_cost = 1;
        let text = card_class(&card, "com.buddy.mod.cards", "buddy").unwrap();
        assert!(text.contains("upgradeBaseCost(2);"));
    }

    #[test]
    fn test_pom_and_metadata() {
        let def = buddy_mod();
        let pom = pom(&def);
        assert!(pom.contains("<artifactId>buddy</artifactId>"));
        assert!(pom.contains("${project.basedir}/lib/desktop-1.0.jar"));
        let meta = mod_metadata(&def);
        assert_eq!(meta["sts_version"], "12-22-2020");
        assert_eq!(meta["author_list"], json!(["Best Bud"]));
    }
}
