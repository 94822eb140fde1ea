//! Rule document loading: permissive parsing, reference resolution, load
//! order and reload semantics.

mod common;

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{fixture, recording_executors, test_config};
use reactor_engine::Engine;
use reactor_engine::form::FormType;
use reactor_engine::loader::document::MAX_COUNT;
use reactor_engine::loader::{self, LoadStats, parse_document};
use reactor_engine::rules::{AttackType, EffectKind, EventKind, RuleContext, WeaponType};

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

#[derive(Clone, Default)]
struct LogSink(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with warnings and errors captured as plain text.
fn captured_warnings(f: impl FnOnce()) -> String {
    let sink = LogSink::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = sink.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Single documents
// ---------------------------------------------------------------------------

#[test]
fn full_rule_parses_every_field() {
    let f = fixture();
    let doc = r#"[{
        "event": ["Hit", "activate"],
        "filter": {
            "formTypes": ["Container", "activator"],
            "formIDs": ["Test.esp:0x800"],
            "keywords": ["Test.esp:0x809"],
            "chance": 40,
            "interactions": 2,
            "weaponsTypes": ["Sword", "Bow"],
            "weapons": ["Test.esp:0x803"],
            "projectiles": ["Test.esp:0x805"],
            "attacks": ["Power", "Sneak"]
        },
        "effect": [
            { "type": "SpawnItem", "formID": "Test.esp:0x808", "count": 3 },
            { "type": "Nudge", "duration": 2.5 }
        ]
    }]"#;

    let parsed = parse_document("full.json", doc, f.host.as_ref()).unwrap();
    assert_eq!(parsed.skipped, 0);
    let rule = &parsed.rules[0];

    assert_eq!(rule.events, vec![EventKind::Hit, EventKind::Activate]);
    assert_eq!(rule.source, "full.json");

    let filter = &rule.filter;
    assert!(filter.form_types.contains(&FormType::Container));
    assert!(filter.form_types.contains(&FormType::Activator));
    assert!(filter.form_ids.contains(&f.chest.id));
    assert_eq!(filter.keywords, vec![f.keyword_metal.id]);
    assert_eq!(filter.chance, 40.0);
    assert_eq!(filter.interactions, 2);
    assert!(filter.weapon_types.contains(&WeaponType::Sword));
    assert!(filter.weapon_types.contains(&WeaponType::Bow));
    assert!(filter.weapons.contains(&f.sword.id));
    assert!(filter.projectiles.contains(&f.arrow.id));
    assert!(filter.attacks.contains(&AttackType::Power));
    assert!(filter.attacks.contains(&AttackType::Sneak));

    assert_eq!(rule.effects.len(), 2);
    assert_eq!(rule.effects[0].kind, EffectKind::SpawnItem);
    assert_eq!(rule.effects[0].form, Some(f.gold.id));
    assert_eq!(rule.effects[0].count, 3);
    assert_eq!(rule.effects[1].kind, EffectKind::Nudge);
    assert_eq!(rule.effects[1].duration, Duration::from_millis(2500));
}

#[test]
fn defaults_apply_when_fields_are_absent() {
    let f = fixture();
    let doc = r#"[{ "event": "Activate", "effect": [{ "type": "Dispose" }, { "type": "Nudge" }] }]"#;

    let parsed = parse_document("defaults.json", doc, f.host.as_ref()).unwrap();
    let rule = &parsed.rules[0];
    assert!(rule.filter.form_types.is_empty());
    assert_eq!(rule.filter.chance, 100.0);
    assert_eq!(rule.filter.interactions, 0);
    assert_eq!(rule.effects[0].chance, 100.0);
    assert_eq!(rule.effects[0].count, 1);
    assert_eq!(rule.effects[1].duration, Duration::from_secs(1));
}

#[test]
fn rule_level_chance_is_inherited_and_overridable() {
    let f = fixture();
    let doc = r#"[{
        "event": "Activate",
        "chance": 25,
        "effect": [
            { "type": "Dispose" },
            { "type": "PlaySound", "formID": "Test.esp:0x807", "chance": 80 },
            { "type": "Dispose", "chance": 250 }
        ]
    }]"#;

    let rule = &parse_document("chance.json", doc, f.host.as_ref()).unwrap().rules[0];
    let chances: Vec<f32> = rule.effects.iter().map(|e| e.chance).collect();
    assert_eq!(chances, vec![25.0, 80.0, 100.0]);
}

#[test]
fn zero_count_falls_back_to_one() {
    let f = fixture();
    let doc = r#"[{ "event": "Activate", "effect": { "type": "SpawnItem", "formID": "Test.esp:0x808", "count": 0 } }]"#;
    let rule = &parse_document("count.json", doc, f.host.as_ref()).unwrap().rules[0];
    assert_eq!(rule.effects[0].count, 1);
}

#[test]
fn oversized_counts_fall_back_to_one() {
    let f = fixture();
    let doc = r#"[{
        "event": "Activate",
        "filter": { "interactions": 1000000000000 },
        "effect": [
            { "type": "SpawnItem", "formID": "Test.esp:0x808", "count": 1000000000000 },
            { "type": "SpawnItem", "formID": "Test.esp:0x808", "count": 1001 },
            { "type": "SpawnItem", "formID": "Test.esp:0x808", "count": 1000 },
            { "type": "SpawnMultipleItems", "items": [{ "formID": "Test.esp:0x808", "count": 5000 }] }
        ]
    }]"#;

    let rule = &parse_document("huge.json", doc, f.host.as_ref()).unwrap().rules[0];
    let counts: Vec<u32> = rule.effects.iter().take(3).map(|e| e.count).collect();
    assert_eq!(counts, vec![1, 1, MAX_COUNT]);
    assert_eq!(rule.effects[3].items[0].count, 1);
    assert_eq!(rule.filter.interactions, 0);
}

#[test]
fn weapon_types_alias_is_accepted() {
    let f = fixture();
    let doc = r#"[{ "event": "Hit", "filter": { "weaponTypes": "Mace" }, "effect": { "type": "Dispose" } }]"#;
    let rule = &parse_document("alias.json", doc, f.host.as_ref()).unwrap().rules[0];
    assert!(rule.filter.weapon_types.contains(&WeaponType::Mace));
}

#[test]
fn item_lists_resolve_and_skip_bad_entries() {
    let f = fixture();
    let doc = r#"[{
        "event": "Activate",
        "effect": {
            "type": "SpawnMultipleItems",
            "items": [
                { "formID": "Test.esp:0x808", "count": 5 },
                { "formID": "Test.esp:0x807" },
                { "formID": "Missing.esp:0x1" },
                { "formID": "Test.esp:0x803" }
            ]
        }
    }]"#;

    let rule = &parse_document("items.json", doc, f.host.as_ref()).unwrap().rules[0];
    let items: Vec<(u32, u32)> = rule.effects[0].items.iter().map(|i| (i.form.0, i.count)).collect();
    assert_eq!(items, vec![(f.gold.id.0, 5), (f.sword.id.0, 1)]);
}

// ---------------------------------------------------------------------------
// Partial failure
// ---------------------------------------------------------------------------

#[test]
fn bad_keyword_is_dropped_but_rule_survives() {
    let f = fixture();
    let doc = r#"[{
        "event": "Activate",
        "filter": { "keywords": ["Test.esp:0x809", "Nowhere.esp:0x10", "garbage"] },
        "effect": { "type": "Dispose" }
    }]"#;

    let parsed = parse_document("keywords.json", doc, f.host.as_ref()).unwrap();
    assert_eq!(parsed.rules.len(), 1);
    assert_eq!(parsed.rules[0].filter.keywords, vec![f.keyword_metal.id]);
}

#[test]
fn filter_field_with_no_usable_entries_drops_the_rule() {
    let f = fixture();
    let doc = r#"[
        { "event": "Activate", "filter": { "formIDs": ["Typo.esp:0x800"] }, "effect": { "type": "Dispose" } },
        { "event": "Activate", "filter": { "formIDs": ["Typo.esp:0x800", "Test.esp:0x800"] }, "effect": { "type": "Dispose" } },
        { "event": "Activate", "filter": { "keywords": ["Test.esp:0x800"] }, "effect": { "type": "Dispose" } },
        { "event": "Activate", "filter": { "formTypes": ["Contianer"] }, "effect": { "type": "Dispose" } },
        { "event": "Hit", "filter": { "weapons": ["Test.esp:0x805"] }, "effect": { "type": "Dispose" } },
        { "event": "Hit", "filter": { "attacks": "Headbutt" }, "effect": { "type": "Dispose" } },
        { "event": "Activate", "filter": { "formIDs": [] }, "effect": { "type": "PlaySound", "formID": "Test.esp:0x807" } }
    ]"#;

    let parsed = parse_document("typos.json", doc, f.host.as_ref()).unwrap();
    assert_eq!(parsed.skipped, 5);
    assert_eq!(parsed.rules.len(), 2);
    assert!(parsed.rules[0].filter.form_ids.contains(&f.chest.id));
    assert!(parsed.rules[1].filter.form_ids.is_empty());

    // A lever matches neither surviving chest rule nor a typo-widened one.
    let (executors, _) = recording_executors();
    let engine = Engine::new(f.host.clone(), test_config(), executors);
    engine.install(parsed.rules);
    let lever = f.world.place(f.lever, &[]);
    let ctx = RuleContext::new(EventKind::Activate, None, lever).unwrap();
    assert_eq!(engine.trigger(&ctx), 1);
    assert_eq!(engine.pending()[0].effect.kind, EffectKind::PlaySound);
}

#[test]
fn hit_filters_on_mixed_event_rules_are_flagged() {
    let f = fixture();
    let doc = r#"[
        { "event": ["Hit", "Activate"], "filter": { "weaponsTypes": "Mace" }, "effect": { "type": "Dispose" } },
        { "event": "Hit", "filter": { "weaponsTypes": "Mace" }, "effect": { "type": "Dispose" } }
    ]"#;

    let mut parsed = None;
    let logs = captured_warnings(|| parsed = Some(parse_document("mixed.json", doc, f.host.as_ref()).unwrap()));
    assert_eq!(parsed.unwrap().rules.len(), 2);
    assert!(logs.contains("mixed.json rule #0"), "{logs}");
    assert!(logs.contains("only narrow Hit"), "{logs}");
    assert!(!logs.contains("mixed.json rule #1"), "{logs}");
}

#[test]
fn rule_whose_only_effect_fails_to_resolve_is_dropped() {
    let f = fixture();
    let doc = r#"[
        { "event": "Activate", "effect": { "type": "SpawnItem", "formID": "Nowhere.esp:0x10" } },
        { "event": "Activate", "effect": { "type": "PlaySound", "formID": "Test.esp:0x808" } },
        { "event": "Activate", "effect": { "type": "PlaySound" } },
        { "event": "Activate", "effect": [
            { "type": "PlaySound", "formID": "Test.esp:0x807" },
            { "type": "SpawnItem", "formID": "Nowhere.esp:0x10" }
        ] }
    ]"#;

    let parsed = parse_document("effects.json", doc, f.host.as_ref()).unwrap();
    assert_eq!(parsed.skipped, 3);
    assert_eq!(parsed.rules.len(), 1);
    assert_eq!(parsed.rules[0].effects.len(), 1);
    assert_eq!(parsed.rules[0].effects[0].kind, EffectKind::PlaySound);
}

#[test]
fn rules_without_recognized_events_are_rejected() {
    let f = fixture();
    let doc = r#"[
        { "effect": { "type": "Dispose" } },
        { "event": [], "effect": { "type": "Dispose" } },
        { "event": ["Sneeze"], "effect": { "type": "Dispose" } },
        { "event": ["Sneeze", "Grab"], "effect": { "type": "Dispose" } },
        "not an object",
        { "event": "Activate", "effect": { "type": "Teleport" } }
    ]"#;

    let parsed = parse_document("events.json", doc, f.host.as_ref()).unwrap();
    assert_eq!(parsed.rules.len(), 1);
    assert_eq!(parsed.rules[0].events, vec![EventKind::Grab]);
    assert_eq!(parsed.skipped, 5);
}

#[test]
fn broken_documents_are_errors() {
    let f = fixture();
    assert!(parse_document("broken.json", "[{", f.host.as_ref()).is_err());
    assert!(parse_document("object.json", r#"{"event":"Activate"}"#, f.host.as_ref()).is_err());
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

#[test]
fn directory_scan_is_recursive_and_sorted() {
    let f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "b.json", r#"[{ "event": "Activate", "effect": { "type": "PlaySound", "formID": "Test.esp:0x807" } }]"#);
    write(root, "a/nested.json", r#"[{ "event": "Hit", "effect": { "type": "Dispose" } }]"#);
    write(root, "c.json", "this is not json");
    write(root, "d.json", r#"{ "not": "an array" }"#);
    write(root, "notes.txt", "ignored");
    write(root, "e.JSON", r#"[{ "event": "Grab", "effect": { "type": "Nudge" } }]"#);

    let report = loader::load_dir(root, f.host.as_ref());
    assert_eq!(
        report.stats,
        LoadStats {
            documents: 5,
            skipped_documents: 2,
            rules: 3,
            skipped_rules: 0,
        }
    );

    let sources: Vec<&str> = report.rules.iter().map(|r| r.source.as_str()).collect();
    let nested = Path::new("a").join("nested.json").display().to_string();
    assert_eq!(sources, vec![nested.as_str(), "b.json", "e.JSON"]);
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_not_followed() {
    use std::os::unix::fs::symlink;

    let f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let rule = r#"[{ "event": "Activate", "effect": { "type": "Dispose" } }]"#;

    write(root, "a.json", rule);
    write(root, "sub/b.json", rule);
    symlink(root, root.join("loop")).unwrap();
    symlink(root.join("sub"), root.join("alias")).unwrap();
    // Linked files are still documents.
    symlink(root.join("a.json"), root.join("z.json")).unwrap();

    let report = loader::load_dir(root, f.host.as_ref());
    assert_eq!(
        report.stats,
        LoadStats {
            documents: 3,
            skipped_documents: 0,
            rules: 3,
            skipped_rules: 0,
        }
    );
}

#[test]
fn missing_root_loads_nothing() {
    let f = fixture();
    let dir = tempfile::tempdir().unwrap();
    let report = loader::load_dir(&dir.path().join("absent"), f.host.as_ref());
    assert!(report.rules.is_empty());
    assert_eq!(report.stats, LoadStats::default());
}

#[test]
fn reload_is_idempotent() {
    let f = fixture();
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "rules.json",
        r#"[
            { "event": "Activate", "effect": { "type": "PlaySound", "formID": "Test.esp:0x807" } },
            { "event": ["Hit", "Activate"], "filter": { "formTypes": "Container" }, "effect": { "type": "Dispose" } }
        ]"#,
    );

    let (executors, _) = recording_executors();
    let engine = Engine::new(f.host.clone(), test_config(), executors);

    let chest = f.world.place(f.chest, &[]);
    let ctx = RuleContext::new(EventKind::Activate, None, chest).unwrap();
    let fired_after = |engine: &Engine<common::MockHost>| {
        engine.trigger(&ctx);
        let kinds: Vec<EffectKind> = engine.pending().iter().map(|t| t.effect.kind).collect();
        engine.run_deferred();
        kinds
    };

    let first = engine.reload(dir.path());
    let gen_one = engine.generation();
    let first_kinds = fired_after(&engine);
    let second = engine.reload(dir.path());
    let second_kinds = fired_after(&engine);

    assert_eq!(first, second);
    assert_eq!(first_kinds, vec![EffectKind::PlaySound, EffectKind::Dispose]);
    assert_eq!(second_kinds, first_kinds);
    assert_eq!(engine.rule_count(), 2);
    assert_eq!(engine.generation(), gen_one + 1);
    assert_eq!(engine.metrics().reloads, 2);
}

#[test]
fn reload_swaps_the_rule_set() {
    let f = fixture();
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "rules.json", r#"[{ "event": "Activate", "effect": { "type": "Dispose" } }]"#);

    let (executors, _) = recording_executors();
    let engine = Engine::new(f.host.clone(), test_config(), executors);
    engine.reload(dir.path());
    assert_eq!(engine.rule_count(), 1);

    fs::remove_file(dir.path().join("rules.json")).unwrap();
    engine.reload(dir.path());
    assert_eq!(engine.rule_count(), 0);
}
