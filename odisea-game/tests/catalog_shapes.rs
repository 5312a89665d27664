use std::collections::HashSet;

use odisea_game::{CardCatalog, CardKind, CatalogData, RulesConfig, normalize_name};

#[test]
fn bundled_catalog_ids_follow_the_kind_prefix() {
    let catalog = CardCatalog::load_from_static();
    assert!(!catalog.is_empty());
    let mut seen = HashSet::new();
    for card in catalog.iter() {
        let (prefix, suffix) = card.id.as_str().split_once('-').unwrap();
        assert_eq!(prefix.parse::<CardKind>(), Ok(card.kind), "{}", card.id);
        assert!(!suffix.is_empty(), "{}", card.id);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'),
            "{}",
            card.id
        );
        assert!(seen.insert(card.id.clone()), "duplicate {}", card.id);
        assert!(!card.name.is_empty());
    }
}

#[test]
fn bundled_characters_have_rollable_conflict_values() {
    let catalog = CardCatalog::load_from_static();
    let characters: Vec<_> = catalog.of_kind(CardKind::Character).collect();
    assert!(characters.len() >= 10);
    for card in characters {
        assert!(
            (1..=6).contains(&card.conflict_value),
            "{} has conflict {}",
            card.name,
            card.conflict_value
        );
    }
    for card in catalog
        .iter()
        .filter(|card| card.kind != CardKind::Character)
    {
        assert_eq!(card.conflict_value, 0, "{}", card.name);
    }
}

#[test]
fn only_characters_and_events_are_dealt() {
    let catalog = CardCatalog::load_from_static();
    let deck = catalog.deck_ids();
    assert_eq!(
        deck.len(),
        catalog.of_kind(CardKind::Character).count() + catalog.of_kind(CardKind::Event).count()
    );
    assert!(deck.iter().all(|id| {
        catalog
            .get(id)
            .is_some_and(|card| card.kind.is_deck_kind())
    }));
    assert_eq!(catalog.initiative_ids().len(), 4);
    assert_eq!(catalog.talent_ids().len(), 4);
}

#[test]
fn names_without_source_ids_use_the_normalized_form() {
    let data = CatalogData::from_json(include_str!("../assets/catalog.json")).unwrap();
    let catalog = CardCatalog::build(&data).unwrap();
    for (name, _) in &data.events {
        let id = format!("event-{}", normalize_name(name));
        assert!(catalog.get(&id.as_str().into()).is_some(), "{id}");
    }
    assert!(catalog.get(&"event-senal_de_radio".into()).is_some());
    assert!(catalog.get(&"initiative-exploracion".into()).is_some());
}

#[test]
fn default_rules_document_is_complete() {
    let value = serde_json::to_value(RulesConfig::default()).unwrap();
    let object = value.as_object().unwrap();
    for field in [
        "victory_travel",
        "fatigue_loss_threshold",
        "encounter_action_cap",
        "encounters_per_turn",
        "conflict_attempt_limit",
        "preparation_fatigue_relief",
        "played_character_errant_chance",
        "log_history",
    ] {
        assert!(object.contains_key(field), "missing {field}");
    }
    let parsed = RulesConfig::from_json(&value.to_string()).unwrap();
    assert_eq!(parsed, RulesConfig::default());
}
