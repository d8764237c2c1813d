use std::path::{Path, PathBuf};

use fdm_config::{EngineDef, NavigationFrame, load, load_yaml, save_yaml, validate_aircraft};

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

#[test]
fn samples_load_and_validate() {
    for name in ["trainer.yaml", "jet.yaml"] {
        let path = data_dir().join(name);
        let def = load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        validate_aircraft(&def).unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
    }
}

#[test]
fn trainer_contents() {
    let def = load_yaml(&data_dir().join("trainer.yaml")).unwrap();
    assert_eq!(def.name, "trainer");
    assert_eq!(def.navigation, NavigationFrame::Flat);
    assert_eq!(def.propulsion.engines.len(), 1);
    assert!(matches!(def.propulsion.engines[0], EngineDef::Piston(_)));
    assert_eq!(def.landing_gear.wheels.len(), 3);
    assert_eq!(def.landing_gear.steering_wheel.as_deref(), Some("nose"));
    assert_eq!(def.mass.stations.iter().filter(|s| s.fuel_tank).count(), 2);
    assert!(
        def.controls
            .channels
            .iter()
            .any(|c| c.output == "controls/elevator")
    );
}

#[test]
fn jet_uses_rotating_earth() {
    let def = load_yaml(&data_dir().join("jet.yaml")).unwrap();
    assert_eq!(def.navigation, NavigationFrame::Wgs84);
    assert!(def.landing_gear.retractable);
    assert!(matches!(def.propulsion.engines[0], EngineDef::Turbojet(_)));
}

#[test]
fn roundtrip_yaml_sample() {
    let def = load_yaml(&data_dir().join("jet.yaml")).unwrap();

    let path = std::env::temp_dir().join("fdm_config_roundtrip_jet.yaml");
    save_yaml(&path, &def).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(def, loaded);
}

#[test]
fn roundtrip_json_sample() {
    let def = load_yaml(&data_dir().join("trainer.yaml")).unwrap();

    let json = serde_json::to_string_pretty(&def).unwrap();
    let path = std::env::temp_dir().join("fdm_config_roundtrip_trainer.json");
    std::fs::write(&path, json).unwrap();
    let loaded = load(&path).unwrap();

    assert_eq!(def, loaded);
}
