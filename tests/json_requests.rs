//! JSON boundary tests: requests read from fixture files under `tests/data`.

use beamlib::quanting::Scorer;
use beamlib::{quant_beam_json, BeamError, BeamRequest, Direction, Solution};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn data_file(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

#[test]
fn knee_request_parses_with_overrides() {
    let request: BeamRequest =
        serde_json::from_str(&data_file("knee_beam.json")).expect("fixture should parse");

    assert_eq!(request.beam.stems.len(), 4);
    assert_eq!(request.params.region_size, 3, "region-size override should apply");
    assert_eq!(request.params.collision_penalty, 500.0, "other weights keep defaults");
    assert!(request.options.debug);
    assert!(request.options.inspect_quants.is_none());
    let dirs: Vec<Direction> = request.beam.stems.iter().map(|s| s.direction).collect();
    assert_eq!(dirs, vec![Direction::Up, Direction::Down, Direction::Up, Direction::Down]);
}

#[test]
fn knee_request_gives_a_feasible_beam() {
    let json = quant_beam_json(&data_file("knee_beam.json")).expect("knee beam should quant");
    let solution: Solution = serde_json::from_str(&json).expect("solution JSON should parse");

    assert_eq!(solution.warnings, vec![]);
    assert!(solution.demerits.is_some());

    // Every stem reaches its minimum length: up stems need the beam at or
    // above -0.5, down stems at or below 0.5.
    let request: BeamRequest = serde_json::from_str(&data_file("knee_beam.json")).unwrap();
    let (x0, x1) = (0.0, 9.0);
    for stem in &request.beam.stems {
        let t = (stem.x - x0) / (x1 - x0);
        let y = solution.positions.left + t * solution.positions.delta();
        let shortfall = stem.direction.sign() * (stem.shortest_y - y);
        assert!(shortfall <= 1e-9,
            "stem {:?} at x {} is too short by {} (beam y {})", stem.id, stem.x, shortfall, y);
    }

    let card = solution.score_card.expect("debug request should carry a score card");
    assert_eq!(card.entries.len(), Scorer::ALL.len());
    assert_eq!(Some(card.total), solution.demerits);
    assert!(card.completed >= 1 && card.completed <= card.candidates);
}

#[test]
fn minimal_request_uses_defaults() {
    let json = r#"{ "beam": { "stems": [
        { "x": 0.0, "direction": "up", "ideal_y": 2.0, "shortest_y": 1.0 },
        { "x": 10.0, "direction": "up", "ideal_y": 2.0, "shortest_y": 1.0 }
    ] } }"#;
    let solution: Solution = serde_json::from_str(&quant_beam_json(json).unwrap()).unwrap();
    assert_eq!(solution.positions.left, 2.0);
    assert_eq!(solution.positions.right, 2.0);
    assert!(solution.score_card.is_none());
}

#[test]
fn malformed_request_is_a_json_error() {
    let err = quant_beam_json(r#"{ "beam": { "stems": "none" } }"#).unwrap_err();
    assert!(matches!(err, BeamError::Json(_)), "unexpected error: {}", err);
}

#[test]
fn request_without_normal_stems_fails() {
    let json = r#"{ "beam": { "stems": [
        { "x": 0.0, "direction": "up", "ideal_y": 2.0, "shortest_y": 1.0, "normal": false }
    ] } }"#;
    assert!(matches!(quant_beam_json(json), Err(BeamError::NoNormalStems)));
}

#[test]
fn huge_region_size_is_refused() {
    let json = r#"{
        "beam": { "stems": [
            { "x": 0.0, "direction": "up", "ideal_y": 2.0, "shortest_y": 1.0 },
            { "x": 10.0, "direction": "down", "ideal_y": -2.0, "shortest_y": -1.0 }
        ] },
        "params": { "region-size": 1e12 }
    }"#;
    let err = quant_beam_json(json).unwrap_err();
    assert!(matches!(err, BeamError::Json(_)), "unexpected error: {}", err);
    assert!(err.to_string().contains("region-size"), "error should name the parameter: {}", err);
}
