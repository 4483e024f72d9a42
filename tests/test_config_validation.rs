use mapforge::MapConfig;
use validator::Validate;

#[test]
fn test_map_config_validation() {
    let config = MapConfig {
        seed: String::new(),           // invalid
        width: 0,                      // invalid
        height: 10,                    // valid
        ..MapConfig::default()
    };

    let err = config.validate().unwrap_err();
    let mut fields: Vec<&str> = err.errors().keys().copied().collect();
    fields.sort_unstable();
    assert_eq!(fields, vec!["seed", "width"], "incorrect validation errors in {err:#?}");
}

#[test]
fn test_nested_shape_config_validation() {
    let mut config = MapConfig::default();
    config.shape.sea_level = 5.0; // invalid, outside [0.1, 0.7]
    config.shape.ocean_ratio = -1.0; // invalid, outside [0, 1]

    let err = config.validate().unwrap_err();
    assert!(err.errors().contains_key("shape"));
}

#[test]
fn test_nested_climate_config_validation() {
    let mut config = MapConfig::default();
    config.climate.wind_angle_deg = -10.0; // invalid, must be [0, 360)

    let err = config.validate().unwrap_err();
    assert!(err.errors().contains_key("climate"));
}

#[test]
fn test_default_config_is_valid() {
    MapConfig::default().validate().unwrap();
}
