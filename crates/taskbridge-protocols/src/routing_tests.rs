use super::*;

#[test]
fn test_default_for() {
    let props = RoutingProperties::default_for(&RoutingDefaults::default());
    assert_eq!(props.service_type, "assistant");
    assert_eq!(props.service_name, DEFAULT_SERVICE_NAME);
    assert_eq!(props.service_version, DEFAULT_SERVICE_VERSION);
    assert!(props.extra.is_empty());
}

#[test]
fn test_from_pairs_lifts_routing_fields() {
    let props = RoutingProperties::from_pairs(
        vec![
            ("service.type", "mcp"),
            ("service.name", "toolbox"),
            ("priority", "high"),
        ],
        &RoutingDefaults::default(),
    );

    assert_eq!(props.service_type, "mcp");
    assert_eq!(props.service_name, "toolbox");
    assert_eq!(props.service_version, DEFAULT_SERVICE_VERSION);
    assert_eq!(props.extra.get("priority").map(String::as_str), Some("high"));
    assert!(!props.extra.contains_key("service.type"));
}

#[test]
fn test_from_pairs_last_write_wins() {
    let props = RoutingProperties::from_pairs(
        vec![
            ("service.name", "first"),
            ("color", "red"),
            ("service.name", "second"),
            ("color", "blue"),
        ],
        &RoutingDefaults::default(),
    );

    assert_eq!(props.service_name, "second");
    assert_eq!(props.get("color"), Some("blue"));
}

#[test]
fn test_round_trip_through_map() {
    let pairs = vec![("service.tool", "search"), ("timeout", "30")];
    let props = RoutingProperties::from_pairs(pairs.clone(), &RoutingDefaults::default());
    let map = props.to_map();

    for (key, value) in pairs {
        assert_eq!(map.get(key).map(String::as_str), Some(value));
    }
    assert_eq!(map.get(SERVICE_TYPE_KEY).map(String::as_str), Some("assistant"));
    assert_eq!(map.get(SERVICE_NAME_KEY).map(String::as_str), Some(DEFAULT_SERVICE_NAME));
    assert_eq!(map.get(SERVICE_VERSION_KEY).map(String::as_str), Some(DEFAULT_SERVICE_VERSION));
    assert_eq!(map.len(), 5);
}

#[test]
fn test_requested_tool() {
    let props = RoutingProperties::from_pairs(
        vec![("service.tool", "summarize")],
        &RoutingDefaults::default(),
    );
    assert_eq!(props.requested_tool(), Some("summarize"));

    let empty = RoutingProperties::from_pairs(vec![("service.tool", "")], &RoutingDefaults::default());
    assert!(empty.requested_tool().is_none());
}

#[test]
fn test_identity_display() {
    let identity = ServiceIdentity::new("assistant", "svcA");
    assert_eq!(identity.to_string(), "assistant/svcA");
}
