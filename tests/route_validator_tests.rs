use bgpsimulator::route_validator::RouteValidator;
use bgpsimulator::shared::{Relationships, Settings};
use bgpsimulator::simulation_engine::Announcement;

fn ann(rov_invalid: bool) -> Announcement {
    Announcement::new_with_path("1.2.0.0/16", vec![2, 3], 2, Relationships::Customers, rov_invalid)
}

#[test]
fn test_non_enforcing_as_accepts_everything() {
    let route_validator = RouteValidator::from_asns([10, 20]);
    assert!(route_validator.is_accepted(&ann(false), 1));
    assert!(route_validator.is_accepted(&ann(true), 1));
}

#[test]
fn test_enforcing_as_drops_invalid() {
    let route_validator = RouteValidator::from_asns([10, 20]);
    assert!(route_validator.is_accepted(&ann(false), 10));
    assert!(!route_validator.is_accepted(&ann(true), 10));
    assert!(!route_validator.is_accepted(&ann(true), 20));
}

#[test]
fn test_settings_for() {
    let mut route_validator = RouteValidator::new();
    assert!(route_validator.is_empty());
    assert_eq!(route_validator.settings_for(5), Settings::BaseDefense);

    assert!(route_validator.add_rov_asn(5));
    assert!(!route_validator.add_rov_asn(5));
    assert_eq!(route_validator.settings_for(5), Settings::Rov);
    assert_eq!(route_validator.len(), 1);
}

#[test]
fn test_rov_asns_sorted() {
    let route_validator = RouteValidator::from_asns([30, 10, 20, 10]);
    assert_eq!(route_validator.rov_asns().collect::<Vec<_>>(), vec![10, 20, 30]);
}
