//! Store integration tests: CRUD validation and organization filters.

use orgdir::{
    ActivityCreate, BuildingCreate, DirectoryError, DirectoryStore, OrganizationCreate,
    OrganizationFilter,
};

/// Seeded entity ids, for assertions.
struct Seed {
    building_a: i64,
    building_b: i64,
    food: i64,
    meat: i64,
    beef: i64,
    dairy: i64,
    cars: i64,
    butcher: i64,
    dairy_shop: i64,
    garage: i64,
}

/// Two buildings, a small activity tree, three organizations.
///
/// food -> meat -> beef
///      -> dairy
/// cars
fn seed_store(store: &mut DirectoryStore) -> Seed {
    let building_a = store
        .create_building(&BuildingCreate {
            address: "1 Market St".to_string(),
            latitude: 55.75,
            longitude: 37.62,
        })
        .unwrap()
        .id;
    let building_b = store
        .create_building(&BuildingCreate {
            address: "2 Garage Ln".to_string(),
            latitude: 55.80,
            longitude: 37.70,
        })
        .unwrap()
        .id;

    let food = store
        .create_activity(&ActivityCreate {
            name: "Food".to_string(),
            parent_id: None,
        })
        .unwrap()
        .id;
    let meat = store
        .create_activity(&ActivityCreate {
            name: "Meat".to_string(),
            parent_id: Some(food),
        })
        .unwrap()
        .id;
    let beef = store
        .create_activity(&ActivityCreate {
            name: "Beef".to_string(),
            parent_id: Some(meat),
        })
        .unwrap()
        .id;
    let dairy = store
        .create_activity(&ActivityCreate {
            name: "Dairy".to_string(),
            parent_id: Some(food),
        })
        .unwrap()
        .id;
    let cars = store
        .create_activity(&ActivityCreate {
            name: "Cars".to_string(),
            parent_id: None,
        })
        .unwrap()
        .id;

    let butcher = store
        .create_organization(&OrganizationCreate {
            name: "Prime Butcher".to_string(),
            building_id: building_a,
            phones: vec!["8495123456".to_string()],
            activity_ids: vec![beef],
        })
        .unwrap()
        .id;
    let dairy_shop = store
        .create_organization(&OrganizationCreate {
            name: "Milk & More".to_string(),
            building_id: building_a,
            phones: vec!["84951234567".to_string(), "8495000000".to_string()],
            activity_ids: vec![dairy],
        })
        .unwrap()
        .id;
    let garage = store
        .create_organization(&OrganizationCreate {
            name: "City Garage".to_string(),
            building_id: building_b,
            phones: vec![],
            activity_ids: vec![cars],
        })
        .unwrap()
        .id;

    Seed {
        building_a,
        building_b,
        food,
        meat,
        beef,
        dairy,
        cars,
        butcher,
        dairy_shop,
        garage,
    }
}

fn ids(orgs: &[orgdir::Organization]) -> Vec<i64> {
    orgs.iter().map(|o| o.id).collect()
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_unfiltered_list_is_ordered_by_id() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let all = store.list_organizations(&OrganizationFilter::default()).unwrap();
    assert_eq!(ids(&all), vec![seed.butcher, seed.dairy_shop, seed.garage]);
}

#[test]
fn test_building_filter() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let filter = OrganizationFilter {
        building_id: Some(seed.building_b),
        ..Default::default()
    };
    assert_eq!(ids(&store.list_organizations(&filter).unwrap()), vec![seed.garage]);
}

#[test]
fn test_name_filter_is_case_insensitive_substring() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let filter = OrganizationFilter {
        name: Some("BUTCHER".to_string()),
        ..Default::default()
    };
    assert_eq!(ids(&store.list_organizations(&filter).unwrap()), vec![seed.butcher]);

    let filter = OrganizationFilter {
        name: Some("ar".to_string()), // "City Garage" only
        ..Default::default()
    };
    assert_eq!(ids(&store.list_organizations(&filter).unwrap()), vec![seed.garage]);
}

#[test]
fn test_exact_activity_filter_does_not_include_descendants() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    // Nobody is tagged "Food" directly
    let filter = OrganizationFilter {
        activity_id: Some(seed.food),
        ..Default::default()
    };
    assert!(store.list_organizations(&filter).unwrap().is_empty());

    let filter = OrganizationFilter {
        activity_id: Some(seed.beef),
        ..Default::default()
    };
    assert_eq!(ids(&store.list_organizations(&filter).unwrap()), vec![seed.butcher]);
}

#[test]
fn test_hierarchy_filter_includes_descendants() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    // "Food" expanded covers beef (butcher) and dairy (dairy shop)
    let filter = OrganizationFilter {
        activity_id: Some(seed.food),
        include_children: true,
        ..Default::default()
    };
    assert_eq!(
        ids(&store.list_organizations(&filter).unwrap()),
        vec![seed.butcher, seed.dairy_shop]
    );

    // "Meat" expanded covers only beef
    let filter = OrganizationFilter {
        activity_id: Some(seed.meat),
        include_children: true,
        ..Default::default()
    };
    assert_eq!(ids(&store.list_organizations(&filter).unwrap()), vec![seed.butcher]);
}

#[test]
fn test_unknown_activity_filter_matches_nothing() {
    let mut store = DirectoryStore::in_memory().unwrap();
    seed_store(&mut store);

    for include_children in [false, true] {
        let filter = OrganizationFilter {
            activity_id: Some(9999),
            include_children,
            ..Default::default()
        };
        assert!(store.list_organizations(&filter).unwrap().is_empty());
    }
}

#[test]
fn test_filters_compose() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let filter = OrganizationFilter {
        building_id: Some(seed.building_a),
        name: Some("milk".to_string()),
        activity_id: Some(seed.food),
        include_children: true,
        ..Default::default()
    };
    assert_eq!(ids(&store.list_organizations(&filter).unwrap()), vec![seed.dairy_shop]);

    // Same predicates with the wrong building: no match
    let filter = OrganizationFilter {
        building_id: Some(seed.building_b),
        name: Some("milk".to_string()),
        activity_id: Some(seed.food),
        include_children: true,
        ..Default::default()
    };
    assert!(store.list_organizations(&filter).unwrap().is_empty());
}

#[test]
fn test_expand_activity_matches_tree() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    assert_eq!(
        store.expand_activity(seed.food).unwrap(),
        vec![seed.food, seed.meat, seed.beef, seed.dairy]
    );
    assert_eq!(store.expand_activity(seed.cars).unwrap(), vec![seed.cars]);
    assert!(store.expand_activity(9999).unwrap().is_empty());
}

// ============================================================================
// CRUD Validation
// ============================================================================

#[test]
fn test_organization_roundtrip_embeds_relations() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let org = store.get_organization(seed.dairy_shop).unwrap();
    assert_eq!(org.name, "Milk & More");
    assert_eq!(org.building.id, seed.building_a);
    assert_eq!(org.building.address, "1 Market St");
    // Phones keep insertion order
    assert_eq!(org.phones, vec!["84951234567", "8495000000"]);
    assert_eq!(org.activities.len(), 1);
    assert_eq!(org.activities[0].id, seed.dairy);
    assert_eq!(org.activities[0].parent_id, Some(seed.food));
}

#[test]
fn test_get_missing_organization_is_not_found() {
    let store = DirectoryStore::in_memory().unwrap();
    assert!(matches!(
        store.get_organization(1).unwrap_err(),
        DirectoryError::NotFound {
            entity: "organization",
            ..
        }
    ));
}

#[test]
fn test_create_organization_rejects_missing_building() {
    let mut store = DirectoryStore::in_memory().unwrap();

    let err = store
        .create_organization(&OrganizationCreate {
            name: "Ghost Org".to_string(),
            building_id: 42,
            phones: vec![],
            activity_ids: vec![],
        })
        .unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::MissingReference {
            entity: "building",
            id: 42
        }
    ));
    assert!(store.list_organizations(&OrganizationFilter::default()).unwrap().is_empty());
}

#[test]
fn test_create_organization_rejects_missing_activity() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let err = store
        .create_organization(&OrganizationCreate {
            name: "Ghost Org".to_string(),
            building_id: seed.building_a,
            phones: vec![],
            activity_ids: vec![seed.beef, 9999],
        })
        .unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::MissingReference {
            entity: "activity",
            id: 9999
        }
    ));
}

#[test]
fn test_create_organization_rejects_bad_phone() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    for phone in ["12345", "8-495-12345", "123456789012"] {
        let err = store
            .create_organization(&OrganizationCreate {
                name: "Phoney".to_string(),
                building_id: seed.building_a,
                phones: vec![phone.to_string()],
                activity_ids: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidPhone { .. }), "{phone}");
    }
}

#[test]
fn test_create_organization_collapses_duplicate_activities() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let org = store
        .create_organization(&OrganizationCreate {
            name: "Double Tag".to_string(),
            building_id: seed.building_a,
            phones: vec![],
            activity_ids: vec![seed.beef, seed.beef],
        })
        .unwrap();
    assert_eq!(org.activities.len(), 1);
}

#[test]
fn test_create_activity_rejects_missing_parent() {
    let mut store = DirectoryStore::in_memory().unwrap();

    let err = store
        .create_activity(&ActivityCreate {
            name: "Orphan".to_string(),
            parent_id: Some(7),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::MissingReference {
            entity: "activity",
            id: 7
        }
    ));
}

#[test]
fn test_list_buildings_and_activities_ordered_by_id() {
    let mut store = DirectoryStore::in_memory().unwrap();
    let seed = seed_store(&mut store);

    let buildings = store.list_buildings().unwrap();
    assert_eq!(
        buildings.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![seed.building_a, seed.building_b]
    );

    let activities = store.list_activities().unwrap();
    assert_eq!(
        activities.iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![seed.food, seed.meat, seed.beef, seed.dairy, seed.cars]
    );
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_data_survives_reopen() {
    let tmp_dir = tempfile::TempDir::new().expect("failed to create temp dir");
    let db_path = tmp_dir.path().join("directory.db");
    let db_path = db_path.to_str().unwrap();

    let seed = {
        let mut store = DirectoryStore::open(db_path).unwrap();
        seed_store(&mut store)
    };

    let store = DirectoryStore::open(db_path).unwrap();
    let org = store.get_organization(seed.butcher).unwrap();
    assert_eq!(org.name, "Prime Butcher");
    assert_eq!(org.building.id, seed.building_a);
    assert_eq!(store.expand_activity(seed.food).unwrap().len(), 4);
}
