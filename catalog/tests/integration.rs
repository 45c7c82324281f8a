use catalog::SceneRegistry;
use tile_core::{Capability, EconomyError, RoleTable};

#[test]
fn test_full_catalog_setup() {
    let mut roles = RoleTable::with_owner("owner");
    roles
        .grant("owner", Capability::Creator, "user_creator")
        .unwrap();

    let mut registry = SceneRegistry::new();
    let scene_id = registry
        .create_scene(&roles, "user_creator", 5, 6, 100_000, 500)
        .unwrap();

    // Five rarity classes over the scene's 30 tiles
    registry
        .partition_tiles(
            &roles,
            "user_creator",
            scene_id,
            &[1, 2, 3, 4, 5],
            &[14, 7, 5, 2, 2],
            25,
        )
        .unwrap();

    let box_id = registry
        .define_box(
            &roles,
            "user_creator",
            scene_id,
            4,
            vec![1, 2, 3, 4, 5],
            vec![4900, 2900, 1500, 550, 150],
            vec![],
            100,
        )
        .unwrap();

    let box_def = registry.box_def(box_id).unwrap();
    assert_eq!(box_def.scene_id, scene_id);
    assert_eq!(box_def.remaining_supply, 100);
    // Box token sits right after the scene's reward token
    assert_eq!(box_def.token_id, 32);
}

#[test]
fn test_box_over_unknown_class_is_rejected() {
    let roles = RoleTable::with_owner("owner");
    let mut registry = SceneRegistry::new();
    let scene_id = registry
        .create_scene(&roles, "owner", 2, 2, 0, 0)
        .unwrap();
    registry
        .partition_tiles(&roles, "owner", scene_id, &[1, 2], &[2, 2], 5)
        .unwrap();

    let result = registry.define_box(
        &roles,
        "owner",
        scene_id,
        2,
        vec![1, 9],
        vec![5000, 5000],
        vec![],
        10,
    );
    assert!(matches!(result, Err(EconomyError::Validation(_))));
}
