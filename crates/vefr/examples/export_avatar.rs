//! Import an avatar, rig it, and export it into a scene.
//!
//! ```text
//! cargo run --example export_avatar -- path/to/avatar.glb [out-dir]
//! ```
//!
//! Without a model path a small Mixamo-named skeleton is built in code.

use std::path::PathBuf;

use vefr::prelude::*;

const STORAGE_URL: &str = "https://assets.example.test";

fn build_skeleton(world: &mut World) -> Entity {
    let root = world.spawn((Transform::default(), Name::new("Armature")));
    let hips = world.spawn_child(
        root,
        (Transform::from_xyz(0.0, 1.0, 0.0), Name::new("mixamorig:Hips"), Bone),
    );
    let mut attach = |parent: Entity, names: &[&str]| {
        let mut current = parent;
        for name in names {
            current = world.spawn_child(
                current,
                (Transform::from_xyz(0.0, 0.15, 0.0), Name::new(format!("mixamorig:{name}")), Bone),
            );
        }
        current
    };
    let chest = attach(hips, &["Spine", "Spine1", "Spine2"]);
    attach(chest, &["Neck", "Head"]);
    attach(chest, &["LeftShoulder", "LeftArm", "LeftForeArm", "LeftHand"]);
    attach(chest, &["RightShoulder", "RightArm", "RightForeArm", "RightHand"]);
    attach(hips, &["LeftUpLeg", "LeftLeg", "LeftFoot", "LeftToeBase"]);
    attach(hips, &["RightUpLeg", "RightLeg", "RightFoot", "RightToeBase"]);
    root
}

fn main() -> vefr::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let model = args.next();
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("vefr-export"));

    let config = ExportConfig::default().with_storage_provider_url(STORAGE_URL);
    let registry = ComponentRegistry::with_builtins();
    let mut world = World::new();

    let avatar = match &model {
        Some(path) => {
            let imported = import_gltf_file(&mut world, path, &registry, &config)?;
            let rig = setup_avatar_rig(&mut world, &imported, path)?;
            log::info!("{} mapped {} bones", rig.name, rig.mapping.len());
            imported.root
        }
        None => {
            let root = build_skeleton(&mut world);
            propagate_transforms(&mut world);
            retarget_mixamo(&mut world, root, "builtin")?;
            root
        }
    };

    let scene = world.spawn((
        Transform::default(),
        Name::new("Lobby"),
        SceneSettings::default(),
    ));
    world.spawn_child(
        scene,
        (Transform::from_xyz(0.0, 0.0, 4.0), Name::new("Spawn"), SpawnPoint::default()),
    );
    world.spawn_child(
        scene,
        (
            Transform::default(),
            Name::new("Stage"),
            GltfSource::new(format!("{STORAGE_URL}/projects/demo/stage.glb")),
        ),
    );
    world.set_parent(avatar, scene);
    propagate_transforms(&mut world);

    let mut extensions = default_export_extensions();
    let document = export_gltf_scene(&mut world, scene, &registry, &mut extensions, &config)?;
    log::info!(
        "exported {} nodes, extensions used: {:?}",
        document.nodes.len(),
        document.extensions_used
    );

    let uploader = FileSystemUploader::new(out_dir.clone(), STORAGE_URL);
    let url = upload_scene(&document, &uploader, "demo", "lobby.gltf", &config)?;
    println!("{url}");
    Ok(())
}
