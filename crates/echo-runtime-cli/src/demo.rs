// SPDX-License-Identifier: Apache-2.0
//! The wired demo: one pass through each of the four core runtime
//! subsystems, in the dependency order `spec.md` lays them out in
//! (hash registry, message bus, resource factory, scene graph).

use std::any::Any;
use std::path::PathBuf;

use anyhow::Context;
use echo_gui::{EasingCurve, PlaybackMode, Property, Scene, Vec4};
use echo_msgbus::{MessageBus, MessageUrl};
use echo_resourcefactory::{Factory, FilesystemProvider, ResourceError, ResourceType};
use tracing::info;

struct TextResource;

impl ResourceType for TextResource {
    fn create(
        &self,
        _factory: &Factory,
        bytes: Vec<u8>,
    ) -> Result<Box<dyn Any + Send + Sync>, ResourceError> {
        Ok(Box::new(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn destroy(&self, _factory: &Factory, _resource: Box<dyn Any + Send + Sync>) {}
}

/// Runs the demo against `root` (a fresh temp dir if `None`).
///
/// # Errors
///
/// Propagates any I/O or subsystem error encountered while wiring the
/// four pieces together.
pub fn run(root: Option<PathBuf>) -> anyhow::Result<()> {
    let _tempdir_guard;
    let root = match root {
        Some(root) => root,
        None => {
            let dir = tempfile::tempdir().context("create demo temp dir")?;
            let path = dir.path().to_path_buf();
            _tempdir_guard = dir;
            path
        }
    };
    std::fs::create_dir_all(&root).context("create demo root")?;
    std::fs::write(root.join("greeting.txt"), b"hello from the resource factory")
        .context("write demo fixture")?;

    let path_hash = echo_resourcefactory::path_hash("greeting.txt");
    info!(path_hash = format!("{path_hash:#018x}"), "hash registry: hashed demo path");
    println!("hash registry: greeting.txt -> {path_hash:#018x}");

    let mut bus = MessageBus::new();
    let socket = bus.new_socket("demo")?;
    let url = MessageUrl {
        socket_handle: socket.as_u32(),
        path_hash,
        fragment_hash: 0,
    };
    bus.post(None, url, 1, 0, None, b"hello")?;
    let dispatched = bus.dispatch(socket, |message| {
        let text = String::from_utf8_lossy(&message.payload);
        println!("message bus: dispatched {text:?} to socket 'demo'");
    })?;
    info!(dispatched, "message bus: drained socket queue");

    let provider = FilesystemProvider::new(root.clone());
    let factory = Factory::new(vec![Box::new(provider)], 16);
    factory.register_type("txt", std::sync::Arc::new(TextResource))?;
    let handle = factory.get("greeting.txt")?;
    factory.with_resource::<String, ()>(handle, |text| {
        println!("resource factory: loaded greeting.txt -> {text:?}");
    })?;
    factory.release(handle)?;

    let mut scene = Scene::new();
    let node = scene.new_node(path_hash)?;
    scene.animate(
        node,
        Property::Position,
        0,
        100.0,
        PlaybackMode::OnceForward,
        1.0,
        0.0,
        EasingCurve::OutQuad,
        None,
    );
    scene.update_animations(0.5);
    scene.begin_traversal();
    let (world, _opacity) = scene.world_transform(node);
    let p = world.transform_point(Vec4::new(0.0, 0.0, 0.0, 1.0));
    println!("scene graph: node x after half a second -> {:.2}", p.x);

    let entries = echo_gui::render(&scene);
    println!("scene graph: render stream has {} entries", entries.len());

    Ok(())
}
