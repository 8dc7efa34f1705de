use std::sync::Arc;

use map_surface_texture::core::headless::{HeadlessSurfaceSource, HeadlessTextureRegistrar};
use map_surface_texture::{
    MethodCall, MethodResponse, PluginConfig, SurfaceHandle, SurfaceTexturePlugin, TextureId,
};
use serde_json::{json, Value};

struct Harness {
    source: Arc<HeadlessSurfaceSource>,
    registrar: Arc<HeadlessTextureRegistrar>,
    plugin: SurfaceTexturePlugin,
}

fn harness(surfaces: &[i64]) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let source = Arc::new(HeadlessSurfaceSource::new());
    for &raw in surfaces {
        source.add_surface(surface(raw));
    }
    let registrar = Arc::new(HeadlessTextureRegistrar::new());
    let plugin = SurfaceTexturePlugin::new(
        source.clone(),
        registrar.clone(),
        PluginConfig::default(),
    );

    Harness {
        source,
        registrar,
        plugin,
    }
}

fn surface(raw: i64) -> SurfaceHandle {
    SurfaceHandle::try_from(raw).expect("valid handle")
}

impl Harness {
    fn call(&self, method: &str, arguments: Value) -> MethodResponse {
        self.plugin
            .handle_method_call(&MethodCall::new(method, Some(arguments)))
    }

    fn set_surface(&self, map_surface_id: Value) -> MethodResponse {
        self.call("setSurface", json!({ "mapSurfaceId": map_surface_id }))
    }

    fn texture_id(response: &MethodResponse) -> TextureId {
        match response {
            MethodResponse::Success { result } => {
                TextureId::new(result.as_i64().expect("integer texture id"))
            }
            other => panic!("expected success, got {other:?}"),
        }
    }
}

#[test]
fn set_dispose_set_returns_fresh_texture() {
    let h = harness(&[7]);
    assert_eq!(h.plugin.channel_name(), "flutter_map_surface_plugin");

    let first = h.set_surface(json!(7));
    let t1 = Harness::texture_id(&first);

    let duplicate = h.set_surface(json!(7));
    assert_eq!(duplicate.error_code(), Some("ALREADY_REGISTERED"));
    assert_eq!(h.plugin.registry().len(), 1);

    assert_eq!(
        h.call("dispose", json!({ "textureId": t1.get() })),
        MethodResponse::ack()
    );
    assert!(h.plugin.registry().is_empty());

    let t2 = Harness::texture_id(&h.set_surface(json!(7)));
    assert_ne!(t1, t2);
}

#[test]
fn negative_handle_is_rejected() {
    let h = harness(&[7]);

    let response = h.set_surface(json!(-1));

    assert_eq!(response.error_code(), Some("ARG_ERROR"));
    assert!(h.plugin.registry().is_empty());
    assert_eq!(h.registrar.texture_count(), 0);
}

#[test]
fn unknown_surface_reports_registration_failure() {
    let h = harness(&[7]);

    let response = h.set_surface(json!(8));

    assert_eq!(response.error_code(), Some("REGISTRATION_FAILED"));
    assert!(h.plugin.registry().is_empty());
}

#[test]
fn dispose_of_unknown_texture_succeeds() {
    let h = harness(&[7]);
    let texture_id = Harness::texture_id(&h.set_surface(json!(7)));

    let response = h.call("dispose", json!({ "textureId": 999 }));

    assert!(response.is_success());
    assert_eq!(h.plugin.registry().len(), 1);
    assert!(h.registrar.is_registered(texture_id));
}

#[test]
fn dispose_requires_integer_texture_id() {
    let h = harness(&[7]);
    let texture_id = Harness::texture_id(&h.set_surface(json!(7)));

    for arguments in [json!({}), json!({ "textureId": "1" }), json!({ "textureId": null })] {
        assert_eq!(h.call("dispose", arguments).error_code(), Some("ARG_ERROR"));
    }
    let response = h
        .plugin
        .handle_method_call(&MethodCall::new("dispose", None));
    assert_eq!(response.error_code(), Some("NO_ARGS"));

    assert!(h.registrar.is_registered(texture_id));
}

#[test]
fn update_surface_is_acknowledged() {
    let h = harness(&[7]);
    let texture_id = Harness::texture_id(&h.set_surface(json!(7)));

    let response = h.call(
        "updateSurface",
        json!({ "textureId": texture_id.get(), "width": 640, "height": 480 }),
    );
    assert_eq!(response, MethodResponse::ack());

    let response = h
        .plugin
        .handle_method_call(&MethodCall::new("updateSurface", None));
    assert_eq!(response, MethodResponse::ack());
    assert!(h.plugin.registry().contains_texture(texture_id));
}

#[test]
fn unknown_method_is_not_implemented() {
    let h = harness(&[]);

    assert_eq!(
        h.call("resizeSurface", json!({})),
        MethodResponse::NotImplemented
    );
}

#[test]
fn frames_flow_from_surface_to_texture() {
    let h = harness(&[7]);
    let texture_id = Harness::texture_id(&h.set_surface(json!(7)));

    assert_eq!(h.registrar.paint(texture_id), None);

    h.source.publish_frame(surface(7), 2, 1, vec![10; 8]);
    assert_eq!(h.registrar.frames_available(texture_id), 1);

    let snapshot = h.registrar.paint(texture_id).expect("frame painted");
    assert_eq!((snapshot.width(), snapshot.height()), (2, 1));
    assert_eq!(snapshot.pixels(), &[10; 8]);
}

#[test]
fn dispose_then_late_notification_is_ignored() {
    let h = harness(&[7]);
    let texture_id = Harness::texture_id(&h.set_surface(json!(7)));
    let late_callback = h.source.callback(surface(7)).expect("subscribed");

    h.call("dispose", json!({ "textureId": texture_id.get() }));
    let marks = h.registrar.total_marks();
    late_callback();

    assert_eq!(h.registrar.total_marks(), marks);
    assert!(h.plugin.registry().is_empty());
}

#[test]
fn dropping_plugin_disposes_bridges() {
    let h = harness(&[1, 2]);
    h.set_surface(json!(1));
    h.set_surface(json!(2));

    let Harness {
        source,
        registrar,
        plugin,
    } = h;
    drop(plugin);

    assert_eq!(registrar.texture_count(), 0);
    assert!(!source.is_locked(surface(1)));
    assert!(!source.is_locked(surface(2)));
}

#[test]
fn shutdown_keeps_plugin_usable() {
    let h = harness(&[7]);
    h.set_surface(json!(7));

    h.plugin.shutdown();
    assert!(h.plugin.registry().is_empty());

    assert!(h.set_surface(json!(7)).is_success());
}
