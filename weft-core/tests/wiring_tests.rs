//! Integration tests for component construction and wiring

use parking_lot::Mutex;
use std::sync::Arc;
use weft_core::library::{collate, map, ops, Terminal, TerminalKind};
use weft_core::{
    create_component, create_view, Behavior, ChildSpec, ConfigOption, Direction, InputDecl, InputHandlers,
    InstanceConfig, Node, Outputs, Render, WireError, LOAD, PROPS,
};
use weft_reactive::{Observer, Recorder, Relay, Scheduler, Signal};
use weft_types::{InstanceId, Map, Value, ValueKind};

fn log_observer(log: &Arc<Mutex<Vec<String>>>, label: &'static str) -> Observer {
    let log = log.clone();
    Observer::new(move |value| log.lock().push(format!("{label}:{value}")))
}

fn terminal<'a>(node: &'a Arc<dyn Node>) -> &'a Terminal {
    node.as_any().downcast_ref::<Terminal>().unwrap()
}

#[test]
fn test_initial_packet_arrives_once_before_explicit_writes() {
    let scheduler = Scheduler::new();
    let greeter = create_component("greeter")
        .config("greeting", ConfigOption::required().of_type(ValueKind::String))
        .behavior("greeting", Behavior::new(|_, value| Ok(Outputs::new().emit("said", value))))
        .relay_output("said")
        .instantiate(&scheduler, InstanceConfig::new().with("greeting", "hi"))
        .unwrap();
    let recorder = Recorder::new();
    let _sub = greeter.output("said").unwrap().subscribe(recorder.observer());

    let feed = Relay::deferred(&scheduler);
    let _feed = feed.subscribe(greeter.input("greeting").unwrap().observer().clone());
    feed.write(Signal::Success(Value::from("explicit")));
    scheduler.run_until_idle();

    assert_eq!(recorder.values(), vec![Value::from("hi"), Value::from("explicit")]);
}

#[test]
fn test_load_fires_once_and_latches() {
    let scheduler = Scheduler::new();
    let component = create_component("plain")
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let early = Recorder::new();
    let late = Recorder::new();

    let _a = component.output(LOAD).unwrap().subscribe(early.observer());
    scheduler.run_until_idle();
    let _b = component.output(LOAD).unwrap().subscribe(late.observer());
    scheduler.run_until_idle();

    assert_eq!(early.values(), vec![Value::Null]);
    assert_eq!(late.values(), vec![Value::Null]);
}

#[test]
fn test_load_precedes_external_deliveries() {
    let scheduler = Scheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let component = create_component("switch")
        .config("mode", ConfigOption::required())
        .behavior("mode", Behavior::new(|_, value| Ok(Outputs::new().emit("changes", value))))
        .relay_output("changes")
        .instantiate(&scheduler, InstanceConfig::new().with("mode", "auto"))
        .unwrap();

    let _load = component.output(LOAD).unwrap().subscribe(log_observer(&log, "load"));
    let _changes = component.output("changes").unwrap().subscribe(log_observer(&log, "change"));
    let feed = Relay::deferred(&scheduler);
    let _feed = feed.subscribe(component.input("mode").unwrap().observer().clone());
    feed.write(Signal::Success(Value::from("manual")));
    scheduler.run_until_idle();

    assert_eq!(*log.lock(), vec!["load:null", "change:auto", "change:manual"]);
}

#[test]
fn test_rebinding_only_touches_named_ports() {
    let scheduler = Scheduler::new();
    let component = create_component("phases")
        .behavior(
            "a",
            Behavior::new(|_, _| {
                Ok(Outputs::new()
                    .emit("out", "a1")
                    .rebind("b", Behavior::new(|_, _| Ok(Outputs::new().emit("out", "b2"))))
                    .rebind(PROPS, Behavior::ignore()))
            }),
        )
        .behavior("b", Behavior::new(|_, _| Ok(Outputs::new().emit("out", "b1"))))
        .relay_output("out")
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let recorder = Recorder::new();
    let _sub = component.output("out").unwrap().subscribe(recorder.observer());

    let a = component.input("a").unwrap();
    let b = component.input("b").unwrap();
    b.send(Value::Null);
    a.send(Value::Null);
    b.send(Value::Null);
    a.send(Value::Null);
    scheduler.run_until_idle();

    let values: Vec<String> = recorder.values().iter().map(ToString::to_string).collect();
    assert_eq!(values, vec!["b1", "a1", "b2", "a1"]);
    assert_eq!(component.rebind_count("a"), Some(0));
    assert_eq!(component.rebind_count("b"), Some(2));
    assert_eq!(component.rebind_count(PROPS), None);
    assert!(a.is_rebindable());
    assert!(!component.input(PROPS).unwrap().is_rebindable());
}

#[test]
fn test_fan_out_delivers_once_per_sink() {
    let scheduler = Scheduler::new();
    let parent = create_component("splitter")
        .child("src", Arc::new(map()), InstanceConfig::new().with("op", ops::identity()))
        .child("left", Arc::new(TerminalKind), InstanceConfig::new())
        .child("right", Arc::new(TerminalKind), InstanceConfig::new())
        .fan_out("split", "src.output", ["left.in", "right.in"])
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    assert_eq!(parent.connection_names(), vec!["split[0]", "split[1]"]);

    let src = parent.child_component("src").unwrap();
    scheduler.run_until_idle();
    src.input("input").unwrap().send(5);
    scheduler.run_until_idle();

    let left = parent.child("left").unwrap();
    let right = parent.child("right").unwrap();
    assert_eq!(terminal(&left).received("in"), vec![Value::from(5)]);
    assert_eq!(terminal(&right).received("in"), vec![Value::from(5)]);

    assert!(parent.disconnect("split[1]"));
    assert!(!parent.disconnect("split[1]"));
    src.input("input").unwrap().send(6);
    scheduler.run_until_idle();

    assert_eq!(terminal(&left).received("in"), vec![Value::from(5), Value::from(6)]);
    assert_eq!(terminal(&right).received("in"), vec![Value::from(5)]);
}

#[test]
fn test_construction_errors() {
    let scheduler = Scheduler::new();
    let build = |def: weft_core::ComponentDef| def.instantiate(&scheduler, InstanceConfig::new()).unwrap_err();

    let err = build(create_component("x").connect("c", "ghost.output", "this.props"));
    assert!(matches!(err, WireError::UnresolvedComponent(name) if name == "ghost"));

    let err = build(create_component("x").connect("c", "output", "this.props"));
    assert!(matches!(err, WireError::InvalidPortPath(path) if path == "output"));

    let err = build(create_component("x").input("x", InputDecl::Behavior));
    assert!(matches!(err, WireError::MissingBehavior(name) if name == "x"));

    let err = build(create_component("x").input_path("x", "this.props"));
    assert!(matches!(err, WireError::UnresolvedComponent(name) if name == "this"));

    let err = build(create_component("x").child("sum", Arc::new(collate()), InstanceConfig::new()));
    match err {
        WireError::Child { name, source } => {
            assert_eq!(name, "sum");
            assert!(matches!(*source, WireError::MissingConfig(ref option) if option == "seed"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let seeded = InstanceConfig::new().with("seed", 0).with("op", ops::add());
    let err = build(
        create_component("x")
            .child("sum", Arc::new(collate()), seeded)
            .output_path("total", "sum.nope"),
    );
    match err {
        WireError::UnresolvedPort {
            component,
            direction,
            port,
        } => {
            assert_eq!(component, "sum");
            assert_eq!(direction, Direction::Output);
            assert_eq!(port, "nope");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_behavior_failures_reach_relay_outputs() {
    let scheduler = Scheduler::new();
    let component = create_component("fragile")
        .behavior("input", Behavior::new(|_, _| Err(Value::from("boom"))))
        .relay_output("out")
        .relay_output("audit")
        .stream_output("ticks", |_, _| None)
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let out = Recorder::new();
    let audit = Recorder::new();
    let load = Recorder::new();
    let _a = component.output("out").unwrap().subscribe(out.observer());
    let _b = component.output("audit").unwrap().subscribe(audit.observer());
    let _c = component.output(LOAD).unwrap().subscribe(load.observer());

    component.input("input").unwrap().send(1);
    scheduler.run_until_idle();

    assert_eq!(out.errors(), vec![Value::from("boom")]);
    assert_eq!(audit.errors(), vec![Value::from("boom")]);
    assert!(load.errors().is_empty());
}

#[test]
fn test_observer_shaped_behaviors_handle_error_and_complete() {
    let scheduler = Scheduler::new();
    let component = create_component("careful")
        .behavior(
            "input",
            Behavior::new(|_, value| Ok(Outputs::new().emit("out", value)))
                .with_error(|_, error| Ok(Outputs::new().emit("out", format!("handled {error}"))))
                .with_complete(|_| Ok(Outputs::new().emit("out", "done"))),
        )
        .behavior("plain", Behavior::new(|_, value| Ok(Outputs::new().emit("out", value))))
        .relay_output("out")
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let recorder = Recorder::new();
    let _sub = component.output("out").unwrap().subscribe(recorder.observer());

    let careful = component.input("input").unwrap();
    careful.observer().on_error(Value::from("e1"));
    careful.observer().on_complete();
    let plain = component.input("plain").unwrap();
    plain.observer().on_error(Value::from("e2"));
    plain.observer().on_complete();
    scheduler.run_until_idle();

    assert_eq!(
        recorder.values(),
        vec![Value::from("handled e1"), Value::from("done")]
    );
}

#[test]
fn test_handler_inputs_are_bound_to_the_instance() {
    let scheduler = Scheduler::new();
    let component = create_component("direct")
        .input_handlers(
            "input",
            InputHandlers::new(|this, value| this.emit("out", value))
                .with_error(|this, error| this.emit("out", format!("error {error}"))),
        )
        .relay_output("out")
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let recorder = Recorder::new();
    let _sub = component.output("out").unwrap().subscribe(recorder.observer());

    let input = component.input("input").unwrap();
    assert!(!input.is_rebindable());
    input.send("x");
    input.observer().on_error(Value::from("bad"));
    scheduler.run_until_idle();

    assert_eq!(recorder.values(), vec![Value::from("x"), Value::from("error bad")]);
}

#[test]
fn test_child_factory_sees_resolved_config() {
    let scheduler = Scheduler::new();
    let component = create_component("offset-sum")
        .config("start", ConfigOption::optional().of_type(ValueKind::Number).with_default(5))
        .child_with("sum", |config| {
            ChildSpec::new(
                Arc::new(collate()),
                InstanceConfig::new()
                    .with("seed", config.get("start").cloned().unwrap_or_default())
                    .with("op", ops::add()),
            )
        })
        .input_path("value", "sum.input")
        .output_path("total", "sum.output")
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let recorder = Recorder::new();
    let _sub = component.output("total").unwrap().subscribe(recorder.observer());

    component.input("value").unwrap().send(1);
    scheduler.run_until_idle();

    assert_eq!(recorder.values(), vec![Value::from(6)]);
}

#[test]
fn test_lazy_ports_on_leaf_children() {
    let scheduler = Scheduler::new();
    let component = create_component("screen-host")
        .child("screen", Arc::new(TerminalKind), InstanceConfig::new())
        .input_path("title", "screen.title")
        .output_path("clicks", "screen.clicks")
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let screen = component.child("screen").unwrap();
    let screen = terminal(&screen);

    assert_eq!(screen.input_names(), vec!["title"]);
    assert_eq!(screen.output_names(), vec!["clicks"]);
    assert_eq!(screen.connected_outputs(), vec!["clicks"]);

    let recorder = Recorder::new();
    let _sub = component.output("clicks").unwrap().subscribe(recorder.observer());
    assert!(screen.emit("clicks", 1));
    component.input("title").unwrap().send("weft");
    scheduler.run_until_idle();

    assert_eq!(recorder.values(), vec![Value::from(1)]);
    assert_eq!(screen.received("title"), vec![Value::from("weft")]);
}

#[test]
fn test_extends_falls_back_to_base_ports() {
    let scheduler = Scheduler::new();
    let derived = create_component("labelled-sum")
        .config("label", ConfigOption::optional().of_type(ValueKind::String))
        .extends(Arc::new(collate()))
        .parent_config(|config| {
            config
                .iter()
                .filter(|(key, _)| key.as_str() != "label")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .instantiate(
            &scheduler,
            InstanceConfig::new()
                .with("label", "running")
                .with("seed", 1)
                .with("op", ops::add()),
        )
        .unwrap();
    let recorder = Recorder::new();
    let _sub = derived.output("output").unwrap().subscribe(recorder.observer());

    derived.input("input").unwrap().send(2);
    scheduler.run_until_idle();

    assert!(derived.base().is_some());
    assert_eq!(derived.input_names(), vec![PROPS]);
    assert_eq!(derived.config_value("label"), Some(Value::from("running")));
    assert_eq!(recorder.values(), vec![Value::from(3)]);
}

#[test]
fn test_construct_hook_runs_after_wiring() {
    let scheduler = Scheduler::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();

    create_component("hooked")
        .child("screen", Arc::new(TerminalKind), InstanceConfig::new())
        .relay_output("out")
        .connect("wire", "this.out", "screen.in")
        .on_construct(move |this, config| {
            record.lock().extend(this.connection_names());
            record.lock().push(format!("{} options", config.len()));
            Ok(())
        })
        .instantiate(&scheduler, InstanceConfig::new().with("extra", 1))
        .unwrap();

    assert_eq!(*seen.lock(), vec!["wire", "1 options"]);

    let err = create_component("failing")
        .on_construct(|_, _| Err(WireError::Hook("not today".into())))
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap_err();
    assert!(matches!(err, WireError::Hook(message) if message == "not today"));
}

#[derive(Default)]
struct Frames(Mutex<Vec<Value>>);

impl Render for Frames {
    fn render(&self, _instance: InstanceId, picture: &Value) {
        self.0.lock().push(picture.clone());
    }
}

#[test]
fn test_view_updates_are_coalesced() {
    let scheduler = Scheduler::new();
    let frames = Arc::new(Frames::default());
    let label = create_view("label", |state| Value::Map(state.clone()))
        .config("text", ConfigOption::optional().with_default(""))
        .behavior(
            "text",
            Behavior::new(|_, value| {
                let mut picture = Map::new();
                picture.insert("text".to_string(), value);
                Ok(Outputs::new().emit("picture", picture))
            }),
        )
        .renderer(frames.clone())
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();

    // the initial props and text packets flush together
    scheduler.run_until_idle();
    assert_eq!(label.flush_count(), 1);

    let text = label.input("text").unwrap();
    text.send("a");
    text.send("b");
    // both deliveries run, the flush they schedule waits for the next tick
    scheduler.tick();
    assert!(label.has_pending_update());
    assert_eq!(label.flush_count(), 1);
    scheduler.run_until_idle();

    assert_eq!(label.flush_count(), 2);
    assert_eq!(frames.0.lock().len(), 2);
    let picture = label.last_picture().unwrap();
    assert_eq!(picture.get("text"), Some(&Value::from("b")));
    assert_eq!(picture.get(PROPS), Some(&Value::map()));
}

#[test]
fn test_props_delegate_to_root_child() {
    let scheduler = Scheduler::new();
    let root = create_view("panel", |state| Value::Map(state.clone()));
    let host = create_component("host")
        .child("root", Arc::new(root), InstanceConfig::new())
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    scheduler.run_until_idle();

    host.input(PROPS)
        .unwrap()
        .send(Value::from(serde_json::json!({ "title": "hello" })));
    scheduler.run_until_idle();

    let panel = host.child_component("root").unwrap();
    let expected = Value::from(serde_json::json!({ "title": "hello" }));
    assert_eq!(panel.config_value(PROPS), Some(expected.clone()));
    assert_eq!(panel.view_state().unwrap().get(PROPS), Some(&expected));
    assert_eq!(panel.render().unwrap().get(PROPS), Some(&expected));
}

#[test]
fn test_setter_inputs_reconfigure_live() {
    let scheduler = Scheduler::new();
    let negator = map()
        .instantiate(&scheduler, InstanceConfig::new().with("op", ops::identity()))
        .unwrap();
    let recorder = Recorder::new();
    let _sub = negator.output("output").unwrap().subscribe(recorder.observer());

    negator.input("op").unwrap().send(ops::negate());
    scheduler.run_until_idle();
    negator.input("input").unwrap().send(4);
    scheduler.run_until_idle();

    assert_eq!(
        negator
            .config_value("op")
            .and_then(|op| op.as_callable().and_then(|op| op.name().map(str::to_string))),
        Some("negate".to_string())
    );
    assert_eq!(recorder.values(), vec![Value::from(-4)]);
}

#[test]
fn test_writes_right_after_construction_follow_initial_packets() {
    let scheduler = Scheduler::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let component = create_component("switch")
        .config("mode", ConfigOption::required())
        .behavior("mode", Behavior::new(|_, value| Ok(Outputs::new().emit("changes", value))))
        .relay_output("changes")
        .instantiate(&scheduler, InstanceConfig::new().with("mode", "initial"))
        .unwrap();
    let _changes = component.output("changes").unwrap().subscribe(log_observer(&log, "change"));

    component.input("mode").unwrap().send("explicit");
    scheduler.run_until_idle();

    assert_eq!(*log.lock(), vec!["change:initial", "change:explicit"]);
}

#[test]
fn test_producers_forward_every_pushed_value() {
    let scheduler = Scheduler::new();
    let component = create_component("burst")
        .behavior(
            "input",
            Behavior::new(|_, value| {
                let first = value.as_f64().unwrap_or(0.0);
                Ok(Outputs::new().produce("out", move |observer| {
                    observer.on_next(Value::from(first));
                    observer.on_next(Value::from(first * 9.0));
                }))
            }),
        )
        .relay_output("out")
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    let recorder = Recorder::new();
    let _sub = component.output("out").unwrap().subscribe(recorder.observer());

    component.input("input").unwrap().send(1);
    scheduler.run_until_idle();

    assert_eq!(recorder.values(), vec![Value::from(1), Value::from(9)]);
}

#[test]
fn test_picture_producers_coalesce_into_one_update() {
    let scheduler = Scheduler::new();
    let frames = Arc::new(Frames::default());
    let card = create_view("card", |state| Value::Map(state.clone()))
        .behavior(
            "input",
            Behavior::new(|_, _| {
                Ok(Outputs::new().produce("picture", |observer| {
                    observer.on_next(Value::from(serde_json::json!({ "title": "a" })));
                    observer.on_next(Value::from(serde_json::json!({ "body": "b" })));
                }))
            }),
        )
        .renderer(frames.clone())
        .instantiate(&scheduler, InstanceConfig::new())
        .unwrap();
    scheduler.run_until_idle();
    assert_eq!(card.flush_count(), 1);

    card.input("input").unwrap().send(Value::Null);
    scheduler.run_until_idle();

    assert_eq!(card.flush_count(), 2);
    assert_eq!(frames.0.lock().len(), 2);
    let picture = card.last_picture().unwrap();
    assert_eq!(picture.get("title"), Some(&Value::from("a")));
    assert_eq!(picture.get("body"), Some(&Value::from("b")));
}
