//! Reducer component
//!
//! Folds every value on `input` into an accumulator with `op(acc, value)`
//! and emits each new accumulator on `output`. The accumulator lives in the
//! rebound behavior, not in a field. `reset` emits the seed and starts over.

use crate::behavior::{Behavior, BehaviorResult, Outputs};
use crate::component::Component;
use crate::def::{create_component, ComponentDef};
use crate::schema::ConfigOption;
use weft_types::{Value, ValueKind};

pub const TYPE_NAME: &str = "collate";

pub fn collate() -> ComponentDef {
    create_component(TYPE_NAME)
        .config("seed", ConfigOption::required().any())
        .config("op", ConfigOption::required().of_type(ValueKind::Function))
        .behavior("input", from_seed())
        .behavior(
            "reset",
            Behavior::new(|this, _| {
                let seed = this.config_value("seed").unwrap_or_default();
                Ok(Outputs::new().emit("output", seed).rebind("input", from_seed()))
            }),
        )
        .relay_output("output")
}

fn from_seed() -> Behavior {
    Behavior::new(|this, value| {
        let seed = this.config_value("seed").unwrap_or_default();
        fold(this, seed, value)
    })
}

fn fold(this: &Component, acc: Value, value: Value) -> BehaviorResult {
    let op = this
        .config_value("op")
        .and_then(|op| op.as_callable().cloned())
        .ok_or_else(|| Value::from("collate: op is not a function"))?;

    let acc = op.call(&[acc, value]);
    let carried = acc.clone();
    Ok(Outputs::new()
        .emit("output", acc)
        .next(Behavior::new(move |this, value| fold(this, carried.clone(), value))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WireError;
    use crate::schema::InstanceConfig;
    use weft_reactive::{Recorder, Relay, Scheduler, Signal};
    use weft_types::Callable;

    fn add() -> Callable {
        Callable::named("add", |args| {
            let sum = args.iter().filter_map(Value::as_f64).sum::<f64>();
            Value::from(sum)
        })
    }

    #[test]
    fn test_requires_seed() {
        let err = collate()
            .instantiate(&Scheduler::new(), InstanceConfig::new().with("op", add()))
            .unwrap_err();
        assert!(matches!(err, WireError::MissingConfig(name) if name == "seed"));
    }

    #[test]
    fn test_requires_function_op() {
        let scheduler = Scheduler::new();

        let err = collate()
            .instantiate(&scheduler, InstanceConfig::new().with("seed", 1))
            .unwrap_err();
        assert!(matches!(err, WireError::MissingConfig(name) if name == "op"));

        let err = collate()
            .instantiate(&scheduler, InstanceConfig::new().with("seed", 1).with("op", ""))
            .unwrap_err();
        assert!(matches!(err, WireError::ConfigType { .. }));
    }

    #[test]
    fn test_reduces_values() {
        let scheduler = Scheduler::new();
        let collate = collate()
            .instantiate(&scheduler, InstanceConfig::new().with("seed", 1).with("op", add()))
            .unwrap();
        let recorder = Recorder::new();

        // values written before anyone listens still arrive, delivery is deferred
        let feed = Relay::deferred(&scheduler);
        let _feed = feed.subscribe(collate.input("input").unwrap().observer().clone());
        feed.write(Signal::Success(Value::from(2)));
        feed.write(Signal::Success(Value::from(3)));
        let _sub = collate.output("output").unwrap().subscribe(recorder.observer());
        scheduler.run_until_idle();

        assert_eq!(recorder.values(), vec![Value::from(3), Value::from(6)]);
        assert_eq!(collate.rebind_count("input"), Some(2));
    }

    #[test]
    fn test_reset_emits_seed_and_restarts() {
        let scheduler = Scheduler::new();
        let collate = collate()
            .instantiate(&scheduler, InstanceConfig::new().with("seed", 1).with("op", add()))
            .unwrap();
        let recorder = Recorder::new();
        let _sub = collate.output("output").unwrap().subscribe(recorder.observer());
        let input = collate.input("input").unwrap();

        input.send(2);
        input.send(3);
        collate.input("reset").unwrap().send(true);
        input.send(2);
        input.send(3);
        input.send(4);
        scheduler.run_until_idle();

        let values: Vec<f64> = recorder.values().iter().filter_map(Value::as_f64).collect();
        assert_eq!(values, vec![3.0, 6.0, 1.0, 3.0, 6.0, 10.0]);
    }
}
