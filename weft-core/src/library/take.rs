//! Gate component
//!
//! Forwards the first `count` values from `input` to `output`, signals
//! `done` with the count, then drops everything until `reset` re-arms it.
//! The count is a positive whole number.

use crate::behavior::{Behavior, BehaviorResult, Outputs};
use crate::component::Component;
use crate::def::{create_component, ComponentDef};
use crate::schema::ConfigOption;
use weft_types::{Value, ValueKind};

pub const TYPE_NAME: &str = "take";

pub fn take() -> ComponentDef {
    create_component(TYPE_NAME)
        .config(
            "count",
            ConfigOption::required()
                .of_type(ValueKind::Number)
                .with_assert(|value| value.as_f64().is_some_and(|n| n >= 1.0 && n.fract() == 0.0)),
        )
        .behavior("input", armed())
        .behavior(
            "reset",
            Behavior::new(|_, _| Ok(Outputs::new().rebind("input", armed()))),
        )
        .relay_output("output")
        .relay_output("done")
}

fn count(this: &Component) -> u64 {
    this.config_value("count")
        .and_then(|count| count.as_f64())
        .map_or(0, |count| count as u64)
}

fn armed() -> Behavior {
    Behavior::new(|this, value| step(this, count(this), value))
}

fn step(this: &Component, remaining: u64, value: Value) -> BehaviorResult {
    let left = remaining.saturating_sub(1);
    let outputs = Outputs::new().emit("output", value);
    if left == 0 {
        Ok(outputs.emit("done", count(this)).next(dropping()))
    } else {
        Ok(outputs.next(Behavior::new(move |this, value| step(this, left, value))))
    }
}

fn dropping() -> Behavior {
    Behavior::new(|this, value| {
        tracing::trace!(component = %this.id(), value = %value, "take: value dropped");
        Ok(Outputs::new())
    })
}
