//! Mapping component: emits `op(value)` for every value on `input`

use crate::behavior::{Behavior, Outputs};
use crate::def::{create_component, ComponentDef};
use crate::schema::ConfigOption;
use weft_types::{Value, ValueKind};

pub const TYPE_NAME: &str = "map";

pub fn map() -> ComponentDef {
    create_component(TYPE_NAME)
        .config("op", ConfigOption::required().of_type(ValueKind::Function).reconfigurable())
        .behavior(
            "input",
            Behavior::new(|this, value| {
                let op = this
                    .config_value("op")
                    .and_then(|op| op.as_callable().cloned())
                    .ok_or_else(|| Value::from("map: op is not a function"))?;
                Ok(Outputs::new().emit("output", op.call(&[value])))
            }),
        )
        .relay_output("output")
}
