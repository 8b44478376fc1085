//! Named functions for manifests

use weft_types::{Callable, Value};

fn numbers(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    args.iter().filter_map(Value::as_f64)
}

/// Sum numbers, or concatenate when the first argument is a string
pub fn add() -> Callable {
    Callable::named("add", |args| match args.first() {
        Some(Value::String(_)) => concat_strings(args),
        _ => Value::from(numbers(args).sum::<f64>()),
    })
}

pub fn mul() -> Callable {
    Callable::named("mul", |args| Value::from(numbers(args).product::<f64>()))
}

pub fn max() -> Callable {
    Callable::named("max", |args| {
        numbers(args).reduce(f64::max).map_or(Value::Null, Value::from)
    })
}

pub fn min() -> Callable {
    Callable::named("min", |args| {
        numbers(args).reduce(f64::min).map_or(Value::Null, Value::from)
    })
}

pub fn negate() -> Callable {
    Callable::named("negate", |args| {
        args.first()
            .and_then(Value::as_f64)
            .map_or(Value::Null, |n| Value::from(-n))
    })
}

/// Append to a list accumulator, or join strings
pub fn concat() -> Callable {
    Callable::named("concat", |args| match args.first() {
        Some(Value::List(items)) => {
            let mut joined = items.clone();
            for arg in &args[1..] {
                match arg {
                    Value::List(more) => joined.extend(more.iter().cloned()),
                    other => joined.push(other.clone()),
                }
            }
            Value::List(joined)
        }
        _ => concat_strings(args),
    })
}

pub fn identity() -> Callable {
    Callable::named("identity", |args| args.first().cloned().unwrap_or_default())
}

fn concat_strings(args: &[Value]) -> Value {
    let joined: String = args
        .iter()
        .map(|arg| match arg {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    Value::from(joined)
}

/// Every named function, for registration
pub fn all() -> Vec<(&'static str, Callable)> {
    vec![
        ("add", add()),
        ("mul", mul()),
        ("max", max()),
        ("min", min()),
        ("negate", negate()),
        ("concat", concat()),
        ("identity", identity()),
    ]
}
