//! Feed values through a manifest and print what comes out.

use super::{load_component, parse_assignment};
use anyhow::{anyhow, bail, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use weft_core::LOAD;
use weft_reactive::{Observer, Scheduler, Subscription};
use weft_types::Value;

pub struct RunOptions {
    pub set: Vec<String>,
    pub send: Vec<String>,
    pub max_tasks: usize,
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
enum EventKind {
    Next,
    Error,
    Complete,
}

/// One notification observed on an output port
#[derive(Debug, Clone, Serialize)]
struct Event {
    port: String,
    #[serde(rename = "type")]
    kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
}

impl Event {
    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(self)?);
            return Ok(());
        }
        let value = self
            .value
            .as_ref()
            .map(|v| Value::from(v.clone()).to_string())
            .unwrap_or_default();
        match self.kind {
            EventKind::Next => println!("{}: {}", self.port, value),
            EventKind::Error => println!("{} (error): {}", self.port, value),
            EventKind::Complete => println!("{} (complete)", self.port),
        }
        Ok(())
    }
}

type EventLog = Arc<Mutex<Vec<Event>>>;

fn event_observer(port: &str, log: &EventLog) -> Observer {
    let record = |kind: EventKind| {
        let port = port.to_string();
        let log = log.clone();
        move |value: Option<Value>| {
            log.lock().push(Event {
                port: port.clone(),
                kind: kind.clone(),
                value: value.map(|v| v.to_json()),
            });
        }
    };

    let next = record(EventKind::Next);
    let error = record(EventKind::Error);
    let complete = record(EventKind::Complete);
    Observer::new(move |value| next(Some(value)))
        .with_error(move |error_value| error(Some(error_value)))
        .with_complete(move || complete(None))
}

fn flush(log: &EventLog, json: bool) -> Result<()> {
    let events = std::mem::take(&mut *log.lock());
    for event in &events {
        event.print(json)?;
    }
    Ok(())
}

/// Drain the queue, spending from the shared delivery budget
fn settle(scheduler: &Scheduler, budget: &mut usize, max_tasks: usize) -> Result<()> {
    let report = scheduler.run_bounded(*budget);
    *budget -= report.executed;
    if !report.idle {
        bail!(
            "Graph did not settle within {} deliveries (is there a cycle?)",
            max_tasks
        );
    }
    Ok(())
}

/// Instantiate the manifest, send each `--send` value in order and print every
/// output emission. The `load` output is not reported.
pub fn run_manifest(path: &Path, opts: RunOptions) -> Result<()> {
    let scheduler = Scheduler::new();
    let (manifest, component) = load_component(path, &opts.set, &scheduler)?;

    // Resolve every target before anything runs so a typo fails cleanly
    let sends = opts
        .send
        .iter()
        .map(|raw| {
            let (port, value) = parse_assignment(raw)?;
            let input = component
                .input(&port)
                .ok_or_else(|| anyhow!("{} has no input port named {}", manifest.name, port))?;
            Ok((port, input, value))
        })
        .collect::<Result<Vec<_>>>()?;

    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let subscriptions: Vec<Subscription> = component
        .output_names()
        .into_iter()
        .filter(|port| port != LOAD)
        .filter_map(|port| {
            let output = component.output(&port)?;
            Some(output.subscribe(event_observer(&port, &log)))
        })
        .collect();

    let mut budget = opts.max_tasks;
    settle(&scheduler, &mut budget, opts.max_tasks)?;
    flush(&log, opts.json)?;

    for (port, input, value) in sends {
        tracing::debug!(port = %port, value = %value, "sending value");
        input.send(value);
        settle(&scheduler, &mut budget, opts.max_tasks)?;
        flush(&log, opts.json)?;
    }

    for subscription in subscriptions {
        subscription.dispose();
    }
    component.disconnect_all();

    tracing::debug!(
        component = %component.id(),
        executed = scheduler.executed(),
        "run complete"
    );
    Ok(())
}
