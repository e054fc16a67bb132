//! Quickstart: build a small network, run it, and resolve a conflict.
//!
//! Run with `RUST_LOG=debug` to see evaluator events, or leave the default
//! filter to see only the display node's output.
//!
//! ```sh
//! cargo run --example quickstart
//! ```

use propnet::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // x = anon1 + y, y = anon1, print(x)
    let mut net = Network::new();
    let x = net.cell();
    let anon1 = net.cell_with(Value::int(1));
    let y = net.cell();
    let printed = DisplaySink::new();
    net.expression([anon1, y], Add, x)?;
    net.expression([anon1], Identity, y)?;
    let sink = net.cell();
    net.propagator([x], Display::new(printed.clone()), sink)?;

    let metrics = net.run([anon1])?;
    println!("y = {}", display(net.value(y)));
    println!("x = {}", display(net.value(x)));
    println!("printed: {:?}", printed.lines());
    println!(
        "{} firings over {} cells in {}us",
        metrics.firings, metrics.cells_processed, metrics.total_us
    );

    // Two writers disagree on `a`; the context's handler picks the minimum.
    let ctx = net.context();
    let handler = net.context_cells(ctx)?.conflict;
    let scratch = net.cell();
    let min = net.expression([], Min, scratch)?;
    let strategy = net.group([scratch], [min], [])?;

    let b = net.cell_in(None, Some(ctx));
    let a = net.cell();
    let one = net.cell_with(Value::int(1));
    let two = net.cell_with(Value::int(2));
    net.expression([b, one], Add, a)?;
    net.expression([b, two], Add, a)?;

    let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
    ev.set(handler, Value::Group(strategy), None)?;
    ev.set(b, Value::int(1), Some(ctx))?;
    let metrics = ev.run()?;
    println!(
        "a = {} after {} conflict(s)",
        display(net.value(a)),
        metrics.conflicts
    );

    Ok(())
}

fn display(value: Option<&Value>) -> String {
    value.map_or_else(|| "<empty>".to_string(), ToString::to_string)
}
