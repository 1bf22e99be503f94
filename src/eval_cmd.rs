//! Eval command: recompute and print model nodes.

use anyhow::{Result, bail};
use semcore_algebra::DeferredError;
use tracing::{info, info_span};

use crate::cli::EvalArgs;
use crate::convert::{Model, load_model};

/// Evaluates the requested nodes and prints their descriptions.
pub fn run(args: EvalArgs) -> Result<()> {
    let _cmd = info_span!("eval").entered();
    let mut model = load_model(&args.model, args.params.as_deref())?;
    let (text, deferred) = evaluate(&mut model, &args.node)?;
    print!("{text}");
    for error in &deferred {
        eprintln!("warning: {error}");
    }
    info!(deferred = deferred.len(), "evaluation done");
    Ok(())
}

/// Recomputes `nodes` (or the model's own targets when empty) and returns
/// their descriptions together with the deferred errors met on the way.
fn evaluate(model: &mut Model, nodes: &[String]) -> Result<(String, Vec<DeferredError>)> {
    let targets = if nodes.is_empty() {
        let mut targets = model.evaluate.clone();
        if let Some(fit) = model.fit.filter(|fit| !model.evaluate.contains(fit)) {
            targets.push(fit);
        }
        targets
    } else {
        nodes
            .iter()
            .map(|name| model.state.lookup(name))
            .collect::<Result<Vec<_>, _>>()?
    };
    if targets.is_empty() {
        bail!("nothing to evaluate: list nodes in `evaluate`, add a [fit] block or pass --node");
    }

    let mut text = String::new();
    for id in targets {
        model.state.recompute(id)?;
        text.push_str(&model.state.describe(id)?);
        text.push_str("\n\n");
    }
    Ok((text, model.state.take_deferred()))
}
