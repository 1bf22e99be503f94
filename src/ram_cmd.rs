//! Ram command: shallow inverse and expected covariance.

use anyhow::{Context, Result};
use semcore_algebra::DeferredError;
use tracing::info_span;

use crate::cli::RamArgs;
use crate::convert::{Model, load_model};

/// Computes and prints `(I - A)^-1` and `F Z S Zᵀ Fᵀ`.
pub fn run(args: RamArgs) -> Result<()> {
    let _cmd = info_span!("ram").entered();
    let mut model = load_model(&args.model, args.params.as_deref())?;
    match expectation(&mut model)? {
        Ok(text) => print!("{text}"),
        Err(deferred) => {
            for error in deferred {
                eprintln!("warning: {error}");
            }
        }
    }
    Ok(())
}

/// Listing of the inverse and the expected covariance, or the deferred
/// errors when `I - A` is singular.
fn expectation(model: &mut Model) -> Result<Result<String, Vec<DeferredError>>> {
    let ram = model
        .ram
        .as_mut()
        .context("model file has no [ram] block")?;
    Ok(match ram.compute(&mut model.state)? {
        Some(cov) => Ok(format!("{}\n\n{cov}\n", ram.inverse())),
        None => Err(model.state.take_deferred()),
    })
}

#[cfg(test)]
mod tests {
    use semcore_algebra::{RamConfig, RamExpectation};

    use super::*;
    use crate::config::ModelConfig;
    use crate::convert::{build_model, tests::CHAIN};

    fn model(text: &str) -> Model {
        let config: ModelConfig = toml::from_str(text).unwrap();
        build_model(&config).unwrap()
    }

    #[test]
    fn prints_inverse_and_covariance() {
        let mut model = model(CHAIN);
        let text = expectation(&mut model).unwrap().unwrap();
        assert!(text.starts_with("Z: (2 x 2)"), "{text}");
        assert!(text.contains("expected covariance: (2 x 2)"), "{text}");
    }

    #[test]
    fn singular_returns_deferred() {
        let mut model = model(CHAIN);
        let [a, s, f] = ["A", "S", "F"].map(|name| model.state.lookup(name).unwrap());
        model.state.set_element(a, 0, 0, 1.0).unwrap();
        // series mode never detects a singular I - A
        model.ram = Some(RamExpectation::new(a, s, f, RamConfig::new()));
        let deferred = expectation(&mut model).unwrap().unwrap_err();
        assert_eq!(deferred.len(), 1);
    }

    #[test]
    fn missing_ram_block_fails() {
        let mut model = model("[[matrix]]\nname = \"A\"\nrows = 1\ncols = 1\n");
        let err = expectation(&mut model).unwrap_err();
        assert_eq!(err.to_string(), "model file has no [ram] block");
    }
}
