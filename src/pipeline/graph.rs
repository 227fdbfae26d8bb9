//! Enrichment step scheduling via dependency resolution.
//!
//! Kahn's algorithm over the registered steps. The order is deterministic:
//! among steps whose dependencies are all satisfied, registration order wins.
//! A cycle or a dependency naming an unregistered step is a configuration
//! error, reported before any file is processed.

use std::collections::HashMap;

use super::error::PipelineError;
use super::traits::EnrichmentStep;

/// Resolve an execution order over the registered steps, returned as indices
/// into the input slice.
pub fn resolve_order(steps: &[Box<dyn EnrichmentStep>]) -> Result<Vec<usize>, PipelineError> {
    let names: Vec<String> = steps.iter().map(|s| s.name().to_string()).collect();

    let mut index_by_name: HashMap<&str, usize> = HashMap::new();
    for (i, name) in names.iter().enumerate() {
        if index_by_name.insert(name.as_str(), i).is_some() {
            return Err(PipelineError::Config(format!(
                "Duplicate enrichment step name: '{name}'"
            )));
        }
    }

    // Dependencies as indices; an unresolved name is fatal, same as a cycle.
    // Silently dropping the edge could reorder steps nondeterministically.
    let mut deps: Vec<Vec<usize>> = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        let mut resolved = Vec::new();
        for dep in step.dependencies() {
            match index_by_name.get(dep.as_str()) {
                Some(&j) => resolved.push(j),
                None => {
                    return Err(PipelineError::Config(format!(
                        "Step '{}' depends on unregistered step '{dep}'",
                        names[i]
                    )))
                }
            }
        }
        deps.push(resolved);
    }

    let mut in_degree: Vec<usize> = deps.iter().map(|d| d.len()).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
    for (i, d) in deps.iter().enumerate() {
        for &j in d {
            dependents[j].push(i);
        }
    }

    let mut order = Vec::with_capacity(steps.len());
    let mut emitted = vec![false; steps.len()];

    // Each round emits the earliest-registered step with no remaining
    // predecessors, keeping the order stable and reproducible.
    loop {
        let next = (0..steps.len()).find(|&i| !emitted[i] && in_degree[i] == 0);
        let Some(i) = next else { break };
        emitted[i] = true;
        order.push(i);
        for &j in &dependents[i] {
            in_degree[j] -= 1;
        }
    }

    if order.len() < steps.len() {
        let stuck: Vec<&str> = (0..steps.len())
            .filter(|&i| !emitted[i])
            .map(|i| names[i].as_str())
            .collect();
        return Err(PipelineError::Config(format!(
            "Cyclic enrichment step dependencies among: {}",
            stuck.join(", ")
        )));
    }

    Ok(order)
}
