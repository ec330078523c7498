use std::collections::HashSet;

use tracing::debug;

use crate::assembly::{stack_name_from_template_file, Assembly};
use crate::model::{Resource, ResourceType, Stack};

/// A resource located in the assembly together with the stack that deploys it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoundResource<'a> {
    pub resource: &'a Resource,
    pub stack: &'a Stack,
    /// Synthesized logical id, e.g. `ExampleFunction1D4F8B3C`.
    pub logical_id: &'a str,
}

/// Finds the resource of `resource_type` whose construct id is `id`.
///
/// Stacks are searched in assembly order and nested stacks are descended into
/// where they are declared, so the first match in that depth-first order wins.
pub fn find_resource<'a>(
    assembly: &'a Assembly,
    id: &str,
    resource_type: &ResourceType,
) -> Option<FoundResource<'a>> {
    let mut visited = HashSet::new();

    for stack in &assembly.stacks {
        if let Some(found) = find_in_stack(assembly, stack, id, resource_type, &mut visited) {
            return Some(found);
        }
    }

    debug!(id, resource_type = %resource_type, "Resource not found in assembly");
    return None;
}

fn find_in_stack<'a>(
    assembly: &'a Assembly,
    stack: &'a Stack,
    id: &str,
    resource_type: &ResourceType,
    visited: &mut HashSet<&'a str>,
) -> Option<FoundResource<'a>> {
    // a stack reachable both directly and as a nested stack is only searched once
    if !visited.insert(stack.stack_name.as_str()) {
        return None;
    }

    for (logical_id, resource) in &stack.template.resources {
        if &resource.resource_type == resource_type && resource.has_construct_id(id) {
            return Some(FoundResource {
                resource,
                stack,
                logical_id,
            });
        }

        if resource.resource_type != ResourceType::CloudFormationStack {
            continue;
        }

        let nested = resource
            .asset_path()
            .map(stack_name_from_template_file)
            .and_then(|stack_name| assembly.stack(stack_name));

        if let Some(nested) = nested {
            debug!(
                parent = %stack.stack_name,
                nested = %nested.stack_name,
                "Descending into nested stack"
            );
            if let Some(found) = find_in_stack(assembly, nested, id, resource_type, visited) {
                return Some(found);
            }
        }
    }

    return None;
}
