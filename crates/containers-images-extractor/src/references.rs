//! Image references in manifest files
//!
//! A shallow scan: `FROM` lines of Dockerfiles, `services.*.image` of Compose
//! files and `image` entries of Helm values. Build-arg evaluation beyond
//! global `ARG` defaults and template rendering are left to dedicated tools;
//! references that still contain variables after substitution are dropped.

use serde_yaml::Value;
use std::collections::{BTreeMap, HashSet};

/// Base images named by `FROM` instructions
///
/// Global `ARG` defaults (declared before the first `FROM`) are substituted.
/// `scratch` and references to earlier build stages are skipped.
pub fn dockerfile_images(content: &str) -> Vec<String> {
    let mut args = BTreeMap::new();
    let mut stages = HashSet::new();
    let mut images = Vec::new();
    let mut seen_from = false;

    for instruction in logical_lines(content) {
        let mut words = instruction.split_whitespace();
        let Some(keyword) = words.next() else {
            continue;
        };

        if keyword.eq_ignore_ascii_case("ARG") && !seen_from {
            for arg in words {
                if let Some((name, default)) = arg.split_once('=') {
                    args.insert(name.to_string(), default.trim_matches('"').to_string());
                }
            }
            continue;
        }

        if !keyword.eq_ignore_ascii_case("FROM") {
            continue;
        }
        seen_from = true;

        let operands: Vec<&str> = words.filter(|w| !w.starts_with("--")).collect();
        let Some(reference) = operands.first() else {
            continue;
        };

        if let [_, keyword, alias] = operands.as_slice()
            && keyword.eq_ignore_ascii_case("AS")
        {
            stages.insert(alias.to_ascii_lowercase());
        }

        let image = substitute_variables(reference, &args);
        if image.eq_ignore_ascii_case("scratch") || stages.contains(&image.to_ascii_lowercase())
        {
            continue;
        }
        if image.is_empty() || image.contains('$') {
            tracing::debug!(reference = %reference, "Skipping unresolved FROM reference");
            continue;
        }

        images.push(image);
    }

    images
}

/// Instructions with `\` continuations joined and comments removed
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }

        match trimmed.strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                current.push(' ');
            }
            None => {
                current.push_str(trimmed);
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current.clear();
            }
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    lines
}

/// Images of the `services` section of a Compose file
///
/// `${VAR}`, `${VAR:-default}`, `${VAR-default}` and `$VAR` are looked up in
/// `variables`.
pub fn compose_images(
    content: &str,
    variables: &BTreeMap<String, String>,
) -> Result<Vec<String>, serde_yaml::Error> {
    let document: Value = serde_yaml::from_str(content)?;

    let Some(services) = document.get("services").and_then(Value::as_mapping) else {
        return Ok(Vec::new());
    };

    let mut images = Vec::new();
    for (name, service) in services {
        let Some(image) = service.get("image").and_then(Value::as_str) else {
            continue;
        };

        let image = substitute_variables(image, variables);
        if image.is_empty() || image.contains('$') {
            tracing::debug!(service = ?name, "Skipping unresolved image reference");
            continue;
        }
        images.push(image);
    }

    Ok(images)
}

/// Images declared in a Helm values file
///
/// Any `image` key counts, at any depth, either as a plain reference or as a
/// mapping with `repository` and optional `registry`, `tag` and `digest`.
pub fn helm_values_images(content: &str) -> Result<Vec<String>, serde_yaml::Error> {
    let document: Value = serde_yaml::from_str(content)?;
    let mut images = Vec::new();
    collect_helm_images(&document, &mut images);
    Ok(images)
}

fn collect_helm_images(value: &Value, images: &mut Vec<String>) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                if key.as_str() == Some("image")
                    && let Some(image) = helm_image(child)
                {
                    images.push(image);
                    continue;
                }
                collect_helm_images(child, images);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                collect_helm_images(item, images);
            }
        }
        _ => {}
    }
}

fn helm_image(value: &Value) -> Option<String> {
    if let Some(reference) = value.as_str() {
        let reference = reference.trim();
        return (!reference.is_empty() && !reference.contains("{{")).then(|| reference.to_string());
    }

    let repository = scalar(value.get("repository")?)?;
    if repository.is_empty() {
        return None;
    }

    let mut image = match value.get("registry").and_then(scalar) {
        Some(registry) if !registry.is_empty() => format!("{}/{}", registry, repository),
        _ => repository,
    };

    if let Some(tag) = value.get("tag").and_then(scalar).filter(|t| !t.is_empty()) {
        image = format!("{}:{}", image, tag);
    }
    if let Some(digest) = value.get("digest").and_then(scalar).filter(|d| !d.is_empty()) {
        image = format!("{}@{}", image, digest);
    }

    Some(image)
}

/// Strings and numbers (`tag: 7`) as text
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Replaces `${VAR}`, `${VAR:-default}`, `${VAR-default}` and `$VAR`
///
/// Unknown variables without a default are left untouched.
pub fn substitute_variables(input: &str, variables: &BTreeMap<String, String>) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        output.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(body) = after.strip_prefix('{') {
            let Some(end) = body.find('}') else {
                output.push_str(&rest[pos..]);
                return output;
            };
            let expression = &body[..end];
            let (name, default, use_default_when_empty) =
                if let Some((name, default)) = expression.split_once(":-") {
                    (name, Some(default), true)
                } else if let Some((name, default)) = expression.split_once('-') {
                    (name, Some(default), false)
                } else {
                    (expression, None, false)
                };

            match (variables.get(name), default) {
                (Some(value), Some(default)) if value.is_empty() && use_default_when_empty => {
                    output.push_str(default)
                }
                (Some(value), _) => output.push_str(value),
                (None, Some(default)) => output.push_str(default),
                (None, None) => output.push_str(&rest[pos..pos + 2 + end + 1]),
            }
            rest = &body[end + 1..];
        } else {
            let length = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..length];

            match variables.get(name) {
                Some(value) if !name.is_empty() => output.push_str(value),
                _ => output.push_str(&rest[pos..pos + 1 + length]),
            }
            rest = &after[length..];
        }
    }

    output.push_str(rest);
    output
}
