use std::path::Path;

use {serde::Deserialize, tracing::debug};

#[derive(Deserialize, Default)]
struct Frontmatter {
    #[serde(default)]
    description: Option<serde_yaml::Value>,
}

/// Read `SKILL.md` from `skill_dir` and extract its description.
///
/// Unreadable files and malformed frontmatter yield `None`.
pub fn read_description(skill_dir: &Path) -> Option<String> {
    let path = skill_dir.join(crate::types::SKILL_MANIFEST);
    match std::fs::read_to_string(&path) {
        Ok(content) => parse_description(&content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not read skill manifest");
            None
        },
    }
}

/// Extract `description` from the frontmatter of a `SKILL.md` body.
///
/// Tries a YAML parse of the frontmatter first. Frontmatter that is not
/// valid YAML (unquoted colons are common) falls back to a line scan for a
/// `description:` key with optional surrounding quotes.
pub fn parse_description(content: &str) -> Option<String> {
    let frontmatter = split_frontmatter(content)?;

    if let Ok(fm) = serde_yaml::from_str::<Frontmatter>(frontmatter) {
        return match fm.description {
            Some(serde_yaml::Value::String(s)) => non_empty(s.trim()),
            Some(serde_yaml::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
    }

    frontmatter.lines().find_map(|line| {
        let value = line.strip_prefix("description:")?;
        non_empty(strip_quotes(value.trim()))
    })
}

/// The `SKILL.md` body after its frontmatter block. Content without a
/// complete frontmatter block is returned whole.
pub fn strip_frontmatter(content: &str) -> &str {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let Some(after_open) = trimmed.strip_prefix("---").and_then(|rest| {
        rest.strip_prefix("\r\n")
            .or_else(|| rest.strip_prefix('\n'))
    }) else {
        return content;
    };
    let close = if after_open.starts_with("---") {
        Some(0)
    } else {
        after_open.find("\n---").map(|idx| idx + 1)
    };
    match close {
        Some(idx) => after_open[idx + 3..]
            .split_once('\n')
            .map_or("", |(_, body)| body),
        None => content,
    }
}

/// The text between the opening `---` line and the next `---` line.
fn split_frontmatter(content: &str) -> Option<&str> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    let after_open = trimmed.strip_prefix("---")?;
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))?;
    if let Some(rest) = after_open.strip_prefix("---") {
        return rest
            .chars()
            .next()
            .is_none_or(|c| c == '\n' || c == '\r')
            .then_some("");
    }
    let close = after_open.find("\n---")?;
    Some(&after_open[..close])
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
