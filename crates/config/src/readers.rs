//! Built-in catalog of skill readers (consuming agents) and the user
//! override merge.

use serde::{Deserialize, Serialize};

/// Reader id used for the universal `~/.agents/skills` location. The
/// packaging tool has no agent by this name, so it never appears in
/// `--agent` flags.
pub const UNIVERSAL_READER_ID: &str = "skills-cli";

/// How a specific agent reads skills from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reader {
    /// Unique identifier, e.g. `claude-code`.
    pub id: String,
    /// Display name, e.g. `Claude Code`.
    pub name: String,
    /// Short label for compact listings, e.g. `CC`.
    pub short_name: String,
    /// Global skill directory, may start with `~`.
    pub global_path: String,
    /// Skill directory relative to a project root.
    pub project_path: String,
}

/// A partial reader definition from user config. Every field except `id`
/// is optional and overrides the built-in value of the same reader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderOverride {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub global_path: Option<String>,
    #[serde(default)]
    pub project_path: Option<String>,
}

// (id, name, short name, global path, project path)
const BUILTIN_READERS: &[(&str, &str, &str, &str, &str)] = &[
    ("amp", "Amp, Kimi Code CLI", "AMP", "~/.config/agents/skills", ".agents/skills"),
    ("antigravity", "Antigravity", "AG", "~/.gemini/antigravity/global_skills", ".agent/skills"),
    ("claude-code", "Claude Code", "CC", "~/.claude/skills", ".claude/skills"),
    ("moltbot", "Moltbot", "MOLT", "~/.moltbot/skills", "skills"),
    ("cline", "Cline", "CLINE", "~/.cline/skills", ".cline/skills"),
    ("codebuddy", "CodeBuddy", "CB", "~/.codebuddy/skills", ".codebuddy/skills"),
    ("codex", "Codex", "CX", "~/.codex/skills", ".codex/skills"),
    ("command-code", "Command Code", "CMD", "~/.commandcode/skills", ".commandcode/skills"),
    ("continue", "Continue", "CONT", "~/.continue/skills", ".continue/skills"),
    ("crush", "Crush", "CRUSH", "~/.config/crush/skills", ".crush/skills"),
    ("cursor", "Cursor", "CUR", "~/.cursor/skills", ".cursor/skills"),
    ("droid", "Droid", "DROID", "~/.factory/skills", ".factory/skills"),
    ("gemini-cli", "Gemini CLI", "GM", "~/.gemini/skills", ".gemini/skills"),
    ("github-copilot", "GitHub Copilot", "COPILOT", "~/.copilot/skills", ".github/skills"),
    ("goose", "Goose", "GOOSE", "~/.config/goose/skills", ".goose/skills"),
    ("junie", "Junie", "JUNIE", "~/.junie/skills", ".junie/skills"),
    ("kilo", "Kilo Code", "KILO", "~/.kilocode/skills", ".kilocode/skills"),
    ("kiro-cli", "Kiro CLI", "KIRO", "~/.kiro/skills", ".kiro/skills"),
    ("kode", "Kode", "KODE", "~/.kode/skills", ".kode/skills"),
    ("mcpjam", "MCPJam", "MCP", "~/.mcpjam/skills", ".mcpjam/skills"),
    ("mux", "Mux", "MUX", "~/.mux/skills", ".mux/skills"),
    ("opencode", "OpenCode", "OPEN", "~/.config/opencode/skills", ".opencode/skills"),
    ("openhands", "OpenHands", "HANDS", "~/.openhands/skills", ".openhands/skills"),
    ("pi", "Pi", "PI", "~/.pi/agent/skills", ".pi/skills"),
    ("qoder", "Qoder", "QODER", "~/.qoder/skills", ".qoder/skills"),
    ("qwen-code", "Qwen Code", "QWEN", "~/.qwen/skills", ".qwen/skills"),
    ("roo", "Roo Code", "ROO", "~/.roo/skills", ".roo/skills"),
    ("trae", "Trae", "TRAE", "~/.trae/skills", ".trae/skills"),
    ("windsurf", "Windsurf", "WIND", "~/.codeium/windsurf/skills", ".windsurf/skills"),
    ("zencoder", "Zencoder", "ZEN", "~/.zencoder/skills", ".zencoder/skills"),
    ("neovate", "Neovate", "NEO", "~/.neovate/skills", ".neovate/skills"),
    ("pochi", "Pochi", "POCHI", "~/.pochi/skills", ".pochi/skills"),
    (UNIVERSAL_READER_ID, "Agents (Universal)", "UN", "~/.agents/skills", ".agents/skills"),
];

/// The built-in reader catalog, in display order.
pub fn default_readers() -> Vec<Reader> {
    BUILTIN_READERS
        .iter()
        .map(|(id, name, short, global, project)| Reader {
            id: (*id).into(),
            name: (*name).into(),
            short_name: (*short).into(),
            global_path: (*global).into(),
            project_path: (*project).into(),
        })
        .collect()
}

/// Merge user overrides into the defaults with a field-level merge keyed by
/// `id`.
///
/// Existing readers keep their position and take every field the override
/// sets. Unknown ids are appended in override order, but only when they name
/// both a global and a project path; the display name falls back to the id.
pub fn merge_readers(defaults: Vec<Reader>, overrides: &[ReaderOverride]) -> Vec<Reader> {
    let mut readers = defaults;

    for over in overrides {
        if let Some(existing) = readers.iter_mut().find(|r| r.id == over.id) {
            if let Some(ref name) = over.name {
                existing.name = name.clone();
            }
            if let Some(ref short) = over.short_name {
                existing.short_name = short.clone();
            }
            if let Some(ref global) = over.global_path {
                existing.global_path = global.clone();
            }
            if let Some(ref project) = over.project_path {
                existing.project_path = project.clone();
            }
            continue;
        }

        match (&over.global_path, &over.project_path) {
            (Some(global), Some(project)) => readers.push(Reader {
                id: over.id.clone(),
                name: over.name.clone().unwrap_or_else(|| over.id.clone()),
                short_name: over
                    .short_name
                    .clone()
                    .unwrap_or_else(|| over.id.to_uppercase()),
                global_path: global.clone(),
                project_path: project.clone(),
            }),
            _ => {
                tracing::warn!(
                    id = %over.id,
                    "ignoring reader override without globalPath and projectPath"
                );
            },
        }
    }

    readers
}
