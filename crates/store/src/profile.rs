use {
    skillknife_common::time::now_rfc3339,
    skillknife_skills::{Profile, ProfileSkill, Skill, SkillRef, resolve_install_source},
    tracing::warn,
};

/// Freeze the current project-scope skills into a named profile.
///
/// Each entry records where the skill can be reinstalled from. Skills with
/// no recorded provenance cannot be restored and are left out; their names
/// are returned alongside the profile.
pub fn snapshot_profile(name: &str, project_skills: &[Skill]) -> (Profile, Vec<String>) {
    let mut skills = Vec::new();
    let mut skipped = Vec::new();
    for skill in project_skills {
        let entry = ProfileSkill {
            name: skill.name.clone(),
            install_source: resolve_install_source(&SkillRef::Local(skill.clone())),
        };
        if SkillRef::from_profile(&entry).is_some() {
            skills.push(entry);
        } else {
            warn!(skill = %skill.name, profile = name, "no recorded source, not saved to profile");
            skipped.push(skill.name.clone());
        }
    }
    let profile = Profile {
        name: name.to_string(),
        created_at: now_rfc3339(),
        skills,
    };
    (profile, skipped)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        skillknife_skills::{Installation, Scope, SkillMetadata},
        std::path::PathBuf,
    };

    fn project_skill(name: &str, repo_url: Option<&str>) -> Skill {
        Skill {
            name: name.into(),
            description: None,
            installations: vec![Installation {
                scope: Scope::Project,
                reader_id: "claude-code".into(),
                path: PathBuf::from(format!("/w/.claude/skills/{name}")),
            }],
            metadata: repo_url.map(|url| SkillMetadata {
                repo_url: Some(url.into()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn snapshot_records_locators_and_skips_unsourced() {
        let (profile, skipped) = snapshot_profile("web", &[
            project_skill("pdf", Some("https://github.com/anthropics/skills/tree/main/skills/pdf")),
            project_skill("notes", None),
            project_skill("lint", Some("acme/tools")),
        ]);
        assert_eq!(profile.name, "web");
        assert!(profile.created_at.ends_with('Z'));
        assert_eq!(profile.skills, [
            ProfileSkill {
                name: "pdf".into(),
                install_source: "https://github.com/anthropics/skills".into(),
            },
            ProfileSkill {
                name: "lint".into(),
                install_source: "acme/tools".into(),
            },
        ]);
        assert_eq!(skipped, ["notes"]);
    }
}
