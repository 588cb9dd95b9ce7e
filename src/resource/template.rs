use anyhow::{Context, Result, bail};
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// Renders a template source against a set of bindings
pub trait TemplateEngine: Send + Sync + std::fmt::Debug {
    fn render(&self, source: &str, bindings: &BTreeMap<String, String>) -> Result<String>;
}

/// Plain `{{ key }}` substitution
///
/// Unbound placeholders left in the output are an error rather than silent
/// literal text.
#[derive(Debug, Default)]
pub struct SubstitutionEngine;

impl TemplateEngine for SubstitutionEngine {
    fn render(&self, source: &str, bindings: &BTreeMap<String, String>) -> Result<String> {
        let mut rendered = source.to_string();
        for (key, value) in bindings {
            rendered = rendered.replace(&format!("{{{{ {key} }}}}"), value);
        }
        if let Some(pos) = rendered.find("{{") {
            let tail: String = rendered[pos..].chars().take(40).collect();
            bail!("unbound template variable near '{tail}'");
        }
        Ok(rendered)
    }
}

/// A file managed from a template
///
/// Converges the file content to the rendered template; the diff between
/// on-disk content and rendered content drives the apply decision.
#[derive(Debug)]
pub struct TemplateResource {
    path: PathBuf,
    source: String,
    mode: Option<u32>,
    bindings: BTreeMap<String, String>,
    engine: Arc<dyn TemplateEngine>,
}

impl TemplateResource {
    pub fn new(
        path: impl Into<PathBuf>,
        source: impl Into<String>,
        bindings: BTreeMap<String, String>,
        engine: Arc<dyn TemplateEngine>,
    ) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            mode: None,
            bindings,
            engine,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    fn rendered(&self) -> Result<String> {
        self.engine
            .render(&self.source, &self.bindings)
            .with_context(|| format!("Could not render template for {}", self.path.display()))
    }
}

impl Resource for TemplateResource {
    fn kind(&self) -> &'static str {
        "template"
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn description(&self) -> String {
        format!("render {}", self.path.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.path.exists() {
            return Ok(ResourceState::Absent);
        }
        let on_disk = fs::read_to_string(&self.path)
            .with_context(|| format!("Could not read {}", self.path.display()))?;
        let rendered = self.rendered()?;
        if on_disk == rendered {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Modified {
                from: on_disk,
                to: rendered,
            })
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        let was_absent = !self.path.exists();
        let rendered = self.rendered()?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        fs::write(&self.path, rendered)
            .with_context(|| format!("Could not write {}", self.path.display()))?;
        if let Some(mode) = self.mode {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&self.path, fs::Permissions::from_mode(mode)).with_context(
                    || format!("Could not set mode on {}", self.path.display()),
                )?;
            }
        }
        if was_absent {
            Ok(ApplyResult::Created)
        } else {
            Ok(ApplyResult::Modified)
        }
    }
}
