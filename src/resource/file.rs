use anyhow::{Context, Result};
use converge::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::fs;
use std::path::PathBuf;

/// A file that must exist, created empty when missing
///
/// Existing content is left alone; this is create-if-missing, not content
/// management. Used for the sqlite database file, which the server schema
/// tooling then populates.
#[derive(Debug)]
pub struct FileResource {
    path: PathBuf,
    mode: Option<u32>,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }
}

impl Resource for FileResource {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn description(&self) -> String {
        format!("create file {}", self.path.display())
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.path.exists() {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, _ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }
        fs::write(&self.path, b"")
            .with_context(|| format!("Could not create {}", self.path.display()))?;
        if let Some(mode) = self.mode {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&self.path, fs::Permissions::from_mode(mode)).with_context(
                    || format!("Could not set mode on {}", self.path.display()),
                )?;
            }
        }
        Ok(ApplyResult::Created)
    }
}
