//! Script sources handed to the scripting subsystem

use std::path::Path;

use super::{Resource, ResourceError, ResourceKind, ResourceResult};

/// Source text of a behaviour script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptAsset {
    source: String,
}

impl ScriptAsset {
    /// Source text
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Resource for ScriptAsset {
    const KIND: ResourceKind = ResourceKind::Script;

    fn load_from_file(path: &Path) -> ResourceResult<Self> {
        let name = path.display().to_string();
        if !super::is_supported_script_file(&name) {
            return Err(ResourceError::Unsupported(name));
        }
        Ok(Self { source: std::fs::read_to_string(path)? })
    }
}
