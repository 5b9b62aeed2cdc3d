//! Script component - forwards lifecycle hooks to the scripting runtime

use crate::io::{FileStream, StreamResult};
use crate::resources::{is_supported_script_file, ResourceManager, ScriptAsset};

use super::{Component, ComponentKind, ComponentType, UpdateContext};

/// Behaviour scripts run for the owning game object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    scripts: Vec<String>,
}

impl Script {
    /// Attach a script by path; attaching the same path twice is a no-op
    pub fn add_script(&mut self, path: impl Into<String>) {
        let path = path.into();
        if self.scripts.contains(&path) {
            log::debug!("Script {} already attached", path);
            return;
        }
        self.scripts.push(path);
    }

    /// Detach a script; returns whether it was attached
    pub fn remove_script(&mut self, path: &str) -> bool {
        let before = self.scripts.len();
        self.scripts.retain(|s| s != path);
        self.scripts.len() != before
    }

    /// Attached script paths, in attach order
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }
}

impl Component for Script {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Script
    }

    fn start(&mut self, ctx: &mut UpdateContext<'_>) {
        for script in &self.scripts {
            ctx.scripting.invoke_start(script, ctx.owner_id);
        }
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) {
        for script in &self.scripts {
            ctx.scripting.invoke_update(script, ctx.owner_id, ctx.delta);
        }
    }

    fn serialize(&self, stream: &mut FileStream) {
        stream.write_strings(&self.scripts);
    }

    fn deserialize(&mut self, stream: &mut FileStream) -> StreamResult<()> {
        self.scripts = stream.read_strings()?;
        Ok(())
    }

    fn bind_resources(&mut self, resources: &mut ResourceManager) {
        for path in self.scripts.iter().filter(|p| is_supported_script_file(p)) {
            if let Err(e) = resources.load::<ScriptAsset>(path) {
                log::warn!("Script source {} is not available: {}", path, e);
            }
        }
    }

    component_any!();
}

impl ComponentType for Script {
    const KIND: ComponentKind = ComponentKind::Script;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::GameObjectKey;
    use crate::subsystems::Scripting;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingScripting {
        starts: Vec<(String, String)>,
        updates: usize,
    }

    impl Scripting for CountingScripting {
        fn invoke_start(&mut self, script: &str, owner_id: &str) {
            self.starts.push((script.to_string(), owner_id.to_string()));
        }

        fn invoke_update(&mut self, _script: &str, _owner_id: &str, _delta: Duration) {
            self.updates += 1;
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn test_hooks_reach_every_script() {
        let mut script = Script::default();
        script.add_script("scripts/a.script");
        script.add_script("scripts/b.script");
        script.add_script("scripts/a.script");
        assert_eq!(script.scripts().len(), 2);

        let mut runtime = CountingScripting::default();
        let mut ctx = UpdateContext {
            owner: GameObjectKey::default(),
            owner_id: "owner",
            delta: Duration::from_millis(16),
            scripting: &mut runtime,
        };
        script.start(&mut ctx);
        script.update(&mut ctx);
        script.update(&mut ctx);

        assert_eq!(runtime.starts[1], ("scripts/b.script".to_string(), "owner".to_string()));
        assert_eq!(runtime.updates, 4);
    }
}
