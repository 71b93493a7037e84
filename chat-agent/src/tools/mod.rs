use crate::clients::ToolDefinition;

#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    definitions: Vec<ToolDefinition>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration, replacing any earlier one with the same name.
    pub fn register(&mut self, definition: ToolDefinition) {
        match self
            .definitions
            .iter_mut()
            .find(|existing| existing.name() == definition.name())
        {
            Some(existing) => *existing = definition,
            None => self.definitions.push(definition),
        }
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

pub fn default_tools() -> ToolManager {
    ToolManager::new()
}
