use mas_core::{AgentId, Sku};

use crate::{Agent, AgentContext, AgentKind, AgentResult};

/// Passive roster entry standing for one catalog item.  Never acts.
#[derive(Debug, Clone)]
pub struct CatalogAgent {
    id:  AgentId,
    sku: Sku,
}

impl CatalogAgent {
    pub fn new(id: AgentId, sku: Sku) -> Self {
        Self { id, sku }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }
}

impl Agent for CatalogAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn kind(&self) -> AgentKind {
        AgentKind::Catalog
    }

    fn step(&mut self, _ctx: &mut AgentContext<'_>) -> AgentResult<()> {
        Ok(())
    }
}
