//! Status-name → [`TaskState`] lookup.
//!
//! Store rows carry free-text status names in several languages. They are
//! resolved once, here, against a table built at startup from the built-in
//! aliases plus any extra aliases from the `statuses:` config section.

use std::collections::HashMap;

use crate::config::StatusConfig;
use crate::error::{Result, RollupError};
use crate::types::TaskState;

const COMPLETED: &[&str] = &[
    "completed",
    "complete",
    "done",
    "finished",
    "closed",
    "delivered",
    "completada",
    "completado",
    "terminada",
    "terminado",
    "finalizada",
    "finalizado",
    "concluido",
];

const IN_PROGRESS: &[&str] = &[
    "in progress",
    "ongoing",
    "active",
    "started",
    "en progreso",
    "en curso",
    "en proceso",
];

const PENDING: &[&str] = &[
    "pending",
    "not started",
    "todo",
    "to do",
    "planned",
    "pendiente",
    "no iniciado",
];

/// Lower-case, trim, and fold `_` / `-` / repeated spaces into one space, so
/// "In_Progress", "in-progress" and " in  progress " all compare equal.
pub fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct StatusAliases {
    table: HashMap<String, TaskState>,
}

impl Default for StatusAliases {
    fn default() -> Self {
        let mut table = HashMap::new();
        for (aliases, state) in [
            (COMPLETED, TaskState::Completed),
            (IN_PROGRESS, TaskState::InProgress),
            (PENDING, TaskState::Pending),
        ] {
            for alias in aliases {
                table.insert(normalize(alias), state);
            }
        }
        Self { table }
    }
}

impl StatusAliases {
    /// Built-in aliases extended with the configured ones. An alias that ends
    /// up pointing at two different states is rejected.
    pub fn from_config(cfg: &StatusConfig) -> Result<Self> {
        let mut aliases = Self::default();
        for (extra, state) in [
            (&cfg.completed, TaskState::Completed),
            (&cfg.in_progress, TaskState::InProgress),
            (&cfg.pending, TaskState::Pending),
        ] {
            for alias in extra {
                aliases.insert(alias, state)?;
            }
        }
        Ok(aliases)
    }

    fn insert(&mut self, alias: &str, state: TaskState) -> Result<()> {
        let key = normalize(alias);
        if key.is_empty() {
            return Err(RollupError::Config("empty status alias".to_string()));
        }
        match self.table.get(&key) {
            Some(existing) if *existing != state => Err(RollupError::Config(format!(
                "status alias '{alias}' maps to both {existing} and {state}"
            ))),
            _ => {
                self.table.insert(key, state);
                Ok(())
            }
        }
    }

    /// Resolve a raw status name. Unknown or missing names count as pending.
    pub fn resolve(&self, name: Option<&str>) -> TaskState {
        name.and_then(|n| self.lookup(n)).unwrap_or(TaskState::Pending)
    }

    /// Exact lookup without the pending fallback.
    pub fn lookup(&self, name: &str) -> Option<TaskState> {
        self.table.get(&normalize(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
