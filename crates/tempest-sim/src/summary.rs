//! End-of-run report.

use std::fmt;

use serde::Serialize;
use tempest_common::{TempestError, TempestResult, Tick};

/// Per-agent results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    /// Raw agent ID.
    pub id: u64,
    /// Health left at the end of the run.
    pub health: f32,
    /// Whether the agent survived.
    pub alive: bool,
    /// Damage dealt to others.
    pub damage_dealt: f32,
    /// Damage taken.
    pub damage_taken: f32,
    /// Hits landed.
    pub hits_landed: u32,
    /// Hits taken.
    pub hits_taken: u32,
    /// Agents defeated.
    pub kills: u32,
    /// Times defeated.
    pub deaths: u32,
    /// Attacks started.
    pub attacks_started: u32,
    /// Attacks that finished recovery.
    pub attacks_completed: u32,
    /// Attacks cancelled by interrupts or death.
    pub attacks_cancelled: u32,
    /// Presses the scheduler refused.
    pub presses_refused: u32,
    /// Deepest combo reached.
    pub best_combo: u32,
}

/// Results of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimSummary {
    /// Ticks simulated.
    pub ticks: Tick,
    /// Presentation cues emitted.
    pub cues: usize,
    /// Agents in ID order.
    pub agents: Vec<AgentSummary>,
}

impl SimSummary {
    /// Total hits landed by everyone.
    #[must_use]
    pub fn total_hits(&self) -> u32 {
        self.agents.iter().map(|a| a.hits_landed).sum()
    }

    /// Agents still alive.
    #[must_use]
    pub fn survivors(&self) -> usize {
        self.agents.iter().filter(|a| a.alive).count()
    }

    /// Summary for one agent.
    #[must_use]
    pub fn agent(&self, id: u64) -> Option<&AgentSummary> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Pretty JSON.
    pub fn to_json(&self) -> TempestResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| TempestError::Serialization(e.to_string()))
    }
}

impl fmt::Display for SimSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Arena run: {} ticks, {} cues", self.ticks, self.cues)?;
        writeln!(
            f,
            "{:>6} {:>8} {:>8} {:>8} {:>5} {:>5} {:>7} {:>7} {:>6}",
            "agent", "health", "dealt", "taken", "hits", "kos", "attacks", "refused", "combo"
        )?;
        for agent in &self.agents {
            writeln!(
                f,
                "{:>6} {:>8.1} {:>8.1} {:>8.1} {:>5} {:>5} {:>7} {:>7} {:>6}{}",
                agent.id,
                agent.health,
                agent.damage_dealt,
                agent.damage_taken,
                agent.hits_landed,
                agent.kills,
                agent.attacks_started,
                agent.presses_refused,
                agent.best_combo,
                if agent.alive { "" } else { "  (down)" }
            )?;
        }
        Ok(())
    }
}
